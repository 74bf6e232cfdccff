//! Named tasks and the dependency graph between them.
//!
//! ```text
//! content ──┐
//!           ├──► build ──► serve
//! style ────┘
//! ```
//!
//! A run executes the target's dependency closure sequentially in
//! topological order. When a task fails, everything downstream of it is
//! skipped, but unrelated tasks still run: a broken stylesheet does not stop
//! the content build.

use crate::{
    build::{build_content, build_style},
    config::{ConfigError, SiteConfig},
    log,
    serve::serve_site,
};
use anyhow::{Result, bail};
use rustc_hash::FxHashSet;
use std::{collections::BTreeMap, fmt};

/// A unit of work the CLI or the watcher can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Task {
    Content,
    Style,
    Build,
    Serve,
}

impl Task {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Content => "content",
            Self::Style => "style",
            Self::Build => "build",
            Self::Serve => "serve",
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A task and the tasks that must finish before it.
#[derive(Debug, Clone)]
pub struct TaskNode {
    pub task: Task,
    pub deps: Vec<Task>,
}

impl TaskNode {
    pub fn new(task: Task, deps: &[Task]) -> Self {
        Self {
            task,
            deps: deps.to_vec(),
        }
    }
}

/// Validated, acyclic task graph.
#[derive(Debug, Clone)]
pub struct TaskGraph {
    deps: BTreeMap<Task, Vec<Task>>,
}

#[derive(Clone, Copy, PartialEq)]
enum Mark {
    Visiting,
    Done,
}

impl TaskGraph {
    /// Build a graph, rejecting unknown dependencies and cycles.
    pub fn new(nodes: impl IntoIterator<Item = TaskNode>) -> Result<Self, ConfigError> {
        let deps: BTreeMap<Task, Vec<Task>> =
            nodes.into_iter().map(|node| (node.task, node.deps)).collect();

        for (task, task_deps) in &deps {
            if let Some(dep) = task_deps.iter().find(|d| !deps.contains_key(*d)) {
                return Err(ConfigError::UnknownTask {
                    task: task.to_string(),
                    dependency: dep.to_string(),
                });
            }
        }

        let graph = Self { deps };
        let mut marks = BTreeMap::new();
        for &task in graph.deps.keys() {
            let mut stack = Vec::new();
            graph.find_cycle(task, &mut marks, &mut stack)?;
        }
        Ok(graph)
    }

    /// `content`, `style`, `build` (both), `serve` (after `build`).
    pub fn standard() -> Result<Self, ConfigError> {
        Self::new([
            TaskNode::new(Task::Content, &[]),
            TaskNode::new(Task::Style, &[]),
            TaskNode::new(Task::Build, &[Task::Content, Task::Style]),
            TaskNode::new(Task::Serve, &[Task::Build]),
        ])
    }

    fn deps_of(&self, task: Task) -> &[Task] {
        self.deps.get(&task).map(Vec::as_slice).unwrap_or_default()
    }

    fn find_cycle(
        &self,
        task: Task,
        marks: &mut BTreeMap<Task, Mark>,
        stack: &mut Vec<Task>,
    ) -> Result<(), ConfigError> {
        match marks.get(&task) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::Visiting) => {
                let start = stack.iter().position(|&t| t == task).unwrap_or(0);
                let path: Vec<&str> = stack[start..]
                    .iter()
                    .chain([&task])
                    .map(|t| t.name())
                    .collect();
                return Err(ConfigError::Cycle(path.join(" -> ")));
            }
            None => {}
        }

        marks.insert(task, Mark::Visiting);
        stack.push(task);
        for &dep in self.deps_of(task) {
            self.find_cycle(dep, marks, stack)?;
        }
        stack.pop();
        marks.insert(task, Mark::Done);
        Ok(())
    }

    /// `target` and everything it depends on, dependencies first.
    pub fn plan(&self, target: Task) -> Vec<Task> {
        fn visit(graph: &TaskGraph, task: Task, seen: &mut FxHashSet<Task>, order: &mut Vec<Task>) {
            if !seen.insert(task) {
                return;
            }
            for &dep in graph.deps_of(task) {
                visit(graph, dep, seen, order);
            }
            order.push(task);
        }

        let mut order = Vec::new();
        visit(self, target, &mut FxHashSet::default(), &mut order);
        order
    }

    /// Execute the plan for `target` with `action`, returning what happened
    /// to each task.
    pub fn execute(
        &self,
        target: Task,
        mut action: impl FnMut(Task) -> Result<()>,
    ) -> Vec<(Task, Outcome)> {
        let mut outcomes: Vec<(Task, Outcome)> = Vec::new();

        for task in self.plan(target) {
            let blocked = self.deps_of(task).iter().find(|dep| {
                outcomes
                    .iter()
                    .any(|(t, outcome)| t == *dep && *outcome != Outcome::Done)
            });

            let outcome = if let Some(dep) = blocked {
                log!("warn"; "skipping {task}: {dep} did not complete");
                Outcome::Skipped
            } else {
                match action(task) {
                    Ok(()) => Outcome::Done,
                    Err(e) => {
                        log!("error"; "{task} failed: {e:#}");
                        Outcome::Failed
                    }
                }
            };
            outcomes.push((task, outcome));
        }

        outcomes
    }

    /// Execute `target`, failing if any task in its plan failed.
    pub fn run(&self, target: Task, action: impl FnMut(Task) -> Result<()>) -> Result<()> {
        let failed: Vec<&str> = self
            .execute(target, action)
            .into_iter()
            .filter(|(_, outcome)| *outcome == Outcome::Failed)
            .map(|(task, _)| task.name())
            .collect();

        if !failed.is_empty() {
            bail!("failed tasks: {}", failed.join(", "));
        }
        Ok(())
    }
}

/// Result of one task in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Done,
    Failed,
    Skipped,
}

/// The action behind each task.
pub fn run_task(task: Task, config: &SiteConfig) -> Result<()> {
    match task {
        Task::Content => build_content(config).map(drop),
        Task::Style => build_style(config).map(drop),
        Task::Build => Ok(()),
        Task::Serve => serve_site(config),
    }
}
