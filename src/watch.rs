//! File system watcher for live reload.
//!
//! Watches the source directory and turns changes into task runs.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      Event Loop                              │
//! │                                                              │
//! │  ┌──────────┐    ┌────────────┐    ┌──────────────────────┐  │
//! │  │ notify   │───▶│ classify   │───▶│ TaskQueue (FIFO)     │  │
//! │  │ events   │    │ style/     │    │ run one at a time,   │  │
//! │  └──────────┘    │ content    │    │ then broadcast       │  │
//! │                  └────────────┘    └──────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every relevant event queues its task; nothing is debounced or merged, and
//! a run always finishes before the next one starts. A failed run is logged
//! and the loop keeps going.

use crate::{
    config::{SiteConfig, to_slash},
    log,
    reload::{ReloadHub, ReloadMessage},
    tasks::{Task, run_task},
    utils::glob::Globs,
};
use anyhow::{Context, Result};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use std::{
    collections::VecDeque,
    path::{Path, PathBuf},
    sync::mpsc,
    time::Instant,
};

// =============================================================================
// Path Utilities
// =============================================================================

/// Check if path is a temp/backup file (editor artifacts).
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
        || name.starts_with('#')
}

const fn is_relevant(event: &Event) -> bool {
    matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}

// =============================================================================
// Classification
// =============================================================================

/// Maps a changed source path to the task that rebuilds it.
pub struct Classifier {
    source: PathBuf,
    style: Globs,
    content: Globs,
}

impl Classifier {
    pub fn new(config: &SiteConfig) -> Result<Self> {
        Ok(Self {
            source: config.paths().source_dir(),
            style: Globs::new(&config.serve.watch_style)?,
            content: Globs::new(&config.serve.watch_content)?,
        })
    }

    /// Style globs win when both match.
    pub fn classify(&self, path: &Path) -> Option<Task> {
        if is_temp_file(path) {
            return None;
        }
        let rel = path.strip_prefix(&self.source).map_or_else(|_| to_slash(path), to_slash);

        if self.style.is_match(&rel) {
            Some(Task::Style)
        } else if self.content.is_match(&rel) {
            Some(Task::Content)
        } else {
            None
        }
    }
}

// =============================================================================
// Task Queue
// =============================================================================

/// FIFO of pending task runs.
#[derive(Debug, Default)]
pub struct TaskQueue {
    pending: VecDeque<Task>,
}

impl TaskQueue {
    /// Queue one task per relevant path of `event`.
    pub fn push_event(&mut self, event: &Event, classifier: &Classifier) {
        if !is_relevant(event) {
            return;
        }
        self.pending
            .extend(event.paths.iter().filter_map(|p| classifier.classify(p)));
    }

    pub fn pop(&mut self) -> Option<Task> {
        self.pending.pop_front()
    }

    /// Run every pending task in order with `run`. A failed run is logged and
    /// the next one still runs; `notify` only hears about successful runs.
    pub fn drain(
        &mut self,
        mut run: impl FnMut(Task) -> Result<()>,
        mut notify: impl FnMut(ReloadMessage),
    ) {
        while let Some(task) = self.pop() {
            let started = Instant::now();
            match run(task) {
                Ok(()) => {
                    log!("watch"; "{task} done in {:.0?}", started.elapsed());
                    notify(reload_message(task));
                }
                Err(err) => log!("error"; "{task} failed: {err:#}"),
            }
        }
    }
}

/// What browsers should do after `task` succeeds.
const fn reload_message(task: Task) -> ReloadMessage {
    match task {
        Task::Style => ReloadMessage::Css,
        _ => ReloadMessage::Reload,
    }
}

// =============================================================================
// Public API
// =============================================================================

/// Watch the source directory and run tasks serially until the watcher
/// channel closes.
pub fn watch_blocking(config: &SiteConfig, hub: &ReloadHub) -> Result<()> {
    let classifier = Classifier::new(config)?;

    let (tx, rx) = mpsc::channel();
    let mut watcher = notify::recommended_watcher(tx).context("Failed to create file watcher")?;
    watcher
        .watch(&classifier.source, RecursiveMode::Recursive)
        .with_context(|| format!("Failed to watch {}", classifier.source.display()))?;

    log!("watch"; "{}", classifier.source.display());

    let mut queue = TaskQueue::default();
    for event in rx {
        match event {
            Ok(event) => queue.push_event(&event, &classifier),
            Err(e) => log!("watch"; "error: {e}"),
        }

        queue.drain(|task| run_task(task, config), |message| hub.broadcast(message));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use notify::event::{AccessKind, CreateKind, ModifyKind, RemoveKind};

    fn classifier() -> Classifier {
        let mut config = SiteConfig::default();
        config.root = PathBuf::from("/site");
        Classifier::new(&config).unwrap()
    }

    #[test]
    fn test_classify() {
        let c = classifier();

        assert_eq!(c.classify(Path::new("/site/src/sass/main.scss")), Some(Task::Style));
        assert_eq!(c.classify(Path::new("/site/src/sass/vendor/reset.css")), Some(Task::Style));
        assert_eq!(c.classify(Path::new("/site/src/posts/hello.md")), Some(Task::Content));
        assert_eq!(c.classify(Path::new("/site/src/templates/post.hbt")), Some(Task::Content));
        assert_eq!(c.classify(Path::new("/site/src/img/logo.png")), Some(Task::Content));
        assert_eq!(c.classify(Path::new("/site/src/notes.txt")), None);
    }

    #[test]
    fn test_temp_files_ignored() {
        let c = classifier();

        assert_eq!(c.classify(Path::new("/site/src/posts/.hello.md.swp")), None);
        assert_eq!(c.classify(Path::new("/site/src/posts/hello.md~")), None);
        assert_eq!(c.classify(Path::new("/site/src/posts/hello.md.tmp")), None);
    }

    #[test]
    fn test_queue_keeps_every_event_in_order() {
        let c = classifier();
        let mut queue = TaskQueue::default();

        let save = |path: &str| Event::new(EventKind::Modify(ModifyKind::Any)).add_path(path.into());
        queue.push_event(&save("/site/src/posts/a.md"), &c);
        queue.push_event(&save("/site/src/posts/a.md"), &c);
        queue.push_event(&save("/site/src/sass/main.scss"), &c);
        queue.push_event(
            &Event::new(EventKind::Create(CreateKind::File)).add_path("/site/src/b.md".into()),
            &c,
        );
        queue.push_event(
            &Event::new(EventKind::Remove(RemoveKind::File)).add_path("/site/src/c.html".into()),
            &c,
        );

        let order: Vec<_> = std::iter::from_fn(|| queue.pop()).collect();
        assert_eq!(
            order,
            vec![Task::Content, Task::Content, Task::Style, Task::Content, Task::Content]
        );
    }

    #[test]
    fn test_irrelevant_events_skipped() {
        let c = classifier();
        let mut queue = TaskQueue::default();

        queue.push_event(
            &Event::new(EventKind::Access(AccessKind::Any)).add_path("/site/src/a.md".into()),
            &c,
        );
        queue.push_event(
            &Event::new(EventKind::Modify(ModifyKind::Any)).add_path("/site/src/notes.txt".into()),
            &c,
        );

        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn test_failed_run_does_not_stop_queue() {
        let c = classifier();
        let mut queue = TaskQueue::default();
        let save = |path: &str| Event::new(EventKind::Modify(ModifyKind::Any)).add_path(path.into());
        queue.push_event(&save("/site/src/posts/a.md"), &c);
        queue.push_event(&save("/site/src/sass/main.scss"), &c);

        let mut ran = Vec::new();
        let mut sent = Vec::new();
        queue.drain(
            |task| {
                ran.push(task);
                match task {
                    Task::Content => Err(anyhow!("missing template")),
                    _ => Ok(()),
                }
            },
            |message| sent.push(message),
        );

        assert_eq!(ran, vec![Task::Content, Task::Style]);
        assert_eq!(sent, vec![ReloadMessage::Css]);
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn test_successful_content_run_reloads_page() {
        let c = classifier();
        let mut queue = TaskQueue::default();
        queue.push_event(
            &Event::new(EventKind::Create(CreateKind::File)).add_path("/site/src/b.md".into()),
            &c,
        );

        let mut sent = Vec::new();
        queue.drain(|_| Ok(()), |message| sent.push(message));

        assert_eq!(sent, vec![ReloadMessage::Reload]);
    }
}
