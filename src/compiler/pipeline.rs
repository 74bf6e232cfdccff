//! Content stage chain.
//!
//! ```text
//! Records ──► drafts ──► collections ──► markdown ──► permalinks ──► templates ──► ignore ──► Records
//! ```
//!
//! Each stage owns the record set for the duration of its call and hands
//! back the (possibly filtered, possibly renamed) set. Order matters: later
//! stages read attributes and paths the earlier ones produce.

use super::record::{Record, Records};
use super::{collections, drafts, ignore, markdown, permalinks, templates};
use crate::config::SiteConfig;
use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

/// Content pipeline errors that are not plain I/O.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("`{first}` and `{second}` both write to `{path}`")]
    DuplicateOutput {
        path: String,
        first: String,
        second: String,
    },

    #[error("Failed to load templates from `{0}`")]
    TemplateLoad(String, #[source] tera::Error),

    #[error("Failed to render `{path}` with template `{template}`")]
    Render {
        path: String,
        template: String,
        #[source]
        source: tera::Error,
    },
}

/// State shared by all stages of one build.
pub struct BuildContext<'a> {
    pub config: &'a SiteConfig,
    /// Collection name → member source paths, in sort order.
    pub collections: BTreeMap<String, Vec<String>>,
}

impl<'a> BuildContext<'a> {
    pub fn new(config: &'a SiteConfig) -> Self {
        Self {
            config,
            collections: BTreeMap::new(),
        }
    }

    /// Site metadata as configured in `[site]`.
    pub fn metadata(&self) -> &Map<String, Value> {
        &self.config.site
    }
}

/// One step of the content pipeline.
pub trait Stage {
    fn name(&self) -> &'static str;

    fn transform(&self, records: Records, ctx: &mut BuildContext<'_>) -> Result<Records>;
}

/// Ordered list of stages.
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    /// The standard chain for `config`.
    pub fn new(config: &SiteConfig) -> Result<Self> {
        let build = &config.build;
        let mut stages: Vec<Box<dyn Stage>> = Vec::new();

        if !build.drafts {
            stages.push(Box::new(drafts::Drafts));
        }
        stages.push(Box::new(collections::Collections::new(&build.collections)?));
        stages.push(Box::new(markdown::Markdown::new(&build.markdown)));
        if let Some(pattern) = &build.permalink {
            stages.push(Box::new(permalinks::Permalinks::new(pattern)));
        }
        stages.push(Box::new(templates::Templates::new(config)));
        stages.push(Box::new(ignore::Ignore::new(&build.ignore)?));

        Ok(Self { stages })
    }

    #[cfg(test)]
    pub fn with_stages(stages: Vec<Box<dyn Stage>>) -> Self {
        Self { stages }
    }

    #[cfg(test)]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run every stage in order, stopping at the first failure.
    pub fn run(&self, mut records: Records, ctx: &mut BuildContext<'_>) -> Result<Records> {
        for stage in &self.stages {
            records = stage
                .transform(records, ctx)
                .with_context(|| format!("{} stage failed", stage.name()))?;
        }
        Ok(records)
    }
}

/// Insert `record` under its current path, refusing to overwrite another.
pub fn insert_unique(records: &mut Records, record: Record) -> Result<(), PipelineError> {
    if let Some(existing) = records.get(&record.path) {
        return Err(PipelineError::DuplicateOutput {
            path: record.path.clone(),
            first: existing.source.clone(),
            second: record.source.clone(),
        });
    }
    records.insert(record.path.clone(), record);
    Ok(())
}

/// Build a record set from a list, keyed by path.
pub fn into_records(list: impl IntoIterator<Item = Record>) -> Result<Records, PipelineError> {
    let mut records = Records::new();
    for record in list {
        insert_unique(&mut records, record)?;
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;

    struct Tag(&'static str);

    impl Stage for Tag {
        fn name(&self) -> &'static str {
            self.0
        }

        fn transform(&self, mut records: Records, _: &mut BuildContext<'_>) -> Result<Records> {
            for record in records.values_mut() {
                let mut seen = record.attr_str("seen").unwrap_or_default().to_owned();
                seen.push_str(self.0);
                record.attributes.insert("seen".into(), seen.into());
            }
            Ok(records)
        }
    }

    struct Fail;

    impl Stage for Fail {
        fn name(&self) -> &'static str {
            "fail"
        }

        fn transform(&self, _: Records, _: &mut BuildContext<'_>) -> Result<Records> {
            bail!("boom")
        }
    }

    #[test]
    fn test_stages_run_in_order() {
        let config = SiteConfig::default();
        let mut ctx = BuildContext::new(&config);
        let pipeline = Pipeline::with_stages(vec![Box::new(Tag("a")), Box::new(Tag("b"))]);

        let records = into_records([Record::new("x.html", "")]).unwrap();
        let records = pipeline.run(records, &mut ctx).unwrap();

        assert_eq!(records["x.html"].attr_str("seen"), Some("ab"));
    }

    #[test]
    fn test_failure_names_stage() {
        let config = SiteConfig::default();
        let mut ctx = BuildContext::new(&config);
        let pipeline = Pipeline::with_stages(vec![Box::new(Tag("a")), Box::new(Fail)]);

        let err = pipeline.run(Records::new(), &mut ctx).unwrap_err();
        assert_eq!(err.to_string(), "fail stage failed");
        assert_eq!(err.root_cause().to_string(), "boom");
    }

    #[test]
    fn test_standard_order() {
        let pipeline = Pipeline::new(&SiteConfig::default()).unwrap();
        assert_eq!(
            pipeline.stage_names(),
            vec!["drafts", "collections", "markdown", "permalinks", "templates", "ignore"]
        );
    }

    #[test]
    fn test_optional_stages_skipped() {
        let config = SiteConfig::from_str("[build]\ndrafts = true\npermalink = false").unwrap();

        let pipeline = Pipeline::new(&config).unwrap();
        assert_eq!(
            pipeline.stage_names(),
            vec!["collections", "markdown", "templates", "ignore"]
        );
    }

    #[test]
    fn test_insert_unique_rejects_collision() {
        let mut a = Record::new("posts/a.md", "");
        a.path = "posts/hello/index.html".into();
        let mut b = Record::new("posts/b.md", "");
        b.path = "posts/hello/index.html".into();

        let err = into_records([a, b]).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("posts/a.md"));
        assert!(message.contains("posts/b.md"));
        assert!(message.contains("posts/hello/index.html"));
    }
}
