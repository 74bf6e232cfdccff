//! Drop non-output source assets (stylesheets, templates) from the output set.

use super::pipeline::{BuildContext, Stage};
use super::record::Records;
use crate::utils::glob::Globs;
use anyhow::Result;

pub struct Ignore {
    globs: Globs,
}

impl Ignore {
    pub fn new(patterns: &[String]) -> Result<Self> {
        Ok(Self {
            globs: Globs::new(patterns)?,
        })
    }
}

impl Stage for Ignore {
    fn name(&self) -> &'static str {
        "ignore"
    }

    fn transform(&self, mut records: Records, _: &mut BuildContext<'_>) -> Result<Records> {
        // Match the output path and the source path, so a renamed template
        // (`templates/a.html` → `templates/a/index.html`) is still caught.
        records.retain(|path, record| {
            !self.globs.is_match(path) && !self.globs.is_match(&record.source)
        });
        Ok(records)
    }
}
