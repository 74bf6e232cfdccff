//! Site building orchestration.
//!
//! # Architecture
//!
//! ```text
//! build_content()
//!     │
//!     ├── read_sources()    ──► Records with front matter split off
//!     ├── Pipeline::run()   ──► drafts → collections → markdown
//!     │                         → permalinks → templates → ignore
//!     └── write_records()   ──► build/**
//!
//! build_style()
//!     │
//!     └── compile_styles()  ──► src/sass/*.scss → build/css/*.css
//! ```
//!
//! Nothing is written for content until every stage has succeeded.

use crate::{
    compiler::{
        pipeline::{BuildContext, Pipeline},
        read_sources,
        style::compile_styles,
        write_records,
    },
    config::SiteConfig,
    log,
};
use anyhow::Result;
use std::path::Path;

/// Run the content pipeline and write its output. Returns the file count.
pub fn build_content(config: &SiteConfig) -> Result<usize> {
    let pipeline = Pipeline::new(config)?;
    let records = read_sources(config)?;
    log!("content"; "read {} files", records.len());

    let mut ctx = BuildContext::new(config);
    let records = pipeline.run(records, &mut ctx)?;

    let output = config.paths().output_dir();
    let count = write_records(&records, &output)?;
    log!("content"; "wrote {} files to {}", count, display_rel(&output, &config.root));

    Ok(count)
}

/// Compile stylesheets. Returns the number of stylesheets written.
pub fn build_style(config: &SiteConfig) -> Result<usize> {
    let written = compile_styles(config)?;

    if written.is_empty() {
        let sass_dir = config.paths().sass_dir();
        log!("style"; "no stylesheets in {}", display_rel(&sass_dir, &config.root));
    } else {
        log!("style"; "compiled {} stylesheets", written.len());
    }

    Ok(written.len())
}

fn display_rel(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}
