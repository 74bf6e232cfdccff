//! Content and style compilation.
//!
//! - **record**: In-memory source files keyed by output path
//! - **front_matter**: YAML header extraction
//! - **pipeline**: The ordered [`Stage`](pipeline::Stage) chain
//! - **drafts / collections / markdown / permalinks / templates / ignore**: Stages
//! - **style**: Sass compilation and vendor prefixing
//!
//! # Content Flow
//!
//! ```text
//! read_sources() ──► Pipeline::run() ──► write_records()
//!       │                  │                   │
//!       ▼                  ▼                   ▼
//!   Records[]       transformed Records    build/**
//! ```

pub mod collections;
pub mod drafts;
pub mod front_matter;
pub mod ignore;
pub mod markdown;
pub mod permalinks;
pub mod pipeline;
pub mod record;
pub mod style;
pub mod templates;

use crate::config::SiteConfig;
use anyhow::{Context, Result, bail};
use rayon::prelude::*;
use record::{Record, Records};
use std::{
    fs,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

// ============================================================================
// Shared utilities
// ============================================================================

/// Files to ignore during directory traversal
const IGNORED_FILES: &[&str] = &[".DS_Store"];

/// Collect all files from a directory recursively.
pub fn collect_all_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            let name = e.file_name().to_str().unwrap_or_default();
            !IGNORED_FILES.contains(&name)
        })
        .map(walkdir::DirEntry::into_path)
        .collect()
}

// ============================================================================
// Reading
// ============================================================================

/// Read every file under the source directory into a record set.
///
/// Files whose extension is listed in `build.front_matter` have their YAML
/// header moved into attributes; everything else is carried as raw bytes.
pub fn read_sources(config: &SiteConfig) -> Result<Records> {
    let paths = config.paths();
    let source_dir = paths.source_dir();
    if !source_dir.is_dir() {
        bail!("Source directory `{}` not found", source_dir.display());
    }

    let header_exts = &config.build.front_matter;
    let records: Vec<Record> = collect_all_files(&source_dir)
        .par_iter()
        .filter_map(|path| paths.source_relative(path).map(|rel| (path, rel)))
        .map(|(path, rel)| {
            let contents =
                fs::read(path).with_context(|| format!("Failed to read `{}`", path.display()))?;
            let record = Record::new(rel, contents);
            let eligible = record
                .extension()
                .is_some_and(|ext| header_exts.iter().any(|e| e.eq_ignore_ascii_case(ext)));

            Ok(if eligible { front_matter::extract(record) } else { record })
        })
        .collect::<Result<_>>()?;

    Ok(pipeline::into_records(records)?)
}

// ============================================================================
// Writing
// ============================================================================

/// Write each record to `output/<path>`, returning the number written.
pub fn write_records(records: &Records, output: &Path) -> Result<usize> {
    fs::create_dir_all(output)
        .with_context(|| format!("Failed to create output directory `{}`", output.display()))?;

    records.par_iter().try_for_each(|(path, record)| {
        let dest = output.join(path);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create `{}`", parent.display()))?;
        }
        fs::write(&dest, &record.contents)
            .with_context(|| format!("Failed to write `{}`", dest.display()))
    })?;

    Ok(records.len())
}
