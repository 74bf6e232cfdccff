//! Stylesheets: Sass → expanded CSS → vendor prefixes.
//!
//! ```text
//! src/sass/main.scss ──► grass ──► lightningcss (targets) ──► build/css/main.css
//! ```
//!
//! Files whose name starts with `_` are Sass partials: they are only reached
//! through `@use`/`@import` and never compiled on their own.

use super::collect_all_files;
use crate::config::{BrowserTargets, SiteConfig, parse_browser_version};
use anyhow::{Context, Result};
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use rayon::prelude::*;
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

const STYLE_EXTENSIONS: &[&str] = &["scss", "css"];

#[derive(Debug, Error)]
pub enum StyleError {
    #[error("Failed to compile `{path}`: {message}")]
    Sass { path: String, message: String },

    #[error("Failed to prefix `{path}`: {message}")]
    Prefix { path: String, message: String },

    #[error("`{first}` and `{second}` both compile to `{output}`")]
    DuplicateOutput {
        output: String,
        first: String,
        second: String,
    },
}

/// Compile every stylesheet entry point, returning the written paths.
pub fn compile_styles(config: &SiteConfig) -> Result<Vec<PathBuf>> {
    let paths = config.paths();
    let sass_dir = paths.sass_dir();
    let css_dir = paths.css_dir();
    let targets = Targets::from(browsers(&config.build.style.targets));

    let jobs = output_paths(entry_points(&sass_dir), &sass_dir, &css_dir)?;
    if jobs.is_empty() {
        return Ok(Vec::new());
    }

    jobs.par_iter()
        .map(|(output, input)| {
            let rel = input.strip_prefix(&sass_dir).unwrap_or(input);
            let css = compile_sass(input, &sass_dir)?;
            let css = prefix_css(&css, &rel.to_string_lossy(), targets)?;

            if let Some(parent) = output.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create `{}`", parent.display()))?;
            }
            fs::write(output, css)
                .with_context(|| format!("Failed to write `{}`", output.display()))?;
            Ok(output.clone())
        })
        .collect()
}

/// Map each output stylesheet to its input, rejecting inputs that would
/// overwrite each other (`main.scss` next to `main.css`).
fn output_paths(
    inputs: Vec<PathBuf>,
    sass_dir: &Path,
    css_dir: &Path,
) -> Result<BTreeMap<PathBuf, PathBuf>, StyleError> {
    let mut jobs: BTreeMap<PathBuf, PathBuf> = BTreeMap::new();
    for input in inputs {
        let rel = input.strip_prefix(sass_dir).unwrap_or(&input);
        let output = css_dir.join(rel).with_extension("css");
        if let Some(first) = jobs.get(&output) {
            return Err(StyleError::DuplicateOutput {
                output: output.display().to_string(),
                first: first.display().to_string(),
                second: input.display().to_string(),
            });
        }
        jobs.insert(output, input);
    }
    Ok(jobs)
}

/// Non-partial `.scss`/`.css` files under `dir`; empty if `dir` is missing.
pub fn entry_points(dir: &Path) -> Vec<PathBuf> {
    if !dir.is_dir() {
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = collect_all_files(dir)
        .into_iter()
        .filter(|path| {
            let is_style = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| STYLE_EXTENSIONS.contains(&ext));
            let is_partial = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with('_'));
            is_style && !is_partial
        })
        .collect();
    files.sort();
    files
}

/// Compile one Sass (or plain CSS) file in expanded style.
pub fn compile_sass(input: &Path, load_path: &Path) -> Result<String, StyleError> {
    let options = grass::Options::default()
        .style(grass::OutputStyle::Expanded)
        .load_path(load_path);
    grass::from_path(input, &options).map_err(|e| StyleError::Sass {
        path: input.display().to_string(),
        message: e.to_string(),
    })
}

/// Add the vendor prefixes `targets` need; output stays readable.
pub fn prefix_css(css: &str, filename: &str, targets: Targets) -> Result<String, StyleError> {
    let fail = |message: String| StyleError::Prefix {
        path: filename.to_owned(),
        message,
    };

    let mut sheet = StyleSheet::parse(
        css,
        ParserOptions {
            filename: filename.to_owned(),
            ..ParserOptions::default()
        },
    )
    .map_err(|e| fail(e.to_string()))?;

    sheet
        .minify(MinifyOptions {
            targets,
            ..MinifyOptions::default()
        })
        .map_err(|e| fail(e.to_string()))?;

    let printed = sheet
        .to_css(PrinterOptions {
            minify: false,
            targets,
            ..PrinterOptions::default()
        })
        .map_err(|e| fail(e.to_string()))?;
    Ok(printed.code)
}

/// Minimum browser versions in lightningcss' encoding.
pub fn browsers(targets: &BrowserTargets) -> Browsers {
    let version = |v: &Option<String>| v.as_deref().and_then(parse_browser_version);
    Browsers {
        android: version(&targets.android),
        chrome: version(&targets.chrome),
        edge: version(&targets.edge),
        firefox: version(&targets.firefox),
        ie: version(&targets.ie),
        ios_saf: version(&targets.ios_saf),
        opera: version(&targets.opera),
        safari: version(&targets.safari),
        samsung: version(&targets.samsung),
    }
}
