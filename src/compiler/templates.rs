//! Layout rendering with tera.
//!
//! Every file under the templates directory is registered under its
//! `/`-separated relative path (`post.hbt`, `partials/head.hbt`); entries of
//! `[build.templates.partials]` are registered again under their alias so
//! layouts can `{% include "head" %}`.
//!
//! # Context
//!
//! | Key             | Value                                               |
//! |-----------------|-----------------------------------------------------|
//! | `site`, `*`     | `[site]` metadata (also flattened at the top level) |
//! | `*`             | the record's own attributes                         |
//! | `contents`      | rendered body                                       |
//! | `path`          | permalink URL, or the output path                   |
//! | `collections`   | collection name → member list, in sort order        |
//! | `previous/next` | neighbouring collection member, if any              |
//!
//! Autoescaping is off: `contents` is already HTML.

use super::pipeline::{BuildContext, PipelineError, Stage};
use super::record::{Record, Records};
use crate::config::{SiteConfig, to_slash};
use crate::utils::date::{iso_date, post_date};
use anyhow::{Context as _, Result};
use rustc_hash::FxHashMap;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use tera::Tera;
use walkdir::WalkDir;

pub struct Templates {
    dir: PathBuf,
    default: Option<String>,
    partials: BTreeMap<String, String>,
}

impl Templates {
    pub fn new(config: &SiteConfig) -> Self {
        let templates = &config.build.templates;
        Self {
            dir: config.paths().templates_dir(),
            default: templates.default.clone(),
            partials: templates.partials.clone(),
        }
    }

    /// Name of the layout `record` should be rendered with, if any.
    fn template_for(&self, record: &Record) -> Option<String> {
        match record.attr("template") {
            Some(Value::String(name)) if !name.is_empty() => Some(name.clone()),
            Some(Value::Bool(false)) => None,
            _ if record.extension() == Some("html") => self.default.clone(),
            _ => None,
        }
    }

    /// Load every template plus the partial aliases.
    pub fn load(&self) -> Result<Tera> {
        let mut files: Vec<(PathBuf, Option<String>)> = Vec::new();

        if self.dir.is_dir() {
            for entry in WalkDir::new(&self.dir).sort_by_file_name() {
                let entry = entry
                    .with_context(|| format!("Failed to read `{}`", self.dir.display()))?;
                if !entry.file_type().is_file() || entry.file_name() == ".DS_Store" {
                    continue;
                }
                let name = entry
                    .path()
                    .strip_prefix(&self.dir)
                    .map(to_slash)
                    .with_context(|| {
                        format!("`{}` is outside the templates directory", entry.path().display())
                    })?;
                files.push((entry.path().to_path_buf(), Some(name)));
            }
        }

        for (alias, path) in &self.partials {
            files.push((self.dir.join(path), Some(alias.clone())));
        }

        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        register_helpers(&mut tera);
        tera.add_template_files(files)
            .map_err(|e| PipelineError::TemplateLoad(self.dir.display().to_string(), e))?;
        Ok(tera)
    }
}

impl Stage for Templates {
    fn name(&self) -> &'static str {
        "templates"
    }

    fn transform(&self, mut records: Records, ctx: &mut BuildContext<'_>) -> Result<Records> {
        let jobs: Vec<(String, String)> = records
            .values()
            .filter_map(|r| self.template_for(r).map(|t| (r.path.clone(), t)))
            .collect();
        if jobs.is_empty() {
            return Ok(records);
        }

        let tera = self.load()?;

        // Snapshot before any record is replaced by its rendered page.
        let by_source: FxHashMap<&str, Value> = records
            .values()
            .map(|r| (r.source.as_str(), r.to_value()))
            .collect();
        let collections = collections_value(ctx, &by_source);

        let mut rendered = Vec::with_capacity(jobs.len());
        for (path, template) in jobs {
            let record = &records[&path];
            let context = page_context(ctx.metadata(), record, &collections, &by_source);
            let html = tera::Context::from_value(context)
                .and_then(|context| tera.render(&template, &context))
                .map_err(|source| PipelineError::Render {
                    path: path.clone(),
                    template,
                    source,
                })?;
            rendered.push((path, html));
        }

        for (path, html) in rendered {
            if let Some(record) = records.get_mut(&path) {
                record.contents = html.into_bytes();
            }
        }

        Ok(records)
    }
}

fn collections_value(ctx: &BuildContext<'_>, by_source: &FxHashMap<&str, Value>) -> Value {
    let collections = ctx
        .collections
        .iter()
        .map(|(name, sources)| {
            let members = sources
                .iter()
                .filter_map(|s| by_source.get(s.as_str()).cloned())
                .collect();
            (name.clone(), Value::Array(members))
        })
        .collect();
    Value::Object(collections)
}

fn page_context(
    site: &Map<String, Value>,
    record: &Record,
    collections: &Value,
    by_source: &FxHashMap<&str, Value>,
) -> Value {
    let mut context = site.clone();
    context.insert("site".into(), Value::Object(site.clone()));

    if let Value::Object(page) = record.to_value() {
        context.extend(page);
    }

    for key in ["previous", "next"] {
        let neighbour = record
            .attr_str(key)
            .and_then(|source| by_source.get(source))
            .cloned();
        match neighbour {
            Some(value) => context.insert(key.into(), value),
            None => context.remove(key),
        };
    }

    context.insert("collections".into(), collections.clone());
    Value::Object(context)
}

// ============================================================================
// Date helpers
// ============================================================================

fn register_helpers(tera: &mut Tera) {
    tera.register_filter("postDate", post_date_filter);
    tera.register_filter("isoDate", iso_date_filter);
    tera.register_function("postDate", post_date_function);
    tera.register_function("isoDate", iso_date_function);
}

static NULL: Value = Value::Null;

fn date_arg(args: &HashMap<String, Value>) -> &Value {
    args.get("date").unwrap_or(&NULL)
}

fn post_date_filter(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    Ok(Value::String(post_date(value)))
}

fn iso_date_filter(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    Ok(Value::String(iso_date(value)))
}

fn post_date_function(args: &HashMap<String, Value>) -> tera::Result<Value> {
    Ok(Value::String(post_date(date_arg(args))))
}

fn iso_date_function(args: &HashMap<String, Value>) -> tera::Result<Value> {
    Ok(Value::String(iso_date(date_arg(args))))
}
