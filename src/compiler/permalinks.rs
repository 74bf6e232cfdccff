//! Pretty URLs: `posts/hello.html` → `posts/hello/index.html`.
//!
//! The pattern (`:collections/:title` by default) is expanded per record.
//! When any placeholder has no value the record keeps its directory and
//! gets `<dir>/<stem>/index.html` instead.

use super::pipeline::{BuildContext, Stage, insert_unique};
use super::record::{Record, Records};
use crate::config::join_dir;
use crate::utils::{date::parse_date, slug::slugify};
use anyhow::Result;
use regex::{Captures, Regex};
use serde_json::Value;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":([A-Za-z_][A-Za-z0-9_]*)").unwrap());

pub struct Permalinks {
    pattern: String,
}

impl Permalinks {
    pub fn new(pattern: &str) -> Self {
        Self {
            pattern: pattern.trim_matches('/').to_owned(),
        }
    }

    /// Expand the pattern for `record`, or `None` if a placeholder is unset.
    pub fn expand(&self, record: &Record) -> Option<String> {
        let mut missing = false;
        let expanded = PLACEHOLDER.replace_all(&self.pattern, |caps: &Captures<'_>| {
            match placeholder(record, &caps[1]) {
                Some(value) if !value.is_empty() => value,
                _ => {
                    missing = true;
                    String::new()
                }
            }
        });
        (!missing).then(|| expanded.trim_matches('/').to_owned())
    }

    fn link(&self, record: &Record) -> String {
        self.expand(record)
            .unwrap_or_else(|| join_dir(&[record.dir(), record.stem()]))
    }
}

fn placeholder(record: &Record, key: &str) -> Option<String> {
    match key {
        "collection" | "collections" => record.collections().first().map(|c| slugify(c)),
        "title" => Some(
            record
                .attr_str("title")
                .map(slugify)
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| slugify(record.stem())),
        ),
        "slug" => Some(slugify(record.stem())),
        _ => record.attr(key).and_then(attribute_segment),
    }
}

fn attribute_segment(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(match parse_date(s) {
            Some(date) => date.format("%Y/%m/%d").to_string(),
            None => slugify(s),
        }),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn disabled(record: &Record) -> bool {
    matches!(record.attr("permalink"), Some(Value::Bool(false)))
        || record.attr_str("permalink") == Some("false")
}

impl Stage for Permalinks {
    fn name(&self) -> &'static str {
        "permalinks"
    }

    fn transform(&self, records: Records, _: &mut BuildContext<'_>) -> Result<Records> {
        let mut out = Records::new();

        for (_, mut record) in records {
            if record.extension() == Some("html") {
                if record.stem() == "index" {
                    let url = record.dir().to_owned();
                    record.attributes.entry("path").or_insert(Value::String(url));
                } else if !disabled(&record) {
                    let url = self.link(&record);
                    record.path = join_dir(&[url.as_str(), "index.html"]);
                    record.attributes.insert("path".into(), Value::String(url));
                }
            }
            insert_unique(&mut out, record)?;
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::pipeline::{PipelineError, into_records};
    use crate::config::SiteConfig;
    use serde_json::json;

    fn run(pattern: &str, records: Vec<Record>) -> Result<Records> {
        let config = SiteConfig::default();
        let mut ctx = BuildContext::new(&config);
        Permalinks::new(pattern).transform(into_records(records)?, &mut ctx)
    }

    fn rendered(source: &str) -> Record {
        let mut record = Record::new(source, "<p>body</p>");
        record.path = source.replace(".md", ".html");
        record
    }

    #[test]
    fn test_collection_and_title() {
        let post = rendered("posts/hello.md")
            .with_attribute("title", "Hello World")
            .with_attribute("collection", json!(["posts"]));

        let records = run(":collections/:title", vec![post]).unwrap();
        let record = &records["posts/hello-world/index.html"];

        assert_eq!(record.source, "posts/hello.md");
        assert_eq!(record.attr_str("path"), Some("posts/hello-world"));
    }

    #[test]
    fn test_title_falls_back_to_stem() {
        let post = rendered("posts/hello.md").with_attribute("collection", "posts");

        let records = run(":collections/:title", vec![post]).unwrap();
        assert!(records.contains_key("posts/hello/index.html"));
    }

    #[test]
    fn test_missing_placeholder_falls_back() {
        let page = rendered("about/team.md").with_attribute("title", "Our Team");

        let records = run(":collections/:title", vec![page]).unwrap();
        let record = &records["about/team/index.html"];
        assert_eq!(record.attr_str("path"), Some("about/team"));
    }

    #[test]
    fn test_date_placeholder() {
        let post = rendered("posts/hello.md")
            .with_attribute("date", "2021-03-05")
            .with_attribute("collection", "posts");

        let records = run(":collection/:date/:slug", vec![post]).unwrap();
        assert!(records.contains_key("posts/2021/03/05/hello/index.html"));
    }

    #[test]
    fn test_skipped_records() {
        let records = run(
            ":collections/:title",
            vec![
                Record::new("index.html", "home"),
                Record::new("blog/index.html", "blog"),
                Record::new("raw.html", "").with_attribute("permalink", false),
                Record::new("img/logo.png", ""),
            ],
        )
        .unwrap();

        let paths: Vec<_> = records.keys().map(String::as_str).collect();
        assert_eq!(paths, vec!["blog/index.html", "img/logo.png", "index.html", "raw.html"]);
        assert_eq!(records["blog/index.html"].attr_str("path"), Some("blog"));
        assert_eq!(records["index.html"].attr_str("path"), Some(""));
    }

    #[test]
    fn test_duplicate_permalinks_fail() {
        let a = rendered("posts/a.md")
            .with_attribute("title", "Same Title")
            .with_attribute("collection", "posts");
        let b = rendered("posts/b.md")
            .with_attribute("title", "Same title!")
            .with_attribute("collection", "posts");

        let err = run(":collections/:title", vec![a, b]).unwrap_err();
        let err = err.downcast::<PipelineError>().unwrap();
        assert!(matches!(
            err,
            PipelineError::DuplicateOutput { ref path, .. } if path == "posts/same-title/index.html"
        ));
    }
}
