//! Markdown → HTML.
//!
//! Uses pulldown-cmark with GFM extensions (tables, strikethrough, task lists,
//! footnotes). Raw HTML passes through unchanged per CommonMark. Rendered
//! records are renamed from `.md` to `.html`.

use super::pipeline::{BuildContext, Stage, insert_unique};
use super::record::{Records, with_extension};
use anyhow::Result;
use pulldown_cmark::{Options, Parser, html::push_html};

/// Render a markdown document to an HTML fragment.
pub fn render_markdown(content: &str) -> String {
    let options = Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_FOOTNOTES;

    let mut html = String::with_capacity(content.len() * 3 / 2);
    push_html(&mut html, Parser::new_ext(content, options));
    html
}

pub struct Markdown {
    extensions: Vec<String>,
}

impl Markdown {
    pub fn new(extensions: &[String]) -> Self {
        Self {
            extensions: extensions.iter().map(|e| e.to_ascii_lowercase()).collect(),
        }
    }

    fn is_markdown(&self, ext: Option<&str>) -> bool {
        ext.is_some_and(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }
}

impl Stage for Markdown {
    fn name(&self) -> &'static str {
        "markdown"
    }

    fn transform(&self, records: Records, _: &mut BuildContext<'_>) -> Result<Records> {
        let mut out = Records::new();

        for (_, mut record) in records {
            if self.is_markdown(record.extension()) {
                let html = render_markdown(&record.text());
                record.contents = html.into_bytes();
                record.path = with_extension(&record.path, "html");
            }
            insert_unique(&mut out, record)?;
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::pipeline::into_records;
    use crate::compiler::record::Record;
    use crate::config::SiteConfig;

    fn stage() -> Markdown {
        Markdown::new(&["md".to_owned(), "markdown".to_owned()])
    }

    #[test]
    fn test_render_markdown() {
        let html = render_markdown("# Hello\n\nSome *emphasis* and ~~strike~~.\n");
        assert!(html.contains("<h1>Hello</h1>"));
        assert!(html.contains("<em>emphasis</em>"));
        assert!(html.contains("<del>strike</del>"));
    }

    #[test]
    fn test_render_tables() {
        let html = render_markdown("| a | b |\n|---|---|\n| 1 | 2 |\n");
        assert!(html.contains("<table>"));
        assert!(html.contains("<td>2</td>"));
    }

    #[test]
    fn test_raw_html_passes_through() {
        let html = render_markdown("<div class=\"note\">kept</div>\n");
        assert!(html.contains("<div class=\"note\">kept</div>"));
    }

    #[test]
    fn test_stage_renders_and_renames() {
        let config = SiteConfig::default();
        let mut ctx = BuildContext::new(&config);
        let records = into_records([
            Record::new("posts/hello.md", "**bold**").with_attribute("title", "Hello"),
            Record::new("about.MARKDOWN", "text"),
            Record::new("raw.html", "**not markdown**"),
        ])
        .unwrap();

        let records = stage().transform(records, &mut ctx).unwrap();

        let hello = &records["posts/hello.html"];
        assert_eq!(hello.text().trim(), "<p><strong>bold</strong></p>");
        assert_eq!(hello.source, "posts/hello.md");
        assert_eq!(hello.attr_str("title"), Some("Hello"));

        assert!(records.contains_key("about.html"));
        assert_eq!(records["raw.html"].text(), "**not markdown**");
    }

    #[test]
    fn test_rename_collision_fails() {
        let config = SiteConfig::default();
        let mut ctx = BuildContext::new(&config);
        let records =
            into_records([Record::new("page.md", "a"), Record::new("page.html", "b")]).unwrap();

        assert!(stage().transform(records, &mut ctx).is_err());
    }
}
