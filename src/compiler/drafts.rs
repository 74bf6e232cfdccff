//! Drop records marked `draft: true`.

use super::pipeline::{BuildContext, Stage};
use super::record::Records;
use anyhow::Result;

pub struct Drafts;

impl Stage for Drafts {
    fn name(&self) -> &'static str {
        "drafts"
    }

    fn transform(&self, mut records: Records, _: &mut BuildContext<'_>) -> Result<Records> {
        records.retain(|_, record| !record.flag("draft"));
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::pipeline::into_records;
    use crate::compiler::record::Record;
    use crate::config::SiteConfig;

    #[test]
    fn test_drafts_removed() {
        let config = SiteConfig::default();
        let mut ctx = BuildContext::new(&config);
        let records = into_records([
            Record::new("posts/done.md", "").with_attribute("draft", false),
            Record::new("posts/wip.md", "").with_attribute("draft", true),
            Record::new("posts/also-wip.md", "").with_attribute("draft", "yes"),
            Record::new("about.md", ""),
        ])
        .unwrap();

        let records = Drafts.transform(records, &mut ctx).unwrap();

        let paths: Vec<_> = records.keys().map(String::as_str).collect();
        assert_eq!(paths, vec!["about.md", "posts/done.md"]);
    }
}
