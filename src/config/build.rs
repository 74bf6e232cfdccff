//! `[build]` section configuration.
//!
//! Contains directory layout, content stage settings, collections,
//! templates and stylesheet browser targets.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

// ============================================================================
// Main BuildConfig
// ============================================================================

/// `[build]` section in sitesmith.toml - build pipeline configuration.
///
/// # Example
/// ```toml
/// [build]
/// source = "src"
/// output = "build"
/// permalink = ":collections/:title"
/// ignore = ["sass/**/*", "templates/**/*"]
///
/// [build.collections.posts]
/// pattern = "posts/*.md"
/// sort_by = "date"
/// reverse = true
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Source directory holding content, templates and stylesheets.
    #[serde(default = "defaults::build::source")]
    #[educe(Default = defaults::build::source())]
    pub source: PathBuf,

    /// Build output directory.
    #[serde(default = "defaults::build::output")]
    #[educe(Default = defaults::build::output())]
    pub output: PathBuf,

    /// Stylesheet sources, relative to `source`.
    #[serde(default = "defaults::build::sass")]
    #[educe(Default = defaults::build::sass())]
    pub sass: PathBuf,

    /// Compiled stylesheets, relative to `output`.
    #[serde(default = "defaults::build::css")]
    #[educe(Default = defaults::build::css())]
    pub css: PathBuf,

    /// Keep records flagged `draft: true` in the output.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub drafts: bool,

    /// Extensions rendered as markdown.
    #[serde(default = "defaults::build::markdown")]
    #[educe(Default = defaults::build::markdown())]
    pub markdown: Vec<String>,

    /// Extensions scanned for a front-matter block.
    #[serde(default = "defaults::build::front_matter")]
    #[educe(Default = defaults::build::front_matter())]
    pub front_matter: Vec<String>,

    /// Permalink pattern; `permalink = false` keeps source-derived paths.
    #[serde(
        default = "defaults::build::permalink",
        deserialize_with = "deserialize_permalink"
    )]
    #[educe(Default = defaults::build::permalink())]
    pub permalink: Option<String>,

    /// Globs (relative to `source`) dropped from the output set.
    #[serde(default = "defaults::build::ignore")]
    #[educe(Default = defaults::build::ignore())]
    pub ignore: Vec<String>,

    /// Named collections.
    #[serde(default = "defaults::build::collections")]
    #[educe(Default = defaults::build::collections())]
    pub collections: BTreeMap<String, CollectionConfig>,

    #[serde(default)]
    pub templates: TemplatesConfig,

    #[serde(default)]
    pub style: StyleConfig,
}

// ============================================================================
// Sub-sections
// ============================================================================

/// `[build.collections.<name>]`
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct CollectionConfig {
    /// Glob selecting members by source path.
    #[serde(default)]
    pub pattern: Option<String>,

    /// Attribute used as the sort key.
    #[serde(default = "defaults::build::collection::sort_by")]
    #[educe(Default = defaults::build::collection::sort_by())]
    pub sort_by: String,

    /// Sort descending.
    #[serde(default = "defaults::r#false")]
    pub reverse: bool,
}

/// `[build.templates]`
///
/// ```toml
/// [build.templates]
/// directory = "templates"
/// default = "page.hbt"
///
/// [build.templates.partials]
/// head = "partials/head.hbt"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct TemplatesConfig {
    /// Template directory, relative to `source`.
    #[serde(default = "defaults::build::templates::directory")]
    #[educe(Default = defaults::build::templates::directory())]
    pub directory: PathBuf,

    /// Template applied to `.html` records without a `template` attribute.
    pub default: Option<String>,

    /// Alias → template file (relative to `directory`).
    pub partials: BTreeMap<String, String>,
}

/// `[build.style]`
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct StyleConfig {
    /// Oldest browser versions that prefixes must cover.
    #[serde(default = "defaults::build::style::targets")]
    #[educe(Default = defaults::build::style::targets())]
    pub targets: BrowserTargets,
}

/// Minimum supported version per browser, as `"major[.minor[.patch]]"`.
///
/// A missing entry means the browser is not targeted at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BrowserTargets {
    pub android: Option<String>,
    pub chrome: Option<String>,
    pub edge: Option<String>,
    pub firefox: Option<String>,
    pub ie: Option<String>,
    pub ios_saf: Option<String>,
    pub opera: Option<String>,
    pub safari: Option<String>,
    pub samsung: Option<String>,
}

impl BrowserTargets {
    /// All configured `(browser, version)` pairs.
    pub fn entries(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("android", &self.android),
            ("chrome", &self.chrome),
            ("edge", &self.edge),
            ("firefox", &self.firefox),
            ("ie", &self.ie),
            ("ios_saf", &self.ios_saf),
            ("opera", &self.opera),
            ("safari", &self.safari),
            ("samsung", &self.samsung),
        ]
        .into_iter()
        .filter_map(|(name, version)| version.as_deref().map(|v| (name, v)))
    }
}

/// A pattern string, or a bool: `false` disables permalinks, `true` keeps
/// the default pattern.
fn deserialize_permalink<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Setting {
        Pattern(String),
        Enabled(bool),
    }

    Ok(match Setting::deserialize(deserializer)? {
        Setting::Pattern(pattern) => Some(pattern),
        Setting::Enabled(true) => defaults::build::permalink(),
        Setting::Enabled(false) => None,
    })
}

/// Encode `"major[.minor[.patch]]"` the way browser target tables expect:
/// `major << 16 | minor << 8 | patch`.
pub fn parse_browser_version(version: &str) -> Option<u32> {
    let mut parts = version.trim().split('.');
    let major: u32 = parts.next()?.parse().ok()?;
    let minor: u32 = parts.next().map_or(Some(0), |p| p.parse().ok())?;
    let patch: u32 = parts.next().map_or(Some(0), |p| p.parse().ok())?;
    if parts.next().is_some() || major > 0xffff || minor > 0xff || patch > 0xff {
        return None;
    }
    Some((major << 16) | (minor << 8) | patch)
}

#[cfg(test)]
mod tests {
    use super::super::SiteConfig;
    use super::*;

    #[test]
    fn test_build_defaults() {
        let config: SiteConfig = toml::from_str("").unwrap();
        let build = &config.build;

        assert_eq!(build.source, PathBuf::from("src"));
        assert_eq!(build.output, PathBuf::from("build"));
        assert_eq!(build.sass, PathBuf::from("sass"));
        assert_eq!(build.css, PathBuf::from("css"));
        assert!(!build.drafts);
        assert_eq!(build.permalink.as_deref(), Some(":collections/:title"));
        assert_eq!(build.ignore, vec!["sass/**/*", "templates/**/*"]);

        let posts = &build.collections["posts"];
        assert_eq!(posts.pattern.as_deref(), Some("posts/*.md"));
        assert_eq!(posts.sort_by, "date");
        assert!(posts.reverse);
    }

    #[test]
    fn test_collections_override_replaces_defaults() {
        let config: SiteConfig = toml::from_str(
            r#"
            [build.collections.notes]
            pattern = "notes/**/*.md"
            "#,
        )
        .unwrap();

        let collections = &config.build.collections;
        assert_eq!(collections.len(), 1);
        assert_eq!(collections["notes"].sort_by, "date");
        assert!(!collections["notes"].reverse);
    }

    #[test]
    fn test_templates_section() {
        let config: SiteConfig = toml::from_str(
            r#"
            [build.templates]
            default = "page.hbt"
            [build.templates.partials]
            head = "partials/head.hbt"
            "#,
        )
        .unwrap();

        let templates = &config.build.templates;
        assert_eq!(templates.directory, PathBuf::from("templates"));
        assert_eq!(templates.default.as_deref(), Some("page.hbt"));
        assert_eq!(templates.partials["head"], "partials/head.hbt");
    }

    #[test]
    fn test_style_targets_partial_override() {
        let config: SiteConfig = toml::from_str(
            r#"
            [build.style.targets]
            chrome = "100"
            "#,
        )
        .unwrap();

        let entries: Vec<_> = config.build.style.targets.entries().collect();
        assert_eq!(entries, vec![("chrome", "100")]);
    }

    #[test]
    fn test_permalink_setting() {
        let parse = |value: &str| {
            toml::from_str::<SiteConfig>(&format!("[build]\npermalink = {value}"))
                .unwrap()
                .build
                .permalink
        };

        assert_eq!(parse("false"), None);
        assert_eq!(parse("true").as_deref(), Some(":collections/:title"));
        assert_eq!(parse("\":title\"").as_deref(), Some(":title"));
        assert!(toml::from_str::<SiteConfig>("[build]\npermalink = 3").is_err());
    }

    #[test]
    fn test_unknown_field_rejection() {
        let result: Result<SiteConfig, _> = toml::from_str(
            r#"
            [build]
            typst = true
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_browser_version() {
        assert_eq!(parse_browser_version("10"), Some(10 << 16));
        assert_eq!(parse_browser_version("4.4"), Some((4 << 16) | (4 << 8)));
        assert_eq!(parse_browser_version("15.2.1"), Some((15 << 16) | (2 << 8) | 1));
        assert_eq!(parse_browser_version(""), None);
        assert_eq!(parse_browser_version("ten"), None);
        assert_eq!(parse_browser_version("1.2.3.4"), None);
    }
}
