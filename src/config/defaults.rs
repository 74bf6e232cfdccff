//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization. Together
//! they describe the stock project layout: `src/` in, `build/` out.

// ============================================================================
// Common Defaults
// ============================================================================

pub fn r#true() -> bool {
    true
}

pub fn r#false() -> bool {
    false
}

// ============================================================================
// [build] Section Defaults
// ============================================================================

pub mod build {
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    use super::super::build::CollectionConfig;

    pub fn source() -> PathBuf {
        "src".into()
    }

    pub fn output() -> PathBuf {
        "build".into()
    }

    pub fn sass() -> PathBuf {
        "sass".into()
    }

    pub fn css() -> PathBuf {
        "css".into()
    }

    pub fn markdown() -> Vec<String> {
        vec!["md".into(), "markdown".into()]
    }

    pub fn front_matter() -> Vec<String> {
        vec!["html".into(), "md".into(), "hbt".into()]
    }

    pub fn permalink() -> Option<String> {
        Some(":collections/:title".into())
    }

    pub fn ignore() -> Vec<String> {
        vec!["sass/**/*".into(), "templates/**/*".into()]
    }

    pub fn collections() -> BTreeMap<String, CollectionConfig> {
        BTreeMap::from([(
            "posts".to_owned(),
            CollectionConfig {
                pattern: Some("posts/*.md".into()),
                sort_by: collection::sort_by(),
                reverse: true,
            },
        )])
    }

    pub mod collection {
        pub fn sort_by() -> String {
            "date".into()
        }
    }

    pub mod templates {
        use std::path::PathBuf;

        pub fn directory() -> PathBuf {
            "templates".into()
        }
    }

    pub mod style {
        use super::super::super::build::BrowserTargets;

        /// Browser floor in the spirit of autoprefixer's classic
        /// `last 2 versions` query, which still includes IE 10.
        pub fn targets() -> BrowserTargets {
            BrowserTargets {
                android: Some("4.4".into()),
                chrome: Some("49".into()),
                edge: Some("12".into()),
                firefox: Some("52".into()),
                ie: Some("10".into()),
                ios_saf: Some("9".into()),
                opera: Some("36".into()),
                safari: Some("9".into()),
                samsung: Some("4".into()),
            }
        }
    }
}

// ============================================================================
// [serve] Section Defaults
// ============================================================================

pub mod serve {
    pub fn interface() -> String {
        "127.0.0.1".into()
    }

    pub fn port() -> u16 {
        3000
    }

    /// Conventional LiveReload port.
    pub fn reload_port() -> u16 {
        35729
    }

    pub fn watch_style() -> Vec<String> {
        vec!["**/*.{scss,css}".into()]
    }

    pub fn watch_content() -> Vec<String> {
        vec!["**/*.{html,md,hbt,jpg,png,svg}".into()]
    }
}
