//! Site configuration management for `sitesmith.toml`.
//!
//! # Sections
//!
//! | Section     | Purpose                                            |
//! |-------------|----------------------------------------------------|
//! | `[site]`    | Free-form metadata exposed to every template       |
//! | `[build]`   | Paths, content stages, collections, style targets  |
//! | `[serve]`   | Development server, live reload, watch globs       |
//!
//! The file is optional: every field has a default, so a project following
//! the stock `src/` → `build/` layout needs no configuration at all. Once
//! loaded, the configuration is immutable and passed by reference.
//!
//! # Example
//!
//! ```toml
//! [site]
//! name = "My Blog"
//!
//! [build]
//! permalink = ":collections/:title"
//!
//! [build.collections.posts]
//! pattern = "posts/*.md"
//! reverse = true
//!
//! [serve]
//! port = 3000
//! ```

mod build;
pub mod defaults;
mod error;
mod paths;
mod serve;

pub use build::{BrowserTargets, BuildConfig, CollectionConfig, parse_browser_version};
pub use error::ConfigError;
pub use paths::{PathResolver, join_dir, to_slash};
pub use serve::ServeConfig;

use crate::cli::{Cli, Commands};
use crate::utils::glob::Globs;
use anyhow::{Result, bail};
use educe::Educe;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Config file name looked up in the project root.
pub const CONFIG_FILE: &str = "sitesmith.toml";

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing sitesmith.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Absolute project root (set after loading)
    #[serde(skip)]
    #[educe(Default = PathBuf::from("."))]
    pub root: PathBuf,

    /// Absolute path to the config file (set after loading, may not exist)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Global metadata merged into every template context
    #[serde(default)]
    pub site: Map<String, Value>,

    /// Build settings
    #[serde(default)]
    pub build: BuildConfig,

    /// Development server settings
    #[serde(default)]
    pub serve: ServeConfig,
}

impl SiteConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: SiteConfig = toml::from_str(content).map_err(ConfigError::from)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
    }

    /// Load the configuration for a CLI invocation.
    ///
    /// A missing config file is not an error; defaults apply.
    pub fn load(cli: &Cli) -> Result<Self> {
        let root = normalize_path(cli.root.as_deref().unwrap_or(Path::new(".")));
        let config_path = normalize_path(&root.join(&cli.config));

        let mut config = if config_path.is_file() {
            Self::from_path(&config_path)?
        } else {
            Self::default()
        };
        config.root = root;
        config.config_path = config_path;
        config.update_with_cli(cli);
        config.validate()?;

        Ok(config)
    }

    /// Directory resolver bound to this configuration.
    pub fn paths(&self) -> PathResolver<'_> {
        PathResolver::new(&self.root, &self.build)
    }

    /// Apply CLI overrides on top of file values.
    fn update_with_cli(&mut self, cli: &Cli) {
        if cli.drafts {
            self.build.drafts = true;
        }

        if let Commands::Serve {
            interface,
            port,
            watch,
        } = &cli.command
        {
            update_option(&mut self.serve.interface, interface.as_ref());
            update_option(&mut self.serve.port, port.as_ref());
            update_option(&mut self.serve.watch, watch.as_ref());
        }
    }

    /// Check values serde cannot check on its own.
    pub fn validate(&self) -> Result<()> {
        Globs::new(&self.build.ignore)?;
        Globs::new(&self.serve.watch_style)?;
        Globs::new(&self.serve.watch_content)?;

        for (name, collection) in &self.build.collections {
            if let Some(pattern) = &collection.pattern {
                Globs::new(std::slice::from_ref(pattern))?;
            }
            if collection.sort_by.is_empty() {
                bail!(ConfigError::Validation(format!(
                    "[build.collections.{name}.sort_by] must not be empty"
                )));
            }
        }

        if self.build.permalink.as_deref().is_some_and(|p| p.trim_matches('/').is_empty()) {
            bail!(ConfigError::Validation(
                "[build.permalink] must not be empty".into()
            ));
        }

        for (browser, version) in self.build.style.targets.entries() {
            if parse_browser_version(version).is_none() {
                bail!(ConfigError::Validation(format!(
                    "[build.style.targets.{browser}] invalid version `{version}`"
                )));
            }
        }

        if self.serve.port == self.serve.reload_port {
            bail!(ConfigError::Validation(
                "[serve.port] and [serve.reload_port] must differ".into()
            ));
        }

        Ok(())
    }
}

/// Update config option if CLI value is provided
fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
    if let Some(option) = cli_option {
        *config_option = option.clone();
    }
}

/// Normalize a path to absolute, using canonicalize if the path exists
fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(path))
                .unwrap_or_else(|_| path.to_path_buf())
        }
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::tempdir;

    #[test]
    fn test_site_metadata() {
        let config = SiteConfig::from_str(
            r#"
            [site]
            name = "Dan's Notes"
            tagline = "words"
            "#,
        )
        .unwrap();

        assert_eq!(config.site["name"], "Dan's Notes");
        assert_eq!(config.site["tagline"], "words");
    }

    #[test]
    fn test_unknown_section_rejected() {
        assert!(SiteConfig::from_str("[deploy]\nforce = true").is_err());
    }

    #[test]
    fn test_load_without_config_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let root = dir.path().to_str().unwrap();
        let cli = Cli::parse_from(["sitesmith", "--root", root, "build"]);

        let config = SiteConfig::load(&cli).unwrap();

        assert_eq!(config.build.source, PathBuf::from("src"));
        assert!(!config.config_path.exists());
        assert_eq!(
            config.paths().output_dir(),
            dir.path().canonicalize().unwrap().join("build")
        );
    }

    #[test]
    fn test_load_applies_serve_overrides() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            "[serve]\nport = 4000\nwatch = true\n",
        )
        .unwrap();
        let root = dir.path().to_str().unwrap();
        let cli = Cli::parse_from([
            "sitesmith", "--root", root, "--drafts", "serve", "--port", "5000", "--watch", "false",
        ]);

        let config = SiteConfig::load(&cli).unwrap();

        assert_eq!(config.serve.port, 5000);
        assert!(!config.serve.watch);
        assert!(config.build.drafts);
    }

    #[test]
    fn test_validate_rejects_bad_glob() {
        let config = SiteConfig::from_str(r#"build.ignore = ["sass/{a"]"#).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_browser_version() {
        let config = SiteConfig::from_str(
            r#"
            [build.style.targets]
            safari = "latest"
            "#,
        )
        .unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("safari"));
    }

    #[test]
    fn test_validate_rejects_port_clash() {
        let config = SiteConfig::from_str("[serve]\nport = 35729").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_defaults_ok() {
        assert!(SiteConfig::default().validate().is_ok());
    }
}
