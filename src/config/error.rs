//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config file parsing error")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid glob pattern `{0}`: {1}")]
    Glob(String, String),

    #[error("Task `{task}` depends on unknown task `{dependency}`")]
    UnknownTask { task: String, dependency: String },

    #[error("Task dependency cycle: {0}")]
    Cycle(String),

    #[error("Config validation error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_config_error_display() {
        let io_err = ConfigError::Io(
            PathBuf::from("sitesmith.toml"),
            Error::new(ErrorKind::NotFound, "file not found"),
        );
        let display = format!("{io_err}");
        assert!(display.contains("IO error"));
        assert!(display.contains("sitesmith.toml"));

        let cycle = ConfigError::Cycle("build -> serve -> build".into());
        assert!(format!("{cycle}").contains("build -> serve -> build"));

        let unknown = ConfigError::UnknownTask {
            task: "serve".into(),
            dependency: "deploy".into(),
        };
        let display = format!("{unknown}");
        assert!(display.contains("`serve`"));
        assert!(display.contains("`deploy`"));
    }
}
