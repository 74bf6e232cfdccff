//! Glob matching over `/`-separated relative paths.

use crate::config::ConfigError;
use wax::{Glob, Pattern};

/// A compiled list of globs; a path matches if any glob matches.
#[derive(Debug, Clone, Default)]
pub struct Globs {
    globs: Vec<Glob<'static>>,
}

impl Globs {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, ConfigError> {
        let globs = patterns
            .iter()
            .map(|p| compile(p.as_ref()))
            .collect::<Result<_, _>>()?;
        Ok(Self { globs })
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.globs.iter().any(|glob| glob.is_match(path))
    }
}

/// Compile a single pattern.
pub fn compile(pattern: &str) -> Result<Glob<'static>, ConfigError> {
    Glob::new(pattern)
        .map(Glob::into_owned)
        .map_err(|e| ConfigError::Glob(pattern.to_owned(), e.to_string()))
}
