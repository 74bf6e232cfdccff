//! Directory resolution for the build pipeline.
//!
//! Every directory the tasks touch is derived here from the project root
//! and the relative fragments in `[build]`:
//!
//! ```text
//! SiteConfig
//!     │
//!     └── paths() → PathResolver
//!                       │
//!                       ├── source_dir()     → /abs/root/src
//!                       ├── sass_dir()       → /abs/root/src/sass
//!                       ├── templates_dir()  → /abs/root/src/templates
//!                       ├── output_dir()     → /abs/root/build
//!                       └── css_dir()        → /abs/root/build/css
//! ```

use super::build::BuildConfig;
use std::path::{Path, PathBuf};

/// Join directory fragments with `/`.
///
/// Used for glob strings and record paths, which are always `/`-separated
/// regardless of platform. Empty fragments are skipped.
pub fn join_dir<S: AsRef<str>>(parts: &[S]) -> String {
    parts
        .iter()
        .map(AsRef::as_ref)
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Render a relative path with `/` separators.
pub fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Resolves the configured directories against the project root.
#[derive(Debug, Clone, Copy)]
pub struct PathResolver<'a> {
    root: &'a Path,
    build: &'a BuildConfig,
}

impl<'a> PathResolver<'a> {
    #[inline]
    pub const fn new(root: &'a Path, build: &'a BuildConfig) -> Self {
        Self { root, build }
    }

    pub fn source_dir(&self) -> PathBuf {
        self.root.join(&self.build.source)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root.join(&self.build.output)
    }

    pub fn sass_dir(&self) -> PathBuf {
        self.source_dir().join(&self.build.sass)
    }

    pub fn css_dir(&self) -> PathBuf {
        self.output_dir().join(&self.build.css)
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.source_dir().join(&self.build.templates.directory)
    }

    /// Source-relative, `/`-separated path of `path`, if it lies under the
    /// source directory.
    pub fn source_relative(&self, path: &Path) -> Option<String> {
        let source = self.source_dir();
        path.strip_prefix(&source)
            .ok()
            .map(to_slash)
            .filter(|rel| !rel.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_dir() {
        assert_eq!(join_dir(&["./src", "sass/*.scss"]), "./src/sass/*.scss");
        assert_eq!(join_dir(&["build", "css"]), "build/css");
        assert_eq!(join_dir(&["", "css"]), "css");
        assert_eq!(join_dir::<&str>(&[]), "");
    }

    #[test]
    fn test_resolver_defaults() {
        let build = BuildConfig::default();
        let paths = PathResolver::new(Path::new("/site"), &build);

        assert_eq!(paths.source_dir(), PathBuf::from("/site/src"));
        assert_eq!(paths.output_dir(), PathBuf::from("/site/build"));
        assert_eq!(paths.sass_dir(), PathBuf::from("/site/src/sass"));
        assert_eq!(paths.css_dir(), PathBuf::from("/site/build/css"));
        assert_eq!(paths.templates_dir(), PathBuf::from("/site/src/templates"));
    }

    #[test]
    fn test_resolver_custom_dirs() {
        let build = BuildConfig {
            source: "content".into(),
            output: "public".into(),
            css: "assets/css".into(),
            ..Default::default()
        };
        let paths = PathResolver::new(Path::new("/site"), &build);

        assert_eq!(paths.sass_dir(), PathBuf::from("/site/content/sass"));
        assert_eq!(paths.css_dir(), PathBuf::from("/site/public/assets/css"));
    }

    #[test]
    fn test_source_relative() {
        let build = BuildConfig::default();
        let paths = PathResolver::new(Path::new("/site"), &build);

        assert_eq!(
            paths.source_relative(Path::new("/site/src/posts/hello.md")),
            Some("posts/hello.md".to_owned())
        );
        assert_eq!(paths.source_relative(Path::new("/site/src")), None);
        assert_eq!(paths.source_relative(Path::new("/elsewhere/a.md")), None);
    }
}
