//! URL slugification.

use deunicode::deunicode;

/// Convert text to a lowercase ASCII slug.
///
/// Transliterates non-ASCII (`"Café Noir"` → `"cafe-noir"`), collapses runs
/// of non-alphanumerics into single hyphens and trims hyphens at both ends.
pub fn slugify(text: &str) -> String {
    let ascii = deunicode(text);
    let mut slug = String::with_capacity(ascii.len());
    let mut pending_hyphen = false;

    for ch in ascii.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Hello"), "hello");
        assert_eq!(slugify("Hello, World!"), "hello-world");
    }

    #[test]
    fn test_slugify_collapses_and_trims() {
        assert_eq!(slugify("  --Rust   &  Sass--  "), "rust-sass");
        assert_eq!(slugify("a__b"), "a-b");
    }

    #[test]
    fn test_slugify_transliterates() {
        assert_eq!(slugify("Café Noir"), "cafe-noir");
        assert_eq!(slugify("Ünïcödé"), "unicode");
    }

    #[test]
    fn test_slugify_empty() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_slugify_keeps_digits() {
        assert_eq!(slugify("Top 10 of 2021"), "top-10-of-2021");
    }
}
