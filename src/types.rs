//! Shared types passed between pipeline stages.
//!
//! A [`PagePath`] is produced by discovery, survives (or not) the rule
//! filters, and is wrapped into a [`SitemapEntry`] by the entry builder.
//! Both are immutable once built.

use crate::config::ChangeFreq;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use std::fmt;

/// Characters left as-is inside a URL path segment: unreserved ones plus
/// sub-delims, `:` and `@`. Everything else, non-ASCII included, is encoded.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'!')
    .remove(b'$')
    .remove(b'&')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'*')
    .remove(b'+')
    .remove(b',')
    .remove(b';')
    .remove(b'=')
    .remove(b':')
    .remove(b'@');

/// A normalized, web-facing route such as `/`, `/about` or `/blog/post`.
///
/// Always starts with `/`. Separators are forward slashes, repeated slashes
/// are collapsed and the trailing slash is dropped (except for the root).
/// The only way to get a trailing slash back is [`PagePath::with_trailing_slash`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PagePath(String);

impl PagePath {
    /// The site root, `/`.
    pub fn root() -> Self {
        PagePath("/".to_string())
    }

    /// Normalize a raw route or relative file path into a page path.
    ///
    /// - `"about"` → `/about`
    /// - `"/blog//post/"` → `/blog/post`
    /// - `"docs\\guide"` → `/docs/guide`
    /// - `""` → `/`
    pub fn new(raw: &str) -> Self {
        let segments: Vec<&str> = raw
            .trim()
            .split(['/', '\\'])
            .filter(|s| !s.is_empty())
            .collect();
        if segments.is_empty() {
            return Self::root();
        }
        PagePath(format!("/{}", segments.join("/")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Path segments, without empty pieces. The root has none.
    pub fn segments(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// Last segment, or `None` for the root.
    pub fn leaf(&self) -> Option<&str> {
        self.segments().next_back()
    }

    /// The path as it goes into a URL, each segment percent-encoded.
    ///
    /// `/über uns` → `/%C3%BCber%20uns`
    pub fn to_encoded(&self) -> String {
        self.0
            .split('/')
            .map(|segment| utf8_percent_encode(segment, SEGMENT).to_string())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Append exactly one trailing slash to a non-root path.
    ///
    /// Idempotent: calling it on a path that already ends in `/` returns
    /// an equal path.
    pub fn with_trailing_slash(&self) -> Self {
        if self.0.ends_with('/') {
            self.clone()
        } else {
            PagePath(format!("{}/", self.0))
        }
    }

    /// Drop a trailing slash from a non-root path.
    pub fn without_trailing_slash(&self) -> Self {
        if self.is_root() {
            return self.clone();
        }
        match self.0.strip_suffix('/') {
            Some(trimmed) => PagePath(trimmed.to_string()),
            None => self.clone(),
        }
    }
}

impl fmt::Display for PagePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PagePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One page as it appears in the sitemap body.
#[derive(Debug, Clone, PartialEq)]
pub struct SitemapEntry {
    pub page_path: PagePath,
    /// Decimal string between `0.0` and `1.0`
    pub priority: String,
    pub changefreq: ChangeFreq,
    /// `YYYY-MM-DD`, omitted from the XML when absent
    pub lastmod: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_adds_leading_slash() {
        assert_eq!(PagePath::new("about").as_str(), "/about");
    }

    #[test]
    fn new_collapses_and_trims_slashes() {
        assert_eq!(PagePath::new("/blog//post/").as_str(), "/blog/post");
    }

    #[test]
    fn new_converts_backslashes() {
        assert_eq!(PagePath::new("docs\\guide").as_str(), "/docs/guide");
    }

    #[test]
    fn empty_input_is_root() {
        assert!(PagePath::new("").is_root());
        assert!(PagePath::new("/").is_root());
        assert!(PagePath::new("  ").is_root());
    }

    #[test]
    fn leaf_of_nested_path() {
        assert_eq!(PagePath::new("/a/b/c").leaf(), Some("c"));
        assert_eq!(PagePath::root().leaf(), None);
    }

    #[test]
    fn encoded_escapes_non_ascii_and_spaces() {
        assert_eq!(PagePath::new("/über uns").to_encoded(), "/%C3%BCber%20uns");
        assert_eq!(PagePath::new("/a#b?c").to_encoded(), "/a%23b%3Fc");
        assert_eq!(PagePath::new("/100%").to_encoded(), "/100%25");
    }

    #[test]
    fn encoded_keeps_plain_paths() {
        assert_eq!(PagePath::root().to_encoded(), "/");
        assert_eq!(PagePath::new("/blog/first-post_v1.2").to_encoded(), "/blog/first-post_v1.2");
        assert_eq!(PagePath::new("/docs").with_trailing_slash().to_encoded(), "/docs/");
    }

    #[test]
    fn trailing_slash_is_idempotent() {
        let once = PagePath::new("/about").with_trailing_slash();
        let twice = once.with_trailing_slash();
        assert_eq!(once.as_str(), "/about/");
        assert_eq!(once, twice);
    }

    #[test]
    fn trailing_slash_leaves_root_alone() {
        assert_eq!(PagePath::root().with_trailing_slash().as_str(), "/");
        assert_eq!(PagePath::root().without_trailing_slash().as_str(), "/");
    }

    #[test]
    fn without_trailing_slash_undoes_with() {
        let p = PagePath::new("/docs").with_trailing_slash();
        assert_eq!(p.without_trailing_slash().as_str(), "/docs");
    }
}
