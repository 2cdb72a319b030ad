//! Shared test utilities for the sitemap-gen test suite.
//!
//! Page-tree builders, config builders and XML inspection helpers used by
//! the per-module test suites.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! write_pages(tmp.path(), &["index.html", "blog/first-post.md"]);
//!
//! let config = config_with(|file| file.langs = vec!["en".into(), "fr".into()]);
//! let summary = xml_summary(&xml);
//! assert_eq!(summary.urls, 4);
//! ```

use crate::config::{ChangeFreq, ConfigFile, DEFAULT_PRIORITY, SitemapConfig};
use crate::types::{PagePath, SitemapEntry};
use quick_xml::Reader;
use quick_xml::events::Event;
use std::fs;
use std::path::Path;

// =========================================================================
// Page trees
// =========================================================================

/// Create an empty file for every relative path under `root`, creating
/// parent directories as needed.
pub fn write_pages(root: &Path, files: &[&str]) {
    for file in files {
        let path = root.join(file);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, "").unwrap();
    }
}

/// Page paths as plain strings, in order.
pub fn page_strings(paths: &[PagePath]) -> Vec<String> {
    paths.iter().map(|p| p.as_str().to_string()).collect()
}

// =========================================================================
// Config builders
// =========================================================================

/// A valid config for `https://x.com` reading `pages/` into `public/`,
/// adjusted by `edit` before validation. Panics if validation fails.
pub fn config_with(edit: impl FnOnce(&mut ConfigFile)) -> SitemapConfig {
    let mut file = ConfigFile {
        base_url: Some("https://x.com".into()),
        pages_directory: Some("pages".into()),
        target_directory: Some("public".into()),
        ..ConfigFile::default()
    };
    edit(&mut file);
    SitemapConfig::try_from(file).unwrap_or_else(|e| panic!("test config invalid: {e}"))
}

/// An entry with default metadata and no lastmod.
pub fn entry(path: &str) -> SitemapEntry {
    SitemapEntry {
        page_path: PagePath::new(path),
        priority: DEFAULT_PRIORITY.to_string(),
        changefreq: ChangeFreq::default(),
        lastmod: None,
    }
}

// =========================================================================
// XML inspection
// =========================================================================

/// Element counts from a parsed sitemap.
#[derive(Debug, Default, PartialEq)]
pub struct XmlSummary {
    pub urlsets: usize,
    pub urls: usize,
    pub alternate_links: usize,
}

/// Parse `xml` with quick-xml and count its elements.
///
/// Panics on malformed XML (unbalanced or mismatched tags included), so
/// calling it doubles as a well-formedness assertion.
pub fn xml_summary(xml: &str) -> XmlSummary {
    let mut reader = Reader::from_str(xml);
    let mut summary = XmlSummary::default();
    let mut depth = 0usize;
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                depth += 1;
                count_element(&mut summary, e.name().as_ref());
            }
            Ok(Event::Empty(e)) => count_element(&mut summary, e.name().as_ref()),
            Ok(Event::End(_)) => depth -= 1,
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => panic!(
                "malformed XML at position {}: {e}\n{xml}",
                reader.error_position()
            ),
        }
    }
    assert_eq!(depth, 0, "unclosed elements in:\n{xml}");
    assert_eq!(summary.urlsets, 1, "expected exactly one <urlset> in:\n{xml}");
    summary
}

fn count_element(summary: &mut XmlSummary, name: &[u8]) {
    match name {
        b"urlset" => summary.urlsets += 1,
        b"url" => summary.urls += 1,
        b"xhtml:link" => summary.alternate_links += 1,
        _ => {}
    }
}
