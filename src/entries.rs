//! Sitemap entry building.
//!
//! Turns filtered page paths into [`SitemapEntry`] values: applies the
//! include allowlist, looks up per-page metadata and applies the
//! trailing-slash policy. Order is preserved.

use crate::config::{DEFAULT_PRIORITY, PagesConfig};
use crate::rules::RuleSet;
use crate::types::{PagePath, SitemapEntry};
use tracing::debug;

/// Build one entry per path that passes `include`.
///
/// - An empty `include` keeps every path; otherwise a path must match at
///   least one include rule.
/// - Metadata comes from `pages` (exact key, then longest pattern), falling
///   back to priority `0.5` and changefreq `daily`.
/// - `default_lastmod` is used for pages without their own `lastmod`;
///   `None` leaves those entries without one.
pub fn build(
    paths: &[PagePath],
    include: &RuleSet,
    pages: &PagesConfig,
    trailing_slash: bool,
    default_lastmod: Option<&str>,
) -> Vec<SitemapEntry> {
    paths
        .iter()
        .filter(|path| {
            let kept = include.is_empty() || include.matches(path);
            if !kept {
                debug!(path = %path, "not in include list");
            }
            kept
        })
        .map(|path| {
            let meta = pages.lookup(path);
            let page_path = if trailing_slash {
                path.with_trailing_slash()
            } else {
                path.without_trailing_slash()
            };
            SitemapEntry {
                page_path,
                priority: meta
                    .and_then(|m| m.priority.as_deref())
                    .map(str::trim)
                    .unwrap_or(DEFAULT_PRIORITY)
                    .to_string(),
                changefreq: meta.and_then(|m| m.changefreq).unwrap_or_default(),
                lastmod: meta
                    .and_then(|m| m.lastmod.as_deref())
                    .or(default_lastmod)
                    .map(str::to_string),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ChangeFreq, PageMetadata};
    use std::collections::BTreeMap;

    fn paths(items: &[&str]) -> Vec<PagePath> {
        items.iter().map(|p| PagePath::new(p)).collect()
    }

    fn entry_paths(entries: &[SitemapEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.page_path.as_str()).collect()
    }

    fn pages(items: &[(&str, PageMetadata)]) -> PagesConfig {
        let map: BTreeMap<String, PageMetadata> = items
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        PagesConfig::from_map(&map).unwrap()
    }

    fn include(patterns: &[&str]) -> RuleSet {
        RuleSet::classify(patterns).unwrap()
    }

    #[test]
    fn defaults_applied_without_metadata() {
        let entries = build(
            &paths(&["/", "/about"]),
            &RuleSet::default(),
            &PagesConfig::default(),
            false,
            None,
        );
        assert_eq!(entry_paths(&entries), vec!["/", "/about"]);
        for entry in &entries {
            assert_eq!(entry.priority, "0.5");
            assert_eq!(entry.changefreq, ChangeFreq::Daily);
            assert_eq!(entry.lastmod, None);
        }
    }

    #[test]
    fn order_preserved() {
        let input = paths(&["/z", "/a", "/m/n", "/"]);
        let entries = build(&input, &RuleSet::default(), &PagesConfig::default(), false, None);
        assert_eq!(entry_paths(&entries), vec!["/z", "/a", "/m/n", "/"]);
    }

    // =========================================================================
    // Include allowlist
    // =========================================================================

    #[test]
    fn include_restricts_to_matches() {
        let entries = build(
            &paths(&["/", "/blog", "/blog/post", "/about", "/docs/a"]),
            &include(&["/blog", "/docs/*"]),
            &PagesConfig::default(),
            false,
            None,
        );
        assert_eq!(entry_paths(&entries), vec!["/blog", "/blog/post", "/docs/a"]);
    }

    #[test]
    fn include_with_no_matches_yields_nothing() {
        let entries = build(
            &paths(&["/", "/about"]),
            &include(&["/missing"]),
            &PagesConfig::default(),
            false,
            None,
        );
        assert!(entries.is_empty());
    }

    // =========================================================================
    // Metadata lookup
    // =========================================================================

    #[test]
    fn exact_metadata_applied() {
        let config = pages(&[(
            "/",
            PageMetadata {
                priority: Some("1.0".into()),
                changefreq: Some(ChangeFreq::Weekly),
                lastmod: Some("2024-01-31".into()),
            },
        )]);
        let entries = build(
            &paths(&["/", "/about"]),
            &RuleSet::default(),
            &config,
            false,
            Some("2025-06-01"),
        );
        assert_eq!(entries[0].priority, "1.0");
        assert_eq!(entries[0].changefreq, ChangeFreq::Weekly);
        assert_eq!(entries[0].lastmod.as_deref(), Some("2024-01-31"));
        assert_eq!(entries[1].priority, "0.5");
        assert_eq!(entries[1].lastmod.as_deref(), Some("2025-06-01"));
    }

    #[test]
    fn partial_metadata_falls_back_per_field() {
        let config = pages(&[(
            "/blog/*",
            PageMetadata {
                changefreq: Some(ChangeFreq::Monthly),
                ..PageMetadata::default()
            },
        )]);
        let entries = build(
            &paths(&["/blog/post"]),
            &RuleSet::default(),
            &config,
            false,
            None,
        );
        assert_eq!(entries[0].priority, "0.5");
        assert_eq!(entries[0].changefreq, ChangeFreq::Monthly);
    }

    #[test]
    fn longest_prefix_metadata_wins() {
        let config = pages(&[
            (
                "/docs",
                PageMetadata {
                    priority: Some("0.3".into()),
                    ..PageMetadata::default()
                },
            ),
            (
                "/docs/api",
                PageMetadata {
                    priority: Some("0.9".into()),
                    ..PageMetadata::default()
                },
            ),
        ]);
        let entries = build(
            &paths(&["/docs/api/v2", "/docs/intro"]),
            &RuleSet::default(),
            &config,
            false,
            None,
        );
        assert_eq!(entries[0].priority, "0.9");
        assert_eq!(entries[1].priority, "0.3");
    }

    // =========================================================================
    // Trailing slash
    // =========================================================================

    #[test]
    fn trailing_slash_added_except_root() {
        let entries = build(
            &paths(&["/", "/about", "/blog/post"]),
            &RuleSet::default(),
            &PagesConfig::default(),
            true,
            None,
        );
        assert_eq!(entry_paths(&entries), vec!["/", "/about/", "/blog/post/"]);
    }

    #[test]
    fn trailing_slash_applied_once() {
        let input = vec![PagePath::new("/about").with_trailing_slash()];
        let entries = build(&input, &RuleSet::default(), &PagesConfig::default(), true, None);
        assert_eq!(entry_paths(&entries), vec!["/about/"]);
    }

    #[test]
    fn trailing_slash_removed_when_not_required() {
        let input = vec![PagePath::new("/about").with_trailing_slash()];
        let entries = build(&input, &RuleSet::default(), &PagesConfig::default(), false, None);
        assert_eq!(entry_paths(&entries), vec!["/about"]);
    }

    #[test]
    fn metadata_found_for_trailing_slash_pages() {
        let config = pages(&[(
            "/about",
            PageMetadata {
                priority: Some("0.8".into()),
                ..PageMetadata::default()
            },
        )]);
        let entries = build(&paths(&["/about"]), &RuleSet::default(), &config, true, None);
        assert_eq!(entries[0].page_path.as_str(), "/about/");
        assert_eq!(entries[0].priority, "0.8");
    }
}
