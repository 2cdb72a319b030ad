//! CLI output formatting.
//!
//! Output is **page-centric**: every entry is shown by its page path and
//! positional index, with its metadata and localized URLs as indented
//! context lines.
//!
//! # Output Format
//!
//! ## Check
//!
//! ```text
//! Entries
//! 001 /
//!     priority 1.0, changefreq weekly
//!     en: https://example.com/
//!     fr: https://example.com/fr/
//! 002 /about
//!     priority 0.5, changefreq daily, lastmod 2025-01-01
//!     en: https://example.com/about
//!     fr: https://example.com/fr/about
//!
//! Discovered 3 pages: 1 excluded, 0 duplicates, 0 not included
//! ```
//!
//! ## Build
//!
//! ```text
//! Discovered 3 pages: 1 excluded, 0 duplicates, 0 not included
//! Wrote 4 URLs (2 entries × 2 languages) → public/sitemap.xml
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::generate::{Collected, GenerateSummary};
use crate::locale::Locales;
use crate::types::SitemapEntry;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {plural}")
    }
}

fn metadata_line(entry: &SitemapEntry) -> String {
    let mut line = format!(
        "{}priority {}, changefreq {}",
        indent(1),
        entry.priority,
        entry.changefreq
    );
    if let Some(lastmod) = &entry.lastmod {
        line.push_str(&format!(", lastmod {lastmod}"));
    }
    line
}

// ============================================================================
// Check
// ============================================================================

/// One block per entry: index and path, metadata, then the full URL for
/// each language (or the single URL when no languages are configured).
pub fn format_entries(entries: &[SitemapEntry], base_url: &str, locales: &Locales) -> Vec<String> {
    let mut lines = vec!["Entries".to_string()];
    if entries.is_empty() {
        lines.push(format!("{}(none)", indent(1)));
        return lines;
    }

    for (i, entry) in entries.iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), entry.page_path));
        lines.push(metadata_line(entry));
        if locales.is_empty() {
            lines.push(format!("{}{base_url}{}", indent(1), entry.page_path));
        } else {
            for (lang, base) in locales.iter() {
                lines.push(format!("{}{lang}: {base}{}", indent(1), entry.page_path));
            }
        }
    }
    lines
}

/// Stage counts: how many pages were found and why any were dropped.
pub fn format_collected(collected: &Collected) -> Vec<String> {
    vec![format_counts(
        collected.discovered,
        collected.excluded,
        collected.duplicates,
        collected.not_included,
    )]
}

fn format_counts(
    discovered: usize,
    excluded: usize,
    duplicates: usize,
    not_included: usize,
) -> String {
    format!(
        "Discovered {}: {excluded} excluded, {}, {not_included} not included",
        plural(discovered, "page", "pages"),
        plural(duplicates, "duplicate", "duplicates"),
    )
}

pub fn print_check_output(collected: &Collected, base_url: &str, locales: &Locales) {
    for line in format_entries(&collected.entries, base_url, locales) {
        println!("{}", line);
    }
    println!();
    for line in format_collected(collected) {
        println!("{}", line);
    }
}

// ============================================================================
// Build
// ============================================================================

pub fn format_build_output(summary: &GenerateSummary) -> Vec<String> {
    let counts = format_counts(
        summary.discovered,
        summary.excluded,
        summary.duplicates,
        summary.not_included,
    );
    let urls = plural(summary.urls, "URL", "URLs");
    let written = if summary.languages == 0 {
        format!("Wrote {urls} → {}", summary.output.display())
    } else {
        format!(
            "Wrote {urls} ({} × {}) → {}",
            plural(summary.entries, "entry", "entries"),
            plural(summary.languages, "language", "languages"),
            summary.output.display()
        )
    };
    vec![counts, written]
}

pub fn print_build_output(summary: &GenerateSummary) {
    for line in format_build_output(summary) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChangeFreq;
    use crate::test_helpers::{config_with, entry};
    use std::path::PathBuf;

    fn collected(entries: Vec<SitemapEntry>) -> Collected {
        Collected {
            discovered: 3,
            duplicates: 0,
            excluded: 1,
            not_included: 0,
            entries,
        }
    }

    // =========================================================================
    // Helper tests
    // =========================================================================

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(1000), "1000");
    }

    #[test]
    fn plural_forms() {
        assert_eq!(plural(1, "page", "pages"), "1 page");
        assert_eq!(plural(0, "page", "pages"), "0 pages");
        assert_eq!(plural(2, "entry", "entries"), "2 entries");
    }

    #[test]
    fn metadata_line_with_lastmod() {
        let mut page = entry("/about");
        page.lastmod = Some("2025-01-01".into());
        assert_eq!(
            metadata_line(&page),
            "    priority 0.5, changefreq daily, lastmod 2025-01-01"
        );
    }

    // =========================================================================
    // Check output
    // =========================================================================

    #[test]
    fn entries_single_locale() {
        let mut home = entry("/");
        home.priority = "1.0".into();
        home.changefreq = ChangeFreq::Weekly;
        let config = config_with(|_| {});
        let lines = format_entries(
            &[home, entry("/about")],
            &config.base_url,
            &Locales::from_config(&config),
        );
        assert_eq!(
            lines,
            vec![
                "Entries",
                "001 /",
                "    priority 1.0, changefreq weekly",
                "    https://x.com/",
                "002 /about",
                "    priority 0.5, changefreq daily",
                "    https://x.com/about",
            ]
        );
    }

    #[test]
    fn entries_multi_locale() {
        let config = config_with(|file| {
            file.langs = vec!["en".into(), "fr".into()];
        });
        let lines = format_entries(
            &[entry("/about")],
            &config.base_url,
            &Locales::from_config(&config),
        );
        assert_eq!(
            lines,
            vec![
                "Entries",
                "001 /about",
                "    priority 0.5, changefreq daily",
                "    en: https://x.com/about",
                "    fr: https://x.com/fr/about",
            ]
        );
    }

    #[test]
    fn entries_empty() {
        let config = config_with(|_| {});
        let lines = format_entries(&[], &config.base_url, &Locales::from_config(&config));
        assert_eq!(lines, vec!["Entries", "    (none)"]);
    }

    #[test]
    fn collected_counts() {
        let lines = format_collected(&collected(vec![entry("/")]));
        assert_eq!(
            lines,
            vec!["Discovered 3 pages: 1 excluded, 0 duplicates, 0 not included"]
        );
    }

    // =========================================================================
    // Build output
    // =========================================================================

    fn summary(entries: usize, languages: usize) -> GenerateSummary {
        GenerateSummary {
            discovered: 1,
            duplicates: 1,
            excluded: 0,
            not_included: 0,
            entries,
            urls: entries * languages.max(1),
            languages,
            output: PathBuf::from("public/sitemap.xml"),
        }
    }

    #[test]
    fn build_output_single_locale() {
        let lines = format_build_output(&summary(1, 0));
        assert_eq!(
            lines,
            vec![
                "Discovered 1 page: 0 excluded, 1 duplicate, 0 not included",
                "Wrote 1 URL → public/sitemap.xml",
            ]
        );
    }

    #[test]
    fn build_output_multi_locale() {
        let lines = format_build_output(&summary(2, 2));
        assert_eq!(
            lines[1],
            "Wrote 4 URLs (2 entries × 2 languages) → public/sitemap.xml"
        );
    }
}
