//! # sitemap-gen
//!
//! Generates `sitemap.xml` for statically generated sites. Pages come from
//! the filesystem (every file under the pages directory is a route) or from a
//! framework's route manifest; the result is a standard sitemap with
//! optional per-language `<url>` blocks and `<xhtml:link>` alternates.
//!
//! # Architecture: Linear Pipeline
//!
//! ```text
//! 1. Discover   pages/ or routes.json  →  page paths      (discover, manifest)
//! 2. Filter     page paths             →  surviving paths (rules)
//! 3. Build      surviving paths        →  entries         (entries)
//! 4. Write      entries × languages    →  sitemap.xml     (writer, locale)
//! ```
//!
//! Stages 1–3 are pure functions over values and can be run without
//! writing anything (the `check` command). Stage 4 streams through a
//! [`writer::Sink`], so tests render into memory and the CLI writes to a
//! staging file that replaces `sitemap.xml` only once the document is
//! complete.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`discover`] | Walks the pages directory into page paths |
//! | [`manifest`] | Reads route manifests as an alternative page source |
//! | [`rules`] | Folder, file and glob rules for exclude/include/metadata |
//! | [`entries`] | Applies include, per-page metadata and trailing slashes |
//! | [`locale`] | Base URL per language (path prefix or subdomain) |
//! | [`writer`] | Sitemap XML serialization and output sinks |
//! | [`generate`] | Runs the pipeline for one config |
//! | [`config`] | `sitemap.toml` loading, merging and validation |
//! | [`types`] | `PagePath` and `SitemapEntry` |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## One Immutable Config
//!
//! The config is loaded, merged and validated once into a
//! [`config::SitemapConfig`] that every stage borrows. Patterns are
//! classified into [`rules::Rule`] values at that point, so an invalid glob
//! fails the run before any page is read.
//!
//! ## Nothing Written Until Everything Is Known
//!
//! All pages are collected and filtered before the first byte of XML is
//! produced, and [`writer::FsSink`] renames a fully written staging file
//! over the target. A failed run leaves the previous sitemap in place.

pub mod config;
pub mod discover;
pub mod entries;
pub mod generate;
pub mod locale;
pub mod manifest;
pub mod output;
pub mod rules;
pub mod types;
pub mod writer;

#[cfg(test)]
pub(crate) mod test_helpers;
