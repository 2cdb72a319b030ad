//! Sitemap generation pipeline.
//!
//! Runs every stage for one validated [`SitemapConfig`]:
//!
//! ```text
//! pages/ or routes.json
//!   → discover / read manifest    candidate page paths
//!   → dedupe                      first occurrence wins
//!   → apply exclusions            folder, file and glob rules
//!   → build entries               include allowlist, metadata, trailing slash
//!   → write                       header, <url> blocks per language, footer
//! ```
//!
//! Nothing is written until every page has been collected, so a discovery
//! failure never touches the existing sitemap. [`collect_entries`] stops
//! before the write step and backs the `check` command.

use crate::config::{self, ConfigError, Overrides, PageSource, SitemapConfig};
use crate::discover::{self, DiscoveryError};
use crate::entries;
use crate::manifest::{self, RouteManifestReader};
use crate::rules;
use crate::types::{PagePath, SitemapEntry};
use crate::writer::{self, Sink, WriteError};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum SitemapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
    #[error(transparent)]
    Write(#[from] WriteError),
}

/// Entries ready to be written, plus how many paths each stage dropped.
#[derive(Debug, Clone)]
pub struct Collected {
    pub discovered: usize,
    pub duplicates: usize,
    pub excluded: usize,
    pub not_included: usize,
    pub entries: Vec<SitemapEntry>,
}

/// Result of a full run.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateSummary {
    pub discovered: usize,
    pub duplicates: usize,
    pub excluded: usize,
    pub not_included: usize,
    pub entries: usize,
    /// `<url>` blocks written: entries × languages, or entries alone.
    pub urls: usize,
    pub languages: usize,
    pub output: PathBuf,
}

/// Today's date as `YYYY-MM-DD`, the value stamped into `<lastmod>`.
pub fn today() -> String {
    chrono::Local::now().date_naive().format("%Y-%m-%d").to_string()
}

/// Candidate pages from the configured source, in discovery order.
pub fn collect_pages(
    config: &SitemapConfig,
    reader: &dyn RouteManifestReader,
) -> Result<Vec<PagePath>, DiscoveryError> {
    match &config.source {
        PageSource::Directory(dir) => discover::discover(dir, &config.discover),
        PageSource::Manifest(location) => manifest::read_pages(reader, location),
    }
}

/// Run discovery, filtering and entry building. Writes nothing.
///
/// `lastmod` is the default date for pages without their own; pass `None`
/// to leave them undated.
pub fn collect_entries(
    config: &SitemapConfig,
    reader: &dyn RouteManifestReader,
    lastmod: Option<&str>,
) -> Result<Collected, SitemapError> {
    let pages = collect_pages(config, reader)?;
    let discovered = pages.len();
    info!(count = discovered, "pages discovered");

    let pages = discover::dedupe(pages);
    let duplicates = discovered - pages.len();

    let before = pages.len();
    let pages = rules::apply_exclusions(pages, &config.exclude);
    let excluded = before - pages.len();
    info!(kept = pages.len(), excluded, "exclusions applied");

    let entries = entries::build(
        &pages,
        &config.include,
        &config.pages,
        config.trailing_slash,
        lastmod,
    );
    let not_included = pages.len() - entries.len();
    info!(entries = entries.len(), not_included, "entries built");

    Ok(Collected {
        discovered,
        duplicates,
        excluded,
        not_included,
        entries,
    })
}

/// Generate the sitemap for `config` into `sink`.
pub fn generate<S: Sink>(
    config: &SitemapConfig,
    reader: &dyn RouteManifestReader,
    sink: &mut S,
) -> Result<GenerateSummary, SitemapError> {
    let lastmod = config.lastmod.then(today);
    let collected = collect_entries(config, reader, lastmod.as_deref())?;

    let output = sink.resolve(&config.target_directory);
    let urls = writer::write_sitemap(config, &collected.entries, sink)?;
    info!(path = %output.display(), urls, "sitemap written");

    Ok(GenerateSummary {
        discovered: collected.discovered,
        duplicates: collected.duplicates,
        excluded: collected.excluded,
        not_included: collected.not_included,
        entries: collected.entries.len(),
        urls,
        languages: config.langs.len(),
        output,
    })
}

/// Load the config at `config_path`, then generate into `sink`.
///
/// A config that fails to load or validate aborts before any page is read.
pub fn run<S: Sink>(
    config_path: &Path,
    overrides: &Overrides,
    reader: &dyn RouteManifestReader,
    sink: &mut S,
) -> Result<GenerateSummary, SitemapError> {
    let config = config::load_config(config_path, overrides)?;
    generate(&config, reader, sink)
}
