//! Run configuration.
//!
//! Handles loading, merging and validating `sitemap.toml`. Loading happens in
//! two steps:
//!
//! 1. A [`ConfigFile`] is assembled from three layers, later layers winning:
//!    stock defaults, the user's config file, then flags given on the
//!    command line ([`Overrides`]). Unknown keys are rejected to catch typos.
//! 2. The merged file is validated and frozen into a [`SitemapConfig`]. This
//!    is where mandatory fields are enforced, the base URL is parsed and the
//!    exclude/include patterns are classified into rules. Nothing downstream
//!    mutates it.
//!
//! ## Configuration Options
//!
//! ```toml
//! base_url = "https://example.com"   # required
//! pages_directory = "pages"          # required unless route_manifest is set
//! # route_manifest = "routes.json"   # takes precedence over pages_directory
//! target_directory = "public"        # required; sitemap.xml is written here
//!
//! exclude = ["/admin", "404.html", "/drafts/*"]
//! exclude_extensions = ["css", "js"]
//! exclude_index = true               # strip a trailing `index` segment
//! index_name = "index"
//! skip_reserved = true               # skip `_app`, `.hidden`, ...
//! include = []                       # non-empty = allowlist mode
//!
//! langs = ["en", "fr"]
//! default_lang = "en"                # defaults to the first of `langs`
//! subdomain = false                  # fr.example.com instead of example.com/fr
//! trailing_slash = false
//! lastmod = true                     # stamp entries with today's date
//!
//! [pages."/"]
//! priority = "1.0"
//! changefreq = "weekly"
//!
//! [pages."/blog/*"]
//! priority = "0.7"
//!
//! [[stylesheets]]
//! type = "text/xsl"
//! href = "/sitemap.xsl"
//! ```
//!
//! A `.json` config file with the same keys is accepted as well.

use crate::discover::DiscoverOptions;
use crate::rules::{Rule, RuleError, RuleSet};
use crate::types::PagePath;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Missing required config field: {0}")]
    Missing(&'static str),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Invalid rule: {0}")]
    Rule(#[from] RuleError),
}

/// Default priority for pages without metadata.
pub const DEFAULT_PRIORITY: &str = "0.5";

/// How often a page is expected to change, as understood by crawlers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFreq {
    Always,
    Hourly,
    #[default]
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Never,
}

impl ChangeFreq {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeFreq::Always => "always",
            ChangeFreq::Hourly => "hourly",
            ChangeFreq::Daily => "daily",
            ChangeFreq::Weekly => "weekly",
            ChangeFreq::Monthly => "monthly",
            ChangeFreq::Yearly => "yearly",
            ChangeFreq::Never => "never",
        }
    }
}

impl fmt::Display for ChangeFreq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-page overrides from the `[pages."<path>"]` tables.
///
/// Every field is optional; missing ones fall back to [`DEFAULT_PRIORITY`]
/// and [`ChangeFreq::Daily`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PageMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changefreq: Option<ChangeFreq>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lastmod: Option<String>,
}

/// An `<?xml-stylesheet?>` directive emitted in the sitemap header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Stylesheet {
    #[serde(rename = "type")]
    pub kind: String,
    pub href: String,
}

/// Sitemap configuration as written in `sitemap.toml`.
///
/// All fields have defaults so partial files deserialize; the mandatory ones
/// are `Option` here and enforced by [`SitemapConfig::try_from`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages_directory: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_manifest: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_directory: Option<PathBuf>,
    pub exclude: Vec<String>,
    pub exclude_extensions: Vec<String>,
    pub exclude_index: bool,
    pub index_name: String,
    pub skip_reserved: bool,
    pub include: Vec<String>,
    pub subdomain: bool,
    pub trailing_slash: bool,
    pub langs: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_lang: Option<String>,
    pub lastmod: bool,
    pub pages: BTreeMap<String, PageMetadata>,
    pub stylesheets: Vec<Stylesheet>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            base_url: None,
            pages_directory: None,
            route_manifest: None,
            target_directory: None,
            exclude: Vec::new(),
            exclude_extensions: Vec::new(),
            exclude_index: true,
            index_name: "index".to_string(),
            skip_reserved: true,
            include: Vec::new(),
            subdomain: false,
            trailing_slash: false,
            langs: Vec::new(),
            default_lang: None,
            lastmod: true,
            pages: BTreeMap::new(),
            stylesheets: Vec::new(),
        }
    }
}

/// Where candidate pages come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageSource {
    /// Walk a directory of page files.
    Directory(PathBuf),
    /// Read routes from a framework route manifest.
    Manifest(PathBuf),
}

/// Page metadata keyed by exact path or by pattern.
///
/// Lookup order: an exact key match wins; otherwise the longest matching
/// pattern. A plain key such as `/blog` also matches everything below it;
/// keys with wildcards are globs.
#[derive(Debug, Clone, Default)]
pub struct PagesConfig {
    exact: BTreeMap<PagePath, PageMetadata>,
    patterns: Vec<(Rule, PageMetadata)>,
}

impl PagesConfig {
    pub fn from_map(map: &BTreeMap<String, PageMetadata>) -> Result<Self, ConfigError> {
        let mut pages = PagesConfig::default();
        for (key, meta) in map {
            let rule = if key.contains(['*', '?', '[', '{']) {
                Rule::parse(key)?
            } else {
                let path = PagePath::new(key);
                pages.exact.insert(path.clone(), meta.clone());
                // The root as a prefix would match every page.
                if path.is_root() {
                    continue;
                }
                Rule::Folder(path)
            };
            pages.patterns.push((rule, meta.clone()));
        }
        Ok(pages)
    }

    pub fn lookup(&self, path: &PagePath) -> Option<&PageMetadata> {
        let path = path.without_trailing_slash();
        if let Some(meta) = self.exact.get(&path) {
            return Some(meta);
        }
        self.patterns
            .iter()
            .filter(|(rule, _)| rule.matches(&path))
            .max_by_key(|(rule, _)| rule.pattern().len())
            .map(|(_, meta)| meta)
    }
}

/// Validated, immutable configuration for one run.
#[derive(Debug, Clone)]
pub struct SitemapConfig {
    /// Absolute base URL without a trailing slash.
    pub base_url: String,
    pub source: PageSource,
    pub target_directory: PathBuf,
    pub discover: DiscoverOptions,
    pub exclude: RuleSet,
    pub include: RuleSet,
    pub subdomain: bool,
    pub trailing_slash: bool,
    pub langs: Vec<String>,
    /// Language served from the unprefixed base URL. Empty when `langs` is.
    pub default_lang: String,
    pub lastmod: bool,
    pub pages: PagesConfig,
    pub stylesheets: Vec<Stylesheet>,
}

impl TryFrom<ConfigFile> for SitemapConfig {
    type Error = ConfigError;

    fn try_from(file: ConfigFile) -> Result<Self, Self::Error> {
        let base_url = file.base_url.ok_or(ConfigError::Missing("base_url"))?;
        let base_url = validate_base_url(&base_url)?;

        let source = match (file.route_manifest, file.pages_directory) {
            (Some(manifest), _) => PageSource::Manifest(manifest),
            (None, Some(dir)) => PageSource::Directory(dir),
            (None, None) => return Err(ConfigError::Missing("pages_directory")),
        };
        let target_directory = file
            .target_directory
            .ok_or(ConfigError::Missing("target_directory"))?;

        if file.index_name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "index_name must not be empty".into(),
            ));
        }

        validate_langs(&file.langs)?;
        let default_lang = match file.default_lang {
            Some(lang) if !file.langs.is_empty() && !file.langs.contains(&lang) => {
                return Err(ConfigError::Validation(format!(
                    "default_lang {lang:?} is not one of langs {:?}",
                    file.langs
                )));
            }
            Some(lang) => lang,
            None => file.langs.first().cloned().unwrap_or_default(),
        };

        for (key, meta) in &file.pages {
            validate_page_metadata(key, meta)?;
        }

        let exclude_extensions = file
            .exclude_extensions
            .iter()
            .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();

        Ok(SitemapConfig {
            base_url,
            source,
            target_directory,
            discover: DiscoverOptions {
                exclude_extensions,
                exclude_index: file.exclude_index,
                index_name: file.index_name.trim().to_string(),
                skip_reserved: file.skip_reserved,
            },
            exclude: RuleSet::classify(&file.exclude)?,
            include: RuleSet::classify(&file.include)?,
            subdomain: file.subdomain,
            trailing_slash: file.trailing_slash,
            langs: file.langs,
            default_lang,
            lastmod: file.lastmod,
            pages: PagesConfig::from_map(&file.pages)?,
            stylesheets: file.stylesheets,
        })
    }
}

/// Parse the base URL and return it without a trailing slash.
fn validate_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim();
    let url = Url::parse(trimmed)
        .map_err(|e| ConfigError::Validation(format!("base_url {trimmed:?}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation(format!(
            "base_url must use http or https, got {:?}",
            url.scheme()
        )));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(ConfigError::Validation(format!(
            "base_url {trimmed:?} has no host"
        )));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(ConfigError::Validation(format!(
            "base_url {trimmed:?} must not have a query or fragment"
        )));
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}

fn validate_langs(langs: &[String]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for lang in langs {
        let valid = !lang.is_empty()
            && lang
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(ConfigError::Validation(format!(
                "invalid language code {lang:?}"
            )));
        }
        if !seen.insert(lang.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate language code {lang:?}"
            )));
        }
    }
    Ok(())
}

fn validate_page_metadata(key: &str, meta: &PageMetadata) -> Result<(), ConfigError> {
    if let Some(priority) = &meta.priority {
        let in_range = priority
            .trim()
            .parse::<f64>()
            .is_ok_and(|p| (0.0..=1.0).contains(&p));
        if !in_range {
            return Err(ConfigError::Validation(format!(
                "pages.{key:?}.priority must be a decimal between 0.0 and 1.0, got {priority:?}"
            )));
        }
    }
    if let Some(lastmod) = &meta.lastmod {
        let parses = chrono::NaiveDate::parse_from_str(lastmod, "%Y-%m-%d").is_ok()
            || chrono::DateTime::parse_from_rfc3339(lastmod).is_ok();
        if !parses {
            return Err(ConfigError::Validation(format!(
                "pages.{key:?}.lastmod must be YYYY-MM-DD or RFC 3339, got {lastmod:?}"
            )));
        }
    }
    Ok(())
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Values supplied on the command line. `None` leaves the file value alone.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub pages_directory: Option<PathBuf>,
    pub route_manifest: Option<PathBuf>,
    pub target_directory: Option<PathBuf>,
}

impl Overrides {
    /// The overrides as a TOML table, ready to merge on top of a config.
    pub fn to_toml(&self) -> toml::Value {
        let mut table = toml::Table::new();
        if let Some(url) = &self.base_url {
            table.insert("base_url".into(), toml::Value::String(url.clone()));
        }
        let paths = [
            ("pages_directory", &self.pages_directory),
            ("route_manifest", &self.route_manifest),
            ("target_directory", &self.target_directory),
        ];
        for (key, path) in paths {
            if let Some(path) = path {
                table.insert(
                    key.into(),
                    toml::Value::String(path.to_string_lossy().into_owned()),
                );
            }
        }
        toml::Value::Table(table)
    }
}

/// Returns the stock default config as a `toml::Value::Table`.
///
/// Used as the base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(ConfigFile::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist. `.json` files are parsed
/// as JSON with the same schema; everything else is TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let value = if is_json {
        let file: ConfigFile = serde_json::from_str(&content)?;
        toml::Value::try_from(file)?
    } else {
        toml::from_str(&content)?
    };
    Ok(Some(value))
}

/// Merge the layers in order, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    layers: impl IntoIterator<Item = toml::Value>,
) -> Result<SitemapConfig, ConfigError> {
    let merged = layers.into_iter().fold(base, merge_toml);
    let file: ConfigFile = merged.try_into()?;
    SitemapConfig::try_from(file)
}

/// Load `path` (if it exists), apply command-line overrides, and validate.
pub fn load_config(path: &Path, overrides: &Overrides) -> Result<SitemapConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let file = load_raw_config(path)?;
    resolve_config(base, file.into_iter().chain([overrides.to_toml()]))
}

/// Returns a fully-commented stock `sitemap.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# sitemap-gen configuration
# =========================
# Values shown below are the defaults, except for the three required keys
# at the top, which need real values for your site.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Required
# ---------------------------------------------------------------------------
# Absolute URL the site is served from.
base_url = "https://example.com"

# Directory of page files to walk. Ignored when route_manifest is set.
pages_directory = "pages"

# JSON route manifest to read instead of walking pages_directory.
# Either an array of routes or an object keyed by route.
# route_manifest = "routes.json"

# sitemap.xml is written into this directory.
target_directory = "public"

# ---------------------------------------------------------------------------
# Discovery
# ---------------------------------------------------------------------------
# File extensions (without the dot) that never become pages.
exclude_extensions = []

# Strip a trailing index segment: pages/blog/index.html -> /blog
exclude_index = true

# File stem treated as the index page.
index_name = "index"

# Skip files and directories starting with `_` or `.`.
skip_reserved = true

# ---------------------------------------------------------------------------
# Filtering
# ---------------------------------------------------------------------------
# Paths to leave out. "/admin" drops /admin and everything below it,
# "404.html" drops that page at any depth, "/drafts/*" is a glob.
exclude = []

# When non-empty, only paths matching one of these patterns are kept.
include = []

# ---------------------------------------------------------------------------
# URLs
# ---------------------------------------------------------------------------
# Append a trailing slash to every page except the root.
trailing_slash = false

# Languages to emit. Each page gets one <url> per language, with
# <xhtml:link> alternates pointing at every language.
langs = []

# Language served from base_url itself. Defaults to the first of langs.
# default_lang = "en"

# Serve other languages from subdomains (fr.example.com) instead of
# path prefixes (example.com/fr).
subdomain = false

# Stamp pages with today's date as <lastmod> unless the page sets its own.
lastmod = true

# ---------------------------------------------------------------------------
# Page metadata
# ---------------------------------------------------------------------------
# Defaults: priority = "0.5", changefreq = "daily".
# Keys are exact paths, path prefixes or globs; the most specific wins.
#
# [pages."/"]
# priority = "1.0"
# changefreq = "weekly"
#
# [pages."/blog/*"]
# priority = "0.7"
# changefreq = "monthly"
# lastmod = "2024-01-31"

# ---------------------------------------------------------------------------
# Stylesheets
# ---------------------------------------------------------------------------
# [[stylesheets]]
# type = "text/xsl"
# href = "/sitemap.xsl"
"##
}
