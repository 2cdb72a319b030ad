//! Sitemap XML serialization.
//!
//! [`SitemapWriter`] streams the document through a [`Sink`] in four steps
//! that must happen in order:
//!
//! ```text
//! Start ──write_header──▶ HeaderWritten ──write_entry──▶ BodyWriting ──close──▶ Closed
//!                               │                          ▲      │
//!                               └────────close─────────────┼──────┘
//!                                                          └─write_entry
//! ```
//!
//! Calling a step out of order fails with [`WriteError::OutOfOrder`].
//!
//! ## Format
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8" ?>
//! <?xml-stylesheet href="/sitemap.xsl" type="text/xsl" ?>
//! <urlset xsi:schemaLocation="..." xmlns:xsi="..." xmlns="..." xmlns:xhtml="...">
//!     <url>
//!         <loc>https://example.com/fr/about</loc>
//!         <lastmod>2025-01-01</lastmod>
//!         <changefreq>daily</changefreq>
//!         <priority>0.5</priority>
//!         <xhtml:link rel="alternate" hreflang="en" href="https://example.com/about" />
//!         <xhtml:link rel="alternate" hreflang="fr" href="https://example.com/fr/about" />
//!     </url>
//! </urlset>
//! ```
//!
//! With languages configured, every entry produces one `<url>` per language,
//! each listing all languages as alternates. Without languages there is one
//! `<url>` per entry and no `<xhtml:link>` at all.

use crate::config::{SitemapConfig, Stylesheet};
use crate::locale::Locales;
use crate::types::SitemapEntry;
use quick_xml::escape::escape;
use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// File name of the generated sitemap inside the target directory.
pub const SITEMAP_FILE_NAME: &str = "sitemap.xml";

const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" ?>\n";
const URLSET_OPEN: &str = "<urlset xsi:schemaLocation=\"http://www.sitemaps.org/schemas/sitemap/0.9 http://www.sitemaps.org/schemas/sitemap/0.9/sitemap.xsd\"
    xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\"
    xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\"
    xmlns:xhtml=\"http://www.w3.org/1999/xhtml\">";
const URLSET_CLOSE: &str = "\n</urlset>\n";

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("cannot {operation} while the sitemap writer is {state}")]
    OutOfOrder {
        operation: &'static str,
        state: WriterState,
    },
}

/// Where the writer is in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterState {
    Start,
    HeaderWritten,
    BodyWriting,
    Closed,
}

impl fmt::Display for WriterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WriterState::Start => "not started",
            WriterState::HeaderWritten => "after the header",
            WriterState::BodyWriting => "writing the body",
            WriterState::Closed => "closed",
        })
    }
}

// ============================================================================
// Sinks
// ============================================================================

/// Byte-level output capability used by [`SitemapWriter`].
///
/// Every method either completes fully or returns an error.
pub trait Sink {
    /// Path of the sitemap file inside `directory`.
    fn resolve(&self, directory: &Path) -> PathBuf {
        directory.join(SITEMAP_FILE_NAME)
    }

    /// Replace whatever is at `path` with `bytes`.
    fn write_truncate(&mut self, path: &Path, bytes: &[u8]) -> io::Result<()>;

    /// Append `bytes` to `path`, which must have been started with
    /// [`Sink::write_truncate`].
    fn append(&mut self, path: &Path, bytes: &[u8]) -> io::Result<()>;

    /// Make the document at `path` visible. Called once, after the last append.
    fn finish(&mut self, _path: &Path) -> io::Result<()> {
        Ok(())
    }
}

struct Staged {
    target: PathBuf,
    staging: PathBuf,
    writer: BufWriter<File>,
}

/// Filesystem sink that never exposes a half-written sitemap.
///
/// Bytes go to a sibling `<name>.partial` file; [`Sink::finish`] flushes it
/// and renames it over the target. If the run fails before that, the
/// previous sitemap (if any) is left untouched.
#[derive(Default)]
pub struct FsSink {
    staged: Option<Staged>,
}

impl FsSink {
    pub fn new() -> Self {
        Self::default()
    }
}

fn staging_path(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| SITEMAP_FILE_NAME.into());
    name.push(".partial");
    target.with_file_name(name)
}

impl Sink for FsSink {
    fn write_truncate(&mut self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let staging = staging_path(path);
        let mut writer = BufWriter::new(File::create(&staging)?);
        writer.write_all(bytes)?;
        self.staged = Some(Staged {
            target: path.to_path_buf(),
            staging,
            writer,
        });
        Ok(())
    }

    fn append(&mut self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        match &mut self.staged {
            Some(staged) if staged.target == path => staged.writer.write_all(bytes),
            _ => Err(io::Error::other(format!(
                "append to {} before it was truncated",
                path.display()
            ))),
        }
    }

    fn finish(&mut self, path: &Path) -> io::Result<()> {
        let staged = match self.staged.take() {
            Some(staged) if staged.target == path => staged,
            other => {
                self.staged = other;
                return Err(io::Error::other(format!(
                    "finish of {} before it was truncated",
                    path.display()
                )));
            }
        };
        let file = staged.writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        fs::rename(&staged.staging, &staged.target)?;
        debug!(path = %staged.target.display(), "sitemap committed");
        Ok(())
    }
}

/// In-memory sink. Useful for tests and for embedding the generator where
/// the caller wants the bytes rather than a file.
#[derive(Debug, Default)]
pub struct MemorySink {
    files: BTreeMap<PathBuf, Vec<u8>>,
    finished: Vec<PathBuf>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self, path: &Path) -> Option<&[u8]> {
        self.files.get(path).map(Vec::as_slice)
    }

    /// Contents as UTF-8 text (lossy).
    pub fn text(&self, path: &Path) -> Option<String> {
        self.contents(path)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    pub fn is_finished(&self, path: &Path) -> bool {
        self.finished.iter().any(|p| p == path)
    }
}

impl Sink for MemorySink {
    fn write_truncate(&mut self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        self.finished.retain(|p| p != path);
        self.files.insert(path.to_path_buf(), bytes.to_vec());
        Ok(())
    }

    fn append(&mut self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        match self.files.get_mut(path) {
            Some(buf) => {
                buf.extend_from_slice(bytes);
                Ok(())
            }
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("append to {} before it was truncated", path.display()),
            )),
        }
    }

    fn finish(&mut self, path: &Path) -> io::Result<()> {
        self.finished.push(path.to_path_buf());
        Ok(())
    }
}

// ============================================================================
// Rendering
// ============================================================================

/// XML declaration, stylesheet directives and the `<urlset>` opening tag.
pub fn render_header(stylesheets: &[Stylesheet]) -> String {
    let mut xml = String::from(XML_DECLARATION);
    for sheet in stylesheets {
        xml.push_str(&format!(
            "<?xml-stylesheet href=\"{}\" type=\"{}\" ?>\n",
            escape(&sheet.href),
            escape(&sheet.kind)
        ));
    }
    xml.push_str(URLSET_OPEN);
    xml
}

/// One `<url>` block rooted at `base`, with optional alternates.
fn render_url(base: &str, entry: &SitemapEntry, alternates: Option<&Locales>) -> String {
    let mut xml = String::with_capacity(256);
    xml.push_str("\n    <url>\n        <loc>");
    let path = entry.page_path.to_encoded();
    xml.push_str(&escape(&format!("{base}{path}")));
    xml.push_str("</loc>");
    if let Some(lastmod) = &entry.lastmod {
        xml.push_str("\n        <lastmod>");
        xml.push_str(&escape(lastmod));
        xml.push_str("</lastmod>");
    }
    xml.push_str("\n        <changefreq>");
    xml.push_str(entry.changefreq.as_str());
    xml.push_str("</changefreq>\n        <priority>");
    xml.push_str(&escape(&entry.priority));
    xml.push_str("</priority>");
    for (lang, alt_base) in alternates.into_iter().flat_map(|locales| locales.iter()) {
        xml.push_str(&format!(
            "\n        <xhtml:link rel=\"alternate\" hreflang=\"{}\" href=\"{}\" />",
            escape(lang),
            escape(&format!("{alt_base}{path}"))
        ));
    }
    xml.push_str("\n    </url>");
    xml
}

/// All `<url>` blocks for one entry: one per language, or a single block
/// at `base_url` when no languages are configured.
pub fn render_entry(base_url: &str, locales: &Locales, entry: &SitemapEntry) -> String {
    if locales.is_empty() {
        return render_url(base_url, entry, None);
    }
    locales
        .iter()
        .map(|(_, base)| render_url(base, entry, Some(locales)))
        .collect()
}

// ============================================================================
// Writer
// ============================================================================

/// Streams one sitemap document through a sink.
pub struct SitemapWriter<'a, S: Sink> {
    sink: &'a mut S,
    path: PathBuf,
    base_url: &'a str,
    stylesheets: &'a [Stylesheet],
    locales: Locales,
    state: WriterState,
    urls_written: usize,
}

impl<'a, S: Sink> SitemapWriter<'a, S> {
    pub fn new(config: &'a SitemapConfig, sink: &'a mut S) -> Self {
        let path = sink.resolve(&config.target_directory);
        SitemapWriter {
            sink,
            path,
            base_url: &config.base_url,
            stylesheets: &config.stylesheets,
            locales: Locales::from_config(config),
            state: WriterState::Start,
            urls_written: 0,
        }
    }

    /// Path the sink resolved for this document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> WriterState {
        self.state
    }

    /// Number of `<url>` blocks written so far.
    pub fn urls_written(&self) -> usize {
        self.urls_written
    }

    fn require_state(
        &self,
        operation: &'static str,
        allowed: &[WriterState],
    ) -> Result<(), WriteError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(WriteError::OutOfOrder {
                operation,
                state: self.state,
            })
        }
    }

    /// Truncate the target and write the document header.
    pub fn write_header(&mut self) -> Result<(), WriteError> {
        self.require_state("write the header", &[WriterState::Start])?;
        let header = render_header(self.stylesheets);
        self.sink.write_truncate(&self.path, header.as_bytes())?;
        self.state = WriterState::HeaderWritten;
        Ok(())
    }

    /// Append the `<url>` block(s) for one entry.
    pub fn write_entry(&mut self, entry: &SitemapEntry) -> Result<(), WriteError> {
        self.require_state(
            "write an entry",
            &[WriterState::HeaderWritten, WriterState::BodyWriting],
        )?;
        let xml = render_entry(self.base_url, &self.locales, entry);
        self.sink.append(&self.path, xml.as_bytes())?;
        self.state = WriterState::BodyWriting;
        self.urls_written += self.locales.len().max(1);
        Ok(())
    }

    /// Append the closing tag and commit the document.
    pub fn close(&mut self) -> Result<(), WriteError> {
        self.require_state(
            "close the document",
            &[WriterState::HeaderWritten, WriterState::BodyWriting],
        )?;
        self.sink.append(&self.path, URLSET_CLOSE.as_bytes())?;
        self.sink.finish(&self.path)?;
        self.state = WriterState::Closed;
        Ok(())
    }
}

/// Write a complete sitemap for `entries`. Returns the number of `<url>`
/// blocks written.
pub fn write_sitemap<S: Sink>(
    config: &SitemapConfig,
    entries: &[SitemapEntry],
    sink: &mut S,
) -> Result<usize, WriteError> {
    let mut writer = SitemapWriter::new(config, sink);
    writer.write_header()?;
    for entry in entries {
        writer.write_entry(entry)?;
    }
    writer.close()?;
    Ok(writer.urls_written())
}
