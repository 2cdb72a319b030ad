//! Page discovery.
//!
//! Stage 1 of the pipeline. Walks the pages directory and turns every file
//! into a [`PagePath`]:
//!
//! ```text
//! pages/                     →  page paths
//! ├── index.html             →  /
//! ├── about.html             →  /about
//! ├── _app.js                   (reserved, skipped)
//! ├── blog/
//! │   ├── index.md           →  /blog
//! │   └── first-post.md      →  /blog/first-post
//! └── styles/site.css           (skipped when "css" is an excluded extension)
//! ```
//!
//! Entries are visited in file-name order, so the output is stable for a
//! given tree. When a route manifest is configured this walk is skipped and
//! [`crate::manifest`] supplies the routes instead.

use crate::types::PagePath;
use std::collections::HashSet;
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Pages directory not found: {0}")]
    MissingRoot(PathBuf),
    #[error("Cannot read {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("Invalid route manifest {path}: {reason}")]
    Manifest { path: PathBuf, reason: String },
    #[error("Route manifest JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Knobs for turning files into page paths.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoverOptions {
    /// Lowercase extensions, without the dot, that never become pages.
    pub exclude_extensions: Vec<String>,
    /// Strip a trailing segment equal to `index_name`.
    pub exclude_index: bool,
    pub index_name: String,
    /// Skip files and directories whose name starts with `_` or `.`.
    pub skip_reserved: bool,
}

impl Default for DiscoverOptions {
    fn default() -> Self {
        Self {
            exclude_extensions: Vec::new(),
            exclude_index: true,
            index_name: "index".to_string(),
            skip_reserved: true,
        }
    }
}

/// Walk `root` and return one page path per eligible file.
pub fn discover(root: &Path, options: &DiscoverOptions) -> Result<Vec<PagePath>, DiscoveryError> {
    if !root.is_dir() {
        return Err(DiscoveryError::MissingRoot(root.to_path_buf()));
    }

    // Symlinked files and directories are pages too.
    let walker = WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0 || !(options.skip_reserved && is_reserved(e.file_name()))
        });

    let mut paths = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|source| DiscoveryError::Walk {
            path: root.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(root) else {
            continue;
        };
        if has_excluded_extension(rel, &options.exclude_extensions) {
            debug!(file = %rel.display(), "skipped by extension");
            continue;
        }

        let page = page_path_for(rel, options);
        debug!(file = %rel.display(), page = %page, "discovered");
        paths.push(page);
    }

    Ok(paths)
}

/// Reserved names: framework internals (`_app`, `_document`) and dotfiles.
fn is_reserved(name: &OsStr) -> bool {
    let name = name.to_string_lossy();
    name.starts_with('_') || name.starts_with('.')
}

fn has_excluded_extension(path: &Path, excluded: &[String]) -> bool {
    if excluded.is_empty() {
        return false;
    }
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| excluded.contains(&ext))
}

/// Convert a path relative to the pages root into a page path.
///
/// - `about.html` → `/about`
/// - `blog/index.md` → `/blog` (with `exclude_index`)
/// - `index.html` → `/` (with `exclude_index`)
/// - `blog/index.md` → `/blog/index` (without `exclude_index`)
pub fn page_path_for(rel: &Path, options: &DiscoverOptions) -> PagePath {
    let mut segments: Vec<String> = rel
        .parent()
        .into_iter()
        .flat_map(|parent| parent.components())
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    let stem = rel
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    if !(options.exclude_index && stem == options.index_name) {
        segments.push(stem);
    }

    PagePath::new(&segments.join("/"))
}

/// Remove repeated page paths, keeping the first occurrence.
///
/// Case-insensitive filesystems (`About.html` next to `about.md`) and
/// manifests that list a route twice both produce duplicates.
pub fn dedupe(paths: Vec<PagePath>) -> Vec<PagePath> {
    let mut seen = HashSet::with_capacity(paths.len());
    paths
        .into_iter()
        .filter(|path| {
            let fresh = seen.insert(path.clone());
            if !fresh {
                warn!(page = %path, "duplicate page path dropped");
            }
            fresh
        })
        .collect()
}
