//! Path rules used for exclusion, inclusion and page metadata lookup.
//!
//! Every pattern from the config is classified exactly once, when the config
//! is loaded, into one of three kinds:
//!
//! | Pattern | Kind | Matches |
//! |---------|------|---------|
//! | `/admin` | [`Rule::Folder`] | `/admin`, `/admin/settings` (not `/administrator`) |
//! | `/legal/terms.html` | [`Rule::File`] | `/legal/terms`, `/legal/terms.html` |
//! | `terms.html` | [`Rule::File`] | any path whose last segment is `terms` or `terms.html` |
//! | `/blog/*/draft` | [`Rule::Glob`] | `/blog/2024/draft` (`*` stays inside one segment) |
//!
//! A pattern is a glob when it contains `*`, `?`, `[` or `{`. Otherwise it is
//! a file rule when its last segment has an extension, and a folder rule in
//! every other case. `**` crosses segment boundaries.

use crate::types::PagePath;
use globset::{GlobBuilder, GlobMatcher};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum RuleError {
    #[error("empty rule pattern")]
    Empty,
    #[error("invalid glob pattern {pattern:?}: {source}")]
    Glob {
        pattern: String,
        #[source]
        source: globset::Error,
    },
}

const GLOB_MARKERS: &[char] = &['*', '?', '[', '{'];

/// A single classified pattern.
#[derive(Debug, Clone)]
pub enum Rule {
    /// Matches the path itself and everything below it.
    Folder(PagePath),
    /// Matches one page by its file name. `parent` is `None` for bare names
    /// like `404.html`, which match at any depth.
    File {
        parent: Option<PagePath>,
        name: String,
        stem: String,
    },
    /// Shell-style glob over the whole path.
    Glob {
        pattern: String,
        matcher: GlobMatcher,
    },
}

impl Rule {
    /// Classify a raw pattern.
    pub fn parse(raw: &str) -> Result<Self, RuleError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(RuleError::Empty);
        }

        if trimmed.contains(GLOB_MARKERS) {
            return Self::glob(trimmed);
        }

        let anchored = trimmed.contains('/');
        let normalized = PagePath::new(trimmed);
        let leaf = normalized.leaf().unwrap_or_default();

        if has_extension(leaf) {
            let name = leaf.to_string();
            let stem = match name.rsplit_once('.') {
                Some((stem, _)) => stem.to_string(),
                None => name.clone(),
            };
            let parent = anchored.then(|| parent_of(&normalized));
            return Ok(Rule::File { parent, name, stem });
        }

        Ok(Rule::Folder(normalized))
    }

    fn glob(raw: &str) -> Result<Self, RuleError> {
        let mut pattern = raw.trim_end_matches('/').to_string();
        if !pattern.starts_with('/') && !pattern.starts_with('*') {
            pattern.insert(0, '/');
        }
        let matcher = GlobBuilder::new(&pattern)
            .literal_separator(true)
            .build()
            .map_err(|source| RuleError::Glob {
                pattern: raw.to_string(),
                source,
            })?
            .compile_matcher();
        Ok(Rule::Glob { pattern, matcher })
    }

    /// Whether `path` falls under this rule.
    pub fn matches(&self, path: &PagePath) -> bool {
        let path = path.without_trailing_slash();
        match self {
            Rule::Folder(prefix) => {
                prefix.is_root()
                    || path == *prefix
                    || path
                        .as_str()
                        .strip_prefix(prefix.as_str())
                        .is_some_and(|rest| rest.starts_with('/'))
            }
            Rule::File { parent, name, stem } => {
                let Some(leaf) = path.leaf() else {
                    return false;
                };
                if leaf != name.as_str() && leaf != stem.as_str() {
                    return false;
                }
                match parent {
                    Some(parent) => parent_of(&path) == *parent,
                    None => true,
                }
            }
            Rule::Glob { matcher, .. } => matcher.is_match(path.as_str()),
        }
    }

    /// Pattern text after normalization. Longer text means a more specific
    /// rule when several match the same path.
    pub fn pattern(&self) -> String {
        match self {
            Rule::Folder(prefix) => prefix.to_string(),
            Rule::File {
                parent: Some(parent),
                name,
                ..
            } if parent.is_root() => format!("/{name}"),
            Rule::File {
                parent: Some(parent),
                name,
                ..
            } => format!("{parent}/{name}"),
            Rule::File { parent: None, name, .. } => name.clone(),
            Rule::Glob { pattern, .. } => pattern.clone(),
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, Rule::Folder(_))
    }

    pub fn is_file(&self) -> bool {
        matches!(self, Rule::File { .. })
    }
}

/// A leaf names a file when it ends in a dot and an alphanumeric suffix
/// with at least one letter. `v1.2` is a folder, `notes.md` is not.
fn has_extension(leaf: &str) -> bool {
    match leaf.trim_start_matches('.').rsplit_once('.') {
        Some((stem, ext)) => {
            !stem.is_empty()
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
                && ext.chars().any(|c| c.is_ascii_alphabetic())
        }
        None => false,
    }
}

fn parent_of(path: &PagePath) -> PagePath {
    match path.as_str().rsplit_once('/') {
        Some((parent, _)) => PagePath::new(parent),
        None => PagePath::root(),
    }
}

/// An ordered list of classified rules.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Classify every pattern. Fails on the first invalid one.
    pub fn classify<S: AsRef<str>>(patterns: &[S]) -> Result<Self, RuleError> {
        let rules = patterns
            .iter()
            .map(|p| Rule::parse(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(RuleSet { rules })
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn folders(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(|r| r.is_folder())
    }

    pub fn files(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(|r| r.is_file())
    }

    /// True when any rule matches.
    pub fn matches(&self, path: &PagePath) -> bool {
        self.rules.iter().any(|r| r.matches(path))
    }
}

/// Whether an exclusion rule set removes `path`.
pub fn is_excluded(path: &PagePath, exclude: &RuleSet) -> bool {
    exclude.matches(path)
}

/// Drop every path matched by `exclude`, keeping the order of the rest.
pub fn apply_exclusions(paths: Vec<PagePath>, exclude: &RuleSet) -> Vec<PagePath> {
    if exclude.is_empty() {
        return paths;
    }
    paths
        .into_iter()
        .filter(|path| {
            let excluded = is_excluded(path, exclude);
            if excluded {
                debug!(path = %path, "excluded");
            }
            !excluded
        })
        .collect()
}
