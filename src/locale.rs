//! Localized base URLs.
//!
//! The default language lives at the base URL itself. Every other language
//! gets either a path prefix or a subdomain:
//!
//! | lang | `subdomain = false` | `subdomain = true` |
//! |------|---------------------|--------------------|
//! | `en` (default) | `https://example.com` | `https://example.com` |
//! | `fr` | `https://example.com/fr` | `https://fr.example.com` |

use crate::config::SitemapConfig;
use url::Url;

/// Fully-qualified base URL for `lang`.
///
/// `base_url` is expected without a trailing slash, as stored in
/// [`SitemapConfig::base_url`].
pub fn resolve(base_url: &str, lang: &str, default_lang: &str, subdomain: bool) -> String {
    if lang == default_lang {
        base_url.to_string()
    } else if subdomain {
        subdomain_url(base_url, lang)
    } else {
        format!("{base_url}/{lang}")
    }
}

/// Insert `lang` as the leftmost label of the host, keeping scheme, port and
/// path as they were.
fn subdomain_url(base_url: &str, lang: &str) -> String {
    let via_url = Url::parse(base_url).ok().and_then(|mut url| {
        let host = format!("{lang}.{}", url.host_str()?);
        url.set_host(Some(&host)).ok()?;
        let serialized = url.to_string();
        Some(if base_url.ends_with('/') {
            serialized
        } else {
            serialized.trim_end_matches('/').to_string()
        })
    });

    // Hosts the URL parser refuses to relabel (IP addresses) get a plain
    // textual insertion after the scheme.
    via_url.unwrap_or_else(|| match base_url.split_once("://") {
        Some((scheme, rest)) => format!("{scheme}://{lang}.{rest}"),
        None => format!("{lang}.{base_url}"),
    })
}

/// Localized base URLs for every configured language, computed once per run.
#[derive(Debug, Clone)]
pub struct Locales {
    bases: Vec<(String, String)>,
}

impl Locales {
    pub fn from_config(config: &SitemapConfig) -> Self {
        let bases = config
            .langs
            .iter()
            .map(|lang| {
                let base = resolve(
                    &config.base_url,
                    lang,
                    &config.default_lang,
                    config.subdomain,
                );
                (lang.clone(), base)
            })
            .collect();
        Locales { bases }
    }

    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bases.len()
    }

    /// `(lang, base_url)` pairs in configured order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.bases.iter().map(|(lang, base)| (lang.as_str(), base.as_str()))
    }
}
