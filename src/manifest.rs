//! Route manifests.
//!
//! Frameworks that generate their routes at build time can hand the list to
//! the sitemap directly instead of having the pages directory walked. The
//! pipeline only depends on [`RouteManifestReader`]; [`JsonRouteManifest`]
//! is the implementation used by the CLI and understands three shapes:
//!
//! ```text
//! ["/", "/about", "/blog/hello"]                      plain route list
//! {"/": {"page": "/"}, "/about": {"page": "/about"}}  export path map (keys, in file order)
//! {"staticRoutes": [{"page": "/about"}, ...], ...}    framework routes manifest
//! ```
//!
//! Routes with dynamic segments (`/blog/[slug]`) have no concrete URL and are
//! skipped.

use crate::discover::DiscoveryError;
use crate::types::PagePath;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Source of route strings for sites whose pages are not plain files.
pub trait RouteManifestReader {
    /// Return the routes listed at `location`, in manifest order.
    fn read_routes(&self, location: &Path) -> Result<Vec<String>, DiscoveryError>;
}

/// Reads routes from a JSON file.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRouteManifest;

impl RouteManifestReader for JsonRouteManifest {
    fn read_routes(&self, location: &Path) -> Result<Vec<String>, DiscoveryError> {
        let content = fs::read_to_string(location)?;
        let value: Value = serde_json::from_str(&content)?;
        let routes = parse_routes(value).map_err(|reason| DiscoveryError::Manifest {
            path: location.to_path_buf(),
            reason,
        })?;
        debug!(manifest = %location.display(), count = routes.len(), "read route manifest");
        Ok(routes)
    }
}

fn parse_routes(value: Value) -> Result<Vec<String>, String> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(route) => Ok(route),
                other => Err(format!("expected a route string, found {other}")),
            })
            .collect(),
        Value::Object(mut map) => match map.remove("staticRoutes") {
            Some(Value::Array(routes)) => routes
                .into_iter()
                .map(|route| {
                    route
                        .get("page")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .ok_or_else(|| format!("static route without a \"page\" string: {route}"))
                })
                .collect(),
            Some(other) => Err(format!("\"staticRoutes\" must be an array, found {other}")),
            None => Ok(map.into_iter().map(|(route, _)| route).collect()),
        },
        other => Err(format!(
            "expected an array of routes or an object keyed by route, found {other}"
        )),
    }
}

/// Normalize manifest routes into page paths, dropping dynamic ones.
pub fn routes_to_pages(routes: Vec<String>) -> Vec<PagePath> {
    routes
        .into_iter()
        .filter(|route| {
            let dynamic = route.contains('[');
            if dynamic {
                warn!(route = %route, "dynamic route skipped");
            }
            !dynamic
        })
        .map(|route| PagePath::new(&route))
        .collect()
}

/// Read and normalize the routes at `location`.
pub fn read_pages(
    reader: &dyn RouteManifestReader,
    location: &Path,
) -> Result<Vec<PagePath>, DiscoveryError> {
    Ok(routes_to_pages(reader.read_routes(location)?))
}
