//! Logical path routing
//!
//! Files are identified by logical paths such as `public/index.html` or
//! `src/App.js`. The leading segment picks the physical subtree and is
//! stripped before the file touches the disk.

use crate::manifest::{normalize_path, PUBLIC_PREFIX, SRC_PREFIX};
use serde::{Deserialize, Serialize};

/// One of the two physical roots of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subtree {
    Public,
    Src,
}

impl Subtree {
    pub const ALL: [Subtree; 2] = [Subtree::Public, Subtree::Src];

    /// Directory name under the project base directory.
    pub fn dir_name(self) -> &'static str {
        match self {
            Subtree::Public => "public",
            Subtree::Src => "src",
        }
    }

    /// Logical path of `relative` inside this subtree.
    pub fn logical_path(self, relative: &str) -> String {
        format!("{}/{}", self.dir_name(), relative)
    }
}

/// A logical path resolved to a subtree and a path relative to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutedPath {
    pub subtree: Subtree,
    pub relative: String,
}

/// Error raised for paths that would escape the project tree.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid path: {0}")]
pub struct InvalidPath(pub String);

/// Reject empty, absolute or parent-relative paths.
pub fn validate_relative(path: &str) -> Result<(), InvalidPath> {
    let trimmed = path.trim();

    if trimmed.is_empty()
        || trimmed.starts_with('/')
        || trimmed.starts_with('\\')
        || trimmed.contains(':')
    {
        return Err(InvalidPath(path.to_string()));
    }

    if trimmed.split(['/', '\\']).any(|segment| segment == "..") {
        return Err(InvalidPath(path.to_string()));
    }

    Ok(())
}

/// Drop leading copies of the subtree's own prefix from `relative`.
///
/// `src/App.js` written to the source subtree is stored as `App.js`.
pub fn strip_subtree_prefix(subtree: Subtree, relative: &str) -> &str {
    let prefix = match subtree {
        Subtree::Public => PUBLIC_PREFIX,
        Subtree::Src => SRC_PREFIX,
    };

    let mut relative = relative;
    while let Some(rest) = relative.strip_prefix(prefix) {
        relative = rest;
    }
    relative
}

fn strip_prefix(path: &str) -> Option<RoutedPath> {
    if let Some(rest) = path.strip_prefix(PUBLIC_PREFIX) {
        return Some(RoutedPath {
            subtree: Subtree::Public,
            relative: rest.to_string(),
        });
    }
    if let Some(rest) = path.strip_prefix(SRC_PREFIX) {
        return Some(RoutedPath {
            subtree: Subtree::Src,
            relative: rest.to_string(),
        });
    }
    None
}

fn checked(routed: RoutedPath, original: &str) -> Result<RoutedPath, InvalidPath> {
    validate_relative(&routed.relative).map_err(|_| InvalidPath(original.to_string()))?;
    Ok(routed)
}

/// Route a generated file. Unprefixed paths land in the source subtree.
pub fn route_generated(path: &str) -> Result<RoutedPath, InvalidPath> {
    let normalized = normalize_path(path);
    let routed = strip_prefix(&normalized).unwrap_or(RoutedPath {
        subtree: Subtree::Src,
        relative: normalized.clone(),
    });
    checked(routed, path)
}

/// Route a file written by hand. Unprefixed `.html` files go to the public
/// subtree, everything else to the source subtree.
pub fn route_update(path: &str) -> Result<RoutedPath, InvalidPath> {
    let normalized = normalize_path(path);
    let routed = strip_prefix(&normalized).unwrap_or_else(|| RoutedPath {
        subtree: if normalized.ends_with(".html") {
            Subtree::Public
        } else {
            Subtree::Src
        },
        relative: normalized.clone(),
    });
    checked(routed, path)
}

/// Candidate locations for reading a file, in lookup order.
///
/// A prefixed path has exactly one candidate. An unprefixed path is looked up
/// in the public subtree first, then in the source subtree.
pub fn read_candidates(path: &str) -> Result<Vec<RoutedPath>, InvalidPath> {
    let normalized = normalize_path(path);

    let candidates = match strip_prefix(&normalized) {
        Some(routed) => vec![routed],
        None => Subtree::ALL
            .iter()
            .map(|subtree| RoutedPath {
                subtree: *subtree,
                relative: normalized.clone(),
            })
            .collect(),
    };

    candidates
        .into_iter()
        .map(|routed| checked(routed, path))
        .collect()
}

/// Content type served for a previewed file, based on its extension.
pub fn content_type_for(path: &str) -> &'static str {
    let extension = path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" | "jsx" => "text/javascript; charset=utf-8",
        "json" => "application/json",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "ico" => "image/x-icon",
        "txt" | "md" | "py" => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn routed(subtree: Subtree, relative: &str) -> RoutedPath {
        RoutedPath {
            subtree,
            relative: relative.to_string(),
        }
    }

    #[test]
    fn test_route_generated_by_prefix() {
        assert_eq!(
            route_generated("public/index.html").unwrap(),
            routed(Subtree::Public, "index.html")
        );
        assert_eq!(
            route_generated("src/components/Nav.js").unwrap(),
            routed(Subtree::Src, "components/Nav.js")
        );
    }

    #[test]
    fn test_route_generated_collapses_duplicate_prefix() {
        assert_eq!(
            route_generated("src/src/App.js").unwrap(),
            routed(Subtree::Src, "App.js")
        );
        assert_eq!(
            route_generated("public/public/index.html").unwrap(),
            routed(Subtree::Public, "index.html")
        );
    }

    #[test]
    fn test_route_generated_unprefixed_goes_to_src() {
        assert_eq!(
            route_generated("package.json").unwrap(),
            routed(Subtree::Src, "package.json")
        );
    }

    #[test]
    fn test_route_update_unprefixed_html_goes_to_public() {
        assert_eq!(
            route_update("about.html").unwrap(),
            routed(Subtree::Public, "about.html")
        );
        assert_eq!(route_update("util.js").unwrap(), routed(Subtree::Src, "util.js"));
    }

    #[test]
    fn test_read_candidates() {
        assert_eq!(
            read_candidates("src/App.js").unwrap(),
            vec![routed(Subtree::Src, "App.js")]
        );
        assert_eq!(
            read_candidates("index.html").unwrap(),
            vec![
                routed(Subtree::Public, "index.html"),
                routed(Subtree::Src, "index.html")
            ]
        );
    }

    #[test]
    fn test_traversal_is_rejected() {
        assert!(route_update("../etc/passwd").is_err());
        assert!(route_update("src/../../etc/passwd").is_err());
        assert!(route_generated("/etc/passwd").is_err());
        assert!(read_candidates("public/..").is_err());
        assert!(read_candidates("C:\\Windows").is_err());
    }

    #[test]
    fn test_bare_prefix_is_rejected() {
        assert!(route_update("src/").is_err());
        assert!(route_update("").is_err());
    }

    #[test]
    fn test_strip_subtree_prefix() {
        assert_eq!(strip_subtree_prefix(Subtree::Src, "src/src/App.js"), "App.js");
        assert_eq!(strip_subtree_prefix(Subtree::Src, "App.js"), "App.js");
        assert_eq!(
            strip_subtree_prefix(Subtree::Public, "src/index.html"),
            "src/index.html"
        );
    }

    #[test]
    fn test_logical_path() {
        assert_eq!(Subtree::Public.logical_path("index.html"), "public/index.html");
        assert_eq!(Subtree::Src.logical_path("a/b.js"), "src/a/b.js");
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("index.html"), "text/html; charset=utf-8");
        assert_eq!(content_type_for("src/App.CSS"), "text/css; charset=utf-8");
        assert_eq!(content_type_for("src/App.js"), "text/javascript; charset=utf-8");
        assert_eq!(content_type_for("README"), "application/octet-stream");
    }
}
