//! Required files and completeness checking for a generated project.

use crate::blocks::GeneratedFileSet;
use std::collections::HashSet;

/// Logical prefix of static assets.
pub const PUBLIC_PREFIX: &str = "public/";
/// Logical prefix of application sources.
pub const SRC_PREFIX: &str = "src/";

/// Files every generated project must contain.
pub const CANONICAL_FILES: [&str; 6] = [
    "public/index.html",
    "src/App.js",
    "src/index.js",
    "src/App.css",
    "src/index.css",
    "src/server.js",
];

/// Filenames accepted as a backend entry point.
pub const BACKEND_ENTRY_SUFFIXES: [&str; 2] = ["server.js", "main.py"];

/// Path reported when no backend entry point is present.
pub const BACKEND_CANONICAL: &str = "src/server.js";

/// The set of files a generation must produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredFileManifest {
    pub required: Vec<String>,
    pub backend_suffixes: Vec<String>,
    pub backend_canonical: String,
}

impl Default for RequiredFileManifest {
    fn default() -> Self {
        Self {
            required: CANONICAL_FILES.iter().map(|s| s.to_string()).collect(),
            backend_suffixes: BACKEND_ENTRY_SUFFIXES.iter().map(|s| s.to_string()).collect(),
            backend_canonical: BACKEND_CANONICAL.to_string(),
        }
    }
}

impl RequiredFileManifest {
    fn is_backend_entry(&self, path: &str) -> bool {
        self.backend_suffixes
            .iter()
            .any(|suffix| path.ends_with(suffix.as_str()))
    }
}

/// Collapse duplicated `src/src/` or `public/public/` prefixes.
///
/// Any number of repetitions collapse to a single prefix, so the function is
/// idempotent.
pub fn normalize_path(path: &str) -> String {
    let mut path = path.trim().trim_start_matches("./");

    for prefix in [SRC_PREFIX, PUBLIC_PREFIX] {
        while path.starts_with(prefix) && path[prefix.len()..].starts_with(prefix) {
            path = &path[prefix.len()..];
        }
    }

    path.to_string()
}

/// Canonical paths absent from `files`, in manifest order.
///
/// The backend entry point is an OR-rule: any present path ending in one of
/// the backend suffixes satisfies it. When nothing does, the canonical backend
/// path is reported, at most once.
pub fn missing_files(files: &GeneratedFileSet, manifest: &RequiredFileManifest) -> Vec<String> {
    let present: HashSet<String> = files.paths().map(normalize_path).collect();

    let mut missing: Vec<String> = manifest
        .required
        .iter()
        .filter(|required| !present.contains(required.as_str()))
        .cloned()
        .collect();

    let has_backend = present.iter().any(|p| manifest.is_backend_entry(p));
    if !has_backend && !missing.contains(&manifest.backend_canonical) {
        missing.push(manifest.backend_canonical.clone());
    }

    missing
}
