//! Project file store
//!
//! Owns the on-disk project tree: `<base>/public` for static assets and
//! `<base>/src` for application sources. Writes are not locked; two requests
//! writing the same logical path race and the last write wins.

use promptforge_core::paths::{
    read_candidates, route_generated, route_update, strip_subtree_prefix, validate_relative,
    InvalidPath, RoutedPath, Subtree,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("File {0} not found")]
    NotFound(String),

    #[error(transparent)]
    InvalidPath(#[from] InvalidPath),

    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

/// Storage contract the generation flow and the HTTP handlers depend on.
pub trait ProjectStore: Send + Sync {
    /// Base directory holding both subtrees.
    fn root(&self) -> &Path;

    /// Create or overwrite a file, creating parent directories as needed.
    fn write(&self, subtree: Subtree, relative: &str, content: &str) -> Result<(), StoreError>;

    fn read_bytes(&self, subtree: Subtree, relative: &str) -> Result<Vec<u8>, StoreError>;

    fn exists(&self, subtree: Subtree, relative: &str) -> bool;

    /// Every file of a subtree, relative to it, `/`-separated and sorted.
    fn list(&self, subtree: Subtree) -> Result<Vec<String>, StoreError>;

    fn read(&self, subtree: Subtree, relative: &str) -> Result<String, StoreError> {
        let bytes = self.read_bytes(subtree, relative)?;
        String::from_utf8(bytes).map_err(|e| StoreError::Io {
            path: subtree.logical_path(relative),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        })
    }

    /// Persist a generated file under the subtree its prefix selects.
    fn write_generated(&self, logical: &str, content: &str) -> Result<RoutedPath, StoreError> {
        let routed = route_generated(logical)?;
        self.write(routed.subtree, &routed.relative, content)?;
        Ok(routed)
    }

    /// Persist a hand-edited file.
    fn write_update(&self, logical: &str, content: &str) -> Result<RoutedPath, StoreError> {
        let routed = route_update(logical)?;
        self.write(routed.subtree, &routed.relative, content)?;
        Ok(routed)
    }

    /// Locate a file by logical path, trying `public` before `src` for
    /// unprefixed names.
    fn locate(&self, logical: &str) -> Result<RoutedPath, StoreError> {
        read_candidates(logical)?
            .into_iter()
            .find(|routed| self.exists(routed.subtree, &routed.relative))
            .ok_or_else(|| StoreError::NotFound(logical.to_string()))
    }

    fn read_logical(&self, logical: &str) -> Result<String, StoreError> {
        let routed = self.locate(logical)?;
        self.read(routed.subtree, &routed.relative)
    }

    /// Logical paths of every file in both subtrees.
    fn list_all(&self) -> Result<Vec<String>, StoreError> {
        let mut files = Vec::new();
        for subtree in Subtree::ALL {
            files.extend(
                self.list(subtree)?
                    .iter()
                    .map(|relative| subtree.logical_path(relative)),
            );
        }
        Ok(files)
    }
}

/// [`ProjectStore`] backed by the local filesystem.
#[derive(Debug, Clone)]
pub struct FsProjectStore {
    base: PathBuf,
}

impl FsProjectStore {
    /// Create the base directory and both subtrees if they are missing.
    pub fn setup(base: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let base = base.into();

        for subtree in Subtree::ALL {
            let dir = base.join(subtree.dir_name());
            fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;
        }

        log::info!("Project structure ready at {}", base.display());
        Ok(Self { base })
    }

    fn subtree_dir(&self, subtree: Subtree) -> PathBuf {
        self.base.join(subtree.dir_name())
    }

    fn resolve(&self, subtree: Subtree, relative: &str) -> Result<PathBuf, StoreError> {
        let relative = strip_subtree_prefix(subtree, relative.trim());
        validate_relative(relative)?;
        Ok(self.subtree_dir(subtree).join(relative))
    }
}

impl ProjectStore for FsProjectStore {
    fn root(&self) -> &Path {
        &self.base
    }

    fn write(&self, subtree: Subtree, relative: &str, content: &str) -> Result<(), StoreError> {
        let path = self.resolve(subtree, relative)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }
        fs::write(&path, content).map_err(|e| StoreError::io(&path, e))?;

        log::info!("Saved file to {}", path.display());
        Ok(())
    }

    fn read_bytes(&self, subtree: Subtree, relative: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.resolve(subtree, relative)?;

        if !path.is_file() {
            return Err(StoreError::NotFound(subtree.logical_path(relative)));
        }
        fs::read(&path).map_err(|e| StoreError::io(&path, e))
    }

    fn exists(&self, subtree: Subtree, relative: &str) -> bool {
        self.resolve(subtree, relative)
            .map(|path| path.is_file())
            .unwrap_or(false)
    }

    fn list(&self, subtree: Subtree) -> Result<Vec<String>, StoreError> {
        let dir = self.subtree_dir(subtree);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in walkdir::WalkDir::new(&dir) {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(dir.as_path()).to_path_buf();
                StoreError::io(&path, e.into())
            })?;

            if !entry.file_type().is_file() {
                continue;
            }

            if let Ok(relative) = entry.path().strip_prefix(&dir) {
                let parts: Vec<String> = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect();
                files.push(parts.join("/"));
            }
        }

        files.sort();
        Ok(files)
    }
}
