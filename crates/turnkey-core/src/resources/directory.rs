//! Resources served from an unpacked directory tree.
//!
//! The tree has the same layout as the embedded set, rooted one level above
//! `native/`, so `/native/linux-amd64/libz3.so` maps to
//! `<root>/native/linux-amd64/libz3.so`.

use super::ResourceProvider;
use crate::error::{LoaderError, Result};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// A [`ResourceProvider`] backed by files under a root directory.
#[derive(Debug, Clone)]
pub struct DirectoryResources {
    root: PathBuf,
}

impl DirectoryResources {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a logical resource path onto the filesystem.
    ///
    /// Returns `None` for paths that would escape the root.
    pub fn file_path(&self, resource: &str) -> Option<PathBuf> {
        let relative = Path::new(resource.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return None;
        }
        Some(self.root.join(relative))
    }
}

impl ResourceProvider for DirectoryResources {
    fn open(&self, path: &str) -> Result<Option<Box<dyn Read + Send + '_>>> {
        let Some(file_path) = self.file_path(path) else {
            return Ok(None);
        };

        match File::open(&file_path) {
            Ok(file) => {
                let metadata = file
                    .metadata()
                    .map_err(|e| LoaderError::extraction(e, &file_path))?;
                // Directories open fine on Unix but are not resources.
                if metadata.is_file() {
                    Ok(Some(Box::new(BufReader::new(file))))
                } else {
                    Ok(None)
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => {
                debug!("Cannot open bundled resource {}: {}", file_path.display(), e);
                Err(LoaderError::extraction(e, file_path))
            }
        }
    }

    fn contains(&self, path: &str) -> bool {
        self.file_path(path).map(|p| p.is_file()).unwrap_or(false)
    }
}
