//! Repacking of upstream solver release archives into the bundle layout.
//!
//! Upstream ships one ZIP per platform, named after a distribution tag
//! (`z3-4.8.9-x64-ubuntu-16.04.zip`) with the libraries under
//! `<top>/bin/lib<name>.<ext>`. The bundle layout is the one `build.rs`
//! embeds: `native/<os>-<arch>/lib<name>.<ext>`.

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use solver_turnkey::{resource_path, target_file_name, LibrarySet, Platform};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Distribution tags used in upstream archive names, and the platform each one ships.
const DISTRIBUTION_TAGS: &[(&str, &str)] = &[
    ("x64-osx", "osx-amd64"),
    ("arm64-osx", "osx-aarch64"),
    ("x64-glibc", "linux-amd64"),
    ("x64-ubuntu", "linux-amd64"),
    ("arm64-glibc", "linux-aarch64"),
    ("x64-win", "windows-amd64"),
    ("x86-win", "windows-x86"),
    ("arm64-win", "windows-aarch64"),
];

/// One library written into the bundle.
#[derive(Debug, Clone, Serialize)]
pub struct BundledLibrary {
    pub library: String,
    /// Path inside the upstream archive.
    pub source: String,
    /// Logical resource path the loader will look up.
    pub resource: String,
    pub path: PathBuf,
    pub size: u64,
}

/// Guess the platform from a distribution tag in the archive's file name.
pub fn infer_platform(archive: &Path) -> Option<Platform> {
    let name = archive.file_name()?.to_str()?;
    DISTRIBUTION_TAGS
        .iter()
        .find(|(tag, _)| name.contains(tag))
        .and_then(|(_, platform)| platform.parse().ok())
}

/// Copy the engine and shim for `platform` out of `archive` into `out`.
pub fn bundle(
    archive: &Path,
    platform: Option<Platform>,
    libraries: &LibrarySet,
    out: &Path,
) -> Result<Vec<BundledLibrary>> {
    let platform = match platform {
        Some(platform) => platform,
        None => infer_platform(archive).ok_or_else(|| {
            anyhow!(
                "Cannot tell the platform of {}; pass --platform",
                archive.display()
            )
        })?,
    };
    info!("Bundling {} for {}", archive.display(), platform);

    let file = File::open(archive)
        .with_context(|| format!("Failed to open archive {}", archive.display()))?;
    let mut reader = zip::ZipArchive::new(file)
        .with_context(|| format!("Invalid zip archive {}", archive.display()))?;

    let mut bundled = Vec::new();
    for library in [&libraries.engine, &libraries.shim] {
        let file_name = target_file_name(platform, library);
        let index = find_library(&mut reader, &file_name)?.ok_or_else(|| {
            anyhow!(
                "Archive {} does not contain bin/{}",
                archive.display(),
                file_name
            )
        })?;

        let resource = resource_path(platform, library);
        let destination = out.join(resource.trim_start_matches('/'));
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let mut entry = reader
            .by_index(index)
            .with_context(|| format!("Failed to read zip entry {}", index))?;
        let source = entry.name().to_string();
        let mut outfile = File::create(&destination)
            .with_context(|| format!("Failed to create {}", destination.display()))?;
        let size = io::copy(&mut entry, &mut outfile)
            .with_context(|| format!("Failed to extract {}", source))?;
        debug!("Wrote {} ({} bytes) from {}", destination.display(), size, source);

        bundled.push(BundledLibrary {
            library: library.clone(),
            source,
            resource,
            path: destination,
            size,
        });
    }

    Ok(bundled)
}

/// Index of the entry at `<anything>/bin/<file_name>`, if any.
fn find_library(reader: &mut zip::ZipArchive<File>, file_name: &str) -> Result<Option<usize>> {
    for i in 0..reader.len() {
        let entry = reader
            .by_index(i)
            .with_context(|| format!("Failed to read zip entry {}", i))?;
        if entry.is_dir() {
            continue;
        }
        let path = match entry.enclosed_name() {
            Some(path) => path,
            None => continue,
        };

        let in_bin = path
            .parent()
            .and_then(|parent| parent.file_name())
            .is_some_and(|dir| dir == "bin");
        if in_bin && path.file_name().is_some_and(|name| name == file_name) {
            return Ok(Some(i));
        }
    }
    Ok(None)
}
