//! Deletion of extracted files at process exit.
//!
//! A linked library stays memory-mapped until the process ends, and some
//! platforms refuse to delete a mapped file. The loader therefore registers
//! each extracted path here, and the registered entries are removed at normal
//! termination in last-in-first-out order. A directory must be registered
//! before the files inside it so that it is removed after them, once empty.
//!
//! Cleanup is best-effort. A process that is killed never runs exit hooks,
//! and any entry that cannot be removed is skipped.

// This module owns the `atexit` FFI boundary.
#![allow(unsafe_code)]

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, Once, PoisonError};
use tracing::{debug, warn};

/// Accepts paths that must be removed when the process exits.
pub trait CleanupRegistrar: Send + Sync {
    /// Schedule `path` for removal at exit.
    fn register_for_cleanup_on_exit(&self, path: &Path);
}

/// An ordered list of paths awaiting removal.
#[derive(Debug, Default)]
pub struct CleanupRegistry {
    entries: Mutex<Vec<PathBuf>>,
}

impl CleanupRegistry {
    pub const fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Append a path. Registering the same path twice keeps the first position.
    pub fn register(&self, path: impl Into<PathBuf>) {
        let path = path.into();
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if !entries.contains(&path) {
            debug!("Scheduled for removal at exit: {}", path.display());
            entries.push(path);
        }
    }

    /// Snapshot of the registered paths, in registration order.
    pub fn entries(&self) -> Vec<PathBuf> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every registered path, newest first, and clear the registry.
    ///
    /// Returns how many entries were actually removed. Never panics.
    pub fn run(&self) -> usize {
        let entries = std::mem::take(
            &mut *self.entries.lock().unwrap_or_else(PoisonError::into_inner),
        );

        let mut removed = 0;
        for path in entries.iter().rev() {
            match remove_entry(path) {
                Ok(true) => {
                    debug!("Removed {}", path.display());
                    removed += 1;
                }
                Ok(false) => {}
                Err(e) => debug!("Could not remove {}: {}", path.display(), e),
            }
        }
        removed
    }
}

impl CleanupRegistrar for CleanupRegistry {
    fn register_for_cleanup_on_exit(&self, path: &Path) {
        self.register(path);
    }
}

/// Remove a file or an empty directory. `Ok(false)` if it was already gone.
fn remove_entry(path: &Path) -> io::Result<bool> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };

    if metadata.is_dir() {
        fs::remove_dir(path)?;
    } else {
        fs::remove_file(path)?;
    }
    Ok(true)
}

static EXIT_REGISTRY: CleanupRegistry = CleanupRegistry::new();
static EXIT_HOOK: Once = Once::new();

/// The process-wide registrar, drained by an `atexit` hook.
///
/// The hook is installed on first registration, so a process that never loads
/// anything never installs it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExitCleanup;

impl ExitCleanup {
    /// The registry drained at exit.
    pub fn registry() -> &'static CleanupRegistry {
        &EXIT_REGISTRY
    }
}

impl CleanupRegistrar for ExitCleanup {
    fn register_for_cleanup_on_exit(&self, path: &Path) {
        install_exit_hook();
        EXIT_REGISTRY.register(path);
    }
}

fn install_exit_hook() {
    EXIT_HOOK.call_once(|| {
        // SAFETY: `run_exit_cleanup` takes no arguments, touches only a
        // `'static` registry, and does not unwind.
        let status = unsafe { libc::atexit(run_exit_cleanup) };
        if status != 0 {
            warn!("Could not install exit hook; extracted native libraries will be left on disk");
        }
    });
}

extern "C" fn run_exit_cleanup() {
    let removed = EXIT_REGISTRY.run();
    debug!("Exit cleanup removed {} entries", removed);
}
