//! Libraries compiled into this crate.
//!
//! `build.rs` scans the native bundle (by default `<crate>/native`, or the
//! directory named by `SOLVER_TURNKEY_NATIVE_DIR` at build time) and embeds the
//! files for the compile target's `<os>-<arch>` directory. A build without a
//! bundle embeds nothing, and loading then reports that no libraries exist for
//! the platform.

use super::{ResourceProvider, StaticResources};
use crate::error::Result;
use std::io::Read;

mod generated {
    include!(concat!(env!("OUT_DIR"), "/embedded_natives.rs"));
}

/// The `(resource path, bytes)` table produced by the build script.
pub fn embedded_table() -> &'static [(&'static str, &'static [u8])] {
    generated::EMBEDDED_NATIVES
}

/// A [`ResourceProvider`] over the libraries embedded at build time.
#[derive(Debug, Clone)]
pub struct EmbeddedResources {
    inner: StaticResources,
}

impl EmbeddedResources {
    pub fn new() -> Self {
        Self {
            inner: StaticResources::from_table(embedded_table()),
        }
    }

    /// All embedded resource paths, sorted.
    pub fn paths(&self) -> Vec<&str> {
        self.inner.paths()
    }
}

impl Default for EmbeddedResources {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceProvider for EmbeddedResources {
    fn open(&self, path: &str) -> Result<Option<Box<dyn Read + Send + '_>>> {
        self.inner.open(path)
    }

    fn contains(&self, path: &str) -> bool {
        self.inner.contains(path)
    }
}
