//! Centralized configuration for the native library loader.
//!
//! The core loader has no runtime configuration file or environment variables.
//! Everything it needs is a compile-time constant here, and callers that need
//! something different go through [`crate::NativeLoaderBuilder`].

use crate::resources::LibraryRole;

/// Loader-level configuration.
pub struct LoaderConfig;

impl LoaderConfig {
    /// Top-level directory of the embedded resource tree.
    pub const RESOURCE_ROOT: &'static str = "native";
    /// Prefix of the per-process temporary extraction directory.
    pub const TEMP_DIR_PREFIX: &'static str = "solver-turnkey";
    /// Copy buffer size used when unpacking a library.
    pub const EXTRACT_CHUNK_SIZE: usize = 1 << 13;
    /// File name prefix applied to every bundled library on every OS.
    pub const LIBRARY_PREFIX: &'static str = "lib";
}

/// Names of the bundled engine exports used as probes.
pub struct ProbeConfig;

impl ProbeConfig {
    /// `Z3_string Z3_get_full_version(void)`
    pub const FULL_VERSION_SYMBOL: &'static str = "Z3_get_full_version";
    /// `void Z3_get_version(unsigned*, unsigned*, unsigned*, unsigned*)`
    pub const VERSION_SYMBOL: &'static str = "Z3_get_version";
}

/// Logical names of the two libraries the loader links, in load order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LibrarySet {
    /// The solver engine. Linked first.
    pub engine: String,
    /// The binding shim. Depends on the engine's exports, linked second.
    pub shim: String,
}

impl LibrarySet {
    pub const DEFAULT_ENGINE: &'static str = "z3";
    pub const DEFAULT_SHIM: &'static str = "z3java";

    pub fn new(engine: impl Into<String>, shim: impl Into<String>) -> Self {
        Self {
            engine: engine.into(),
            shim: shim.into(),
        }
    }

    /// The logical name of the library playing `role`.
    pub fn name(&self, role: LibraryRole) -> &str {
        match role {
            LibraryRole::Engine => &self.engine,
            LibraryRole::Shim => &self.shim,
        }
    }
}

impl Default for LibrarySet {
    fn default() -> Self {
        Self::new(Self::DEFAULT_ENGINE, Self::DEFAULT_SHIM)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_library_set() {
        let set = LibrarySet::default();
        assert_eq!(set.engine, "z3");
        assert_eq!(set.shim, "z3java");
        assert_eq!(set.name(LibraryRole::Engine), "z3");
        assert_eq!(set.name(LibraryRole::Shim), "z3java");
    }

    #[test]
    fn test_chunk_size_is_nonzero() {
        assert!(LoaderConfig::EXTRACT_CHUNK_SIZE > 0);
    }
}
