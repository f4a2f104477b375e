//! Bundled library lookup.
//!
//! Libraries are addressed by a logical resource path of the form
//! `/native/<os>-<arch>/lib<name>.<ext>`. A [`ResourceProvider`] turns such a
//! path into a byte stream, wherever the bytes actually live.

pub mod directory;
pub mod embedded;

pub use directory::DirectoryResources;
pub use embedded::EmbeddedResources;

use crate::config::LoaderConfig;
use crate::error::Result;
use crate::platform::Platform;
use std::collections::HashMap;
use std::fmt;
use std::io::Read;

/// Which of the two bundled libraries a descriptor refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LibraryRole {
    /// The solver engine.
    Engine,
    /// The binding shim, which links against the engine.
    Shim,
}

impl LibraryRole {
    /// Both roles, in link order.
    pub const LOAD_ORDER: [LibraryRole; 2] = [LibraryRole::Engine, LibraryRole::Shim];

    /// Position of this role in [`LibraryRole::LOAD_ORDER`].
    pub const fn load_index(self) -> usize {
        match self {
            LibraryRole::Engine => 0,
            LibraryRole::Shim => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LibraryRole::Engine => "engine",
            LibraryRole::Shim => "shim",
        }
    }
}

impl fmt::Display for LibraryRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Get the expected library file name for a platform, e.g. `libz3.so`.
///
/// The `lib` prefix is used on every OS, including Windows.
pub fn target_file_name(platform: Platform, library: &str) -> String {
    format!(
        "{}{}.{}",
        LoaderConfig::LIBRARY_PREFIX,
        library,
        platform.library_extension()
    )
}

/// Get the expected resource path of a library, e.g. `/native/linux-amd64/libz3.so`.
pub fn resource_path(platform: Platform, library: &str) -> String {
    format!(
        "/{}/{}/{}",
        LoaderConfig::RESOURCE_ROOT,
        platform.directory_name(),
        target_file_name(platform, library)
    )
}

/// A bundled library as seen from one platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryDescriptor {
    pub role: LibraryRole,
    pub name: String,
    pub platform: Platform,
}

impl LibraryDescriptor {
    pub fn new(platform: Platform, role: LibraryRole, name: impl Into<String>) -> Self {
        Self {
            role,
            name: name.into(),
            platform,
        }
    }

    pub fn resource_path(&self) -> String {
        resource_path(self.platform, &self.name)
    }

    pub fn target_file_name(&self) -> String {
        target_file_name(self.platform, &self.name)
    }
}

/// An opaque byte-stream provider keyed by logical resource path.
pub trait ResourceProvider: Send + Sync {
    /// Open the resource at `path`.
    ///
    /// Returns `Ok(None)` only if the resource is not bundled. A resource that
    /// exists but cannot be read is an error.
    fn open(&self, path: &str) -> Result<Option<Box<dyn Read + Send + '_>>>;

    /// Check whether a resource is bundled without reading it.
    fn contains(&self, path: &str) -> bool {
        matches!(self.open(path), Ok(Some(_)))
    }
}

/// Resources served from an in-memory `(path, bytes)` table.
#[derive(Debug, Clone, Default)]
pub struct StaticResources {
    entries: HashMap<String, &'static [u8]>,
}

impl StaticResources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a provider from a static table.
    pub fn from_table(table: &[(&str, &'static [u8])]) -> Self {
        let mut resources = Self::new();
        for (path, bytes) in table {
            resources.insert(*path, *bytes);
        }
        resources
    }

    pub fn insert(&mut self, path: impl Into<String>, bytes: &'static [u8]) {
        self.entries.insert(path.into(), bytes);
    }

    /// Add a resource, returning `self` for chaining.
    pub fn with(mut self, path: impl Into<String>, bytes: &'static [u8]) -> Self {
        self.insert(path, bytes);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All bundled resource paths, sorted.
    pub fn paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        paths.sort_unstable();
        paths
    }
}

impl ResourceProvider for StaticResources {
    fn open(&self, path: &str) -> Result<Option<Box<dyn Read + Send + '_>>> {
        Ok(self
            .entries
            .get(path)
            .map(|bytes| Box::new(*bytes) as Box<dyn Read + Send>))
    }

    fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{CpuArchitecture, OperatingSystem};

    #[test]
    fn test_target_file_name_per_os() {
        let cases = [
            (OperatingSystem::MacOs, "libz3.dylib"),
            (OperatingSystem::Linux, "libz3.so"),
            (OperatingSystem::Windows, "libz3.dll"),
        ];

        for (os, expected) in cases {
            let platform = Platform::new(os, CpuArchitecture::Amd64);
            assert_eq!(target_file_name(platform, "z3"), expected);
        }
    }

    #[test]
    fn test_resource_path_layout() {
        let platform = Platform::new(OperatingSystem::Windows, CpuArchitecture::X86);
        assert_eq!(
            resource_path(platform, "z3java"),
            "/native/windows-x86/libz3java.dll"
        );

        let platform = Platform::new(OperatingSystem::MacOs, CpuArchitecture::Aarch64);
        assert_eq!(
            resource_path(platform, "z3"),
            "/native/osx-aarch64/libz3.dylib"
        );
    }

    #[test]
    fn test_locator_is_pure() {
        for platform in Platform::ALL {
            for name in ["z3", "z3java", "engine"] {
                assert_eq!(
                    target_file_name(platform, name),
                    target_file_name(platform, name)
                );
                assert_eq!(resource_path(platform, name), resource_path(platform, name));

                let file_name = target_file_name(platform, name);
                assert!(file_name.starts_with("lib"));
                assert!(file_name.ends_with(&format!(".{}", platform.os.library_extension())));
                assert!(resource_path(platform, name).ends_with(&file_name));
            }
        }
    }

    #[test]
    fn test_descriptor_matches_free_functions() {
        let platform = Platform::new(OperatingSystem::Linux, CpuArchitecture::Aarch64);
        let descriptor = LibraryDescriptor::new(platform, LibraryRole::Shim, "z3java");

        assert_eq!(descriptor.resource_path(), resource_path(platform, "z3java"));
        assert_eq!(descriptor.target_file_name(), "libz3java.so");
    }

    #[test]
    fn test_load_index_matches_load_order() {
        for (index, role) in LibraryRole::LOAD_ORDER.iter().enumerate() {
            assert_eq!(role.load_index(), index, "{role}");
        }
    }

    #[test]
    fn test_static_resources() {
        let resources = StaticResources::new()
            .with("/native/linux-amd64/libz3.so", b"engine bytes")
            .with("/native/linux-amd64/libz3java.so", b"shim bytes");

        assert_eq!(resources.len(), 2);
        assert!(resources.contains("/native/linux-amd64/libz3.so"));
        assert!(resources.open("/native/linux-x86/libz3.so").unwrap().is_none());

        let mut contents = String::new();
        resources
            .open("/native/linux-amd64/libz3java.so")
            .unwrap()
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        assert_eq!(contents, "shim bytes");
    }
}
