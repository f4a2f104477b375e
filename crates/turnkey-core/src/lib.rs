//! Solver TurnKey - bundled native solver libraries, linked on first use.
//!
//! The distributed artifact carries a prebuilt engine library and its binding
//! shim for every supported OS/architecture pair. On first use the loader
//! picks the pair for the running process, unpacks both libraries into a
//! temporary directory that is removed at exit, and links them engine first.
//!
//! # Example
//!
//! ```rust,ignore
//! fn main() -> solver_turnkey::Result<()> {
//!     solver_turnkey::ensure_loaded()?;
//!     println!("{}", solver_turnkey::native::full_version()?);
//!     Ok(())
//! }
//! ```

pub mod cleanup;
pub mod config;
pub mod error;
pub mod extract;
pub mod linker;
pub mod loader;
pub mod native;
pub mod platform;
pub mod resources;

// Re-export commonly used types
pub use cleanup::{CleanupRegistrar, CleanupRegistry, ExitCleanup};
pub use config::{LibrarySet, LoaderConfig, ProbeConfig};
pub use error::{LoaderError, PlatformComponent, Result};
pub use extract::extract;
pub use linker::{Linker, NativeLibrary, SystemLinker};
pub use loader::{
    ExtractedArtifact, LoadedLibraries, LoaderState, NativeLoader, NativeLoaderBuilder,
};
pub use native::EngineVersion;
pub use platform::{CpuArchitecture, HostInfo, OperatingSystem, Platform};
pub use resources::{
    resource_path, target_file_name, DirectoryResources, EmbeddedResources, LibraryDescriptor,
    LibraryRole, ResourceProvider, StaticResources,
};

use std::sync::LazyLock;

static GLOBAL_LOADER: LazyLock<NativeLoader> = LazyLock::new(NativeLoader::new);

/// The process-wide loader for the embedded libraries.
///
/// It is never dropped, so libraries it links stay linked until exit.
pub fn global() -> &'static NativeLoader {
    &GLOBAL_LOADER
}

/// Link the embedded engine and shim into this process, once.
pub fn ensure_loaded() -> Result<()> {
    global().ensure_loaded()
}
