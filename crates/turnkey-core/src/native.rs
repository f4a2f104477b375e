//! Calls into the linked engine.
//!
//! The engine is opaque to this crate. It is reached only by resolving an
//! exported symbol to a typed function pointer, plus two version probes used
//! to check that the bundled libraries actually work.

// This module owns the call boundary into the engine.
#![allow(unsafe_code)]

use crate::config::ProbeConfig;
use crate::error::{LoaderError, Result};
use crate::linker::NativeLibrary;
use crate::loader::NativeLoader;
use crate::resources::LibraryRole;
use std::ffi::{c_char, c_uint, c_void, CStr};
use std::fmt;
use std::mem;
use tracing::debug;

type FullVersionFn = unsafe extern "C" fn() -> *const c_char;
type VersionFn = unsafe extern "C" fn(*mut c_uint, *mut c_uint, *mut c_uint, *mut c_uint);

/// Version numbers reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EngineVersion {
    pub major: u32,
    pub minor: u32,
    pub build: u32,
    pub revision: u32,
}

impl fmt::Display for EngineVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.build, self.revision
        )
    }
}

/// Resolve `symbol` in `library` as a function pointer of type `F`.
///
/// # Safety
///
/// `F` must be the `extern "C"` function pointer type matching the export's
/// real signature, and the pointer must not be called after `library` has
/// been unloaded.
pub unsafe fn entry_point<F: Copy>(library: &dyn NativeLibrary, symbol: &str) -> Result<F> {
    let unresolved = |message: &str| LoaderError::SymbolNotFound {
        library: library.path().to_path_buf(),
        symbol: symbol.to_string(),
        message: message.to_string(),
    };

    if mem::size_of::<F>() != mem::size_of::<*const c_void>() {
        return Err(unresolved("entry point type is not pointer-sized"));
    }

    let address = library.symbol_address(symbol)?;
    if address.is_null() {
        return Err(unresolved("symbol resolved to a null address"));
    }

    // SAFETY: `F` has the size of a pointer (checked above), and the caller
    // guarantees it is the function pointer type of this export.
    Ok(unsafe { mem::transmute_copy::<*const c_void, F>(&address) })
}

impl NativeLoader {
    /// Resolve an export of the engine or shim, loading them first if needed.
    ///
    /// # Safety
    ///
    /// Same contract as [`entry_point`]. Libraries stay linked for as long as
    /// this loader lives.
    pub unsafe fn entry_point<F: Copy>(&self, role: LibraryRole, symbol: &str) -> Result<F> {
        let libraries = self.libraries()?;
        // SAFETY: Forwarded to the caller.
        unsafe { entry_point(libraries.library(role), symbol) }
    }

    /// The engine's full version string, e.g. `Z3 4.8.9.0`.
    pub fn full_version(&self) -> Result<String> {
        let libraries = self.libraries()?;
        let symbol = ProbeConfig::FULL_VERSION_SYMBOL;

        // SAFETY: Declared by the engine as `Z3_string Z3_get_full_version(void)`.
        let get_full_version: FullVersionFn = unsafe { entry_point(libraries.engine(), symbol)? };
        // SAFETY: No arguments. The engine stays linked while `libraries` is held.
        let raw = unsafe { get_full_version() };
        if raw.is_null() {
            return Err(LoaderError::NullResult {
                symbol: symbol.to_string(),
            });
        }

        // SAFETY: Non-null, NUL-terminated and owned by the engine for the
        // life of the process. Copied out before returning.
        let version = unsafe { CStr::from_ptr(raw) }
            .to_string_lossy()
            .into_owned();
        debug!("Engine reports full version {}", version);
        Ok(version)
    }

    /// The engine's numeric version.
    pub fn version(&self) -> Result<EngineVersion> {
        let libraries = self.libraries()?;

        // SAFETY: Declared by the engine as
        // `void Z3_get_version(unsigned*, unsigned*, unsigned*, unsigned*)`.
        let get_version: VersionFn =
            unsafe { entry_point(libraries.engine(), ProbeConfig::VERSION_SYMBOL)? };

        let (mut major, mut minor, mut build, mut revision): (c_uint, c_uint, c_uint, c_uint) =
            (0, 0, 0, 0);
        // SAFETY: All four out-pointers are valid, distinct and writable.
        unsafe { get_version(&mut major, &mut minor, &mut build, &mut revision) };

        Ok(EngineVersion {
            major,
            minor,
            build,
            revision,
        })
    }
}

/// Full version of the engine linked by the process-wide loader.
pub fn full_version() -> Result<String> {
    crate::global().full_version()
}

/// Numeric version of the engine linked by the process-wide loader.
pub fn version() -> Result<EngineVersion> {
    crate::global().version()
}
