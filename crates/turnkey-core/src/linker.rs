//! Linking extracted libraries into the running process.
//!
//! [`Linker`] is the seam between the loader and the OS dynamic linker.
//! [`SystemLinker`] is the real implementation. Tests substitute their own.

// This module owns the dlopen/LoadLibrary FFI boundary.
#![allow(unsafe_code)]

use crate::error::{LoaderError, Result};
use std::ffi::c_void;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A library that has been linked into the process.
pub trait NativeLibrary: Send + Sync + fmt::Debug {
    /// The file the library was linked from.
    fn path(&self) -> &Path;

    /// Resolve an exported symbol to its address.
    fn symbol_address(&self, symbol: &str) -> Result<*const c_void>;
}

/// Loads native code from a file into the process.
pub trait Linker: Send + Sync {
    /// Link the library at `path`.
    ///
    /// Implementations must fail if the file is not a valid library for this
    /// process or if its dependencies cannot be resolved.
    fn link(&self, path: &Path) -> Result<Box<dyn NativeLibrary>>;
}

/// The OS dynamic linker, through `libloading`.
///
/// # Platform Behavior
/// - **Linux/macOS**: `dlopen` with `RTLD_NOW | RTLD_GLOBAL`, so a library
///   linked later can bind to this one's exports
/// - **Windows**: `LoadLibraryExW`; dependents find the module by file name
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLinker;

impl Linker for SystemLinker {
    fn link(&self, path: &Path) -> Result<Box<dyn NativeLibrary>> {
        let library = open_library(path).map_err(|e| LoaderError::LinkFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        debug!("Linked {}", path.display());
        Ok(Box::new(SystemLibrary {
            path: path.to_path_buf(),
            library,
        }))
    }
}

#[cfg(unix)]
fn open_library(path: &Path) -> std::result::Result<libloading::Library, libloading::Error> {
    use libloading::os::unix::{Library, RTLD_GLOBAL, RTLD_NOW};

    // SAFETY: Linking runs the library's initializers. The only files passed
    // here are the bundled engine and shim, which are trusted artifacts.
    let library = unsafe { Library::open(Some(path), RTLD_NOW | RTLD_GLOBAL)? };
    Ok(library.into())
}

#[cfg(not(unix))]
fn open_library(path: &Path) -> std::result::Result<libloading::Library, libloading::Error> {
    // SAFETY: See the Unix variant; the same trust assumption applies.
    unsafe { libloading::Library::new(path) }
}

/// A library handle owned by the loader.
///
/// Dropping this unloads the library, so the loader keeps it for as long as
/// any native code may still be called.
#[derive(Debug)]
pub struct SystemLibrary {
    path: PathBuf,
    library: libloading::Library,
}

impl NativeLibrary for SystemLibrary {
    fn path(&self) -> &Path {
        &self.path
    }

    fn symbol_address(&self, symbol: &str) -> Result<*const c_void> {
        // SAFETY: The symbol is read as an opaque address. Nothing is called
        // or dereferenced here; typed access goes through `native::entry_point`.
        let address = unsafe { self.library.get::<*const c_void>(symbol.as_bytes()) }
            .map(|sym| *sym)
            .map_err(|e| LoaderError::SymbolNotFound {
                library: self.path.clone(),
                symbol: symbol.to_string(),
                message: e.to_string(),
            })?;
        Ok(address)
    }
}
