//! Host environment inspection.
//!
//! Reports the raw operating system name and CPU architecture of the running
//! process. The architecture is the one the process was compiled for, not the
//! kernel's: a 32-bit process on a 64-bit host must link 32-bit libraries.

use super::Platform;
use crate::error::Result;

/// Raw, untrusted platform strings as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostInfo {
    pub os_name: String,
    pub arch: String,
}

impl HostInfo {
    pub fn new(os_name: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os_name: os_name.into(),
            arch: arch.into(),
        }
    }

    /// Inspect the running process.
    ///
    /// # Platform Behavior
    /// - **Linux**: `"Linux"`
    /// - **macOS**: `"Mac OS X"`
    /// - **Windows**: `"Windows"`
    /// - anything else: the Rust target OS name, which [`Platform::identify`] rejects
    pub fn detect() -> Self {
        Self::new(os_name(), arch_name())
    }

    /// Map these strings onto the supported platform matrix.
    pub fn identify(&self) -> Result<Platform> {
        Platform::identify(&self.os_name, &self.arch)
    }
}

fn os_name() -> &'static str {
    #[cfg(target_os = "linux")]
    {
        "Linux"
    }
    #[cfg(target_os = "macos")]
    {
        "Mac OS X"
    }
    #[cfg(target_os = "windows")]
    {
        "Windows"
    }
    #[cfg(not(any(target_os = "linux", target_os = "windows", target_os = "macos")))]
    {
        std::env::consts::OS
    }
}

fn arch_name() -> &'static str {
    match std::env::consts::ARCH {
        // Rust names every 32-bit x86 target `x86`; the shipped binaries are i686.
        "x86" => "i686",
        other => other,
    }
}
