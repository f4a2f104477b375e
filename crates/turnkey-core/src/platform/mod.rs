//! Platform identification.
//!
//! This module owns the closed set of (operating system, CPU architecture)
//! pairs that prebuilt libraries ship for. Everything else in the crate works
//! with [`Platform`] values and never compares raw host strings.
//!
//! # Architecture
//!
//! - `host` - Reports the raw OS and architecture strings of the running process
//!
//! # Supported Platforms
//!
//! | OS      | Directory | Extension | Architectures           |
//! |---------|-----------|-----------|-------------------------|
//! | macOS   | `osx`     | `dylib`   | `x86`, `amd64`, `aarch64` |
//! | Linux   | `linux`   | `so`      | `x86`, `amd64`, `aarch64` |
//! | Windows | `windows` | `dll`     | `x86`, `amd64`, `aarch64` |

pub mod host;

pub use host::HostInfo;

use crate::error::{LoaderError, PlatformComponent, Result};
use std::fmt;
use std::str::FromStr;

/// Supported operating systems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatingSystem {
    MacOs,
    Linux,
    Windows,
}

impl OperatingSystem {
    pub const ALL: [OperatingSystem; 3] = [
        OperatingSystem::MacOs,
        OperatingSystem::Linux,
        OperatingSystem::Windows,
    ];

    /// Identify an operating system from a host-reported name.
    ///
    /// Matching is by case-sensitive prefix so that version-qualified names
    /// such as `"Windows 11"` or `"Mac OS X"` are accepted. Hosts report these
    /// names capitalised; `"linux"` or `"darwin"` are rejected.
    pub fn identify(raw: &str) -> Result<Self> {
        const PREFIXES: [(&str, OperatingSystem); 4] = [
            ("Darwin", OperatingSystem::MacOs),
            ("Mac", OperatingSystem::MacOs),
            ("Linux", OperatingSystem::Linux),
            ("Windows", OperatingSystem::Windows),
        ];

        PREFIXES
            .iter()
            .find(|(prefix, _)| raw.starts_with(*prefix))
            .map(|(_, os)| *os)
            .ok_or_else(|| LoaderError::UnsupportedPlatform {
                component: PlatformComponent::OperatingSystem,
                value: raw.to_string(),
            })
    }

    /// Directory name used for this OS in the resource tree.
    pub fn as_str(&self) -> &'static str {
        match self {
            OperatingSystem::MacOs => "osx",
            OperatingSystem::Linux => "linux",
            OperatingSystem::Windows => "windows",
        }
    }

    /// The file name extension for dynamic libraries on this OS.
    pub fn library_extension(&self) -> &'static str {
        match self {
            OperatingSystem::MacOs => "dylib",
            OperatingSystem::Linux => "so",
            OperatingSystem::Windows => "dll",
        }
    }
}

/// Supported CPU architectures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CpuArchitecture {
    /// Intel/AMD 32 bit.
    X86,
    /// Intel/AMD 64 bit.
    Amd64,
    /// ARMv8 64 bit.
    Aarch64,
}

impl CpuArchitecture {
    pub const ALL: [CpuArchitecture; 3] = [
        CpuArchitecture::X86,
        CpuArchitecture::Amd64,
        CpuArchitecture::Aarch64,
    ];

    /// Identify a CPU architecture from an exact host-reported token.
    pub fn identify(raw: &str) -> Result<Self> {
        match raw {
            "i386" | "i686" => Ok(CpuArchitecture::X86),
            "amd64" | "x86_64" => Ok(CpuArchitecture::Amd64),
            "aarch64" => Ok(CpuArchitecture::Aarch64),
            _ => Err(LoaderError::UnsupportedPlatform {
                component: PlatformComponent::CpuArchitecture,
                value: raw.to_string(),
            }),
        }
    }

    /// Directory name used for this architecture in the resource tree.
    pub fn as_str(&self) -> &'static str {
        match self {
            CpuArchitecture::X86 => "x86",
            CpuArchitecture::Amd64 => "amd64",
            CpuArchitecture::Aarch64 => "aarch64",
        }
    }
}

/// A supported (operating system, CPU architecture) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Platform {
    pub os: OperatingSystem,
    pub arch: CpuArchitecture,
}

impl Platform {
    /// Every platform in the supported matrix.
    pub const ALL: [Platform; 9] = [
        Platform::new(OperatingSystem::MacOs, CpuArchitecture::X86),
        Platform::new(OperatingSystem::MacOs, CpuArchitecture::Amd64),
        Platform::new(OperatingSystem::MacOs, CpuArchitecture::Aarch64),
        Platform::new(OperatingSystem::Linux, CpuArchitecture::X86),
        Platform::new(OperatingSystem::Linux, CpuArchitecture::Amd64),
        Platform::new(OperatingSystem::Linux, CpuArchitecture::Aarch64),
        Platform::new(OperatingSystem::Windows, CpuArchitecture::X86),
        Platform::new(OperatingSystem::Windows, CpuArchitecture::Amd64),
        Platform::new(OperatingSystem::Windows, CpuArchitecture::Aarch64),
    ];

    pub const fn new(os: OperatingSystem, arch: CpuArchitecture) -> Self {
        Self { os, arch }
    }

    /// Identify the platform from raw host strings.
    ///
    /// The OS is checked first, so a host with both an unknown OS and an
    /// unknown architecture reports the OS.
    pub fn identify(raw_os: &str, raw_arch: &str) -> Result<Self> {
        let os = OperatingSystem::identify(raw_os)?;
        let arch = CpuArchitecture::identify(raw_arch)?;
        Ok(Self { os, arch })
    }

    /// Identify the platform the current process runs on.
    pub fn current() -> Result<Self> {
        HostInfo::detect().identify()
    }

    /// The `<os>-<arch>` directory name for this platform's libraries.
    pub fn directory_name(&self) -> String {
        format!("{}-{}", self.os.as_str(), self.arch.as_str())
    }

    /// The dynamic library extension of this platform's OS.
    pub fn library_extension(&self) -> &'static str {
        self.os.library_extension()
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os.as_str(), self.arch.as_str())
    }
}

impl FromStr for Platform {
    type Err = LoaderError;

    /// Parse an `<os>-<arch>` directory name such as `linux-amd64`.
    fn from_str(s: &str) -> Result<Self> {
        Platform::ALL
            .iter()
            .find(|platform| platform.directory_name() == s)
            .copied()
            .ok_or_else(|| LoaderError::UnsupportedPlatform {
                component: PlatformComponent::OperatingSystem,
                value: s.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_os_prefix_matching() {
        let cases = [
            ("Mac OS X", OperatingSystem::MacOs),
            ("Darwin", OperatingSystem::MacOs),
            ("MacOS", OperatingSystem::MacOs),
            ("Linux", OperatingSystem::Linux),
            ("Windows 10", OperatingSystem::Windows),
            ("Windows 11", OperatingSystem::Windows),
            ("Windows Server 2022", OperatingSystem::Windows),
        ];

        for (raw, expected) in cases {
            assert_eq!(OperatingSystem::identify(raw).unwrap(), expected, "{raw}");
        }
    }

    #[test]
    fn test_unknown_os_rejected() {
        for raw in ["FreeBSD", "SunOS", "", "Win", " Linux"] {
            let err = OperatingSystem::identify(raw).unwrap_err();
            assert!(
                matches!(
                    err,
                    LoaderError::UnsupportedPlatform {
                        component: PlatformComponent::OperatingSystem,
                        ..
                    }
                ),
                "{raw}"
            );
        }
    }

    #[test]
    fn test_os_matching_is_case_sensitive() {
        for raw in ["LINUX", "linux", "darwin", "macos", "mac os x", "WINDOWS 11", "windows"] {
            assert!(OperatingSystem::identify(raw).is_err(), "{raw}");
        }
        assert!(Platform::identify("linux", "amd64").is_err());
    }

    #[test]
    fn test_architecture_tokens() {
        let cases = [
            ("i386", CpuArchitecture::X86),
            ("i686", CpuArchitecture::X86),
            ("amd64", CpuArchitecture::Amd64),
            ("x86_64", CpuArchitecture::Amd64),
            ("aarch64", CpuArchitecture::Aarch64),
        ];

        for (raw, expected) in cases {
            assert_eq!(CpuArchitecture::identify(raw).unwrap(), expected, "{raw}");
        }
    }

    #[test]
    fn test_unknown_architecture_rejected() {
        // Exact tokens only: no prefixes, no case folding.
        for raw in ["arm64", "x86", "ppc64le", "riscv64", "AMD64", "x86_64 ", ""] {
            let err = CpuArchitecture::identify(raw).unwrap_err();
            assert!(
                matches!(
                    err,
                    LoaderError::UnsupportedPlatform {
                        component: PlatformComponent::CpuArchitecture,
                        ..
                    }
                ),
                "{raw}"
            );
        }
    }

    #[test]
    fn test_identify_pair() {
        let platform = Platform::identify("Windows 11", "x86_64").unwrap();
        assert_eq!(platform.os, OperatingSystem::Windows);
        assert_eq!(platform.arch, CpuArchitecture::Amd64);
        assert_eq!(platform.library_extension(), "dll");
    }

    #[test]
    fn test_identify_is_deterministic() {
        let first = Platform::identify("Linux", "aarch64").unwrap();
        let second = Platform::identify("Linux", "aarch64").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_directory_name_round_trips_through_from_str() {
        for platform in Platform::ALL {
            let name = platform.directory_name();
            assert_eq!(name, platform.to_string());
            assert_eq!(name.parse::<Platform>().unwrap(), platform);
        }
        assert!("linux-arm64".parse::<Platform>().is_err());
    }

    #[test]
    fn test_current_platform() {
        // CI runs on one of the supported hosts.
        #[cfg(all(
            any(target_os = "linux", target_os = "windows", target_os = "macos"),
            any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64")
        ))]
        assert!(Platform::current().is_ok());
    }
}
