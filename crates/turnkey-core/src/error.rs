//! Error types for the native library loader.
//!
//! Every failure the loader can produce is recorded as its permanent terminal
//! state and handed back to each later caller, so the error type is `Clone`.
//! Underlying I/O errors are shared through `Arc` to make that possible.

use crate::platform::Platform;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Main error type for the solver-turnkey loader.
#[derive(Debug, Clone, Error)]
pub enum LoaderError {
    /// The host OS or CPU architecture string is not in the supported set.
    #[error("Unsupported {component}: {value}")]
    UnsupportedPlatform {
        /// Which half of the platform pair was rejected.
        component: PlatformComponent,
        /// The raw string reported by the host.
        value: String,
    },

    /// The platform is known, but this build ships no binaries for it.
    #[error("No native libraries present for {platform}")]
    NoLibrariesForPlatform { platform: Platform },

    /// Exactly one of the two required libraries is bundled.
    #[error(
        "Native library '{missing}' is missing from the distribution for {platform}. This is a packaging error."
    )]
    IncompleteDistribution { platform: Platform, missing: String },

    // File system errors
    #[error("Could not unpack native library to {path:?}: {source}")]
    ExtractionFailed {
        path: PathBuf,
        #[source]
        source: Arc<std::io::Error>,
    },

    // Dynamic linker errors
    #[error("Could not link native library {path:?}: {message}")]
    LinkFailed { path: PathBuf, message: String },

    #[error("Symbol '{symbol}' not found in {library:?}: {message}")]
    SymbolNotFound {
        library: PathBuf,
        symbol: String,
        message: String,
    },

    #[error("Native call '{symbol}' returned null")]
    NullResult { symbol: String },

    #[error("Native library loading panicked before reaching a terminal state")]
    LoaderPanicked,
}

/// Result type alias for loader operations.
pub type Result<T> = std::result::Result<T, LoaderError>;

/// The part of a platform pair named by [`LoaderError::UnsupportedPlatform`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformComponent {
    OperatingSystem,
    CpuArchitecture,
}

impl std::fmt::Display for PlatformComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlatformComponent::OperatingSystem => write!(f, "operating system"),
            PlatformComponent::CpuArchitecture => write!(f, "CPU architecture"),
        }
    }
}

impl LoaderError {
    /// Create an extraction error with path context.
    pub fn extraction(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        LoaderError::ExtractionFailed {
            path: path.into(),
            source: Arc::new(err),
        }
    }

    /// Check if this error should trigger a retry.
    ///
    /// Native linking is not safely repeatable once attempted, so no loader
    /// failure is retryable.
    pub fn is_retryable(&self) -> bool {
        false
    }

    /// True when the failure points at a broken package rather than an
    /// unsupported host.
    pub fn is_packaging_error(&self) -> bool {
        matches!(self, LoaderError::IncompleteDistribution { .. })
    }
}
