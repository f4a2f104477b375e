//! Smoke test of the embedded libraries.

use anyhow::{bail, Context, Result};
use serde::Serialize;
use solver_turnkey::{ExtractedArtifact, NativeLoader};
use std::path::PathBuf;
use tracing::info;

/// What a successful probe found.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    pub platform: String,
    pub full_version: String,
    pub version: String,
    pub artifacts: Vec<ArtifactReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArtifactReport {
    pub role: String,
    pub path: PathBuf,
    pub size: u64,
}

impl From<&ExtractedArtifact> for ArtifactReport {
    fn from(artifact: &ExtractedArtifact) -> Self {
        Self {
            role: artifact.role.to_string(),
            path: artifact.path.clone(),
            size: artifact.size,
        }
    }
}

/// Load the libraries through `loader` and ask the engine for its version.
pub fn probe(loader: &NativeLoader, expect_version: Option<&str>) -> Result<ProbeReport> {
    let libraries = loader
        .libraries()
        .context("Failed to load the bundled native libraries")?;
    let full_version = loader
        .full_version()
        .context("Failed to query the engine version")?;
    let version = loader
        .version()
        .context("Failed to query the engine version numbers")?;

    if let Some(expected) = expect_version {
        check_version(&full_version, expected)?;
    }
    info!("Engine {} loaded for {}", full_version, libraries.platform());

    Ok(ProbeReport {
        platform: libraries.platform().to_string(),
        full_version,
        version: version.to_string(),
        artifacts: libraries.artifacts().iter().map(ArtifactReport::from).collect(),
    })
}

/// Fail unless the reported version mentions `expected`.
pub fn check_version(full_version: &str, expected: &str) -> Result<()> {
    if !full_version.contains(expected) {
        bail!(
            "Engine reports version '{}', expected '{}'",
            full_version,
            expected
        );
    }
    Ok(())
}
