//! Unpacking of bundled libraries onto disk.
//!
//! The copy is chunked so memory use stays bounded no matter how large the
//! library is. The source stream is taken by value and therefore released when
//! this function returns, on success and on every error path alike.

use crate::config::LoaderConfig;
use crate::error::{LoaderError, Result};
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;
use tracing::debug;

/// Copy a library stream to `destination`, byte for byte.
///
/// Returns the number of bytes written. On failure the destination may be
/// partially written; callers register it for exit cleanup before calling.
pub fn extract<R: Read>(mut source: R, destination: &Path) -> Result<u64> {
    let mut out =
        File::create(destination).map_err(|e| LoaderError::extraction(e, destination))?;

    let written = copy_chunked(&mut source, &mut out)
        .map_err(|e| LoaderError::extraction(e, destination))?;

    out.flush()
        .map_err(|e| LoaderError::extraction(e, destination))?;

    debug!("Unpacked {} bytes to {}", written, destination.display());
    Ok(written)
}

fn copy_chunked<R: Read + ?Sized, W: Write + ?Sized>(
    source: &mut R,
    out: &mut W,
) -> io::Result<u64> {
    let mut buffer = vec![0u8; LoaderConfig::EXTRACT_CHUNK_SIZE];
    let mut total = 0u64;

    loop {
        let read = match source.read(&mut buffer) {
            Ok(0) => return Ok(total),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        out.write_all(&buffer[..read])?;
        total += read as u64;
    }
}
