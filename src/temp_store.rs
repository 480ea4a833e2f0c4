//! # Temporary File Store
//!
//! Scratch files that hold a downloaded image for the length of one
//! handler invocation.
//!
//! A [`ScratchFile`] is created by [`acquire`] and should be handed back to
//! [`release`] once the invocation is done. Release never fails from the
//! caller's point of view: deletion problems are logged and swallowed so they
//! cannot hide the outcome of the actual processing. If a handle is dropped
//! without being released (early return, panic), the file is still removed.

use std::io;
use std::path::Path;

use tempfile::TempPath;
use tracing::{debug, error};

const FILE_PREFIX: &str = "geolocator-";

/// Exclusively owned scratch file
#[derive(Debug)]
pub struct ScratchFile {
    path: TempPath,
}

impl ScratchFile {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Create a new uniquely named scratch file with the given suffix (e.g. `".jpg"`)
pub fn acquire(suffix: &str) -> io::Result<ScratchFile> {
    let file = tempfile::Builder::new()
        .prefix(FILE_PREFIX)
        .suffix(suffix)
        .tempfile()?;
    let path = file.into_temp_path();
    debug!(temp_path = %path.display(), "Scratch file acquired");
    Ok(ScratchFile { path })
}

/// Delete the scratch file if it still exists
pub fn release(handle: ScratchFile) {
    let shown = handle.path.display().to_string();
    match handle.path.close() {
        Ok(()) => debug!(temp_path = %shown, "Temporary file cleaned up successfully"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(temp_path = %shown, "Temporary file was already gone")
        }
        Err(e) => {
            error!(temp_path = %shown, error = %e, "Failed to clean up temporary file")
        }
    }
}
