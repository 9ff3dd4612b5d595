//! Whole-file, write-once output.
//!
//! Every artifact is staged in a temporary file next to its destination and
//! then linked into place only if nothing exists there yet. A reader never
//! sees a half-written file and an existing file is never replaced.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{Error, Result};

/// Result of a write-once operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The file was created.
    Written(PathBuf),
    /// The file already existed and was left untouched.
    AlreadyExists(PathBuf),
}

impl WriteOutcome {
    /// The destination path.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Written(path) | Self::AlreadyExists(path) => path,
        }
    }

    /// Whether this call created the file.
    #[must_use]
    pub fn is_written(&self) -> bool {
        matches!(self, Self::Written(_))
    }
}

/// Write `bytes` to `path` unless it already exists.
///
/// # Errors
///
/// Returns an I/O error if staging or persisting the file fails for any reason
/// other than the destination already existing.
pub fn write_new(path: &Path, bytes: &[u8]) -> Result<WriteOutcome> {
    if path.exists() {
        return Ok(WriteOutcome::AlreadyExists(path.to_path_buf()));
    }

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut staged = NamedTempFile::new_in(dir)?;
    staged.write_all(bytes)?;
    staged.as_file().sync_all()?;

    match staged.persist_noclobber(path) {
        Ok(_) => Ok(WriteOutcome::Written(path.to_path_buf())),
        Err(err) if err.error.kind() == std::io::ErrorKind::AlreadyExists => {
            Ok(WriteOutcome::AlreadyExists(path.to_path_buf()))
        }
        Err(err) => Err(Error::Io(err.error)),
    }
}
