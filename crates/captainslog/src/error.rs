//! Error types for captainslog.
//!
//! This module defines all error types used throughout the captainslog crate.
//! Variants are grouped by the pipeline stage that produces them so callers
//! can decide between skipping a cycle, skipping a screenshot, or aborting.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for captainslog operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    /// A directory or file required at startup does not exist.
    #[error("{what} not found at {path}")]
    MissingPath {
        /// Human-readable name of the missing item.
        what: &'static str,
        /// Where it was expected.
        path: PathBuf,
    },

    // === Status Errors ===
    /// The status file could not be read at all.
    #[error("failed to read status file {path}: {source}")]
    StatusRead {
        /// Path to the status file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The status file stayed malformed for every read attempt.
    #[error("status file {path} still malformed after {attempts} attempts")]
    StatusCorrupt {
        /// Path to the status file.
        path: PathBuf,
        /// Number of attempts made.
        attempts: u32,
    },

    /// The status file is well-formed JSON but not a status object.
    #[error("status file {path} has unexpected contents: {source}")]
    StatusSchema {
        /// Path to the status file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: serde_json::Error,
    },

    // === Journal Errors ===
    /// No journal file exists in the journal directory.
    #[error("no journal files found in {dir}")]
    NoJournal {
        /// The directory that was searched.
        dir: PathBuf,
    },

    /// A journal file could not be read.
    #[error("failed to read journal {path}: {source}")]
    JournalRead {
        /// Path to the journal file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Image Errors ===
    /// Decoding or encoding an image failed.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// Writing a PNG container failed.
    #[error("PNG encoding failed: {0}")]
    PngEncode(#[from] png::EncodingError),

    /// The configured overlay font could not be read.
    #[error("overlay font not found at {path}")]
    FontUnavailable {
        /// Path to the font file.
        path: PathBuf,
    },

    /// A font file exists but could not be parsed.
    #[error("invalid font file {path}")]
    FontInvalid {
        /// Path to the font file.
        path: PathBuf,
    },

    /// Moving a file to the trash failed.
    #[error("failed to move {path} to trash: {message}")]
    Trash {
        /// Path of the file.
        path: PathBuf,
        /// Description of what went wrong.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for captainslog operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a config validation error.
    #[must_use]
    pub fn config_validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
        }
    }

    /// Check if this error only means "no status this cycle".
    ///
    /// The game may be mid-rewrite or not running; the next screenshot can
    /// still succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::StatusCorrupt { .. } | Self::StatusRead { .. })
    }

    /// Check if this error is a startup configuration problem.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigLoad(_) | Self::ConfigValidation { .. } | Self::MissingPath { .. }
        )
    }
}
