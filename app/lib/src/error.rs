//! Error types for the logzip library.
//!
//! This module defines every error that can stop a run: configuration
//! problems detected before any work starts, worker failures during the
//! parallel phases, and I/O or serialization failures while writing the
//! archive. Per-line extraction failures and matching misses are not errors;
//! they are reported through [`crate::ZipReport`].

use thiserror::Error;

/// Main error type for the logzip library.
///
/// All operations that can fail return `Result<T, LogzipError>`.
#[derive(Debug, Error)]
pub enum LogzipError {
    /// No log format was configured.
    #[error("Log format is required")]
    MissingLogFormat,

    /// The log format could not be turned into a field-splitting regex.
    #[error("Invalid log format '{format}': {message}")]
    InvalidLogFormat {
        /// The offending log format string
        format: String,
        /// Description of the problem
        message: String,
    },

    /// The log format does not declare the `<Content>` field needed for
    /// template matching.
    #[error("Log format '{format}' has no <Content> field, required at level {level}")]
    MissingContentField {
        /// The offending log format string
        format: String,
        /// The requested compression level
        level: u8,
    },

    /// Compression level outside 1..=3.
    #[error("Unsupported compression level {level} (expected 1, 2 or 3)")]
    UnsupportedLevel {
        /// The requested level
        level: u8,
    },

    /// Unknown archive kernel name.
    #[error("Unsupported archive kernel '{0}' (expected gz, bz2, lzma or zst)")]
    UnsupportedKernel(String),

    /// The template list was empty or missing.
    #[error("Template list is empty")]
    EmptyTemplates,

    /// A worker of a parallel phase failed; the whole batch is aborted.
    #[error("Worker failure during {phase}: {message}")]
    WorkerFailure {
        /// Name of the parallel phase
        phase: &'static str,
        /// Panic payload or pool construction error
        message: String,
    },

    /// A dictionary-coded cell referenced a code missing from the mapping.
    #[error("Unknown dictionary code '{code}' (mapping has {size} entries)")]
    UnknownDictionaryCode {
        /// The code that was not found
        code: String,
        /// The size of the mapping
        size: usize,
    },

    /// The archive could not be read back.
    #[error("Archive error in '{path}': {message}")]
    Archive {
        /// Path of the archive
        path: String,
        /// Description of the problem
        message: String,
    },

    /// JSON (de)serialization error.
    ///
    /// Wraps errors from the `serde_json` crate.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    ///
    /// Wraps errors from standard I/O operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Type alias for Results using `LogzipError`.
pub type Result<T> = std::result::Result<T, LogzipError>;
