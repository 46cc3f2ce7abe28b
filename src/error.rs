//! Error types
//!
//! Each layer owns an error enum: the binary codec raises [`FormatError`], the
//! tree and name handling raise [`TreeError`], volume resolution raises
//! [`VolumeError`], and the record store wraps all of them in [`StorageError`].
//! [`ApiError`] is the CLI-facing union.
//!
//! None of these are retried. A single malformed record aborts the operation
//! that was reading it.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading or writing the binary crate format.
#[derive(Debug, Error)]
pub enum FormatError {
    /// Fewer bytes were available than a field declares.
    #[error("Truncated input at byte {offset}: expected {expected} bytes, found {found}")]
    TruncatedInput {
        offset: u64,
        expected: usize,
        found: usize,
    },

    /// A literal or fixed constant did not match.
    #[error("Format mismatch at byte {offset}: expected {expected:?}, found {found:?}")]
    FormatMismatch {
        offset: u64,
        expected: String,
        found: String,
    },

    /// Bytes are not valid under the declared text encoding.
    #[error("Invalid {encoding} text at byte {offset}: {reason}")]
    DecodeError {
        offset: u64,
        encoding: &'static str,
        reason: String,
    },

    /// A redundant length field or fixed value failed its arithmetic check.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// A chunk tag appeared where no such section is defined.
    #[error("Unknown section {tag:?} at byte {offset}")]
    UnknownSection { offset: u64, tag: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while building or querying a crate tree.
#[derive(Debug, Error)]
pub enum TreeError {
    /// A crate name or tree edge breaks the prefix/naming rules.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Node not found: {0}")]
    NodeNotFound(String),
}

/// Errors raised while mapping a filesystem path onto a volume.
#[derive(Debug, Error)]
pub enum VolumeError {
    #[error("Cannot determine volume for {path:?}: {reason}")]
    UnresolvableVolume { path: String, reason: String },
}

/// Errors raised by a crate store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// A record failed to decode or encode.
    #[error("Crate {name:?}: {source}")]
    Format {
        name: String,
        #[source]
        source: FormatError,
    },

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error("Directory listing failed: {0}")]
    Listing(#[from] walkdir::Error),

    #[error("Crate not found: {0}")]
    NotFound(String),

    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
}

impl StorageError {
    /// Attach a crate name to a codec error.
    pub fn format(name: impl Into<String>, source: FormatError) -> Self {
        StorageError::Format {
            name: name.into(),
            source,
        }
    }
}

/// Errors surfaced at the command boundary.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("Volume error: {0}")]
    VolumeError(#[from] VolumeError),

    #[error("Tree error: {0}")]
    TreeError(#[from] TreeError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Rendering command output failed.
    #[error("Output error: {0}")]
    OutputError(String),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::OutputError(err.to_string())
    }
}
