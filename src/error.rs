//! Error types and handling for KFS
//!
//! This module defines the error kinds surfaced by every public operation,
//! following §7 of the design: streams emit one of these terminally, and
//! there is no automatic retry.

use thiserror::Error;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Error kinds surfaced by KFS operations
#[derive(Error, Debug)]
pub enum Error {
    /// Key is not 20 bytes / 40 lowercase hex chars
    #[error("bad key: {0}")]
    BadKey(String),

    /// Blob absent on read or per-key stat
    #[error("not found")]
    NotFound,

    /// Admission check failed, or S_max exceeded mid-stream
    #[error("no space: {0}")]
    NoSpace(String),

    /// Engine or filesystem failure; message carries the underlying cause
    #[error("io error: {0}")]
    IOError(String),

    /// Stream aborted by the caller
    #[error("cancelled")]
    Cancelled,

    /// Chunk gap detected during read (violates invariant I1)
    #[error("corrupt blob: {0}")]
    Corrupt(String),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::IOError(e.to_string())
    }
}

impl From<sled::Error> for Error {
    fn from(e: sled::Error) -> Self {
        Error::IOError(e.to_string())
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(e: tokio::task::JoinError) -> Self {
        Error::IOError(format!("task join failed: {e}"))
    }
}
