//! Error types for engine operations.

use std::io;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur during engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Opening or reading a file failed.
    #[error("read failed: {0}")]
    Read(#[source] io::Error),

    /// Creating, opening or writing a file failed.
    #[error("write failed: {0}")]
    Write(#[source] io::Error),

    /// Removing a file failed.
    #[error("purge failed: {0}")]
    Purge(#[source] io::Error),

    /// The lock system reported an error other than contention.
    #[error("lock failed: {0}")]
    Lock(#[source] io::Error),

    /// The lock could not be acquired before the configured deadline.
    #[error("lock timeout")]
    LockTimeout,

    /// The operation was cancelled while waiting for a lock.
    #[error("operation cancelled")]
    Cancelled,
}
