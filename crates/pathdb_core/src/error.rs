//! Error types for store operations.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Low-level engine failure (read, write, lock timeout, cancellation).
    #[error(transparent)]
    Engine(#[from] pathdb_engine::EngineError),

    /// Neither the primary nor the backup copy of the record exists.
    #[error("record does not exist")]
    NotExist,

    /// A stored payload could not be decoded from JSON.
    #[error("decode failed: {0}")]
    Decode(#[from] serde_json::Error),

    /// A payload could not be encoded to JSON for writing.
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// A secure operation was called before a cipher was installed.
    #[error("security not configured")]
    NoSecurity,

    /// Encryption failed.
    #[error("encryption failed: {message}")]
    EncryptionFailed {
        /// Description of the failure.
        message: String,
    },

    /// Decryption failed (wrong key, tampered or truncated ciphertext).
    #[error("decryption failed: {message}")]
    DecryptionFailed {
        /// Description of the failure.
        message: String,
    },

    /// A cipher key could not be derived from the given secret.
    #[error("key derivation failed: {message}")]
    KeyDerivationFailed {
        /// Description of the failure.
        message: String,
    },

    /// The collection root path is unusable.
    #[error("invalid collection path: {path}")]
    InvalidPath {
        /// The rejected path.
        path: PathBuf,
    },

    /// A key argument is unusable for the requested operation.
    #[error("invalid key: {message}")]
    InvalidKey {
        /// Description of the problem.
        message: String,
    },

    /// The key resolves to a regular file where a collection was expected.
    #[error("not a collection: {path}")]
    NotADirectory {
        /// The offending path.
        path: PathBuf,
    },

    /// The destination subtree already exists.
    #[error("collection already exists: {path}")]
    AlreadyExists {
        /// The occupied destination path.
        path: PathBuf,
    },

    /// I/O error outside the locked engine paths (listing, copy, purge).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl StoreError {
    /// Creates an encryption failed error.
    pub fn encryption_failed(message: impl Into<String>) -> Self {
        Self::EncryptionFailed {
            message: message.into(),
        }
    }

    /// Creates a decryption failed error.
    pub fn decryption_failed(message: impl Into<String>) -> Self {
        Self::DecryptionFailed {
            message: message.into(),
        }
    }

    /// Creates a key derivation failed error.
    pub fn key_derivation_failed(message: impl Into<String>) -> Self {
        Self::KeyDerivationFailed {
            message: message.into(),
        }
    }

    /// Creates an invalid path error.
    pub fn invalid_path(path: impl Into<PathBuf>) -> Self {
        Self::InvalidPath { path: path.into() }
    }

    /// Creates an invalid key error.
    pub fn invalid_key(message: impl Into<String>) -> Self {
        Self::InvalidKey {
            message: message.into(),
        }
    }

    /// Creates a not-a-collection error.
    pub fn not_a_directory(path: &Path) -> Self {
        Self::NotADirectory {
            path: path.to_path_buf(),
        }
    }

    /// Creates an already-exists error.
    pub fn already_exists(path: &Path) -> Self {
        Self::AlreadyExists {
            path: path.to_path_buf(),
        }
    }
}
