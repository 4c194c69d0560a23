//! Error types for rootscan_core.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using rootscan_core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading, writing or scanning a block store.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error occurred during file operations.
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Object file is corrupted or invalid.
    #[error("Corrupted object at {path}: {reason}")]
    CorruptedObject { path: PathBuf, reason: String },

    /// Invalid content identifier format or encoding.
    #[error("Invalid content id: {reason}")]
    InvalidHash { reason: String },

    /// Object not found in store.
    #[error("Object not found: {hash}")]
    ObjectNotFound { hash: String },

    /// Store is invalid or not initialized.
    #[error("Invalid store at {path}: {reason}")]
    InvalidStore { path: PathBuf, reason: String },

    /// Invalid pin name or format.
    #[error("Invalid pin: {reason}")]
    InvalidPin { reason: String },

    /// Pin not found.
    #[error("Pin not found: {name}")]
    PinNotFound { name: String },

    /// Invalid object type.
    #[error("Invalid object type: expected {expected}, got {got}")]
    InvalidObjectType { expected: String, got: String },

    /// Invalid tree entry.
    #[error("Invalid tree entry: {reason}")]
    InvalidTreeEntry { reason: String },

    /// Invalid chunk list payload.
    #[error("Invalid chunk list: {reason}")]
    InvalidChunkList { reason: String },

    /// Invalid raw block payload.
    #[error("Invalid raw block: {reason}")]
    InvalidRawBlock { reason: String },

    /// Compression or decompression failed.
    #[error("Compression error: {reason}")]
    Compression { reason: String },

    /// Unsupported algorithm.
    #[error("Unsupported algorithm: {algorithm}")]
    UnsupportedAlgorithm { algorithm: String },

    /// A link points at an object that is not in the store, so its size is unknown.
    #[error("Unknown size for link {hash}: object not present in store")]
    UnknownLinkSize { hash: String },

    /// Summing node and link sizes overflowed.
    #[error("Size of {hash} overflows u64")]
    SizeOverflow { hash: String },
}

impl Error {
    /// Create a CorruptedObject error.
    pub fn corrupted_object(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::CorruptedObject {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidHash error.
    pub fn invalid_hash(reason: impl Into<String>) -> Self {
        Error::InvalidHash {
            reason: reason.into(),
        }
    }

    /// Create an ObjectNotFound error.
    pub fn object_not_found(hash: impl Into<String>) -> Self {
        Error::ObjectNotFound { hash: hash.into() }
    }

    /// Create an InvalidStore error.
    pub fn invalid_store(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::InvalidStore {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidPin error.
    pub fn invalid_pin(reason: impl Into<String>) -> Self {
        Error::InvalidPin {
            reason: reason.into(),
        }
    }

    /// Create a PinNotFound error.
    pub fn pin_not_found(name: impl Into<String>) -> Self {
        Error::PinNotFound { name: name.into() }
    }

    /// Create an InvalidObjectType error.
    pub fn invalid_object_type(expected: impl Into<String>, got: impl Into<String>) -> Self {
        Error::InvalidObjectType {
            expected: expected.into(),
            got: got.into(),
        }
    }

    /// Create an InvalidTreeEntry error.
    pub fn invalid_tree_entry(reason: impl Into<String>) -> Self {
        Error::InvalidTreeEntry {
            reason: reason.into(),
        }
    }

    /// Create an InvalidChunkList error.
    pub fn invalid_chunk_list(reason: impl Into<String>) -> Self {
        Error::InvalidChunkList {
            reason: reason.into(),
        }
    }

    /// Create an InvalidRawBlock error.
    pub fn invalid_raw_block(reason: impl Into<String>) -> Self {
        Error::InvalidRawBlock {
            reason: reason.into(),
        }
    }

    /// Create a Compression error.
    pub fn compression(reason: impl Into<String>) -> Self {
        Error::Compression {
            reason: reason.into(),
        }
    }

    /// Create an UnsupportedAlgorithm error.
    pub fn unsupported_algorithm(algorithm: impl Into<String>) -> Self {
        Error::UnsupportedAlgorithm {
            algorithm: algorithm.into(),
        }
    }

    /// Create an UnknownLinkSize error.
    pub fn unknown_link_size(hash: impl Into<String>) -> Self {
        Error::UnknownLinkSize { hash: hash.into() }
    }

    /// Create a SizeOverflow error.
    pub fn size_overflow(hash: impl Into<String>) -> Self {
        Error::SizeOverflow { hash: hash.into() }
    }
}

impl From<tempfile::PersistError> for Error {
    fn from(err: tempfile::PersistError) -> Self {
        Error::Io { source: err.error }
    }
}
