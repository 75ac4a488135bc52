//! Error types for formrelay.
//!
//! This module defines all error types used throughout the formrelay crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// The main error type for formrelay operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to read the record file.
    #[error("failed to read record file {path}: {source}")]
    StorageRead {
        /// Path to the record file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write the record file.
    #[error("failed to write record file {path}: {source}")]
    StorageWrite {
        /// Path to the record file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The record file does not hold a valid record document.
    #[error("record file {path} is corrupt: {source}")]
    StorageCorrupt {
        /// Path to the record file.
        path: PathBuf,
        /// The underlying parse error.
        #[source]
        source: serde_json::Error,
    },

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

    // === Relay Errors ===
    /// A payload exceeds the relay's datagram bound.
    #[error("payload of {size} bytes exceeds relay limit of {max} bytes")]
    PayloadTooLarge {
        /// Size of the rejected payload.
        size: usize,
        /// Configured maximum payload size.
        max: usize,
    },

    /// Failed to bind a socket.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address that could not be bound.
        addr: SocketAddr,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Sending or receiving on the relay failed.
    #[error("relay error: {0}")]
    Relay(String),

    // === Form Errors ===
    /// A submitted form body could not be parsed.
    #[error("malformed form body: {message}")]
    FormParse {
        /// Description of what went wrong.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for formrelay operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new form parse error.
    #[must_use]
    pub fn form_parse(message: impl Into<String>) -> Self {
        Self::FormParse {
            message: message.into(),
        }
    }

    /// Create a new relay error.
    #[must_use]
    pub fn relay(message: impl Into<String>) -> Self {
        Self::Relay(message.into())
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this error came from a malformed submission.
    #[must_use]
    pub fn is_form_error(&self) -> bool {
        matches!(self, Self::FormParse { .. })
    }

    /// Check if this error is an oversize payload rejection.
    #[must_use]
    pub fn is_payload_too_large(&self) -> bool {
        matches!(self, Self::PayloadTooLarge { .. })
    }

    /// Check if this error means the record file cannot be trusted.
    #[must_use]
    pub fn is_corrupt_storage(&self) -> bool {
        matches!(self, Self::StorageCorrupt { .. })
    }
}
