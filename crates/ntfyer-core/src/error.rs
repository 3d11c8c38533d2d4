//! Error types for ntfyer
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for ntfyer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for ntfyer
#[derive(Error, Debug)]
pub enum Error {
    /// The store file, or a property inside it, does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// More than one live record exists for a property
    ///
    /// The store guarantees at most one record per name, so this always
    /// indicates a corrupted store. It is never recovered from.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// A facade write was aborted; the store holds the previous value
    #[error("Failed to write setting '{property}'")]
    ConfigWriteFailed {
        /// Property that was being written
        property: String,
        /// Underlying store failure
        #[source]
        source: Box<Error>,
    },

    /// The notification endpoint answered with something other than 200
    #[error("Notification failed with status {status}: {body}")]
    NotificationFailed {
        /// HTTP status code returned by the endpoint
        status: u16,
        /// Response body, if it could be read
        body: String,
    },

    /// The notification request never got a response
    #[error("Transport error: {0}")]
    TransportError(String),

    /// The backing storage could not be read or written
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an invariant violation error
    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    /// Wrap a store failure as a failed facade write
    pub fn config_write_failed(property: impl Into<String>, source: Error) -> Self {
        Self::ConfigWriteFailed {
            property: property.into(),
            source: Box::new(source),
        }
    }

    /// Create a notification failure from a response status
    pub fn notification_failed(status: u16, body: impl Into<String>) -> Self {
        Self::NotificationFailed {
            status,
            body: body.into(),
        }
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::TransportError(msg.into())
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::StorageUnavailable(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// True for [`Error::NotFound`]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::StorageUnavailable(err.to_string())
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Self::StorageUnavailable(err.to_string())
    }
}
