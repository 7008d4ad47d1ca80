//! Error types for the topology viewer messaging layer
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for topology viewer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the topology viewer
#[derive(Error, Debug)]
pub enum Error {
    /// An entity lookup did not find its subject
    #[error("Not found: {0}")]
    NotFound(String),

    /// An external network model service failed
    #[error("Service error ({service}): {message}")]
    Service {
        /// Service name
        service: String,
        /// Error message
        message: String,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed client request
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// I/O errors (snapshot files, stdio)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a service failure error
    pub fn service(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Service {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_error_names_the_service() {
        let err = Error::service("statistics", "backend unreachable");
        assert_eq!(
            err.to_string(),
            "Service error (statistics): backend unreachable"
        );
    }

    #[test]
    fn anyhow_errors_keep_their_message() {
        let err: Error = anyhow::anyhow!("boom").into();
        assert!(matches!(err, Error::Other(ref m) if m == "boom"));
    }
}
