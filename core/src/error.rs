//! Error types for Recipebook

use thiserror::Error;

/// Failure reported by a [`Transport`](crate::Transport).
///
/// The Display form is what the store publishes as its last error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Raised locally before the request reached the network
    #[error("Client-side error: {message}")]
    ClientSide { message: String },

    /// The request went out and the other side (or the wire) failed it
    #[error("Server-side error: {}{message}", status_prefix(.status))]
    ServerSide {
        status: Option<u16>,
        message: String,
    },
}

fn status_prefix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!("{} ", code),
        None => String::new(),
    }
}

impl TransportError {
    pub fn client(message: impl Into<String>) -> Self {
        TransportError::ClientSide {
            message: message.into(),
        }
    }

    pub fn server(status: Option<u16>, message: impl Into<String>) -> Self {
        TransportError::ServerSide {
            status,
            message: message.into(),
        }
    }

    pub fn is_client_side(&self) -> bool {
        matches!(self, TransportError::ClientSide { .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::ServerSide { status, .. } => *status,
            TransportError::ClientSide { .. } => None,
        }
    }
}

/// Main error type for Recipebook
#[derive(Error, Debug)]
pub enum RecipebookError {
    // ============ Transport Errors ============
    #[error(transparent)]
    Transport(#[from] TransportError),

    // ============ Store Errors ============
    #[error("Store is closed")]
    StoreClosed,

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    // ============ Backend Errors ============
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    // ============ Configuration Errors ============
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // ============ General Errors ============
    #[error("Serialization failed: {0}")]
    SerializationError(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<std::io::Error> for RecipebookError {
    fn from(err: std::io::Error) -> Self {
        RecipebookError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for RecipebookError {
    fn from(err: serde_json::Error) -> Self {
        RecipebookError::SerializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_side_message_carries_status() {
        let err = TransportError::server(Some(500), "Internal Server Error");
        assert_eq!(err.to_string(), "Server-side error: 500 Internal Server Error");
        assert_eq!(err.status(), Some(500));
        assert!(!err.is_client_side());
    }

    #[test]
    fn test_server_side_without_status() {
        let err = TransportError::server(None, "connection refused");
        assert_eq!(err.to_string(), "Server-side error: connection refused");
    }

    #[test]
    fn test_client_side_message() {
        let err = TransportError::client("record has no id");
        assert!(err.is_client_side());
        assert_eq!(err.to_string(), "Client-side error: record has no id");

        let wrapped: RecipebookError = err.into();
        assert_eq!(wrapped.to_string(), "Client-side error: record has no id");
    }
}
