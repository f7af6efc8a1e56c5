//! Error types for the console client.
//!
//! Every failed [`ApiClient::call`](crate::ApiClient::call) surfaces as an
//! [`ApiError`] carrying an [`ErrorKind`] and the numeric status, so callers can
//! branch on the failure class without parsing messages.
//!
//! | Kind | Status | Hook invoked |
//! |------|--------|--------------|
//! | `Unauthorized` | 401 / 403 | `on_unauthorized` |
//! | `Storm` | 500 | `on_error` |
//! | `Network` | 500 | `on_error` |
//! | `Application` | service status | `on_error` |
//! | `Decode` | envelope status | `on_error` |
//! | `Cancelled` | 499 | none |

use thiserror::Error;

/// Result alias used by client operations.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Status reported for calls abandoned through a [`CancelToken`](crate::client::CancelToken).
pub const CANCELLED_STATUS: u16 = 499;

/// Failure class of an [`ApiError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The service rejected the credential (401 or 403).
    Unauthorized,
    /// The loop guard tripped; no transport was attempted.
    Storm,
    /// The transport never got a response.
    Network,
    /// Any other failure reported by the service.
    Application,
    /// The envelope succeeded but its data did not match the requested type.
    Decode,
    /// The caller cancelled the call before it completed.
    Cancelled,
}

impl ErrorKind {
    /// Lowercase label used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Storm => "storm",
            ErrorKind::Network => "network",
            ErrorKind::Application => "application",
            ErrorKind::Decode => "decode",
            ErrorKind::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed API call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} error (status {status}): {message}")]
pub struct ApiError {
    /// Failure class
    pub kind: ErrorKind,
    /// Numeric status from the envelope
    pub status: u16,
    /// Human-readable message
    pub message: String,
}

impl ApiError {
    /// Create a new error.
    pub fn new(kind: ErrorKind, status: u16, message: impl Into<String>) -> Self {
        ApiError {
            kind,
            status,
            message: message.into(),
        }
    }

    /// Error returned when a [`CancelToken`](crate::client::CancelToken) fires.
    pub fn cancelled() -> Self {
        ApiError::new(ErrorKind::Cancelled, CANCELLED_STATUS, "request cancelled")
    }

    /// Whether this error is an authentication failure.
    pub fn is_unauthorized(&self) -> bool {
        self.kind == ErrorKind::Unauthorized
    }
}

/// Failure at the transport boundary: no response was received at all.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection, DNS, TLS or timeout failure
    #[error("network error: {0}")]
    Network(String),

    /// The request could not be built
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            TransportError::InvalidRequest(err.to_string())
        } else {
            TransportError::Network(err.to_string())
        }
    }
}

/// Failure reading or writing persisted client state.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem failure
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The storage file is not a JSON object of strings
    #[error("storage format error: {0}")]
    Format(#[from] serde_json::Error),

    /// Backend refused the operation
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Invalid client configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration document could not be parsed
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value is out of range
    #[error("invalid config value for {field}: {reason}")]
    Invalid {
        /// Offending field
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },
}
