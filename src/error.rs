//! Transport-level error shared by the queue service client and the Zabbix sender.
//!
//! Anything that fails before a well-formed answer comes back from the remote
//! side is a [`TransportError`]. Backend-level rejections of an otherwise
//! successful exchange live in [`crate::zabbix::ProtocolError`].

use std::time::Duration;

use thiserror::Error;

/// Errors raised when a network call to a collaborator fails.
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP request to the queue service failed.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Queue service endpoint is not a valid URL.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    /// Queue service answered with a non-success status.
    #[error("queue service returned status {status}: {code}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Service error code (e.g. `QueueDoesNotExist`).
        code: String,
        /// Human-readable message from the service.
        message: String,
    },

    /// Response body could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Socket I/O error.
    #[error("network error: {0}")]
    Io(#[from] std::io::Error),

    /// The exchange did not finish in time.
    #[error("timeout elapsed after {0:?}")]
    Timeout(Duration),
}
