//! Error types for transport operations

use thiserror::Error;

/// Errors surfaced by a transport connection.
///
/// Transport failures are the only errors that change a device's externally
/// visible status; everything above the transport absorbs its own anomalies
/// (logged, ignored).
#[derive(Error, Debug)]
pub enum TransportError {
    /// Opening the connection failed (refused, unreachable, handshake)
    #[error("connection failed: {0}")]
    ConnectFailed(String),

    /// An established connection failed while sending
    #[error("send failed: {0}")]
    SendFailed(String),

    /// Closing the connection failed; logged, never retried
    #[error("close failed: {0}")]
    CloseFailed(String),
}

/// Result type alias for transport operations
pub type TransportResult<T> = Result<T, TransportError>;
