//! Error types for the binding facade

use soundtouch_session::DeviceId;
use thiserror::Error;

/// Errors surfaced by device add/remove lifecycle operations
#[derive(Error, Debug)]
pub enum BindingError {
    /// A session already exists for this device id
    #[error("device {0} is already registered")]
    DeviceAlreadyRegistered(DeviceId),

    /// No session exists for this device id
    #[error("unknown device: {0}")]
    UnknownDevice(DeviceId),
}

/// Result type alias for binding operations
pub type BindingResult<T> = Result<T, BindingError>;
