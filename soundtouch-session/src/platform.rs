//! Boundary to the host automation platform.

use crate::types::{Channel, DeviceStatus, StateValue, StatusDetail};

/// Outbound interface a host platform implements for one device.
///
/// The session calls these from its own tasks; implementations must be
/// cheap and non-blocking (hand off to the platform's own machinery if
/// delivery is slow).
pub trait PlatformHandle: Send + Sync {
    /// Push a new value for a channel, for display or automation.
    fn update_state(&self, channel: Channel, value: StateValue);

    /// Report the device's availability, with a machine-readable detail and
    /// an optional human-readable message.
    fn update_status(&self, status: DeviceStatus, detail: StatusDetail, message: Option<String>);
}
