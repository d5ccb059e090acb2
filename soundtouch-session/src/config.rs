//! Per-device connection configuration.

use std::time::Duration;

use crate::types::DeviceId;

/// The device's control port. Fixed in firmware, so it is not exposed as a
/// user-facing setting anywhere; tests may still override it.
pub const DEVICE_PORT: u16 = 8080;

/// Configuration for one SoundTouch device.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// The device's hardware address; doubles as its registry key
    pub device_id: DeviceId,
    /// Network address the device is reachable at
    pub host: String,
    /// Control port (see [`DEVICE_PORT`])
    pub port: u16,
    /// Display name used for zone lookups before the device reports one
    pub name: Option<String>,
    /// Input-cycle attempts when converging on BLUETOOTH
    pub bluetooth_switch_attempts: u32,
    /// Input-cycle attempts when converging on AUX
    pub aux_switch_attempts: u32,
    /// Delay between input-cycle attempts
    pub input_poll_interval: Duration,
}

impl DeviceConfig {
    /// Configuration with default protocol settings.
    pub fn new(device_id: impl Into<DeviceId>, host: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            host: host.into(),
            port: DEVICE_PORT,
            name: None,
            bluetooth_switch_attempts: 5,
            aux_switch_attempts: 10,
            input_poll_interval: Duration::from_secs(1),
        }
    }

    /// Set the configured display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// The WebSocket endpoint this device listens on.
    pub fn endpoint_url(&self) -> String {
        format!("ws://{}:{}/", self.host, self.port)
    }
}
