//! # soundtouch-binding
//!
//! Host-facing facade of the SoundTouch SDK: device add/remove lifecycle
//! over a shared [`DeviceRegistry`], plus logging initialization for
//! embedding applications.
//!
//! A host platform creates one [`SoundTouchBinding`] per process, adds a
//! device per configured speaker, and routes user commands to the returned
//! [`DeviceSession`] handles. State flows back through the
//! [`PlatformHandle`] the host supplies for each device.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use soundtouch_binding::{LoggingMode, SoundTouchBinding};
//! use soundtouch_session::{Channel, Command, DeviceConfig};
//!
//! soundtouch_binding::init_logging(LoggingMode::Development)?;
//!
//! let binding = SoundTouchBinding::new();
//! let config = DeviceConfig::new("00112233AABB", "192.168.1.20").with_name("Kitchen");
//! let session = binding.add_device(config, platform).await?;
//!
//! session.handle_command(Channel::Volume, Command::Percent(35));
//! ```

pub mod error;
pub mod logging;

use std::sync::Arc;

use soundtouch_session::{
    DeviceConfig, DeviceId, DeviceRegistry, DeviceSession, PlatformHandle, Transport, WsTransport,
};

pub use error::{BindingError, BindingResult};
pub use logging::{init_logging, init_logging_from_env, LoggingError, LoggingMode};

/// Entry point wiring device sessions to a host automation platform.
///
/// Owns the process-wide registry that zone commands resolve peers through;
/// every session created by [`add_device`](Self::add_device) shares it.
pub struct SoundTouchBinding {
    registry: Arc<DeviceRegistry>,
    transport: Arc<dyn Transport>,
}

impl SoundTouchBinding {
    /// A binding speaking the production WebSocket transport.
    pub fn new() -> Self {
        Self::with_transport(Arc::new(WsTransport))
    }

    /// A binding over a caller-supplied transport.
    ///
    /// Tests substitute a scripted transport here; everything above the
    /// transport behaves identically.
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self {
            registry: Arc::new(DeviceRegistry::new()),
            transport,
        }
    }

    /// Register a device and open its session.
    ///
    /// The session is registered before the connection attempt, so zone
    /// commands from peers can resolve it immediately; a failed attempt
    /// leaves the session registered and Offline, retrying on its next
    /// command.
    pub async fn add_device(
        &self,
        config: DeviceConfig,
        platform: Arc<dyn PlatformHandle>,
    ) -> BindingResult<DeviceSession> {
        let id = config.device_id.clone();
        if self.registry.lookup(&id).is_some() {
            return Err(BindingError::DeviceAlreadyRegistered(id));
        }
        let session =
            DeviceSession::spawn(config, platform, Arc::clone(&self.transport), &self.registry);
        self.registry.register(session.clone());
        tracing::info!(device = %id, "device added");
        session.open_connection().await;
        Ok(session)
    }

    /// Remove a device: unregister its session and tear it down.
    pub async fn remove_device(&self, id: &DeviceId) -> BindingResult<()> {
        let session = self
            .registry
            .remove(id)
            .ok_or_else(|| BindingError::UnknownDevice(id.clone()))?;
        session.dispose().await;
        tracing::info!(device = %id, "device removed");
        Ok(())
    }

    /// The session for a device, if it is registered.
    pub fn device(&self, id: &DeviceId) -> Option<DeviceSession> {
        self.registry.lookup(id)
    }

    /// Ids of every registered device.
    pub fn device_ids(&self) -> Vec<DeviceId> {
        self.registry.all().into_iter().map(|(id, _)| id).collect()
    }

    /// The registry shared by this binding's sessions.
    pub fn registry(&self) -> &Arc<DeviceRegistry> {
        &self.registry
    }
}

impl Default for SoundTouchBinding {
    fn default() -> Self {
        Self::new()
    }
}
