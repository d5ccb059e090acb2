//! # soundtouch-session
//!
//! Device session state machine and zone coordination for Bose SoundTouch
//! speakers. Each [`DeviceSession`] owns one speaker's WebSocket connection,
//! applies the push-style protocol to its own state, and maps host-platform
//! commands to protocol requests. A process-wide [`DeviceRegistry`] links
//! sessions together for multi-room zone grouping.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use soundtouch_session::{
//!     Channel, Command, DeviceConfig, DeviceRegistry, DeviceSession, WsTransport,
//! };
//!
//! let registry = Arc::new(DeviceRegistry::new());
//! let config = DeviceConfig::new("00112233AABB", "192.168.1.20").with_name("Kitchen");
//! let session = DeviceSession::spawn(config, platform, Arc::new(WsTransport), &registry);
//! session.open_connection().await;
//!
//! session.handle_command(Channel::Volume, Command::Percent(35));
//! session.handle_command(Channel::ZoneControl, Command::Text("add Living Room".into()));
//! ```
//!
//! The protocol is push-based: the device reports state whenever it changes,
//! with no pairing between a request and a later message. All session state
//! is rebuilt from those pushes after every reconnect; nothing is persisted.

mod config;
mod error;
mod platform;
mod registry;
mod session;
mod transport;
mod types;
mod zone;

#[cfg(test)]
mod test_support;

pub use config::*;
pub use error::*;
pub use platform::*;
pub use registry::*;
pub use session::*;
pub use transport::*;
pub use types::*;
pub use zone::{ZoneMember, ZoneRole};
