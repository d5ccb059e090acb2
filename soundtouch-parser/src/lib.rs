//! # soundtouch-parser
//!
//! XML codec for the Bose SoundTouch WebSocket control protocol. This crate
//! is the pure data layer of the SDK: it renders outbound request envelopes
//! and decodes the device's push-style messages into typed events, without
//! touching sockets or session state.
//!
//! ## Encoding
//!
//! ```rust
//! use soundtouch_parser::{RemoteKey, RequestEnvelope};
//!
//! let press = RequestEnvelope::key_press("00112233AABB", RemoteKey::Power);
//! let wire = press.to_xml();
//! ```
//!
//! ## Decoding
//!
//! ```rust
//! use soundtouch_parser::{decode_message, ProtocolEvent};
//!
//! for event in decode_message("<updates deviceID=\"X\"/>") {
//!     match event {
//!         ProtocolEvent::VolumeChanged { level, muted } => { /* ... */ }
//!         _ => {}
//!     }
//! }
//! ```
//!
//! The protocol has no request/response correlation: requests carry an id
//! the device never echoes meaningfully, so nothing here assumes pairing or
//! ordering between a request and a later event.

pub mod error;
pub mod model;
pub mod request;
pub mod update;

// Re-export error types for convenient top-level access
pub use error::{ParseError, ParseResult};

// Re-export the model for convenient top-level access
pub use model::{Art, ContentItem, NowPlaying, OperationMode, PlayStatus, Preset, RemoteKey};

// Codec entry points
pub use request::RequestEnvelope;
pub use update::{decode_message, DeviceInfo, ProtocolEvent, ZoneMemberUpdate, ZoneUpdate};
