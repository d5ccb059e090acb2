//! Core types shared across the session crate.

/// Unique identifier for a SoundTouch device (its hardware address).
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct DeviceId(pub String);

impl DeviceId {
    /// Create a new device ID from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the device ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for DeviceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for DeviceId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Channels a device exposes to the host platform.
///
/// Commands arrive addressed to a channel; state updates are pushed back on
/// one. The now-playing channels are display-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Power,
    Volume,
    Mute,
    OperationMode,
    PlayerControl,
    ZoneInfo,
    ZoneControl,
    Preset,
    KeyCode,
    NowPlayingAlbum,
    NowPlayingArtist,
    NowPlayingArtwork,
    NowPlayingDescription,
    NowPlayingItemName,
    NowPlayingPlayStatus,
    NowPlayingStationLocation,
    NowPlayingStationName,
    NowPlayingTrack,
}

impl Channel {
    /// Stable channel identifier, used in diagnostics.
    pub fn id(&self) -> &'static str {
        match self {
            Channel::Power => "power",
            Channel::Volume => "volume",
            Channel::Mute => "mute",
            Channel::OperationMode => "operationMode",
            Channel::PlayerControl => "playerControl",
            Channel::ZoneInfo => "zoneInfo",
            Channel::ZoneControl => "zoneControl",
            Channel::Preset => "preset",
            Channel::KeyCode => "keyCode",
            Channel::NowPlayingAlbum => "nowPlayingAlbum",
            Channel::NowPlayingArtist => "nowPlayingArtist",
            Channel::NowPlayingArtwork => "nowPlayingArtwork",
            Channel::NowPlayingDescription => "nowPlayingDescription",
            Channel::NowPlayingItemName => "nowPlayingItemName",
            Channel::NowPlayingPlayStatus => "nowPlayingPlayStatus",
            Channel::NowPlayingStationLocation => "nowPlayingStationLocation",
            Channel::NowPlayingStationName => "nowPlayingStationName",
            Channel::NowPlayingTrack => "nowPlayingTrack",
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Commands the host platform can issue on a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    On,
    Off,
    /// A 0-100 percentage
    Percent(u8),
    Play,
    Pause,
    Next,
    Previous,
    /// Free-form string command; interpretation depends on the channel
    Text(String),
    /// Re-publish current state without touching the device
    Refresh,
}

/// Values pushed back to the platform for display and automation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateValue {
    Text(String),
    Percent(u8),
    Switch(bool),
}

/// Coarse device status reported to the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceStatus {
    Online,
    Offline,
}

/// Machine-readable detail attached to a status report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusDetail {
    None,
    CommunicationError,
    ConfigurationError,
}
