//! Coarse playback-source categories

use serde::{Deserialize, Serialize};

/// The coarse playback-source category of a device.
///
/// This is always derived from the current content item and the connection
/// state, never stored as ground truth. `Offline` means there is no
/// connection at all; `Standby` means the device is connected but powered
/// down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationMode {
    Offline,
    Standby,
    InternetRadio,
    Bluetooth,
    Aux,
    StoredMusic,
    Spotify,
    Pandora,
    Deezer,
    SiriusXm,
    Media,
    GroupMember,
    Other,
}

impl OperationMode {
    /// The wire/display name of this mode, matching the strings the host
    /// platform sends on the operation-mode channel.
    pub fn name(&self) -> &'static str {
        match self {
            OperationMode::Offline => "OFFLINE",
            OperationMode::Standby => "STANDBY",
            OperationMode::InternetRadio => "INTERNET_RADIO",
            OperationMode::Bluetooth => "BLUETOOTH",
            OperationMode::Aux => "AUX",
            OperationMode::StoredMusic => "STORED_MUSIC",
            OperationMode::Spotify => "SPOTIFY",
            OperationMode::Pandora => "PANDORA",
            OperationMode::Deezer => "DEEZER",
            OperationMode::SiriusXm => "SIRIUSXM",
            OperationMode::Media => "MEDIA",
            OperationMode::GroupMember => "GROUPMEMBER",
            OperationMode::Other => "OTHER",
        }
    }

    /// Map a `source` attribute reported by the device to a mode.
    ///
    /// Source kinds the protocol can emit but this crate does not model
    /// individually fall back to `Other`.
    pub fn from_source(source: &str) -> Self {
        match source {
            "STANDBY" => OperationMode::Standby,
            "INTERNET_RADIO" | "TUNEIN" => OperationMode::InternetRadio,
            "BLUETOOTH" => OperationMode::Bluetooth,
            "AUX" => OperationMode::Aux,
            "STORED_MUSIC" => OperationMode::StoredMusic,
            "SPOTIFY" => OperationMode::Spotify,
            "PANDORA" => OperationMode::Pandora,
            "DEEZER" => OperationMode::Deezer,
            "SIRIUSXM" => OperationMode::SiriusXm,
            "MEDIA" => OperationMode::Media,
            "GROUPMEMBER" => OperationMode::GroupMember,
            _ => OperationMode::Other,
        }
    }

    /// Parse a mode name as sent on the operation-mode channel.
    pub fn from_name(name: &str) -> Option<Self> {
        let mode = match name {
            "OFFLINE" => OperationMode::Offline,
            "STANDBY" => OperationMode::Standby,
            "INTERNET_RADIO" => OperationMode::InternetRadio,
            "BLUETOOTH" => OperationMode::Bluetooth,
            "AUX" => OperationMode::Aux,
            "STORED_MUSIC" => OperationMode::StoredMusic,
            "SPOTIFY" => OperationMode::Spotify,
            "PANDORA" => OperationMode::Pandora,
            "DEEZER" => OperationMode::Deezer,
            "SIRIUSXM" => OperationMode::SiriusXm,
            "MEDIA" => OperationMode::Media,
            "GROUPMEMBER" => OperationMode::GroupMember,
            "OTHER" => OperationMode::Other,
            _ => return None,
        };
        Some(mode)
    }
}

impl std::fmt::Display for OperationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
