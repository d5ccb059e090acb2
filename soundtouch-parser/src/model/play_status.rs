//! Playback status reported inside now-playing messages

use serde::{Deserialize, Serialize};

/// Transport state of the active source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum PlayStatus {
    #[serde(rename = "PLAY_STATE")]
    Play,
    #[serde(rename = "PAUSE_STATE")]
    Pause,
    #[serde(rename = "STOP_STATE")]
    Stop,
    #[serde(rename = "BUFFERING_STATE")]
    Buffering,
    /// Anything the device reports that this crate does not model
    #[serde(other)]
    Invalid,
}

impl PlayStatus {
    /// Wire name as it appears in `<playStatus>` elements.
    pub fn name(&self) -> &'static str {
        match self {
            PlayStatus::Play => "PLAY_STATE",
            PlayStatus::Pause => "PAUSE_STATE",
            PlayStatus::Stop => "STOP_STATE",
            PlayStatus::Buffering => "BUFFERING_STATE",
            PlayStatus::Invalid => "INVALID_PLAY_STATUS",
        }
    }
}

impl std::fmt::Display for PlayStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
