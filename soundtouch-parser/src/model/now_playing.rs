//! Now-playing payload

use serde::Deserialize;

use super::{ContentItem, PlayStatus};

/// Everything the device reports about the active source.
///
/// The embedded [`ContentItem`] identifies *what* is selected; the
/// remaining fields are display metadata forwarded to the host platform
/// verbatim.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename = "nowPlaying")]
pub struct NowPlaying {
    #[serde(rename = "@deviceID", default)]
    pub device_id: Option<String>,

    #[serde(rename = "@source", default)]
    pub source: Option<String>,

    #[serde(rename = "ContentItem", default)]
    pub content_item: Option<ContentItem>,

    #[serde(rename = "track", default)]
    pub track: Option<String>,

    #[serde(rename = "artist", default)]
    pub artist: Option<String>,

    #[serde(rename = "album", default)]
    pub album: Option<String>,

    #[serde(rename = "stationName", default)]
    pub station_name: Option<String>,

    #[serde(rename = "stationLocation", default)]
    pub station_location: Option<String>,

    #[serde(rename = "description", default)]
    pub description: Option<String>,

    #[serde(rename = "art", default)]
    pub art: Option<Art>,

    #[serde(rename = "playStatus", default)]
    pub play_status: Option<PlayStatus>,
}

impl NowPlaying {
    /// Whether this payload reports the device as powered down.
    ///
    /// A powered-down device pushes a now-playing message whose source is
    /// `STANDBY`; there is no separate power-state message.
    pub fn is_standby(&self) -> bool {
        self.source.as_deref() == Some("STANDBY")
            || self
                .content_item
                .as_ref()
                .map(|item| item.source == "STANDBY")
                .unwrap_or(false)
    }

    /// Artwork URL, when the device reports one with a usable status.
    pub fn art_url(&self) -> Option<&str> {
        self.art.as_ref().and_then(|a| a.url.as_deref()).filter(|u| !u.is_empty())
    }
}

/// Artwork reference inside a now-playing payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Art {
    #[serde(rename = "@artImageStatus", default)]
    pub status: Option<String>,

    #[serde(rename = "$text", default)]
    pub url: Option<String>,
}
