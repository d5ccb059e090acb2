//! Preset slots

use serde::Deserialize;

use super::{ContentItem, RemoteKey};

/// One of the six fixed preset slots, binding a position to a snapshot of
/// the content item stored there.
///
/// The device pushes the full preset list on every change; the list is
/// rebuilt wholesale, never diffed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename = "preset")]
pub struct Preset {
    /// Slot position, 1 through 6
    #[serde(rename = "@id")]
    pub position: u8,

    /// Snapshot of what the slot points at
    #[serde(rename = "ContentItem")]
    pub content_item: ContentItem,
}

impl Preset {
    /// The remote key that selects this slot, if the position is in range.
    pub fn remote_key(&self) -> Option<RemoteKey> {
        RemoteKey::preset(self.position)
    }
}

impl std::fmt::Display for Preset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PRESET_{}", self.position)
    }
}
