//! Content item value object

use serde::{Deserialize, Serialize};

use super::OperationMode;

/// Description of a playable source.
///
/// Replaced wholesale whenever the device reports a now-playing change and
/// snapshotted inside each preset slot; equality against those snapshots is
/// what drives preset matching, so the fields here are exactly the ones the
/// device repeats consistently.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename = "ContentItem")]
pub struct ContentItem {
    /// Raw source kind as reported by the device (e.g. `TUNEIN`, `BLUETOOTH`)
    #[serde(rename = "@source")]
    pub source: String,

    /// Source-specific location token (station id, path, ...)
    #[serde(rename = "@location", default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// Account the source is bound to, when the device reports one
    #[serde(rename = "@sourceAccount", default, skip_serializing_if = "Option::is_none")]
    pub source_account: Option<String>,

    /// Human-readable name of the item (station or playlist name)
    #[serde(rename = "itemName", default, skip_serializing_if = "Option::is_none")]
    pub item_name: Option<String>,
}

impl ContentItem {
    /// The coarse operation mode this item implies.
    pub fn operation_mode(&self) -> OperationMode {
        OperationMode::from_source(&self.source)
    }
}
