//! Logical remote-control keys the protocol can simulate

use serde::{Deserialize, Serialize};

/// A logical button press the device accepts on its `key` endpoint.
///
/// The device has no single-shot "activate" primitive; every key is
/// simulated as a press message immediately followed by a release message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RemoteKey {
    Play,
    Pause,
    PlayPause,
    Stop,
    PrevTrack,
    NextTrack,
    ThumbsUp,
    ThumbsDown,
    Bookmark,
    Power,
    Mute,
    VolumeUp,
    VolumeDown,
    Preset1,
    Preset2,
    Preset3,
    Preset4,
    Preset5,
    Preset6,
    AuxInput,
    ShuffleOff,
    ShuffleOn,
    RepeatOff,
    RepeatOne,
    RepeatAll,
    AddFavorite,
    RemoveFavorite,
}

impl RemoteKey {
    /// Wire name of the key, as placed in the `<key>` body element.
    pub fn name(&self) -> &'static str {
        match self {
            RemoteKey::Play => "PLAY",
            RemoteKey::Pause => "PAUSE",
            RemoteKey::PlayPause => "PLAY_PAUSE",
            RemoteKey::Stop => "STOP",
            RemoteKey::PrevTrack => "PREV_TRACK",
            RemoteKey::NextTrack => "NEXT_TRACK",
            RemoteKey::ThumbsUp => "THUMBS_UP",
            RemoteKey::ThumbsDown => "THUMBS_DOWN",
            RemoteKey::Bookmark => "BOOKMARK",
            RemoteKey::Power => "POWER",
            RemoteKey::Mute => "MUTE",
            RemoteKey::VolumeUp => "VOLUME_UP",
            RemoteKey::VolumeDown => "VOLUME_DOWN",
            RemoteKey::Preset1 => "PRESET_1",
            RemoteKey::Preset2 => "PRESET_2",
            RemoteKey::Preset3 => "PRESET_3",
            RemoteKey::Preset4 => "PRESET_4",
            RemoteKey::Preset5 => "PRESET_5",
            RemoteKey::Preset6 => "PRESET_6",
            RemoteKey::AuxInput => "AUX_INPUT",
            RemoteKey::ShuffleOff => "SHUFFLE_OFF",
            RemoteKey::ShuffleOn => "SHUFFLE_ON",
            RemoteKey::RepeatOff => "REPEAT_OFF",
            RemoteKey::RepeatOne => "REPEAT_ONE",
            RemoteKey::RepeatAll => "REPEAT_ALL",
            RemoteKey::AddFavorite => "ADD_FAVORITE",
            RemoteKey::RemoveFavorite => "REMOVE_FAVORITE",
        }
    }

    /// The preset key for a slot position, if the position is in range.
    pub fn preset(position: u8) -> Option<Self> {
        match position {
            1 => Some(RemoteKey::Preset1),
            2 => Some(RemoteKey::Preset2),
            3 => Some(RemoteKey::Preset3),
            4 => Some(RemoteKey::Preset4),
            5 => Some(RemoteKey::Preset5),
            6 => Some(RemoteKey::Preset6),
            _ => None,
        }
    }
}

impl std::str::FromStr for RemoteKey {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = match s {
            "PLAY" => RemoteKey::Play,
            "PAUSE" => RemoteKey::Pause,
            "PLAY_PAUSE" => RemoteKey::PlayPause,
            "STOP" => RemoteKey::Stop,
            "PREV_TRACK" => RemoteKey::PrevTrack,
            "NEXT_TRACK" => RemoteKey::NextTrack,
            "THUMBS_UP" => RemoteKey::ThumbsUp,
            "THUMBS_DOWN" => RemoteKey::ThumbsDown,
            "BOOKMARK" => RemoteKey::Bookmark,
            "POWER" => RemoteKey::Power,
            "MUTE" => RemoteKey::Mute,
            "VOLUME_UP" => RemoteKey::VolumeUp,
            "VOLUME_DOWN" => RemoteKey::VolumeDown,
            "PRESET_1" => RemoteKey::Preset1,
            "PRESET_2" => RemoteKey::Preset2,
            "PRESET_3" => RemoteKey::Preset3,
            "PRESET_4" => RemoteKey::Preset4,
            "PRESET_5" => RemoteKey::Preset5,
            "PRESET_6" => RemoteKey::Preset6,
            "AUX_INPUT" => RemoteKey::AuxInput,
            "SHUFFLE_OFF" => RemoteKey::ShuffleOff,
            "SHUFFLE_ON" => RemoteKey::ShuffleOn,
            "REPEAT_OFF" => RemoteKey::RepeatOff,
            "REPEAT_ONE" => RemoteKey::RepeatOne,
            "REPEAT_ALL" => RemoteKey::RepeatAll,
            "ADD_FAVORITE" => RemoteKey::AddFavorite,
            "REMOVE_FAVORITE" => RemoteKey::RemoveFavorite,
            _ => return Err(()),
        };
        Ok(key)
    }
}

impl std::fmt::Display for RemoteKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::str::FromStr;

    #[rstest]
    #[case(RemoteKey::Play, "PLAY")]
    #[case(RemoteKey::PrevTrack, "PREV_TRACK")]
    #[case(RemoteKey::Power, "POWER")]
    #[case(RemoteKey::AuxInput, "AUX_INPUT")]
    #[case(RemoteKey::Preset4, "PRESET_4")]
    #[case(RemoteKey::RemoveFavorite, "REMOVE_FAVORITE")]
    fn wire_name_round_trips(#[case] key: RemoteKey, #[case] name: &str) {
        assert_eq!(key.name(), name);
        assert_eq!(RemoteKey::from_str(name), Ok(key));
    }

    #[test]
    fn unknown_name_is_rejected() {
        assert!(RemoteKey::from_str("EJECT").is_err());
        assert!(RemoteKey::from_str("play").is_err());
    }

    #[test]
    fn preset_positions_map_to_keys() {
        assert_eq!(RemoteKey::preset(1), Some(RemoteKey::Preset1));
        assert_eq!(RemoteKey::preset(6), Some(RemoteKey::Preset6));
        assert_eq!(RemoteKey::preset(0), None);
        assert_eq!(RemoteKey::preset(7), None);
    }
}
