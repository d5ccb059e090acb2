//! Zone membership types and the zone-control command grammar.

use crate::types::DeviceId;

/// Role a session plays in a multi-room zone.
///
/// A session has exactly one role at a time; a freshly opened connection
/// resets it to `None` until the device pushes zone state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZoneRole {
    #[default]
    None,
    Master,
    Member,
}

impl std::fmt::Display for ZoneRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ZoneRole::None => "None",
            ZoneRole::Master => "Master",
            ZoneRole::Member => "Member",
        };
        write!(f, "{name}")
    }
}

/// A peer speaker participating in a zone.
///
/// Only the identifier and network address are kept; everything else about
/// the peer is resolved through the registry at use time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneMember {
    pub device_id: DeviceId,
    pub ip_address: String,
}

impl ZoneMember {
    pub fn new(device_id: impl Into<DeviceId>, ip_address: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            ip_address: ip_address.into(),
        }
    }
}

/// Action half of a zone-control command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ZoneAction {
    Add,
    Remove,
}

/// A parsed `"<action> <peerNameOrId>"` zone-control command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ZoneCommand {
    pub action: ZoneAction,
    pub peer: String,
}

impl ZoneCommand {
    /// Parse a zone-control command string; `None` if malformed.
    ///
    /// The action is matched case-insensitively. The peer token is the rest
    /// of the string, so display names containing spaces work.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let (action, peer) = trimmed.split_once(char::is_whitespace)?;
        let peer = peer.trim();
        if peer.is_empty() {
            return None;
        }
        let action = match action.to_ascii_lowercase().as_str() {
            "add" => ZoneAction::Add,
            "remove" => ZoneAction::Remove,
            _ => return None,
        };
        Some(Self {
            action,
            peer: peer.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_add_and_remove() {
        assert_eq!(
            ZoneCommand::parse("add Kitchen"),
            Some(ZoneCommand { action: ZoneAction::Add, peer: "Kitchen".to_string() })
        );
        assert_eq!(
            ZoneCommand::parse("REMOVE 00112233AABB"),
            Some(ZoneCommand { action: ZoneAction::Remove, peer: "00112233AABB".to_string() })
        );
    }

    #[test]
    fn peer_may_contain_spaces() {
        assert_eq!(
            ZoneCommand::parse("add Living Room"),
            Some(ZoneCommand { action: ZoneAction::Add, peer: "Living Room".to_string() })
        );
    }

    #[test]
    fn malformed_commands_are_rejected() {
        assert_eq!(ZoneCommand::parse("add"), None);
        assert_eq!(ZoneCommand::parse("add "), None);
        assert_eq!(ZoneCommand::parse("join Kitchen"), None);
        assert_eq!(ZoneCommand::parse(""), None);
    }
}
