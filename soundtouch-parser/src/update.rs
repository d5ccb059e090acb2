//! Typed decoding of inbound protocol messages.
//!
//! The device pushes free-form XML at any time; there is no request/response
//! correlation. Decoding dispatches on the document's root element and
//! produces zero or more [`ProtocolEvent`]s. Malformed or unexpected input
//! becomes a [`ProtocolEvent::DecodeError`] or
//! [`ProtocolEvent::Unrecognized`] so a single bad message can never take a
//! session down.

use quick_xml::events::Event;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{ParseError, ParseResult};
use crate::model::{ContentItem, NowPlaying, Preset};

/// A decoded inbound protocol event.
#[derive(Debug, Clone, PartialEq)]
pub enum ProtocolEvent {
    /// The active source changed (or the device went to standby)
    NowPlayingChanged(NowPlaying),
    /// Volume level or mute flag changed
    VolumeChanged { level: u8, muted: bool },
    /// Full preset list, replacing any previously known list
    PresetsChanged(Vec<Preset>),
    /// Zone membership changed
    ZoneChanged(ZoneUpdate),
    /// Device identity, from the response to the initial `info` query
    ConnectionInfo(DeviceInfo),
    /// The message could not be decoded; the raw payload is preserved for
    /// diagnostics and the message is discarded
    DecodeError { detail: String, raw: String },
    /// Well-formed XML with a root element this crate does not model
    Unrecognized { element: String },
}

/// Zone membership as pushed by the device.
///
/// The session derives its own role from this; the codec only reports what
/// the device said.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ZoneUpdate {
    /// Device id of the zone master; `None` when the zone is dissolved
    pub master: Option<String>,
    /// Member entries in the order the device listed them
    pub members: Vec<ZoneMemberUpdate>,
}

/// One member entry inside a zone push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneMemberUpdate {
    pub device_id: String,
    pub ip_address: Option<String>,
}

/// Device identity reported by the `info` endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub device_id: Option<String>,
    pub name: Option<String>,
    pub device_type: Option<String>,
}

/// Decode one inbound message into typed events.
///
/// Never fails: undecodable input is reported as a `DecodeError` event and
/// unknown-but-well-formed shapes as `Unrecognized`.
pub fn decode_message(raw: &str) -> Vec<ProtocolEvent> {
    let root = match root_element(raw) {
        Ok(root) => root,
        Err(err) => {
            return vec![ProtocolEvent::DecodeError {
                detail: err.to_string(),
                raw: raw.to_string(),
            }]
        }
    };
    let decoded = match root.as_str() {
        "updates" => decode_updates(raw),
        "msg" => decode_response(raw),
        other => {
            return vec![ProtocolEvent::Unrecognized {
                element: other.to_string(),
            }]
        }
    };
    match decoded {
        Ok(events) => events,
        Err(err) => vec![ProtocolEvent::DecodeError {
            detail: err.to_string(),
            raw: raw.to_string(),
        }],
    }
}

/// Name of the document's root element.
fn root_element(raw: &str) -> ParseResult<String> {
    let mut reader = quick_xml::Reader::from_str(raw);
    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => {
                return Ok(String::from_utf8_lossy(start.name().as_ref()).into_owned())
            }
            Ok(Event::Empty(empty)) => {
                return Ok(String::from_utf8_lossy(empty.name().as_ref()).into_owned())
            }
            Ok(Event::Eof) => return Err(ParseError::MissingRootElement),
            Ok(_) => continue,
            Err(err) => return Err(ParseError::XmlDeserializationFailed(err.to_string())),
        }
    }
}

fn parse<T: DeserializeOwned>(raw: &str) -> ParseResult<T> {
    quick_xml::de::from_str(raw).map_err(|e| ParseError::XmlDeserializationFailed(e.to_string()))
}

// ----------------------------------------------------------------------
// `<updates>` push documents
// ----------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct Updates {
    #[serde(rename = "nowPlayingUpdated", default)]
    now_playing: Option<NowPlayingUpdated>,
    #[serde(rename = "volumeUpdated", default)]
    volume: Option<VolumeUpdated>,
    #[serde(rename = "presetsUpdated", default)]
    presets: Option<PresetsUpdated>,
    #[serde(rename = "zoneUpdated", default)]
    zone: Option<ZoneUpdated>,
}

#[derive(Debug, Deserialize)]
struct NowPlayingUpdated {
    #[serde(rename = "nowPlaying", default)]
    now_playing: Option<NowPlaying>,
}

#[derive(Debug, Deserialize)]
struct VolumeUpdated {
    #[serde(rename = "volume", default)]
    volume: Option<VolumeInfo>,
}

#[derive(Debug, Deserialize)]
struct VolumeInfo {
    #[serde(rename = "targetvolume", default)]
    target: Option<u8>,
    #[serde(rename = "actualvolume", default)]
    actual: Option<u8>,
    #[serde(rename = "muteenabled", default)]
    mute_enabled: Option<bool>,
}

impl VolumeInfo {
    fn into_event(self) -> Option<ProtocolEvent> {
        let level = self.actual.or(self.target)?;
        Some(ProtocolEvent::VolumeChanged {
            level,
            muted: self.mute_enabled.unwrap_or(false),
        })
    }
}

#[derive(Debug, Deserialize)]
struct PresetsUpdated {
    #[serde(rename = "presets", default)]
    presets: Option<Presets>,
}

#[derive(Debug, Deserialize)]
struct Presets {
    #[serde(rename = "preset", default)]
    entries: Vec<Preset>,
}

#[derive(Debug, Deserialize)]
struct ZoneUpdated {
    #[serde(rename = "zone", default)]
    zone: Option<ZoneXml>,
}

#[derive(Debug, Deserialize, Default)]
struct ZoneXml {
    #[serde(rename = "@master", default)]
    master: Option<String>,
    #[serde(rename = "member", default)]
    members: Vec<ZoneMemberXml>,
}

#[derive(Debug, Deserialize)]
struct ZoneMemberXml {
    #[serde(rename = "@ipaddress", default)]
    ip_address: Option<String>,
    #[serde(rename = "$text", default)]
    device_id: Option<String>,
}

impl ZoneXml {
    fn into_update(self) -> ZoneUpdate {
        ZoneUpdate {
            master: self.master.filter(|m| !m.is_empty()),
            members: self
                .members
                .into_iter()
                .filter_map(|m| {
                    let device_id = m.device_id.filter(|id| !id.is_empty())?;
                    Some(ZoneMemberUpdate {
                        device_id,
                        ip_address: m.ip_address,
                    })
                })
                .collect(),
        }
    }
}

fn decode_updates(raw: &str) -> ParseResult<Vec<ProtocolEvent>> {
    let updates: Updates = parse(raw)?;
    let mut events = Vec::new();
    if let Some(now_playing) = updates.now_playing.and_then(|u| u.now_playing) {
        events.push(ProtocolEvent::NowPlayingChanged(now_playing));
    }
    if let Some(event) = updates.volume.and_then(|u| u.volume).and_then(VolumeInfo::into_event) {
        events.push(event);
    }
    if let Some(presets) = updates.presets.and_then(|u| u.presets) {
        events.push(ProtocolEvent::PresetsChanged(presets.entries));
    }
    if let Some(zone) = updates.zone.and_then(|u| u.zone) {
        events.push(ProtocolEvent::ZoneChanged(zone.into_update()));
    }
    Ok(events)
}

// ----------------------------------------------------------------------
// `<msg>` response documents
// ----------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct Msg {
    #[serde(rename = "body", default)]
    body: Option<MsgBody>,
}

#[derive(Debug, Deserialize)]
struct MsgBody {
    #[serde(rename = "info", default)]
    info: Option<InfoXml>,
    #[serde(rename = "nowPlaying", default)]
    now_playing: Option<NowPlaying>,
    #[serde(rename = "volume", default)]
    volume: Option<VolumeInfo>,
    #[serde(rename = "presets", default)]
    presets: Option<Presets>,
    #[serde(rename = "zone", default)]
    zone: Option<ZoneXml>,
}

#[derive(Debug, Deserialize)]
struct InfoXml {
    #[serde(rename = "@deviceID", default)]
    device_id: Option<String>,
    #[serde(rename = "name", default)]
    name: Option<String>,
    #[serde(rename = "type", default)]
    device_type: Option<String>,
}

fn decode_response(raw: &str) -> ParseResult<Vec<ProtocolEvent>> {
    let msg: Msg = parse(raw)?;
    let mut events = Vec::new();
    let Some(body) = msg.body else {
        return Ok(events);
    };
    if let Some(info) = body.info {
        events.push(ProtocolEvent::ConnectionInfo(DeviceInfo {
            device_id: info.device_id,
            name: info.name,
            device_type: info.device_type,
        }));
    }
    if let Some(now_playing) = body.now_playing {
        events.push(ProtocolEvent::NowPlayingChanged(now_playing));
    }
    if let Some(event) = body.volume.and_then(VolumeInfo::into_event) {
        events.push(event);
    }
    if let Some(presets) = body.presets {
        events.push(ProtocolEvent::PresetsChanged(presets.entries));
    }
    if let Some(zone) = body.zone {
        events.push(ProtocolEvent::ZoneChanged(zone.into_update()));
    }
    Ok(events)
}
