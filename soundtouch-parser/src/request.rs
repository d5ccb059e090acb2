//! Outbound request envelopes.
//!
//! Every message sent to a device is wrapped in the same `<msg>` envelope:
//! a header naming the device, the target path and the HTTP-like method,
//! followed by an optional body. The request id exists only to satisfy the
//! envelope shape; the device's push-style replies never correlate on it.

use quick_xml::escape::escape;

use crate::model::RemoteKey;

/// Sender tag the device expects on simulated key presses.
const KEY_SENDER: &str = "Gabbo";

/// An outbound protocol request, rendered to XML with [`RequestEnvelope::to_xml`].
///
/// A request without a body is a GET, a request with a body is a POST; the
/// device offers no other methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestEnvelope {
    device_id: String,
    path: String,
    main_node: Option<String>,
    body: Option<String>,
}

impl RequestEnvelope {
    /// A body-less GET request for `path`.
    pub fn get(device_id: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            path: path.into(),
            main_node: None,
            body: None,
        }
    }

    /// A POST request wrapping `body` (already-rendered XML).
    pub fn post(
        device_id: impl Into<String>,
        path: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            path: path.into(),
            main_node: None,
            body: Some(body.into()),
        }
    }

    /// Tag the request's `<info>` element with a `mainNode` attribute.
    pub fn with_main_node(mut self, main_node: impl Into<String>) -> Self {
        self.main_node = Some(main_node.into());
        self
    }

    /// The HTTP-like method carried in the header.
    pub fn method(&self) -> &'static str {
        if self.body.is_some() {
            "POST"
        } else {
            "GET"
        }
    }

    /// The target path carried in the header.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Render the full wire message.
    pub fn to_xml(&self) -> String {
        let main_node = match &self.main_node {
            Some(node) => format!(" mainNode=\"{}\"", escape(node)),
            None => String::new(),
        };
        let body = match &self.body {
            Some(body) => format!("<body>{body}</body>"),
            None => String::new(),
        };
        format!(
            "<msg><header deviceID=\"{device}\" url=\"{path}\" method=\"{method}\">\
             <request requestID=\"0\"><info{main_node} type=\"new\"/></request>\
             </header>{body}</msg>",
            device = escape(&self.device_id),
            path = escape(&self.path),
            method = self.method(),
        )
    }

    // ------------------------------------------------------------------
    // Protocol operations
    // ------------------------------------------------------------------

    /// The initial device query issued right after the transport opens.
    pub fn info(device_id: &str) -> Self {
        Self::get(device_id, "info")
    }

    /// Set the absolute volume, as a 0-100 percentage.
    pub fn volume(device_id: &str, level: u8) -> Self {
        let body = format!(
            "<volume deviceID=\"{}\">{}</volume>",
            escape(device_id),
            level
        );
        Self::post(device_id, "volume", body)
    }

    /// The press half of a simulated key.
    pub fn key_press(device_id: &str, key: RemoteKey) -> Self {
        Self::key(device_id, key, "press").with_main_node("keyPress")
    }

    /// The release half of a simulated key.
    pub fn key_release(device_id: &str, key: RemoteKey) -> Self {
        Self::key(device_id, key, "release").with_main_node("keyRelease")
    }

    fn key(device_id: &str, key: RemoteKey, state: &str) -> Self {
        let body = format!(
            "<key state=\"{state}\" sender=\"{KEY_SENDER}\">{}</key>",
            key.name()
        );
        Self::post(device_id, "key", body)
    }

    /// Push the zone descriptor for a master and its members.
    ///
    /// `members` yields `(member device id, member ip address)` pairs in
    /// display order. An empty iterator dissolves the zone.
    pub fn set_zone<'a>(
        device_id: &str,
        members: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Self {
        let mut body = format!("<zone master=\"{}\">", escape(device_id));
        for (member_id, ip_address) in members {
            body.push_str(&format!(
                "<member ipaddress=\"{}\">{}</member>",
                escape(ip_address),
                escape(member_id)
            ));
        }
        body.push_str("</zone>");
        Self::post(device_id, "setZone", body).with_main_node("newZone")
    }
}
