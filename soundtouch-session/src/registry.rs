//! Process-wide table of device sessions.
//!
//! The registry is the only path between sessions: zone commands resolve
//! their peer through it at use time, so sessions never own each other and
//! a peer disappearing is always observable. It is mutated only by device
//! registration and removal.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::session::DeviceSession;
use crate::types::DeviceId;

/// In-memory mapping from device identifier to its session.
///
/// Peer resolution is a linear scan; household speaker counts are small
/// enough that nothing faster is warranted.
#[derive(Default)]
pub struct DeviceRegistry {
    sessions: RwLock<HashMap<DeviceId, DeviceSession>>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session under its device id, replacing any previous
    /// session for the same device.
    pub fn register(&self, session: DeviceSession) {
        let id = session.device_id().clone();
        let previous = self.sessions.write().insert(id.clone(), session);
        if previous.is_some() {
            tracing::debug!(device = %id, "replaced existing session registration");
        }
    }

    /// Remove and return the session for a device.
    pub fn remove(&self, id: &DeviceId) -> Option<DeviceSession> {
        self.sessions.write().remove(id)
    }

    /// Look up the session for a device.
    pub fn lookup(&self, id: &DeviceId) -> Option<DeviceSession> {
        self.sessions.read().get(id).cloned()
    }

    /// Snapshot of all registered sessions.
    pub fn all(&self) -> Vec<(DeviceId, DeviceSession)> {
        self.sessions
            .read()
            .iter()
            .map(|(id, session)| (id.clone(), session.clone()))
            .collect()
    }

    /// Resolve a zone peer by device id or display name, case-insensitively.
    pub fn resolve_peer(&self, token: &str) -> Option<DeviceSession> {
        let sessions = self.sessions.read();
        sessions
            .values()
            .find(|session| {
                session.device_id().as_str().eq_ignore_ascii_case(token)
                    || session.name().eq_ignore_ascii_case(token)
            })
            .cloned()
    }

    /// Number of registered sessions.
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}
