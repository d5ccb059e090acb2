//! Shared fixtures for session and registry tests: a scriptable transport
//! and a platform handle that records everything pushed at it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::config::DeviceConfig;
use crate::error::{TransportError, TransportResult};
use crate::platform::PlatformHandle;
use crate::registry::DeviceRegistry;
use crate::session::{ConnectionState, DeviceSession};
use crate::transport::{MessageSink, Transport, TransportEvent, TransportEvents};
use crate::types::{Channel, DeviceStatus, StateValue, StatusDetail};

#[derive(Default)]
pub(crate) struct RecordingPlatform {
    pub states: Mutex<Vec<(Channel, StateValue)>>,
    pub statuses: Mutex<Vec<(DeviceStatus, StatusDetail, Option<String>)>>,
}

impl RecordingPlatform {
    pub fn last_state(&self, channel: Channel) -> Option<StateValue> {
        self.states
            .lock()
            .iter()
            .rev()
            .find(|(c, _)| *c == channel)
            .map(|(_, v)| v.clone())
    }

    pub fn last_status(&self) -> Option<(DeviceStatus, StatusDetail, Option<String>)> {
        self.statuses.lock().last().cloned()
    }
}

impl PlatformHandle for RecordingPlatform {
    fn update_state(&self, channel: Channel, value: StateValue) {
        self.states.lock().push((channel, value));
    }

    fn update_status(&self, status: DeviceStatus, detail: StatusDetail, message: Option<String>) {
        self.statuses.lock().push((status, detail, message));
    }
}

/// Transport whose connections are driven by the test: every frame the
/// session sends is recorded, and the test injects inbound events through
/// the sender captured per connection.
pub(crate) struct MockTransport {
    pub sent: Arc<Mutex<Vec<String>>>,
    pub connections: Arc<Mutex<Vec<mpsc::Sender<TransportEvent>>>>,
    pub refuse: Arc<AtomicBool>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            connections: Arc::new(Mutex::new(Vec::new())),
            refuse: Arc::new(AtomicBool::new(false)),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(
        &self,
        _config: &DeviceConfig,
    ) -> TransportResult<(Box<dyn MessageSink>, TransportEvents)> {
        if self.refuse.load(Ordering::SeqCst) {
            return Err(TransportError::ConnectFailed(
                "connection refused".to_string(),
            ));
        }
        let (tx, rx) = mpsc::channel(64);
        let _ = tx.send(TransportEvent::Opened).await;
        self.connections.lock().push(tx);
        Ok((
            Box::new(MockSink {
                sent: Arc::clone(&self.sent),
            }),
            rx,
        ))
    }
}

struct MockSink {
    sent: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl MessageSink for MockSink {
    async fn send(&mut self, frame: &str) -> TransportResult<()> {
        self.sent.lock().push(frame.to_string());
        Ok(())
    }

    async fn close(&mut self) -> TransportResult<()> {
        Ok(())
    }
}

pub(crate) struct SessionFixture {
    pub session: DeviceSession,
    pub platform: Arc<RecordingPlatform>,
    pub sent: Arc<Mutex<Vec<String>>>,
    pub connections: Arc<Mutex<Vec<mpsc::Sender<TransportEvent>>>>,
    pub refuse: Arc<AtomicBool>,
}

/// Build a session over a mock transport. The fixture's display name is its
/// host string, which keeps by-name registry lookups easy to script.
pub(crate) fn session_fixture(
    id: &str,
    host: &str,
    registry: &Arc<DeviceRegistry>,
) -> SessionFixture {
    let platform = Arc::new(RecordingPlatform::default());
    let transport = MockTransport::new();
    let sent = Arc::clone(&transport.sent);
    let connections = Arc::clone(&transport.connections);
    let refuse = Arc::clone(&transport.refuse);
    let config = DeviceConfig::new(id, host).with_name(host);
    let session = DeviceSession::spawn(
        config,
        Arc::clone(&platform) as Arc<dyn PlatformHandle>,
        Arc::new(transport),
        registry,
    );
    SessionFixture {
        session,
        platform,
        sent,
        connections,
        refuse,
    }
}

/// Wait until `cond` holds, or fail the test after a generous timeout.
pub(crate) async fn wait_for(cond: impl Fn() -> bool) {
    tokio::time::timeout(Duration::from_secs(30), async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not met in time");
}

pub(crate) async fn open_and_wait(fixture: &SessionFixture) {
    fixture.session.open_connection().await;
    let session = fixture.session.clone();
    wait_for(move || session.connection_state() == ConnectionState::Online).await;
}

/// Frames sent on the `key` endpoint, in order.
pub(crate) fn key_frames(sent: &[String]) -> Vec<String> {
    sent.iter()
        .filter(|f| f.contains("url=\"key\""))
        .cloned()
        .collect()
}
