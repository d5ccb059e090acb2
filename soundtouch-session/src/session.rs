//! Device session state machine.
//!
//! A [`DeviceSession`] owns one physical device's connection and protocol
//! state. The lifecycle is `Offline -> Connecting -> Online -> Offline`;
//! there is no separate authentication step, the handshake is just
//! connect-then-query.
//!
//! Two tasks drive a session:
//!
//! - the *event loop*, one per connection, applies transport events to
//!   session state and forwards updates to the platform;
//! - the *command worker* serializes platform commands on its own task, so
//!   the multi-second input-convergence polls never starve event delivery.
//!
//! All session state lives behind one mutex; zone peers are resolved
//! through the registry at use time and never owned.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use soundtouch_parser::{
    decode_message, ContentItem, NowPlaying, OperationMode, Preset, ProtocolEvent, RemoteKey,
    RequestEnvelope, ZoneMemberUpdate, ZoneUpdate,
};

use crate::config::DeviceConfig;
use crate::platform::PlatformHandle;
use crate::registry::DeviceRegistry;
use crate::transport::{MessageSink, Transport, TransportEvent, TransportEvents};
use crate::types::{Channel, Command, DeviceId, DeviceStatus, StateValue, StatusDetail};
use crate::zone::{ZoneAction, ZoneCommand, ZoneMember, ZoneRole};

/// Connection lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Offline,
    Connecting,
    Online,
}

/// Mutable per-device state. Reset piecemeal: the connection-scoped parts
/// (role, members, master) are cleared on every reconnect, the rest is
/// rebuilt from the device's own pushes.
struct SessionState {
    connection: ConnectionState,
    operation_mode: OperationMode,
    content_item: Option<ContentItem>,
    presets: Vec<Preset>,
    muted: bool,
    zone_role: ZoneRole,
    zone_members: Vec<ZoneMember>,
    zone_master: Option<DeviceId>,
    device_name: Option<String>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            connection: ConnectionState::Offline,
            operation_mode: OperationMode::Offline,
            content_item: None,
            presets: Vec::new(),
            muted: false,
            zone_role: ZoneRole::None,
            zone_members: Vec::new(),
            zone_master: None,
            device_name: None,
        }
    }
}

impl SessionState {
    /// Append a zone member unless it is already present.
    fn add_zone_member(&mut self, member: ZoneMember) -> bool {
        if self
            .zone_members
            .iter()
            .any(|m| m.device_id == member.device_id)
        {
            return false;
        }
        self.zone_members.push(member);
        true
    }

    /// Remove a zone member; `false` if it was not in the list.
    fn remove_zone_member(&mut self, id: &DeviceId) -> bool {
        let before = self.zone_members.len();
        self.zone_members.retain(|m| &m.device_id != id);
        self.zone_members.len() != before
    }
}

struct CommandRequest {
    channel: Channel,
    command: Command,
}

struct SessionInner {
    config: DeviceConfig,
    platform: Arc<dyn PlatformHandle>,
    transport: Arc<dyn Transport>,
    registry: Weak<DeviceRegistry>,
    state: Mutex<SessionState>,
    sink: tokio::sync::Mutex<Option<Box<dyn MessageSink>>>,
    command_tx: mpsc::UnboundedSender<CommandRequest>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    /// Bumped on every (re)connect and teardown; event loops from an older
    /// generation stop at their next event instead of mutating fresh state.
    generation: AtomicU64,
}

/// Handle to one device's session. Cheap to clone; the registry and the
/// session's own tasks all share the same inner state.
#[derive(Clone)]
pub struct DeviceSession {
    inner: Arc<SessionInner>,
}

impl DeviceSession {
    /// Create a session and start its command worker.
    ///
    /// The session holds only a weak reference to the registry; ownership
    /// goes the other way (the registry owns sessions for their whole
    /// lifetime).
    pub fn spawn(
        config: DeviceConfig,
        platform: Arc<dyn PlatformHandle>,
        transport: Arc<dyn Transport>,
        registry: &Arc<DeviceRegistry>,
    ) -> DeviceSession {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let session = DeviceSession {
            inner: Arc::new(SessionInner {
                config,
                platform,
                transport,
                registry: Arc::downgrade(registry),
                state: Mutex::new(SessionState::default()),
                sink: tokio::sync::Mutex::new(None),
                command_tx,
                tasks: Mutex::new(Vec::new()),
                generation: AtomicU64::new(0),
            }),
        };
        let worker = {
            let session = session.clone();
            tokio::spawn(async move { session.command_worker(command_rx).await })
        };
        session.track_task(worker);
        session
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn device_id(&self) -> &DeviceId {
        &self.inner.config.device_id
    }

    /// Display name: configured name, then the name the device reported,
    /// then the raw id.
    pub fn name(&self) -> String {
        if let Some(name) = &self.inner.config.name {
            return name.clone();
        }
        if let Some(name) = &self.inner.state.lock().device_name {
            return name.clone();
        }
        self.device_id().to_string()
    }

    /// Network address the device is configured at.
    pub fn host(&self) -> &str {
        &self.inner.config.host
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.inner.state.lock().connection
    }

    /// The derived operation mode as of the last recomputation.
    pub fn operation_mode(&self) -> OperationMode {
        self.inner.state.lock().operation_mode
    }

    pub fn is_muted(&self) -> bool {
        self.inner.state.lock().muted
    }

    pub fn content_item(&self) -> Option<ContentItem> {
        self.inner.state.lock().content_item.clone()
    }

    pub fn presets(&self) -> Vec<Preset> {
        self.inner.state.lock().presets.clone()
    }

    pub fn zone_role(&self) -> ZoneRole {
        self.inner.state.lock().zone_role
    }

    pub fn zone_members(&self) -> Vec<ZoneMember> {
        self.inner.state.lock().zone_members.clone()
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Open the transport and start this connection's event loop.
    ///
    /// No-op unless the session is Offline. Connection-scoped zone state is
    /// reset before the attempt; a failed attempt surfaces as a
    /// communication error, with the next retry happening opportunistically
    /// on the next command.
    pub async fn open_connection(&self) {
        {
            let mut state = self.inner.state.lock();
            if state.connection != ConnectionState::Offline {
                return;
            }
            state.connection = ConnectionState::Connecting;
            state.zone_role = ZoneRole::None;
            state.zone_members.clear();
            state.zone_master = None;
        }
        if let Some(registry) = self.inner.registry.upgrade() {
            if registry.lookup(self.device_id()).is_none() {
                registry.register(self.clone());
            }
        }
        tracing::debug!(
            device = %self.device_id(),
            url = %self.inner.config.endpoint_url(),
            "connecting"
        );
        match self.inner.transport.connect(&self.inner.config).await {
            Ok((sink, events)) => {
                *self.inner.sink.lock().await = Some(sink);
                let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
                let session = self.clone();
                let handle =
                    tokio::spawn(async move { session.event_loop(generation, events).await });
                self.track_task(handle);
            }
            Err(e) => {
                tracing::warn!(device = %self.device_id(), error = %e, "connection attempt failed");
                self.transition_offline(&e.to_string()).await;
            }
        }
    }

    /// Tear the session down: stop its tasks and close the transport.
    pub async fn dispose(&self) {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(mut sink) = self.inner.sink.lock().await.take() {
            if let Err(e) = sink.close().await {
                tracing::error!(device = %self.device_id(), error = %e, "error closing connection");
            }
        }
        for task in self.inner.tasks.lock().drain(..) {
            task.abort();
        }
        let mut state = self.inner.state.lock();
        state.connection = ConnectionState::Offline;
        state.content_item = None;
    }

    fn track_task(&self, handle: JoinHandle<()>) {
        let mut tasks = self.inner.tasks.lock();
        tasks.retain(|t| !t.is_finished());
        tasks.push(handle);
    }

    // ------------------------------------------------------------------
    // Command intake
    // ------------------------------------------------------------------

    /// Enqueue a platform command. Never blocks; dispatch happens on the
    /// session's command worker.
    pub fn handle_command(&self, channel: Channel, command: Command) {
        if self
            .inner
            .command_tx
            .send(CommandRequest { channel, command })
            .is_err()
        {
            tracing::warn!(device = %self.device_id(), "session disposed; dropping command");
        }
    }

    async fn command_worker(self, mut commands: mpsc::UnboundedReceiver<CommandRequest>) {
        while let Some(request) = commands.recv().await {
            self.dispatch_command(request.channel, request.command).await;
        }
    }

    async fn dispatch_command(&self, channel: Channel, command: Command) {
        tracing::debug!(device = %self.device_id(), %channel, ?command, "handling command");
        if self.connection_state() != ConnectionState::Online {
            // Opportunistic reconnect; the command proceeds either way.
            self.open_connection().await;
        }
        if command == Command::Refresh {
            self.recompute_operation_mode();
            return;
        }
        match channel {
            Channel::Power => self.handle_power(command).await,
            Channel::OperationMode => self.handle_operation_mode(command).await,
            Channel::Volume => self.handle_volume(command).await,
            Channel::Mute => self.handle_mute(command).await,
            Channel::PlayerControl => self.handle_player_control(command).await,
            Channel::ZoneControl => self.handle_zone_control(command).await,
            Channel::Preset => self.handle_preset(command).await,
            Channel::KeyCode => self.handle_key_code(command).await,
            _ => {
                tracing::warn!(
                    device = %self.device_id(),
                    %channel,
                    ?command,
                    "command on unhandled channel"
                );
            }
        }
    }

    async fn handle_power(&self, command: Command) {
        let mode = self.operation_mode();
        match command {
            Command::On if mode == OperationMode::Standby => {
                self.simulate_remote_key(RemoteKey::Power).await;
            }
            Command::Off if mode != OperationMode::Standby => {
                self.simulate_remote_key(RemoteKey::Power).await;
            }
            Command::On | Command::Off => {}
            other => self.warn_invalid(Channel::Power, &other),
        }
    }

    async fn handle_operation_mode(&self, command: Command) {
        let Command::Text(target) = command else {
            self.warn_invalid(Channel::OperationMode, &command);
            return;
        };
        match target.as_str() {
            "STANDBY" => {
                if self.operation_mode() != OperationMode::Standby {
                    self.simulate_remote_key(RemoteKey::Power).await;
                }
            }
            "INTERNET_RADIO" => self.select_internet_radio().await,
            "BLUETOOTH" => {
                self.converge_input(
                    OperationMode::Bluetooth,
                    self.inner.config.bluetooth_switch_attempts,
                )
                .await;
            }
            "AUX" => {
                self.converge_input(OperationMode::Aux, self.inner.config.aux_switch_attempts)
                    .await;
            }
            "MEDIA" | "SPOTIFY" | "PANDORA" | "DEEZER" | "SIRIUSXM" | "STORED_MUSIC"
            | "GROUPMEMBER" => {
                tracing::warn!(
                    device = %self.device_id(),
                    mode = %target,
                    "switching to this operation mode is not supported"
                );
            }
            other => {
                tracing::warn!(device = %self.device_id(), mode = other, "unknown operation mode");
            }
        }
    }

    /// Power on if needed, then select the first preset storing an internet
    /// radio station.
    async fn select_internet_radio(&self) {
        self.power_on_if_standby().await;
        let key = {
            let state = self.inner.state.lock();
            state
                .presets
                .iter()
                .find(|p| p.content_item.operation_mode() == OperationMode::InternetRadio)
                .and_then(Preset::remote_key)
        };
        match key {
            Some(key) => self.simulate_remote_key(key).await,
            None => {
                tracing::warn!(
                    device = %self.device_id(),
                    "cannot switch to INTERNET_RADIO: no preset stores an internet radio station"
                );
            }
        }
    }

    /// Cycle the input key until the derived mode matches `target`.
    ///
    /// The device's input-cycling key has no targeted-select equivalent, so
    /// this is a bounded poll: press, wait for the resulting now-playing
    /// push to move the derived mode, try again.
    async fn converge_input(&self, target: OperationMode, attempts: u32) {
        self.power_on_if_standby().await;
        for _ in 0..attempts {
            if self.operation_mode() == target {
                return;
            }
            self.simulate_remote_key(RemoteKey::AuxInput).await;
            tokio::time::sleep(self.inner.config.input_poll_interval).await;
        }
        if self.operation_mode() != target {
            tracing::warn!(
                device = %self.device_id(),
                target = %target,
                "input did not converge; maybe no device is available on that input"
            );
        }
    }

    async fn power_on_if_standby(&self) {
        if self.operation_mode() == OperationMode::Standby {
            self.simulate_remote_key(RemoteKey::Power).await;
        }
    }

    async fn handle_volume(&self, command: Command) {
        match command {
            Command::Percent(level) => {
                self.send_request(RequestEnvelope::volume(self.device_id().as_str(), level))
                    .await;
            }
            other => self.warn_invalid(Channel::Volume, &other),
        }
    }

    async fn handle_mute(&self, command: Command) {
        let muted = self.is_muted();
        match command {
            Command::On if !muted => self.simulate_remote_key(RemoteKey::Mute).await,
            Command::Off if muted => self.simulate_remote_key(RemoteKey::Mute).await,
            Command::On | Command::Off => {}
            other => self.warn_invalid(Channel::Mute, &other),
        }
    }

    async fn handle_player_control(&self, command: Command) {
        let key = match &command {
            Command::Play => Some(RemoteKey::Play),
            Command::Pause => Some(RemoteKey::Pause),
            Command::Next => Some(RemoteKey::NextTrack),
            Command::Previous => Some(RemoteKey::PrevTrack),
            Command::Text(text) => match text.as_str() {
                "PLAY" => Some(RemoteKey::Play),
                "PAUSE" => Some(RemoteKey::Pause),
                "NEXT" => Some(RemoteKey::NextTrack),
                "PREVIOUS" => Some(RemoteKey::PrevTrack),
                _ => None,
            },
            _ => None,
        };
        match key {
            Some(key) => self.simulate_remote_key(key).await,
            None => self.warn_invalid(Channel::PlayerControl, &command),
        }
    }

    async fn handle_preset(&self, command: Command) {
        let Command::Text(text) = command else {
            self.warn_invalid(Channel::Preset, &command);
            return;
        };
        let key = match text.as_str() {
            "PRESET_1" => RemoteKey::Preset1,
            "PRESET_2" => RemoteKey::Preset2,
            "PRESET_3" => RemoteKey::Preset3,
            "PRESET_4" => RemoteKey::Preset4,
            "PRESET_5" => RemoteKey::Preset5,
            "PRESET_6" => RemoteKey::Preset6,
            other => {
                tracing::warn!(device = %self.device_id(), preset = other, "invalid preset");
                return;
            }
        };
        self.simulate_remote_key(key).await;
    }

    async fn handle_key_code(&self, command: Command) {
        let Command::Text(text) = command else {
            self.warn_invalid(Channel::KeyCode, &command);
            return;
        };
        match text.parse::<RemoteKey>() {
            Ok(key) => self.simulate_remote_key(key).await,
            Err(()) => {
                tracing::warn!(device = %self.device_id(), key = %text, "invalid remote key");
            }
        }
    }

    fn warn_invalid(&self, channel: Channel, command: &Command) {
        tracing::warn!(
            device = %self.device_id(),
            %channel,
            ?command,
            "invalid command type for channel"
        );
    }

    // ------------------------------------------------------------------
    // Zone coordination
    // ------------------------------------------------------------------

    async fn handle_zone_control(&self, command: Command) {
        let Command::Text(raw) = command else {
            self.warn_invalid(Channel::ZoneControl, &command);
            return;
        };
        let Some(zone_command) = ZoneCommand::parse(&raw) else {
            tracing::warn!(device = %self.device_id(), command = %raw, "invalid zone command");
            return;
        };
        let Some(registry) = self.inner.registry.upgrade() else {
            tracing::warn!(device = %self.device_id(), "registry is gone; cannot resolve zone peer");
            return;
        };
        let Some(peer) = registry.resolve_peer(&zone_command.peer) else {
            tracing::warn!(
                device = %self.device_id(),
                peer = %zone_command.peer,
                "unknown device in zone command"
            );
            return;
        };
        if peer.device_id() == self.device_id() {
            tracing::warn!(device = %self.device_id(), "a zone cannot contain its own master");
            return;
        }
        match zone_command.action {
            ZoneAction::Add => self.add_zone_member(&peer).await,
            ZoneAction::Remove => self.remove_zone_member(&peer).await,
        }
    }

    async fn add_zone_member(&self, peer: &DeviceSession) {
        let member = ZoneMember::new(peer.device_id().clone(), peer.host().to_string());
        let members = {
            let mut state = self.inner.state.lock();
            if !state.add_zone_member(member) {
                drop(state);
                tracing::warn!(
                    device = %self.device_id(),
                    peer = %peer.device_id(),
                    "device is already a zone member"
                );
                return;
            }
            state.zone_members.clone()
        };
        self.push_zone_descriptor(&members).await;
    }

    async fn remove_zone_member(&self, peer: &DeviceSession) {
        let members = {
            let mut state = self.inner.state.lock();
            if !state.remove_zone_member(peer.device_id()) {
                drop(state);
                tracing::warn!(
                    device = %self.device_id(),
                    peer = %peer.device_id(),
                    "device is not a zone member"
                );
                return;
            }
            state.zone_members.clone()
        };
        self.push_zone_descriptor(&members).await;
    }

    /// Republish the full zone descriptor after every membership mutation;
    /// the master's in-memory list is the single source of truth.
    async fn push_zone_descriptor(&self, members: &[ZoneMember]) {
        let request = RequestEnvelope::set_zone(
            self.device_id().as_str(),
            members
                .iter()
                .map(|m| (m.device_id.as_str(), m.ip_address.as_str())),
        );
        self.send_request(request).await;
    }

    // ------------------------------------------------------------------
    // Transport plumbing
    // ------------------------------------------------------------------

    async fn event_loop(self, generation: u64, mut events: TransportEvents) {
        while let Some(event) = events.recv().await {
            if self.inner.generation.load(Ordering::SeqCst) != generation {
                return;
            }
            match event {
                TransportEvent::Opened => self.on_transport_open().await,
                TransportEvent::Message(text) => self.apply_message(&text),
                TransportEvent::Error(error) => {
                    self.transition_offline(&error).await;
                    return;
                }
                TransportEvent::Closed { reason } => {
                    let reason = if reason.is_empty() {
                        "connection closed".to_string()
                    } else {
                        reason
                    };
                    self.transition_offline(&reason).await;
                    return;
                }
            }
        }
    }

    async fn on_transport_open(&self) {
        self.inner.state.lock().connection = ConnectionState::Online;
        self.inner
            .platform
            .update_status(DeviceStatus::Online, StatusDetail::None, None);
        self.send_request(RequestEnvelope::info(self.device_id().as_str()))
            .await;
    }

    /// Drop to Offline: clear the content item, discard the transport and
    /// surface a communication error. Presets survive; they are rebuilt
    /// from the device's pushes after the next connect anyway.
    async fn transition_offline(&self, detail: &str) {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        {
            let mut state = self.inner.state.lock();
            state.connection = ConnectionState::Offline;
            state.content_item = None;
        }
        if let Some(mut sink) = self.inner.sink.lock().await.take() {
            if let Err(e) = sink.close().await {
                tracing::error!(device = %self.device_id(), error = %e, "error closing connection");
            }
        }
        self.inner.platform.update_status(
            DeviceStatus::Offline,
            StatusDetail::CommunicationError,
            Some(detail.to_string()),
        );
        self.recompute_operation_mode();
    }

    async fn send_request(&self, request: RequestEnvelope) {
        let frame = request.to_xml();
        let result = {
            let mut sink = self.inner.sink.lock().await;
            match sink.as_mut() {
                Some(sink) => sink.send(&frame).await,
                None => {
                    tracing::warn!(
                        device = %self.device_id(),
                        path = request.path(),
                        "not connected; dropping request"
                    );
                    return;
                }
            }
        };
        if let Err(e) = result {
            tracing::warn!(device = %self.device_id(), error = %e, "send failed");
            self.transition_offline(&e.to_string()).await;
        }
    }

    async fn simulate_remote_key(&self, key: RemoteKey) {
        let id = self.device_id().as_str();
        self.send_request(RequestEnvelope::key_press(id, key)).await;
        self.send_request(RequestEnvelope::key_release(id, key)).await;
    }

    // ------------------------------------------------------------------
    // Protocol event application
    // ------------------------------------------------------------------

    fn apply_message(&self, raw: &str) {
        tracing::trace!(device = %self.device_id(), payload = raw, "message received");
        for event in decode_message(raw) {
            self.apply_protocol_event(event);
        }
    }

    fn apply_protocol_event(&self, event: ProtocolEvent) {
        match event {
            ProtocolEvent::NowPlayingChanged(now_playing) => self.apply_now_playing(now_playing),
            ProtocolEvent::VolumeChanged { level, muted } => {
                self.inner.state.lock().muted = muted;
                self.update_state(Channel::Volume, StateValue::Percent(level));
                self.update_state(Channel::Mute, StateValue::Switch(muted));
            }
            ProtocolEvent::PresetsChanged(presets) => {
                self.inner.state.lock().presets = presets;
                self.recompute_operation_mode();
            }
            ProtocolEvent::ZoneChanged(update) => self.apply_zone_update(update),
            ProtocolEvent::ConnectionInfo(info) => {
                tracing::debug!(device = %self.device_id(), ?info, "device info received");
                if let Some(name) = info.name {
                    self.inner.state.lock().device_name = Some(name);
                }
            }
            ProtocolEvent::DecodeError { detail, raw } => {
                tracing::warn!(
                    device = %self.device_id(),
                    %detail,
                    payload = %raw,
                    "discarding undecodable message"
                );
            }
            ProtocolEvent::Unrecognized { element } => {
                tracing::debug!(device = %self.device_id(), %element, "ignoring unrecognized message");
            }
        }
    }

    fn apply_now_playing(&self, now_playing: NowPlaying) {
        {
            let mut state = self.inner.state.lock();
            state.content_item = if now_playing.is_standby() {
                None
            } else {
                now_playing.content_item.clone()
            };
        }
        let text = |value: Option<String>| StateValue::Text(value.unwrap_or_default());
        self.update_state(Channel::NowPlayingAlbum, text(now_playing.album.clone()));
        self.update_state(Channel::NowPlayingArtist, text(now_playing.artist.clone()));
        self.update_state(Channel::NowPlayingTrack, text(now_playing.track.clone()));
        self.update_state(
            Channel::NowPlayingStationName,
            text(now_playing.station_name.clone()),
        );
        self.update_state(
            Channel::NowPlayingStationLocation,
            text(now_playing.station_location.clone()),
        );
        self.update_state(
            Channel::NowPlayingDescription,
            text(now_playing.description.clone()),
        );
        self.update_state(
            Channel::NowPlayingItemName,
            text(
                now_playing
                    .content_item
                    .as_ref()
                    .and_then(|item| item.item_name.clone()),
            ),
        );
        self.update_state(
            Channel::NowPlayingArtwork,
            text(now_playing.art_url().map(str::to_string)),
        );
        self.update_state(
            Channel::NowPlayingPlayStatus,
            text(now_playing.play_status.map(|s| s.to_string())),
        );
        self.recompute_operation_mode();
    }

    fn apply_zone_update(&self, update: ZoneUpdate) {
        let own_id = self.device_id().clone();
        {
            let mut state = self.inner.state.lock();
            match update.master.as_deref() {
                None => {
                    state.zone_role = ZoneRole::None;
                    state.zone_members.clear();
                    state.zone_master = None;
                }
                Some(master) if master == own_id.as_str() => {
                    state.zone_master = None;
                    state.zone_members = zone_members_from(update.members, &own_id);
                    state.zone_role = if state.zone_members.is_empty() {
                        ZoneRole::None
                    } else {
                        ZoneRole::Master
                    };
                }
                Some(master) => {
                    state.zone_master = Some(DeviceId::new(master));
                    state.zone_members = zone_members_from(update.members, &own_id);
                    state.zone_role = ZoneRole::Member;
                }
            }
        }
        self.publish_zone_info();
    }

    fn publish_zone_info(&self) {
        let (role, master, members) = {
            let state = self.inner.state.lock();
            (
                state.zone_role,
                state.zone_master.clone(),
                state.zone_members.clone(),
            )
        };
        let registry = self.inner.registry.upgrade();
        let display_name = |id: &DeviceId| -> String {
            registry
                .as_ref()
                .and_then(|r| r.lookup(id))
                .map(|session| session.name())
                .unwrap_or_else(|| id.to_string())
        };
        let mut info = String::new();
        match role {
            ZoneRole::Master => info.push_str("Master; Members: "),
            ZoneRole::Member => {
                info.push_str("Member; Master is: ");
                match &master {
                    Some(id) => info.push_str(&display_name(id)),
                    None => info.push_str("<unknown>"),
                }
                info.push_str("; Members: ");
            }
            ZoneRole::None => {}
        }
        if role != ZoneRole::None {
            let names: Vec<String> = members.iter().map(|m| display_name(&m.device_id)).collect();
            info.push_str(&names.join(", "));
        }
        self.update_state(Channel::ZoneInfo, StateValue::Text(info));
    }

    // ------------------------------------------------------------------
    // Derived state
    // ------------------------------------------------------------------

    /// Recompute the derived operation mode and republish it, the power
    /// display, and the matching preset (if any).
    fn recompute_operation_mode(&self) {
        enum PresetMatch {
            NotPlaying,
            Matched(String),
            Unmatched,
        }
        let (mode, preset_match) = {
            let state = self.inner.state.lock();
            if state.connection == ConnectionState::Online {
                match &state.content_item {
                    Some(item) => {
                        let mode = item.operation_mode();
                        match state.presets.iter().find(|p| &p.content_item == item) {
                            Some(preset) => (mode, PresetMatch::Matched(preset.to_string())),
                            None => (mode, PresetMatch::Unmatched),
                        }
                    }
                    None => (OperationMode::Standby, PresetMatch::NotPlaying),
                }
            } else {
                (OperationMode::Offline, PresetMatch::NotPlaying)
            }
        };
        match preset_match {
            PresetMatch::Matched(name) => {
                self.update_state(Channel::Preset, StateValue::Text(name));
            }
            PresetMatch::Unmatched => {
                // Playing a non-preset source is valid but noteworthy.
                tracing::warn!(
                    device = %self.device_id(),
                    "active source does not match any stored preset"
                );
                self.update_state(Channel::Preset, StateValue::Text(String::new()));
            }
            PresetMatch::NotPlaying => {}
        }
        self.inner.state.lock().operation_mode = mode;
        self.update_state(Channel::OperationMode, StateValue::Text(mode.to_string()));
        self.update_state(
            Channel::Power,
            StateValue::Switch(mode != OperationMode::Standby),
        );
    }

    fn update_state(&self, channel: Channel, value: StateValue) {
        self.inner.platform.update_state(channel, value);
    }
}

impl std::fmt::Debug for DeviceSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("DeviceSession")
            .field("device_id", &self.inner.config.device_id)
            .field("connection", &state.connection)
            .field("operation_mode", &state.operation_mode)
            .field("zone_role", &state.zone_role)
            .finish()
    }
}

/// Convert pushed member entries into session zone members, dropping the
/// owning id and duplicates.
fn zone_members_from(members: Vec<ZoneMemberUpdate>, own_id: &DeviceId) -> Vec<ZoneMember> {
    let mut out: Vec<ZoneMember> = Vec::with_capacity(members.len());
    for member in members {
        if member.device_id.eq_ignore_ascii_case(own_id.as_str()) {
            continue;
        }
        if out.iter().any(|m| m.device_id.as_str() == member.device_id) {
            continue;
        }
        out.push(ZoneMember::new(
            member.device_id,
            member.ip_address.unwrap_or_default(),
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        key_frames, open_and_wait, session_fixture, wait_for, SessionFixture,
    };
    use crate::transport::TransportEvent;
    use proptest::prelude::*;

    fn registry() -> Arc<DeviceRegistry> {
        Arc::new(DeviceRegistry::new())
    }

    fn aux_now_playing() -> String {
        r#"<updates deviceID="AAAA"><nowPlayingUpdated>
            <nowPlaying deviceID="AAAA" source="AUX">
                <ContentItem source="AUX"><itemName>AUX IN</itemName></ContentItem>
            </nowPlaying>
        </nowPlayingUpdated></updates>"#
            .to_string()
    }

    fn standby_now_playing() -> String {
        r#"<updates deviceID="AAAA"><nowPlayingUpdated>
            <nowPlaying deviceID="AAAA" source="STANDBY">
                <ContentItem source="STANDBY"/>
            </nowPlaying>
        </nowPlayingUpdated></updates>"#
            .to_string()
    }

    fn radio_presets() -> String {
        r#"<updates deviceID="AAAA"><presetsUpdated><presets>
            <preset id="3">
                <ContentItem source="TUNEIN" location="/station/s1"><itemName>Jazz</itemName></ContentItem>
            </preset>
        </presets></presetsUpdated></updates>"#
            .to_string()
    }

    async fn inject(fixture: &SessionFixture, event: TransportEvent) {
        let tx = fixture
            .connections
            .lock()
            .last()
            .cloned()
            .expect("no connection established");
        tx.send(event).await.expect("event channel closed");
    }

    async fn inject_message(fixture: &SessionFixture, xml: String) {
        inject(fixture, TransportEvent::Message(xml)).await;
    }

    fn bookmark_count(sent: &[String]) -> usize {
        sent.iter().filter(|f| f.contains(">BOOKMARK<")).count()
    }

    /// Run a sentinel key command and wait for it, guaranteeing every
    /// previously enqueued command has been dispatched.
    async fn drain_commands(fixture: &SessionFixture) {
        let before = bookmark_count(&fixture.sent.lock());
        fixture
            .session
            .handle_command(Channel::KeyCode, Command::Text("BOOKMARK".to_string()));
        wait_for(|| bookmark_count(&fixture.sent.lock()) >= before + 2).await;
    }

    fn frames_without_bookmark(fixture: &SessionFixture) -> Vec<String> {
        key_frames(&fixture.sent.lock())
            .into_iter()
            .filter(|f| !f.contains(">BOOKMARK<"))
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn open_connection_comes_online_and_queries_info() {
        let registry = registry();
        let fixture = session_fixture("AAAA", "192.168.1.10", &registry);
        open_and_wait(&fixture).await;

        wait_for(|| !fixture.sent.lock().is_empty()).await;
        let sent = fixture.sent.lock();
        assert!(sent[0].contains("url=\"info\""));
        assert!(sent[0].contains("method=\"GET\""));
        drop(sent);
        let (status, detail, _) = fixture.platform.last_status().unwrap();
        assert_eq!(status, DeviceStatus::Online);
        assert_eq!(detail, StatusDetail::None);
    }

    #[tokio::test(start_paused = true)]
    async fn refused_connection_surfaces_communication_error() {
        let registry = registry();
        let fixture = session_fixture("AAAA", "192.168.1.10", &registry);
        fixture.refuse.store(true, std::sync::atomic::Ordering::SeqCst);

        fixture.session.open_connection().await;

        assert_eq!(fixture.session.connection_state(), ConnectionState::Offline);
        let (status, detail, message) = fixture.platform.last_status().unwrap();
        assert_eq!(status, DeviceStatus::Offline);
        assert_eq!(detail, StatusDetail::CommunicationError);
        assert!(message.unwrap().contains("connection refused"));
        assert_eq!(fixture.session.operation_mode(), OperationMode::Offline);
    }

    #[tokio::test(start_paused = true)]
    async fn key_command_sends_press_then_release() {
        let registry = registry();
        let fixture = session_fixture("AAAA", "192.168.1.10", &registry);
        open_and_wait(&fixture).await;

        fixture
            .session
            .handle_command(Channel::KeyCode, Command::Text("PLAY".to_string()));
        wait_for(|| key_frames(&fixture.sent.lock()).len() == 2).await;

        let frames = key_frames(&fixture.sent.lock());
        assert!(frames[0].contains("state=\"press\"") && frames[0].contains(">PLAY<"));
        assert!(frames[1].contains("state=\"release\"") && frames[1].contains(">PLAY<"));
    }

    #[tokio::test(start_paused = true)]
    async fn power_on_in_standby_sends_exactly_one_power_key_pair() {
        let registry = registry();
        let fixture = session_fixture("AAAA", "192.168.1.10", &registry);
        open_and_wait(&fixture).await;
        inject_message(&fixture, standby_now_playing()).await;
        wait_for(|| fixture.session.operation_mode() == OperationMode::Standby).await;

        fixture.session.handle_command(Channel::Power, Command::On);
        drain_commands(&fixture).await;

        let frames = frames_without_bookmark(&fixture);
        assert_eq!(frames.len(), 2);
        assert!(frames[0].contains(">POWER<") && frames[0].contains("state=\"press\""));
        assert!(frames[1].contains(">POWER<") && frames[1].contains("state=\"release\""));
    }

    #[tokio::test(start_paused = true)]
    async fn power_on_while_playing_is_a_noop() {
        let registry = registry();
        let fixture = session_fixture("AAAA", "192.168.1.10", &registry);
        open_and_wait(&fixture).await;
        inject_message(&fixture, aux_now_playing()).await;
        wait_for(|| fixture.session.operation_mode() == OperationMode::Aux).await;

        fixture.session.handle_command(Channel::Power, Command::On);
        drain_commands(&fixture).await;

        assert!(frames_without_bookmark(&fixture).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn internet_radio_powers_on_and_selects_matching_preset() {
        let registry = registry();
        let fixture = session_fixture("AAAA", "192.168.1.10", &registry);
        open_and_wait(&fixture).await;
        inject_message(&fixture, radio_presets()).await;
        inject_message(&fixture, standby_now_playing()).await;
        wait_for(|| fixture.session.operation_mode() == OperationMode::Standby).await;

        fixture.session.handle_command(
            Channel::OperationMode,
            Command::Text("INTERNET_RADIO".to_string()),
        );
        wait_for(|| key_frames(&fixture.sent.lock()).len() == 4).await;

        let frames = key_frames(&fixture.sent.lock());
        assert!(frames[0].contains(">POWER<"));
        assert!(frames[1].contains(">POWER<"));
        assert!(frames[2].contains(">PRESET_3<") && frames[2].contains("state=\"press\""));
        assert!(frames[3].contains(">PRESET_3<") && frames[3].contains("state=\"release\""));
    }

    #[tokio::test(start_paused = true)]
    async fn internet_radio_without_matching_preset_only_powers_on() {
        let registry = registry();
        let fixture = session_fixture("AAAA", "192.168.1.10", &registry);
        open_and_wait(&fixture).await;
        inject_message(&fixture, standby_now_playing()).await;
        wait_for(|| fixture.session.operation_mode() == OperationMode::Standby).await;

        fixture.session.handle_command(
            Channel::OperationMode,
            Command::Text("INTERNET_RADIO".to_string()),
        );
        drain_commands(&fixture).await;

        let frames = frames_without_bookmark(&fixture);
        assert_eq!(frames.len(), 2);
        assert!(frames.iter().all(|f| f.contains(">POWER<")));
    }

    #[tokio::test(start_paused = true)]
    async fn bluetooth_convergence_poll_is_bounded() {
        let registry = registry();
        let fixture = session_fixture("AAAA", "192.168.1.10", &registry);
        open_and_wait(&fixture).await;

        fixture.session.handle_command(
            Channel::OperationMode,
            Command::Text("BLUETOOTH".to_string()),
        );
        // 5 bounded attempts, each a press+release pair
        wait_for(|| key_frames(&fixture.sent.lock()).len() == 10).await;
        drain_commands(&fixture).await;

        let frames = frames_without_bookmark(&fixture);
        assert_eq!(frames.len(), 10);
        assert!(frames.iter().all(|f| f.contains(">AUX_INPUT<")));
    }

    #[tokio::test(start_paused = true)]
    async fn mute_command_only_sent_when_state_differs() {
        let registry = registry();
        let fixture = session_fixture("AAAA", "192.168.1.10", &registry);
        open_and_wait(&fixture).await;

        // not muted: OFF is a no-op, ON toggles
        fixture.session.handle_command(Channel::Mute, Command::Off);
        fixture.session.handle_command(Channel::Mute, Command::On);
        drain_commands(&fixture).await;
        let frames = frames_without_bookmark(&fixture);
        assert_eq!(frames.len(), 2);
        assert!(frames.iter().all(|f| f.contains(">MUTE<")));

        // device reports muted: ON is now a no-op
        inject_message(
            &fixture,
            r#"<updates deviceID="AAAA"><volumeUpdated><volume>
                <actualvolume>20</actualvolume><muteenabled>true</muteenabled>
            </volume></volumeUpdated></updates>"#
                .to_string(),
        )
        .await;
        wait_for(|| fixture.session.is_muted()).await;
        fixture.session.handle_command(Channel::Mute, Command::On);
        drain_commands(&fixture).await;
        assert_eq!(frames_without_bookmark(&fixture).len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn volume_command_posts_percentage() {
        let registry = registry();
        let fixture = session_fixture("AAAA", "192.168.1.10", &registry);
        open_and_wait(&fixture).await;

        fixture
            .session
            .handle_command(Channel::Volume, Command::Percent(42));
        wait_for(|| {
            fixture
                .sent
                .lock()
                .iter()
                .any(|f| f.contains("url=\"volume\""))
        })
        .await;

        let sent = fixture.sent.lock();
        let frame = sent.iter().find(|f| f.contains("url=\"volume\"")).unwrap();
        assert!(frame.contains("method=\"POST\""));
        assert!(frame.contains(">42</volume>"));
    }

    #[tokio::test(start_paused = true)]
    async fn volume_event_updates_platform_and_mute_flag() {
        let registry = registry();
        let fixture = session_fixture("AAAA", "192.168.1.10", &registry);
        open_and_wait(&fixture).await;

        inject_message(
            &fixture,
            r#"<updates deviceID="AAAA"><volumeUpdated><volume>
                <actualvolume>35</actualvolume><muteenabled>false</muteenabled>
            </volume></volumeUpdated></updates>"#
                .to_string(),
        )
        .await;
        wait_for(|| {
            fixture.platform.last_state(Channel::Volume) == Some(StateValue::Percent(35))
        })
        .await;
        assert_eq!(
            fixture.platform.last_state(Channel::Mute),
            Some(StateValue::Switch(false))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn now_playing_metadata_reaches_display_channels() {
        let registry = registry();
        let fixture = session_fixture("AAAA", "192.168.1.10", &registry);
        open_and_wait(&fixture).await;

        inject_message(
            &fixture,
            r#"<updates deviceID="AAAA"><nowPlayingUpdated>
                <nowPlaying deviceID="AAAA" source="TUNEIN">
                    <ContentItem source="TUNEIN" location="/station/s1"><itemName>Jazz</itemName></ContentItem>
                    <track>Take Five</track>
                    <artist>Dave Brubeck</artist>
                    <stationName>Radio Swiss Jazz</stationName>
                    <playStatus>PLAY_STATE</playStatus>
                </nowPlaying>
            </nowPlayingUpdated></updates>"#
                .to_string(),
        )
        .await;
        wait_for(|| fixture.session.operation_mode() == OperationMode::InternetRadio).await;

        let platform = &fixture.platform;
        assert_eq!(
            platform.last_state(Channel::NowPlayingTrack),
            Some(StateValue::Text("Take Five".to_string()))
        );
        assert_eq!(
            platform.last_state(Channel::NowPlayingArtist),
            Some(StateValue::Text("Dave Brubeck".to_string()))
        );
        assert_eq!(
            platform.last_state(Channel::NowPlayingStationName),
            Some(StateValue::Text("Radio Swiss Jazz".to_string()))
        );
        assert_eq!(
            platform.last_state(Channel::NowPlayingPlayStatus),
            Some(StateValue::Text("PLAY_STATE".to_string()))
        );
        // playing a source that is not in the (empty) preset list clears the display
        assert_eq!(
            platform.last_state(Channel::Preset),
            Some(StateValue::Text(String::new()))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn matching_preset_is_surfaced_when_mode_recomputes() {
        let registry = registry();
        let fixture = session_fixture("AAAA", "192.168.1.10", &registry);
        open_and_wait(&fixture).await;
        inject_message(&fixture, radio_presets()).await;
        inject_message(
            &fixture,
            r#"<updates deviceID="AAAA"><nowPlayingUpdated>
                <nowPlaying deviceID="AAAA" source="TUNEIN">
                    <ContentItem source="TUNEIN" location="/station/s1"><itemName>Jazz</itemName></ContentItem>
                </nowPlaying>
            </nowPlayingUpdated></updates>"#
                .to_string(),
        )
        .await;
        wait_for(|| {
            fixture.platform.last_state(Channel::Preset)
                == Some(StateValue::Text("PRESET_3".to_string()))
        })
        .await;
        assert_eq!(
            fixture.session.operation_mode(),
            OperationMode::InternetRadio
        );
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_xml_leaves_session_state_untouched() {
        let registry = registry();
        let fixture = session_fixture("AAAA", "192.168.1.10", &registry);
        open_and_wait(&fixture).await;
        inject_message(&fixture, radio_presets()).await;
        inject_message(&fixture, aux_now_playing()).await;
        wait_for(|| fixture.session.operation_mode() == OperationMode::Aux).await;
        let statuses_before = fixture.platform.statuses.lock().len();

        inject_message(&fixture, "<<<definitely not xml".to_string()).await;
        // a recognizable event afterwards proves the loop is still alive
        inject_message(
            &fixture,
            r#"<updates deviceID="AAAA"><volumeUpdated><volume>
                <actualvolume>31</actualvolume>
            </volume></volumeUpdated></updates>"#
                .to_string(),
        )
        .await;
        wait_for(|| {
            fixture.platform.last_state(Channel::Volume) == Some(StateValue::Percent(31))
        })
        .await;

        assert_eq!(fixture.session.connection_state(), ConnectionState::Online);
        assert_eq!(fixture.session.operation_mode(), OperationMode::Aux);
        assert_eq!(fixture.session.presets().len(), 1);
        assert_eq!(fixture.platform.statuses.lock().len(), statuses_before);
    }

    #[tokio::test(start_paused = true)]
    async fn transport_close_clears_content_and_reports_offline() {
        let registry = registry();
        let fixture = session_fixture("AAAA", "192.168.1.10", &registry);
        open_and_wait(&fixture).await;
        inject_message(&fixture, aux_now_playing()).await;
        wait_for(|| fixture.session.operation_mode() == OperationMode::Aux).await;

        inject(
            &fixture,
            TransportEvent::Closed {
                reason: "device went away".to_string(),
            },
        )
        .await;
        wait_for(|| fixture.session.connection_state() == ConnectionState::Offline).await;

        assert!(fixture.session.content_item().is_none());
        assert_eq!(fixture.session.operation_mode(), OperationMode::Offline);
        let (status, detail, message) = fixture.platform.last_status().unwrap();
        assert_eq!(status, DeviceStatus::Offline);
        assert_eq!(detail, StatusDetail::CommunicationError);
        assert_eq!(message.as_deref(), Some("device went away"));
        assert_eq!(
            fixture.platform.last_state(Channel::OperationMode),
            Some(StateValue::Text("OFFLINE".to_string()))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn command_while_offline_triggers_reconnect() {
        let registry = registry();
        let fixture = session_fixture("AAAA", "192.168.1.10", &registry);
        assert_eq!(fixture.connections.lock().len(), 0);

        fixture
            .session
            .handle_command(Channel::KeyCode, Command::Text("MUTE".to_string()));
        wait_for(|| key_frames(&fixture.sent.lock()).len() == 2).await;

        assert_eq!(fixture.connections.lock().len(), 1);
        assert_eq!(fixture.session.connection_state(), ConnectionState::Online);
    }

    #[tokio::test(start_paused = true)]
    async fn reconnect_resets_zone_state() {
        let registry = registry();
        let fixture = session_fixture("AAAA", "192.168.1.10", &registry);
        let peer = session_fixture("BBBB", "192.168.1.11", &registry);
        registry.register(fixture.session.clone());
        registry.register(peer.session.clone());
        open_and_wait(&fixture).await;

        fixture
            .session
            .handle_command(Channel::ZoneControl, Command::Text("add BBBB".to_string()));
        wait_for(|| fixture.session.zone_members().len() == 1).await;

        inject(
            &fixture,
            TransportEvent::Closed {
                reason: String::new(),
            },
        )
        .await;
        wait_for(|| fixture.session.connection_state() == ConnectionState::Offline).await;
        open_and_wait(&fixture).await;

        assert!(fixture.session.zone_members().is_empty());
        assert_eq!(fixture.session.zone_role(), ZoneRole::None);
    }

    // ------------------------------------------------------------------
    // Zone command scenarios
    // ------------------------------------------------------------------

    fn zone_frames(fixture: &SessionFixture) -> Vec<String> {
        fixture
            .sent
            .lock()
            .iter()
            .filter(|f| f.contains("url=\"setZone\""))
            .cloned()
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn zone_add_pushes_descriptor_and_is_idempotent() {
        let registry = registry();
        let fixture = session_fixture("AAAA", "192.168.1.10", &registry);
        let peer = session_fixture("BBBB", "192.168.1.11", &registry);
        registry.register(fixture.session.clone());
        registry.register(peer.session.clone());
        open_and_wait(&fixture).await;

        fixture
            .session
            .handle_command(Channel::ZoneControl, Command::Text("add BBBB".to_string()));
        wait_for(|| !zone_frames(&fixture).is_empty()).await;

        let frames = zone_frames(&fixture);
        assert_eq!(frames.len(), 1);
        assert!(frames[0].contains("<zone master=\"AAAA\">"));
        assert!(frames[0].contains("<member ipaddress=\"192.168.1.11\">BBBB</member>"));
        assert_eq!(fixture.session.zone_members().len(), 1);

        // second add is a warned no-op
        fixture
            .session
            .handle_command(Channel::ZoneControl, Command::Text("add BBBB".to_string()));
        drain_commands(&fixture).await;
        assert_eq!(zone_frames(&fixture).len(), 1);
        assert_eq!(fixture.session.zone_members().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn zone_peer_resolves_by_name_case_insensitively() {
        let registry = registry();
        let fixture = session_fixture("AAAA", "192.168.1.10", &registry);
        let peer = session_fixture("BBBB", "Living Room", &registry);
        registry.register(fixture.session.clone());
        registry.register(peer.session.clone());
        open_and_wait(&fixture).await;

        fixture.session.handle_command(
            Channel::ZoneControl,
            Command::Text("add living room".to_string()),
        );
        wait_for(|| fixture.session.zone_members().len() == 1).await;
        assert_eq!(
            fixture.session.zone_members()[0].device_id,
            DeviceId::new("BBBB")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn zone_remove_updates_descriptor_and_warns_when_absent() {
        let registry = registry();
        let fixture = session_fixture("AAAA", "192.168.1.10", &registry);
        let peer = session_fixture("BBBB", "192.168.1.11", &registry);
        registry.register(fixture.session.clone());
        registry.register(peer.session.clone());
        open_and_wait(&fixture).await;

        fixture
            .session
            .handle_command(Channel::ZoneControl, Command::Text("add BBBB".to_string()));
        wait_for(|| fixture.session.zone_members().len() == 1).await;

        fixture.session.handle_command(
            Channel::ZoneControl,
            Command::Text("remove BBBB".to_string()),
        );
        wait_for(|| fixture.session.zone_members().is_empty()).await;
        let frames = zone_frames(&fixture);
        assert_eq!(frames.len(), 2);
        assert!(frames[1].contains("<zone master=\"AAAA\"></zone>"));

        // removing again is a warned no-op
        fixture.session.handle_command(
            Channel::ZoneControl,
            Command::Text("remove BBBB".to_string()),
        );
        drain_commands(&fixture).await;
        assert_eq!(zone_frames(&fixture).len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn zone_add_with_unknown_peer_sends_nothing() {
        let registry = registry();
        let fixture = session_fixture("AAAA", "192.168.1.10", &registry);
        registry.register(fixture.session.clone());
        open_and_wait(&fixture).await;

        fixture.session.handle_command(
            Channel::ZoneControl,
            Command::Text("add UnknownName".to_string()),
        );
        drain_commands(&fixture).await;

        assert!(zone_frames(&fixture).is_empty());
        assert!(fixture.session.zone_members().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn zone_add_rejects_self_membership() {
        let registry = registry();
        let fixture = session_fixture("AAAA", "192.168.1.10", &registry);
        registry.register(fixture.session.clone());
        open_and_wait(&fixture).await;

        fixture
            .session
            .handle_command(Channel::ZoneControl, Command::Text("add AAAA".to_string()));
        drain_commands(&fixture).await;

        assert!(zone_frames(&fixture).is_empty());
        assert!(fixture.session.zone_members().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_zone_command_is_ignored() {
        let registry = registry();
        let fixture = session_fixture("AAAA", "192.168.1.10", &registry);
        registry.register(fixture.session.clone());
        open_and_wait(&fixture).await;

        for raw in ["add", "join BBBB", ""] {
            fixture
                .session
                .handle_command(Channel::ZoneControl, Command::Text(raw.to_string()));
        }
        drain_commands(&fixture).await;

        assert!(zone_frames(&fixture).is_empty());
    }

    // ------------------------------------------------------------------
    // Zone pushes from the device
    // ------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn zone_push_assigns_master_role() {
        let registry = registry();
        let fixture = session_fixture("AAAA", "192.168.1.10", &registry);
        let peer = session_fixture("BBBB", "Living Room", &registry);
        registry.register(fixture.session.clone());
        registry.register(peer.session.clone());
        open_and_wait(&fixture).await;

        inject_message(
            &fixture,
            r#"<updates deviceID="AAAA"><zoneUpdated>
                <zone master="AAAA"><member ipaddress="192.168.1.11">BBBB</member></zone>
            </zoneUpdated></updates>"#
                .to_string(),
        )
        .await;
        wait_for(|| fixture.session.zone_role() == ZoneRole::Master).await;
        assert_eq!(
            fixture.platform.last_state(Channel::ZoneInfo),
            Some(StateValue::Text("Master; Members: Living Room".to_string()))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn zone_push_assigns_member_role_with_master_reference() {
        let registry = registry();
        let fixture = session_fixture("AAAA", "192.168.1.10", &registry);
        let master = session_fixture("CCCC", "Kitchen", &registry);
        registry.register(fixture.session.clone());
        registry.register(master.session.clone());
        open_and_wait(&fixture).await;

        inject_message(
            &fixture,
            r#"<updates deviceID="AAAA"><zoneUpdated>
                <zone master="CCCC"><member ipaddress="192.168.1.10">AAAA</member></zone>
            </zoneUpdated></updates>"#
                .to_string(),
        )
        .await;
        wait_for(|| fixture.session.zone_role() == ZoneRole::Member).await;
        // own id is excluded from the member list
        assert!(fixture.session.zone_members().is_empty());
        assert_eq!(
            fixture.platform.last_state(Channel::ZoneInfo),
            Some(StateValue::Text(
                "Member; Master is: Kitchen; Members: ".to_string()
            ))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn dissolved_zone_push_clears_role() {
        let registry = registry();
        let fixture = session_fixture("AAAA", "192.168.1.10", &registry);
        registry.register(fixture.session.clone());
        open_and_wait(&fixture).await;

        inject_message(
            &fixture,
            r#"<updates deviceID="AAAA"><zoneUpdated>
                <zone master="AAAA"><member ipaddress="192.168.1.11">BBBB</member></zone>
            </zoneUpdated></updates>"#
                .to_string(),
        )
        .await;
        wait_for(|| fixture.session.zone_role() == ZoneRole::Master).await;

        inject_message(
            &fixture,
            r#"<updates deviceID="AAAA"><zoneUpdated><zone/></zoneUpdated></updates>"#.to_string(),
        )
        .await;
        wait_for(|| fixture.session.zone_role() == ZoneRole::None).await;
        assert!(fixture.session.zone_members().is_empty());
        assert_eq!(
            fixture.platform.last_state(Channel::ZoneInfo),
            Some(StateValue::Text(String::new()))
        );
    }

    // ------------------------------------------------------------------
    // Zone member list invariants
    // ------------------------------------------------------------------

    proptest! {
        #[test]
        fn zone_member_list_never_holds_duplicates(
            ops in proptest::collection::vec((0u8..6, proptest::bool::ANY), 0..64)
        ) {
            let mut state = SessionState::default();
            for (peer, add) in ops {
                let id = format!("PEER_{peer}");
                if add {
                    state.add_zone_member(ZoneMember::new(id.as_str(), "10.0.0.1"));
                } else {
                    state.remove_zone_member(&DeviceId::new(id.as_str()));
                }
                let ids: Vec<&str> = state
                    .zone_members
                    .iter()
                    .map(|m| m.device_id.as_str())
                    .collect();
                let unique: std::collections::HashSet<&&str> = ids.iter().collect();
                prop_assert_eq!(ids.len(), unique.len());
            }
        }

        #[test]
        fn add_twice_equals_add_once(peer in "[A-F0-9]{4}") {
            let mut once = SessionState::default();
            once.add_zone_member(ZoneMember::new(peer.as_str(), "10.0.0.1"));

            let mut twice = SessionState::default();
            twice.add_zone_member(ZoneMember::new(peer.as_str(), "10.0.0.1"));
            twice.add_zone_member(ZoneMember::new(peer.as_str(), "10.0.0.1"));

            prop_assert_eq!(once.zone_members, twice.zone_members);
        }
    }
}
