//! Room worker lifecycle
//!
//! **Responsibilities:**
//! - Inbox and run loop (commands, stream completions, search expiry)
//! - Voice presence (`ensure_voice`)
//! - Reply, reaction and event helpers shared by the driver and controls
//! - Activity bookkeeping read by the coordinator's eviction sweep

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use jukebox_common::events::{EventBus, JukeboxEvent};
use jukebox_common::{RoomId, TextChannelId};

use crate::chat::{ChatSurface, MessageRef, OutgoingMessage};
use crate::config::Settings;
use crate::control::search::{render_results, SearchSessions};
use crate::control::{Action, Origin};
use crate::display::StatusDisplay;
use crate::error::{Error, Result};
use crate::playback::{PlaybackState, StreamToken};
use crate::resolver::TrackResolver;
use crate::session::SessionState;
use crate::transport::{VoiceGateway, VoiceTransport};

/// Work item for a room worker
#[derive(Debug)]
pub enum RoomMessage {
    /// Control-surface action routed by the coordinator
    Command { origin: Origin, action: Action },

    /// Transport reported the end of a stream; `ack` receives the advance result
    StreamFinished {
        stream: StreamToken,
        error: Option<String>,
        ack: oneshot::Sender<Result<()>>,
    },
}

/// Collaborators shared by every room
#[derive(Clone)]
pub struct RoomDeps {
    pub gateway: Arc<dyn VoiceGateway>,
    pub chat: Arc<dyn ChatSurface>,
    pub resolver: Arc<dyn TrackResolver>,
    pub events: EventBus,
    pub settings: Arc<Settings>,
}

/// Progress counters a room publishes for the coordinator
#[derive(Debug)]
pub struct RoomActivity {
    processed: AtomicU64,
    idle_since: Mutex<Option<Instant>>,
}

impl RoomActivity {
    fn new(now: Instant) -> Self {
        Self {
            processed: AtomicU64::new(0),
            idle_since: Mutex::new(Some(now)),
        }
    }

    /// Commands fully handled so far
    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::Acquire)
    }

    /// Start of the current idle stretch, if the room is idle
    pub fn idle_since(&self) -> Option<Instant> {
        *self.idle_since.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn record(&self, command_done: bool, idle: bool, now: Instant) {
        {
            let mut since = self.idle_since.lock().unwrap_or_else(|p| p.into_inner());
            match (idle, *since) {
                (true, None) => *since = Some(now),
                (false, _) => *since = None,
                (true, Some(_)) => {}
            }
        }
        // Published after the idle state so a matching count implies fresh idleness
        if command_done {
            self.processed.fetch_add(1, Ordering::AcqRel);
        }
    }
}

/// Inbox of a room that is not yet running
///
/// `Room::new` hands this out so a caller can either spawn the worker or
/// drive the room by hand, feeding it the messages that arrive here.
pub struct RoomMailbox {
    pub tx: mpsc::UnboundedSender<RoomMessage>,
    pub rx: mpsc::UnboundedReceiver<RoomMessage>,
}

impl RoomMailbox {
    pub async fn recv(&mut self) -> Option<RoomMessage> {
        self.rx.recv().await
    }
}

/// Coordinator-side handle to a running room worker
pub struct RoomHandle {
    room: RoomId,
    tx: mpsc::UnboundedSender<RoomMessage>,
    activity: Arc<RoomActivity>,
    routed: u64,
    task: JoinHandle<()>,
}

impl RoomHandle {
    /// Create the room's session and start its worker
    pub fn spawn(room: RoomId, deps: RoomDeps) -> Self {
        let (worker, mailbox) = Room::new(room, deps);
        let activity = Arc::clone(&worker.activity);
        let RoomMailbox { tx, rx } = mailbox;
        let task = tokio::spawn(worker.run(rx));

        Self {
            room,
            tx,
            activity,
            routed: 0,
            task,
        }
    }

    pub fn room(&self) -> RoomId {
        self.room
    }

    /// Route an action to the worker
    pub fn send(&mut self, origin: Origin, action: Action) -> Result<()> {
        self.tx
            .send(RoomMessage::Command { origin, action })
            .map_err(|_| Error::Shutdown)?;
        self.routed += 1;
        Ok(())
    }

    /// Every routed command handled and idle for at least `idle_after`
    pub fn is_evictable(&self, now: Instant, idle_after: Duration) -> bool {
        if self.activity.processed() != self.routed {
            return false;
        }
        match self.activity.idle_since() {
            Some(since) => now.saturating_duration_since(since) >= idle_after,
            None => false,
        }
    }

    /// Worker task has exited
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Close the inbox and wait for the worker to disconnect and exit
    pub async fn shutdown(self) {
        let Self { room, tx, task, .. } = self;
        drop(tx);
        if let Err(e) = task.await {
            warn!("Room {} worker ended abnormally: {}", room, e);
        }
    }
}

/// State and collaborators of one room, owned by its worker
pub struct Room {
    pub(super) room: RoomId,
    pub(super) session: SessionState,
    pub(super) transport: Option<Arc<dyn VoiceTransport>>,
    pub(super) searches: SearchSessions,
    pub(super) display: StatusDisplay,
    pub(super) deps: RoomDeps,
    /// Weak so completion handles never keep an evicted room alive
    pub(super) inbox: mpsc::WeakUnboundedSender<RoomMessage>,
    pub(super) advancing: bool,
    activity: Arc<RoomActivity>,
}

impl Room {
    pub fn new(room: RoomId, deps: RoomDeps) -> (Self, RoomMailbox) {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = Self {
            room,
            session: SessionState::new(room),
            transport: None,
            searches: SearchSessions::new(deps.settings.search_timeout),
            display: StatusDisplay::new(Arc::clone(&deps.chat)),
            inbox: tx.downgrade(),
            advancing: false,
            activity: Arc::new(RoomActivity::new(Instant::now())),
            deps,
        };
        (worker, RoomMailbox { tx, rx })
    }

    pub fn room_id(&self) -> RoomId {
        self.room
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SessionState {
        &mut self.session
    }

    pub fn transport(&self) -> Option<&Arc<dyn VoiceTransport>> {
        self.transport.as_ref()
    }

    /// Install an already-connected transport
    pub fn attach_transport(&mut self, transport: Arc<dyn VoiceTransport>) {
        self.transport = Some(transport);
    }

    pub fn playback_state(&self) -> PlaybackState {
        if self.advancing {
            return PlaybackState::Advancing;
        }
        match &self.transport {
            Some(t) if t.is_paused() => PlaybackState::Paused,
            Some(t) if t.is_playing() => PlaybackState::Playing,
            _ => PlaybackState::Idle,
        }
    }

    /// No transport, nothing to play and no open search
    pub fn is_idle(&self) -> bool {
        self.transport.is_none() && self.session.has_nothing_to_play() && self.searches.is_empty()
    }

    /// Handle one inbox message to completion
    pub async fn handle_message(&mut self, message: RoomMessage) {
        let command_done = match message {
            RoomMessage::Command { origin, action } => {
                debug!("Room {} handling {}", self.room, action.name());
                self.session.last_text_channel = Some(origin.text_channel);
                self.dispatch(&origin, action).await;
                true
            }
            RoomMessage::StreamFinished { stream, error, ack } => {
                let result = self.on_stream_finished(stream, error).await;
                if ack.send(result).is_err() {
                    debug!("Completion for stream {} no longer awaited", stream);
                }
                false
            }
        };

        self.activity.record(command_done, self.is_idle(), Instant::now());
    }

    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<RoomMessage>) {
        info!("Room {} worker started", self.room);

        loop {
            let deadline = self.searches.next_deadline();
            tokio::select! {
                message = rx.recv() => {
                    let Some(message) = message else { break };
                    self.expire_searches().await;
                    self.handle_message(message).await;
                }
                _ = sleep_until_opt(deadline) => {
                    self.expire_searches().await;
                    self.activity.record(false, self.is_idle(), Instant::now());
                }
            }
        }

        if let Some(transport) = self.transport.take() {
            self.session.active_stream = None;
            if let Err(e) = transport.disconnect().await {
                warn!("Disconnect on room {} shutdown failed: {}", self.room, e);
            }
        }
        info!("Room {} worker stopped", self.room);
    }

    /// Close due search sets and tell their channels
    pub(super) async fn expire_searches(&mut self) {
        for expired in self.searches.expire_due(Instant::now()) {
            debug!("Search {} expired in room {}", expired.set, self.room);
            self.post(expired.channel, OutgoingMessage::text("❌ Search timed out."))
                .await;
            if let Some(message) = expired.message {
                let closed = render_results(expired.set, &expired.tracks, false);
                if let Err(e) = self.deps.chat.edit(&message, closed).await {
                    warn!("Could not remove buttons from expired search: {}", e);
                }
            }
        }
    }

    /// Join (or move to) the invoking user's voice channel
    ///
    /// Failures are reported to the user here; the caller aborts its action.
    pub(super) async fn ensure_voice(&mut self, origin: &Origin) -> Result<Arc<dyn VoiceTransport>> {
        let Some(channel) = origin.voice else {
            self.reply(origin, format!("❌ {}", Error::NotInVoice)).await;
            return Err(Error::NotInVoice);
        };

        if let Some(transport) = &self.transport {
            let transport = Arc::clone(transport);
            if transport.channel() != channel {
                if let Err(e) = transport.move_to(channel).await {
                    let reason = reason(&e);
                    self.reply(origin, format!("❌ Failed to move to voice channel: `{}`", reason))
                        .await;
                    return Err(Error::VoiceConnect(reason));
                }
                info!("Room {} moved to voice channel {}", self.room, channel);
            }
            return Ok(transport);
        }

        let timeout = self.deps.settings.connect_timeout;
        let connected = tokio::time::timeout(timeout, self.deps.gateway.connect(self.room, channel)).await;
        match connected {
            Ok(Ok(transport)) => {
                info!("Room {} connected to voice channel {}", self.room, channel);
                self.transport = Some(Arc::clone(&transport));
                Ok(transport)
            }
            Err(_) | Ok(Err(Error::ConnectTimeout(_))) => {
                warn!("Room {} timed out connecting to voice", self.room);
                self.reply(
                    origin,
                    "❌ Timed out connecting to voice. Please try again or check your network/region settings.",
                )
                .await;
                Err(Error::ConnectTimeout(timeout))
            }
            Ok(Err(e)) => {
                let reason = reason(&e);
                warn!("Room {} voice connect failed: {}", self.room, reason);
                self.reply(origin, format!("❌ Failed to connect to voice channel: `{}`", reason))
                    .await;
                Err(Error::VoiceConnect(reason))
            }
        }
    }

    /// Answer the invoker; button presses get an ephemeral reply
    pub(super) async fn reply(&self, origin: &Origin, text: impl Into<String>) {
        let mut message = OutgoingMessage::text(text);
        if origin.is_button() {
            message = message.ephemeral(origin.user);
        }
        self.post(origin.text_channel, message).await;
    }

    /// Post to the room's last command channel
    pub(super) async fn notify_channel(&self, text: impl Into<String>) {
        match self.session.last_text_channel {
            Some(channel) => {
                self.post(channel, OutgoingMessage::text(text)).await;
            }
            None => debug!("Room {} has no text channel for notices", self.room),
        }
    }

    pub(super) async fn post(&self, channel: TextChannelId, message: OutgoingMessage) -> Option<MessageRef> {
        match self.deps.chat.send(channel, message).await {
            Ok(sent) => Some(sent),
            Err(e) => {
                warn!("Room {} could not post to channel {}: {}", self.room, channel, e);
                None
            }
        }
    }

    pub(super) async fn react(&self, origin: &Origin, emoji: &str) {
        let Some(target) = origin.message_ref() else {
            return;
        };
        if let Err(e) = self.deps.chat.react(&target, emoji).await {
            warn!("Room {} could not react to {:?}: {}", self.room, target, e);
        }
    }

    pub(super) fn emit(&self, event: JukeboxEvent) {
        self.deps.events.emit_lossy(event);
    }

    pub(super) fn now() -> chrono::DateTime<Utc> {
        Utc::now()
    }
}

/// User-facing reason text without the error-kind prefix
pub(super) fn reason(error: &Error) -> String {
    match error {
        Error::VoiceConnect(r) | Error::Resolution(r) | Error::Source(r) | Error::Display(r) => r.clone(),
        other => other.to_string(),
    }
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
