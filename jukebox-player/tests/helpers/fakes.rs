//! Recording fakes for the external seams

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::thread;

use async_trait::async_trait;

use jukebox_common::{MessageId, RoomId, TextChannelId, Track, VoiceChannelId};
use jukebox_player::chat::{ChatSurface, MessageRef, OutgoingMessage};
use jukebox_player::playback::{AudioSource, CompletionHandle};
use jukebox_player::resolver::TrackResolver;
use jukebox_player::transport::{VoiceGateway, VoiceTransport};
use jukebox_player::{Error, Result};

/// Track with CDN stream URL, page URL and a two minute duration
pub fn track(name: &str) -> Track {
    Track::new(
        format!("https://cdn.example/{}", name),
        name,
        format!("https://video.example/{}", name),
    )
    .with_duration(120)
}

// ============================================================================
// Voice
// ============================================================================

#[derive(Default)]
struct TransportState {
    playing: bool,
    paused: bool,
    pending: Option<CompletionHandle>,
    played: Vec<AudioSource>,
    stops: usize,
    disconnects: usize,
    moves: Vec<VoiceChannelId>,
    volumes: Vec<f32>,
    failing_urls: HashSet<String>,
}

/// Transport that records calls; completions fire from background threads
pub struct FakeTransport {
    channel: Mutex<VoiceChannelId>,
    state: Mutex<TransportState>,
}

impl FakeTransport {
    pub fn new(channel: VoiceChannelId) -> Arc<Self> {
        Arc::new(Self {
            channel: Mutex::new(channel),
            state: Mutex::new(TransportState::default()),
        })
    }

    /// Make `play` fail with a source error for this URL
    pub fn fail_url(&self, url: &str) {
        self.state.lock().unwrap().failing_urls.insert(url.to_string());
    }

    pub fn played_urls(&self) -> Vec<String> {
        self.state.lock().unwrap().played.iter().map(|s| s.url.clone()).collect()
    }

    pub fn played_volumes(&self) -> Vec<f32> {
        self.state.lock().unwrap().played.iter().map(|s| s.volume).collect()
    }

    pub fn play_count(&self) -> usize {
        self.state.lock().unwrap().played.len()
    }

    pub fn stop_count(&self) -> usize {
        self.state.lock().unwrap().stops
    }

    pub fn disconnect_count(&self) -> usize {
        self.state.lock().unwrap().disconnects
    }

    pub fn moves(&self) -> Vec<VoiceChannelId> {
        self.state.lock().unwrap().moves.clone()
    }

    pub fn live_volumes(&self) -> Vec<f32> {
        self.state.lock().unwrap().volumes.clone()
    }

    /// Force the reported playing state
    pub fn set_playing(&self, playing: bool) {
        let mut state = self.state.lock().unwrap();
        state.playing = playing;
        state.paused = false;
    }

    pub fn set_paused(&self) {
        let mut state = self.state.lock().unwrap();
        state.playing = false;
        state.paused = true;
    }

    /// End the stream silently and hand back its completion handle
    pub fn end_stream(&self) -> Option<CompletionHandle> {
        let mut state = self.state.lock().unwrap();
        state.playing = false;
        state.paused = false;
        state.pending.take()
    }

    /// End the stream as a real player would: report from another thread
    pub fn finish_in_background(&self, error: Option<String>) -> thread::JoinHandle<()> {
        let handle = self.end_stream().expect("no active stream to finish");
        thread::spawn(move || handle.notify_blocking(error))
    }

    fn end_and_notify(state: &mut TransportState) {
        state.playing = false;
        state.paused = false;
        if let Some(handle) = state.pending.take() {
            thread::spawn(move || handle.notify_blocking(None));
        }
    }
}

#[async_trait]
impl VoiceTransport for FakeTransport {
    fn channel(&self) -> VoiceChannelId {
        *self.channel.lock().unwrap()
    }

    async fn move_to(&self, channel: VoiceChannelId) -> Result<()> {
        *self.channel.lock().unwrap() = channel;
        self.state.lock().unwrap().moves.push(channel);
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.disconnects += 1;
        Self::end_and_notify(&mut state);
        Ok(())
    }

    fn play(&self, source: AudioSource, on_complete: CompletionHandle) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.failing_urls.contains(&source.url) {
            return Err(Error::Source(format!("cannot open {}", source.url)));
        }
        state.played.push(source);
        state.playing = true;
        state.paused = false;
        state.pending = Some(on_complete);
        Ok(())
    }

    fn pause(&self) {
        let mut state = self.state.lock().unwrap();
        if state.playing {
            state.playing = false;
            state.paused = true;
        }
    }

    fn resume(&self) {
        let mut state = self.state.lock().unwrap();
        if state.paused {
            state.paused = false;
            state.playing = true;
        }
    }

    fn stop(&self) {
        let mut state = self.state.lock().unwrap();
        state.stops += 1;
        Self::end_and_notify(&mut state);
    }

    fn is_playing(&self) -> bool {
        self.state.lock().unwrap().playing
    }

    fn is_paused(&self) -> bool {
        self.state.lock().unwrap().paused
    }

    fn set_volume(&self, volume: f32) -> bool {
        self.state.lock().unwrap().volumes.push(volume);
        true
    }
}

/// How the fake gateway answers `connect`
#[derive(Debug, Clone)]
pub enum ConnectMode {
    Succeed,
    Fail(String),
    /// Never completes; exercises the connect timeout
    Hang,
}

pub struct FakeGateway {
    mode: Mutex<ConnectMode>,
    transports: Mutex<Vec<Arc<FakeTransport>>>,
}

impl FakeGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            mode: Mutex::new(ConnectMode::Succeed),
            transports: Mutex::new(Vec::new()),
        })
    }

    pub fn set_mode(&self, mode: ConnectMode) {
        *self.mode.lock().unwrap() = mode;
    }

    pub fn connect_count(&self) -> usize {
        self.transports.lock().unwrap().len()
    }

    pub fn last_transport(&self) -> Option<Arc<FakeTransport>> {
        self.transports.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl VoiceGateway for FakeGateway {
    async fn connect(&self, _room: RoomId, channel: VoiceChannelId) -> Result<Arc<dyn VoiceTransport>> {
        let mode = self.mode.lock().unwrap().clone();
        match mode {
            ConnectMode::Succeed => {
                let transport = FakeTransport::new(channel);
                self.transports.lock().unwrap().push(Arc::clone(&transport));
                Ok(transport as Arc<dyn VoiceTransport>)
            }
            ConnectMode::Fail(reason) => Err(Error::VoiceConnect(reason)),
            ConnectMode::Hang => std::future::pending().await,
        }
    }
}

// ============================================================================
// Chat
// ============================================================================

/// One recorded send
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub target: MessageRef,
    pub message: OutgoingMessage,
}

impl SentMessage {
    pub fn text(&self) -> Option<&str> {
        self.message.content.as_deref()
    }

    pub fn embed_title(&self) -> Option<&str> {
        self.message.embed.as_ref().map(|e| e.title.as_str())
    }
}

struct ChatState {
    next_id: u64,
    sent: Vec<SentMessage>,
    edits: Vec<(MessageRef, OutgoingMessage)>,
    reactions: Vec<(MessageRef, String)>,
    history: HashMap<TextChannelId, Vec<MessageId>>,
    can_edit: bool,
    fail_edit: bool,
    fail_send: bool,
    fail_history: bool,
}

/// Chat surface that records traffic and keeps per-channel history
pub struct FakeChat {
    state: Mutex<ChatState>,
}

impl FakeChat {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(ChatState {
                next_id: 1000,
                sent: Vec::new(),
                edits: Vec::new(),
                reactions: Vec::new(),
                history: HashMap::new(),
                can_edit: true,
                fail_edit: false,
                fail_send: false,
                fail_history: false,
            }),
        })
    }

    /// Simulate `count` messages from other users
    pub fn push_foreign(&self, channel: TextChannelId, count: usize) {
        let mut state = self.state.lock().unwrap();
        for _ in 0..count {
            let id = MessageId(state.next_id);
            state.next_id += 1;
            state.history.entry(channel).or_default().push(id);
        }
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.state.lock().unwrap().sent.clone()
    }

    /// Text content of every sent message, in order
    pub fn texts(&self) -> Vec<String> {
        self.sent()
            .iter()
            .filter_map(|m| m.text().map(str::to_string))
            .collect()
    }

    pub fn has_text(&self, text: &str) -> bool {
        self.texts().iter().any(|t| t == text)
    }

    /// Sent messages whose embed carries `title`
    pub fn embeds_titled(&self, title: &str) -> Vec<SentMessage> {
        self.sent()
            .into_iter()
            .filter(|m| m.embed_title() == Some(title))
            .collect()
    }

    pub fn edits(&self) -> Vec<(MessageRef, OutgoingMessage)> {
        self.state.lock().unwrap().edits.clone()
    }

    pub fn reactions(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .reactions
            .iter()
            .map(|(_, e)| e.clone())
            .collect()
    }

    pub fn set_can_edit(&self, can_edit: bool) {
        self.state.lock().unwrap().can_edit = can_edit;
    }

    pub fn set_fail_edit(&self, fail: bool) {
        self.state.lock().unwrap().fail_edit = fail;
    }

    pub fn set_fail_send(&self, fail: bool) {
        self.state.lock().unwrap().fail_send = fail;
    }

    pub fn set_fail_history(&self, fail: bool) {
        self.state.lock().unwrap().fail_history = fail;
    }
}

#[async_trait]
impl ChatSurface for FakeChat {
    async fn send(&self, channel: TextChannelId, message: OutgoingMessage) -> Result<MessageRef> {
        let mut state = self.state.lock().unwrap();
        if state.fail_send {
            return Err(Error::Display("send rejected".to_string()));
        }
        let id = MessageId(state.next_id);
        state.next_id += 1;
        state.history.entry(channel).or_default().push(id);
        let target = MessageRef::new(channel, id);
        state.sent.push(SentMessage { target, message });
        Ok(target)
    }

    async fn edit(&self, target: &MessageRef, message: OutgoingMessage) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_edit {
            return Err(Error::Display("edit rejected".to_string()));
        }
        state.edits.push((*target, message));
        Ok(())
    }

    async fn recent_message_ids(&self, channel: TextChannelId, limit: usize) -> Result<Vec<MessageId>> {
        let state = self.state.lock().unwrap();
        if state.fail_history {
            return Err(Error::Display("history unavailable".to_string()));
        }
        Ok(state
            .history
            .get(&channel)
            .map(|h| h.iter().rev().take(limit).copied().collect())
            .unwrap_or_default())
    }

    async fn can_edit(&self, _channel: TextChannelId) -> bool {
        self.state.lock().unwrap().can_edit
    }

    async fn react(&self, target: &MessageRef, emoji: &str) -> Result<()> {
        self.state
            .lock()
            .unwrap()
            .reactions
            .push((*target, emoji.to_string()));
        Ok(())
    }
}

// ============================================================================
// Resolver
// ============================================================================

/// Resolver answering from a fixed table
pub struct FakeResolver {
    tracks: Mutex<HashMap<String, Track>>,
    search_results: Mutex<Vec<Track>>,
}

impl FakeResolver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            tracks: Mutex::new(HashMap::new()),
            search_results: Mutex::new(Vec::new()),
        })
    }

    /// `query` resolves to `track`
    pub fn add(&self, query: &str, track: Track) {
        self.tracks.lock().unwrap().insert(query.to_string(), track);
    }

    pub fn set_search_results(&self, tracks: Vec<Track>) {
        *self.search_results.lock().unwrap() = tracks;
    }
}

#[async_trait]
impl TrackResolver for FakeResolver {
    async fn resolve(&self, query: &str) -> Result<Track> {
        self.tracks
            .lock()
            .unwrap()
            .get(query)
            .cloned()
            .ok_or_else(|| Error::Resolution("No results".to_string()))
    }

    async fn search(&self, _query: &str, limit: usize) -> Vec<Track> {
        self.search_results
            .lock()
            .unwrap()
            .iter()
            .take(limit)
            .cloned()
            .collect()
    }
}
