//! Coordinator
//!
//! Owns the room registry. Every inbound chat message or button press goes
//! through one task that parses it, creates the room's worker on first use,
//! and forwards the action. The same task sweeps idle rooms out of the
//! registry. It never awaits the chat platform or the resolver itself.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use jukebox_common::events::JukeboxEvent;
use jukebox_common::{MessageId, RoomId, TextChannelId, UserId, VoiceChannelId};

use crate::chat::OutgoingMessage;
use crate::control::{parse_command, Action, Origin, Parsed};
use crate::error::{Error, Result};
use crate::room::{RoomDeps, RoomHandle};

/// Inbound queue depth before `submit` waits
const INBOUND_CAPACITY: usize = 256;

/// Time allowed for room workers to disconnect on shutdown
const ROOM_SHUTDOWN_GRACE: Duration = Duration::from_secs(3);

/// Event from the chat platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// A chat message; only prefixed commands are acted on
    Message {
        room: RoomId,
        text_channel: TextChannelId,
        author: UserId,
        /// Voice channel the author is connected to
        author_voice: Option<VoiceChannelId>,
        message: MessageId,
        content: String,
    },

    /// A button press
    Interaction {
        room: RoomId,
        text_channel: TextChannelId,
        user: UserId,
        user_voice: Option<VoiceChannelId>,
        /// Message that carries the button
        message: Option<MessageId>,
        custom_id: String,
    },
}

/// Cloneable entry point into a running coordinator
#[derive(Debug, Clone)]
pub struct CoordinatorHandle {
    tx: mpsc::Sender<Inbound>,
}

impl CoordinatorHandle {
    pub async fn submit(&self, inbound: Inbound) -> Result<()> {
        self.tx.send(inbound).await.map_err(|_| Error::Shutdown)
    }
}

pub struct Coordinator {
    deps: RoomDeps,
    rooms: HashMap<RoomId, RoomHandle>,
    rx: mpsc::Receiver<Inbound>,
}

impl Coordinator {
    pub fn new(deps: RoomDeps) -> (Self, CoordinatorHandle) {
        let (tx, rx) = mpsc::channel(INBOUND_CAPACITY);
        let coordinator = Self {
            deps,
            rooms: HashMap::new(),
            rx,
        };
        (coordinator, CoordinatorHandle { tx })
    }

    /// Route inbound events until every handle is dropped, then stop the rooms
    pub async fn run(mut self) {
        let settings = Arc::clone(&self.deps.settings);
        let mut sweep = tokio::time::interval(settings.eviction_sweep);
        sweep.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            "Coordinator started (prefix {:?}, idle eviction {:?})",
            settings.command_prefix, settings.idle_eviction
        );

        loop {
            tokio::select! {
                inbound = self.rx.recv() => {
                    let Some(inbound) = inbound else { break };
                    self.route(inbound);
                }
                _ = sweep.tick() => {
                    if let Some(idle_after) = settings.idle_eviction {
                        self.evict_idle(Instant::now(), idle_after);
                    }
                }
            }
        }

        self.shutdown_rooms().await;
    }

    /// Stop every worker, waiting up to [`ROOM_SHUTDOWN_GRACE`] for disconnects
    async fn shutdown_rooms(&mut self) {
        info!("Coordinator stopping, releasing {} rooms", self.rooms.len());

        let mut workers = JoinSet::new();
        for (_, handle) in self.rooms.drain() {
            workers.spawn(handle.shutdown());
        }

        let drained = tokio::time::timeout(ROOM_SHUTDOWN_GRACE, async {
            while workers.join_next().await.is_some() {}
        })
        .await;
        if drained.is_err() {
            warn!(
                "{} room workers did not stop within {:?}",
                workers.len(),
                ROOM_SHUTDOWN_GRACE
            );
        }
    }

    fn route(&mut self, inbound: Inbound) {
        match inbound {
            Inbound::Message {
                room,
                text_channel,
                author,
                author_voice,
                message,
                content,
            } => {
                let prefix = &self.deps.settings.command_prefix;
                match parse_command(prefix, &content) {
                    Some(Parsed::Action(action)) => {
                        let origin = Origin::command(text_channel, author, author_voice, Some(message));
                        self.forward(room, origin, action);
                    }
                    Some(Parsed::Usage(text)) => self.reply_detached(text_channel, text),
                    None => {
                        if content.trim_start().starts_with(prefix.as_str()) {
                            debug!("Ignoring unknown command {:?}", content);
                        }
                    }
                }
            }
            Inbound::Interaction {
                room,
                text_channel,
                user,
                user_voice,
                message,
                custom_id,
            } => match Action::from_custom_id(&custom_id) {
                Some(action) => {
                    let origin = Origin::button(text_channel, user, user_voice, message);
                    self.forward(room, origin, action);
                }
                None => debug!("Ignoring unknown button {:?}", custom_id),
            },
        }
    }

    fn forward(&mut self, room: RoomId, origin: Origin, action: Action) {
        let handle = self.room(room);
        let Err(e) = handle.send(origin.clone(), action.clone()) else {
            return;
        };

        // Worker gone (panicked); start over with a fresh session
        warn!("Room {} worker unavailable ({}), recreating", room, e);
        self.rooms.remove(&room);
        if let Err(e) = self.room(room).send(origin, action) {
            warn!("Dropping action for room {}: {}", room, e);
        }
    }

    fn room(&mut self, room: RoomId) -> &mut RoomHandle {
        let deps = &self.deps;
        self.rooms.entry(room).or_insert_with(|| {
            info!("Creating session for room {}", room);
            deps.events.emit_lossy(JukeboxEvent::SessionCreated {
                room,
                timestamp: Utc::now(),
            });
            RoomHandle::spawn(room, deps.clone())
        })
    }

    fn evict_idle(&mut self, now: Instant, idle_after: Duration) {
        let events = &self.deps.events;
        self.rooms.retain(|room, handle| {
            if handle.is_finished() {
                warn!("Room {} worker exited, removing", room);
                return false;
            }
            if !handle.is_evictable(now, idle_after) {
                return true;
            }
            info!("Evicting idle session for room {}", room);
            events.emit_lossy(JukeboxEvent::SessionEvicted {
                room: *room,
                timestamp: Utc::now(),
            });
            false
        });
    }

    /// Usage replies need no session
    fn reply_detached(&self, channel: TextChannelId, text: String) {
        let chat = Arc::clone(&self.deps.chat);
        tokio::spawn(async move {
            if let Err(e) = chat.send(channel, OutgoingMessage::text(text)).await {
                warn!("Could not send usage reply: {}", e);
            }
        });
    }
}
