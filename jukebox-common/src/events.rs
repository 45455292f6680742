//! Event types for the jukebox event system
//!
//! Room workers publish lifecycle events through an [`EventBus`]. Nothing in
//! the playback path depends on a subscriber being present; the binary logs
//! events and integration tests use them to await advancement.

use crate::ids::RoomId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Jukebox event types
///
/// Events can be serialized for external consumers; the `type` tag carries the
/// variant name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum JukeboxEvent {
    /// First command or action for a room created its session
    SessionCreated {
        room: RoomId,
        timestamp: DateTime<Utc>,
    },

    /// Track appended to a room's queue
    TrackQueued {
        room: RoomId,
        title: String,
        /// Queue length after the append
        queue_len: usize,
        timestamp: DateTime<Utc>,
    },

    /// Transport began streaming a track
    TrackStarted {
        room: RoomId,
        title: String,
        /// Stream token assigned to this playback
        stream: u64,
        timestamp: DateTime<Utc>,
    },

    /// Transport reported the end of a stream (normal end, stop, or error)
    TrackFinished {
        room: RoomId,
        stream: u64,
        error: Option<String>,
        timestamp: DateTime<Utc>,
    },

    /// Queue exhausted; transport disconnected and the room is idle
    PlaybackIdle {
        room: RoomId,
        timestamp: DateTime<Utc>,
    },

    /// Loop flag toggled
    LoopChanged {
        room: RoomId,
        looping: bool,
        timestamp: DateTime<Utc>,
    },

    /// Session volume changed (0.0-2.0)
    VolumeChanged {
        room: RoomId,
        volume: f32,
        timestamp: DateTime<Utc>,
    },

    /// Queue and current track cleared by a stop
    QueueCleared {
        room: RoomId,
        timestamp: DateTime<Utc>,
    },

    /// Idle session dropped by the coordinator
    SessionEvicted {
        room: RoomId,
        timestamp: DateTime<Utc>,
    },
}

impl JukeboxEvent {
    /// Room the event belongs to
    pub fn room(&self) -> RoomId {
        match self {
            JukeboxEvent::SessionCreated { room, .. }
            | JukeboxEvent::TrackQueued { room, .. }
            | JukeboxEvent::TrackStarted { room, .. }
            | JukeboxEvent::TrackFinished { room, .. }
            | JukeboxEvent::PlaybackIdle { room, .. }
            | JukeboxEvent::LoopChanged { room, .. }
            | JukeboxEvent::VolumeChanged { room, .. }
            | JukeboxEvent::QueueCleared { room, .. }
            | JukeboxEvent::SessionEvicted { room, .. } => *room,
        }
    }
}

/// Broadcast bus for [`JukeboxEvent`]s
///
/// Cloning is cheap; all clones share the same channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<JukeboxEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// Slow subscribers lose the oldest events once `capacity` is exceeded.
    ///
    /// # Examples
    ///
    /// ```
    /// use jukebox_common::events::EventBus;
    ///
    /// let event_bus = EventBus::new(256);
    /// assert_eq!(event_bus.capacity(), 256);
    /// ```
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<JukeboxEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: JukeboxEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
