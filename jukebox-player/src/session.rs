//! Per-room session state
//!
//! Holds the ordered queue, the current track, loop and volume state, and the
//! reference to the last status display. Every method is a synchronous,
//! non-blocking mutation; callers invoke them only from the room's worker so
//! mutations for one room are totally ordered.

use std::collections::VecDeque;

use rand::seq::SliceRandom;
use rand::Rng;

use jukebox_common::{RoomId, TextChannelId, Track};

use crate::chat::MessageRef;
use crate::playback::StreamToken;

/// Lowest allowed volume
pub const MIN_VOLUME: f32 = 0.0;
/// Highest allowed volume (200%)
pub const MAX_VOLUME: f32 = 2.0;
/// Volume for a freshly created session
pub const DEFAULT_VOLUME: f32 = 0.5;
/// Step applied by the volume buttons
pub const VOLUME_STEP: f32 = 0.1;

/// Round to two decimals so repeated button steps do not drift
fn round2(v: f32) -> f32 {
    (v * 100.0).round() / 100.0
}

/// Clamp a raw volume into [`MIN_VOLUME`, `MAX_VOLUME`]; NaN maps to the minimum
pub fn clamp_volume(v: f32) -> f32 {
    if v.is_nan() {
        return MIN_VOLUME;
    }
    v.clamp(MIN_VOLUME, MAX_VOLUME)
}

/// State for one room
#[derive(Debug)]
pub struct SessionState {
    room: RoomId,

    /// FIFO queue; front is played next
    queue: VecDeque<Track>,

    /// Track presently streaming (or about to be started)
    pub current: Option<Track>,

    pub looping: bool,

    volume: f32,

    /// Last status display sent for this room (weak: the message may be gone)
    pub status_message: Option<MessageRef>,

    /// Channel of the most recent command, used for status and error posts
    pub last_text_channel: Option<TextChannelId>,

    /// Token of the stream the transport is playing for this session
    pub active_stream: Option<StreamToken>,

    next_stream: u64,
}

impl SessionState {
    pub fn new(room: RoomId) -> Self {
        Self {
            room,
            queue: VecDeque::new(),
            current: None,
            looping: false,
            volume: DEFAULT_VOLUME,
            status_message: None,
            last_text_channel: None,
            active_stream: None,
            next_stream: 1,
        }
    }

    pub fn room(&self) -> RoomId {
        self.room
    }

    /// Append to the back of the queue
    pub fn enqueue(&mut self, track: Track) {
        self.queue.push_back(track);
    }

    /// Flip the loop flag and return the new value
    pub fn toggle_loop(&mut self) -> bool {
        self.looping = !self.looping;
        self.looping
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Set the volume, clamped to [0.0, 2.0]; returns the stored value
    pub fn set_volume(&mut self, v: f32) -> f32 {
        self.volume = round2(clamp_volume(v));
        self.volume
    }

    /// Set the volume from a raw percentage (clamped to 0-200)
    pub fn set_volume_percent(&mut self, percent: i64) -> f32 {
        let pct = percent.clamp(0, 200);
        self.set_volume(pct as f32 / 100.0)
    }

    /// Move the volume by `delta`, clamped
    pub fn step_volume(&mut self, delta: f32) -> f32 {
        self.set_volume(self.volume + delta)
    }

    /// Remove and return the queue front
    pub fn pop_next(&mut self) -> Option<Track> {
        self.queue.pop_front()
    }

    /// Drop the queue and the current track
    pub fn clear(&mut self) {
        self.queue.clear();
        self.current = None;
    }

    /// Approximate "previous": current goes back to the front, then the queue
    /// tail is rotated to the front.
    ///
    /// There is no play history. With queue `[B, C]` and current `A` this
    /// yields `[C, A, B]` and no current, so the next advance plays `C`.
    pub fn rewind_approximate(&mut self) {
        if let Some(current) = self.current.take() {
            self.queue.push_front(current);
        }
        if let Some(last) = self.queue.pop_back() {
            self.queue.push_front(last);
        }
    }

    /// Randomize queue order in place
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.queue.make_contiguous().shuffle(rng);
    }

    pub fn queue(&self) -> impl ExactSizeIterator<Item = &Track> {
        self.queue.iter()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_queue_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Nothing queued and nothing current
    pub fn has_nothing_to_play(&self) -> bool {
        self.queue.is_empty() && self.current.is_none()
    }

    /// Allocate the token for a new stream and mark it active
    pub fn begin_stream(&mut self) -> StreamToken {
        let token = StreamToken(self.next_stream);
        self.next_stream += 1;
        self.active_stream = Some(token);
        token
    }
}
