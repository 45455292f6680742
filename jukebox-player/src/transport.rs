//! Voice transport seam
//!
//! A [`VoiceGateway`] opens a [`VoiceTransport`] for a room; the transport
//! streams one [`AudioSource`] at a time and reports the end of each stream
//! through the [`CompletionHandle`] it was given.
//!
//! Completion contract: for every successful `play`, the transport calls the
//! handle exactly once, after the stream ends for any reason (natural end,
//! `stop`, `disconnect`, or error), from its own thread or task. It must never
//! call the handle synchronously from inside `play`, `stop` or `disconnect`;
//! those run on the room worker, which is the context the handle waits on.

use std::sync::Arc;

use async_trait::async_trait;

use jukebox_common::{RoomId, VoiceChannelId};

use crate::error::Result;
use crate::playback::{AudioSource, CompletionHandle};

/// Opens voice connections
#[async_trait]
pub trait VoiceGateway: Send + Sync {
    /// Connect to `channel` on behalf of `room`
    ///
    /// The room worker bounds this call with the configured connect timeout.
    async fn connect(&self, room: RoomId, channel: VoiceChannelId) -> Result<Arc<dyn VoiceTransport>>;
}

/// Active audio connection for one room
#[async_trait]
pub trait VoiceTransport: Send + Sync {
    /// Voice channel currently joined
    fn channel(&self) -> VoiceChannelId;

    /// Move the connection to another channel
    async fn move_to(&self, channel: VoiceChannelId) -> Result<()>;

    /// Leave voice; any active stream ends
    async fn disconnect(&self) -> Result<()>;

    /// Start streaming `source`; fails with [`crate::Error::Source`]
    fn play(&self, source: AudioSource, on_complete: CompletionHandle) -> Result<()>;

    fn pause(&self);

    fn resume(&self);

    /// End the active stream; the completion handle fires afterwards
    fn stop(&self);

    fn is_playing(&self) -> bool;

    fn is_paused(&self) -> bool;

    /// Apply `volume` to the live source; returns false if nothing was applied
    fn set_volume(&self, volume: f32) -> bool;
}
