//! Playback driver
//!
//! **Responsibilities:**
//! - Start the current (or next queued) track on the transport
//! - Advance on completion: loop replay, pop next, or go idle and disconnect
//! - Filter stale completions by stream token
//!
//! Skip and previous retire the active stream and advance on the spot, so
//! nothing handled before the stopped stream's completion can see a track
//! that is already being skipped.
//!
//! Source failures never escape: the track is reported and skipped, one queue
//! entry per failure, so a run of bad tracks ends when the queue does.

use std::sync::Arc;

use tracing::{debug, info, warn};

use jukebox_common::events::JukeboxEvent;
use jukebox_common::Track;

use super::core::{reason, Room};
use crate::error::{Error, Result};
use crate::playback::{AudioSource, CompletionHandle, StreamToken};
use crate::transport::VoiceTransport;

impl Room {
    /// Start streaming unless already streaming or nothing is queued
    pub async fn start_playback(&mut self) {
        loop {
            let Some(transport) = self.transport.clone() else {
                debug!("Room {} has no transport, not starting playback", self.room);
                return;
            };

            if transport.is_playing() || transport.is_paused() {
                debug!("Room {} already streaming", self.room);
                return;
            }

            if self.session.has_nothing_to_play() {
                return;
            }

            if self.session.current.is_none() {
                self.session.current = self.session.pop_next();
            }
            let Some(track) = self.session.current.clone() else {
                warn!("Room {}: {}", self.room, Error::EmptyQueue);
                return;
            };

            match self.begin_stream(&transport, &track) {
                Ok(stream) => {
                    info!("Room {} now playing: {} (stream {})", self.room, track.title, stream);
                    self.emit(JukeboxEvent::TrackStarted {
                        room: self.room,
                        title: track.title.clone(),
                        stream: stream.0,
                        timestamp: Self::now(),
                    });
                    self.refresh_display(&track).await;
                    return;
                }
                Err(e) => {
                    self.session.active_stream = None;
                    warn!("Room {} could not play {}: {}", self.room, track.title, e);
                    self.notify_channel(format!(
                        "❌ Error playing track: {}. Skipping to next.",
                        reason(&e)
                    ))
                    .await;

                    // Forced: a looping session must not retry the broken track
                    self.session.current = self.session.pop_next();
                    if self.session.current.is_none() {
                        if let Err(e) = self.go_idle().await {
                            warn!("Room {} idle transition failed: {}", self.room, e);
                        }
                        return;
                    }
                }
            }
        }
    }

    /// Move past the current track
    ///
    /// With loop on and no `force_skip` the current track is replayed.
    /// Otherwise the queue head becomes current, or, with an empty queue, the
    /// transport is disconnected and the room goes idle.
    pub async fn advance(&mut self, force_skip: bool) -> Result<()> {
        if self.transport.is_none() {
            debug!("Room {} advance without transport ignored", self.room);
            return Ok(());
        }

        if self.session.looping && !force_skip && self.session.current.is_some() {
            debug!("Room {} looping current track", self.room);
        } else {
            self.session.current = self.session.pop_next();
            if self.session.current.is_none() {
                return self.go_idle().await;
            }
            debug!("Room {} advanced, {} left in queue", self.room, self.session.queue_len());
        }

        self.start_playback().await;
        Ok(())
    }

    /// Completion from the transport for `stream`
    pub async fn on_stream_finished(&mut self, stream: StreamToken, error: Option<String>) -> Result<()> {
        if self.session.active_stream != Some(stream) {
            debug!("Room {} ignoring stale completion for stream {}", self.room, stream);
            return Ok(());
        }

        self.session.active_stream = None;
        if let Some(e) = &error {
            warn!("Room {} stream {} ended with error: {}", self.room, stream, e);
        }
        self.emit(JukeboxEvent::TrackFinished {
            room: self.room,
            stream: stream.0,
            error,
            timestamp: Self::now(),
        });

        self.advancing = true;
        let result = self.advance(false).await;
        self.advancing = false;
        result
    }

    /// Queue exhausted: clear current, disconnect once, report idle
    pub(super) async fn go_idle(&mut self) -> Result<()> {
        self.session.current = None;
        self.session.active_stream = None;

        let Some(transport) = self.transport.take() else {
            return Ok(());
        };

        info!("Room {} queue finished, disconnecting", self.room);
        self.emit(JukeboxEvent::PlaybackIdle {
            room: self.room,
            timestamp: Self::now(),
        });

        transport
            .disconnect()
            .await
            .map_err(|e| Error::VoiceConnect(reason(&e)))
    }

    fn begin_stream(&mut self, transport: &Arc<dyn VoiceTransport>, track: &Track) -> Result<StreamToken> {
        let source = AudioSource::from_track(track, self.session.volume())?;
        let stream = self.session.begin_stream();
        let handle = CompletionHandle::new(self.room, stream, self.inbox.clone());
        transport.play(source, handle)?;
        Ok(stream)
    }

    async fn refresh_display(&mut self, track: &Track) {
        let Some(channel) = self.session.last_text_channel else {
            debug!("Room {} has no text channel for the status display", self.room);
            return;
        };

        match self
            .display
            .refresh(channel, self.session.status_message, track)
            .await
        {
            Ok(outcome) => self.session.status_message = Some(outcome.message()),
            Err(e) => warn!("Room {} status display failed: {}", self.room, e),
        }
    }
}
