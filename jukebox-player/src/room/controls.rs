//! Control-surface dispatch
//!
//! One match over [`Action`]. Each arm is a short transaction on the session,
//! optionally followed by a playback-driver call. Voice and resolution
//! failures are reported to the invoker and abort only that action.

use std::sync::Arc;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use jukebox_common::events::JukeboxEvent;
use jukebox_common::Track;

use super::core::{reason, Room};
use crate::chat::{Embed, OutgoingMessage};
use crate::control::search::{render_results, SearchSetId};
use crate::control::{Action, Origin};
use crate::error::{Error, Result};
use crate::session::VOLUME_STEP;
use crate::transport::VoiceTransport;

/// Entries listed by the queue command
pub const QUEUE_PREVIEW: usize = 15;

const QUEUE_COLOR: u32 = 0x2B2D31;

impl Room {
    /// Run one action for `origin`
    pub async fn dispatch(&mut self, origin: &Origin, action: Action) {
        let name = action.name();
        if let Err(e) = self.perform(origin, action).await {
            debug!("Room {} action {} aborted: {}", self.room, name, e);
        }
    }

    async fn perform(&mut self, origin: &Origin, action: Action) -> Result<()> {
        match action {
            Action::Join => {
                self.ensure_voice(origin).await?;
                self.react(origin, "✅").await;
            }
            Action::Leave => {
                self.leave().await;
                self.react(origin, "👋").await;
            }
            Action::Play { query } => self.play(origin, &query).await?,
            Action::Skip => {
                if self.skip().await? {
                    self.react(origin, "⏭️").await;
                }
            }
            Action::ShowQueue => self.show_queue(origin).await,
            Action::ToggleLoop => {
                let looping = self.session.toggle_loop();
                self.emit(JukeboxEvent::LoopChanged {
                    room: self.room,
                    looping,
                    timestamp: Self::now(),
                });
                let state = if looping { "ON" } else { "OFF" };
                if origin.is_button() {
                    self.reply(origin, format!("Loop is now **{}**", state)).await;
                } else {
                    self.reply(origin, format!("🔁 Loop is now **{}**", state)).await;
                }
            }
            Action::SetVolume { percent } => {
                let volume = self.session.set_volume_percent(percent);
                self.apply_volume(volume);
                self.reply(
                    origin,
                    format!("🔈 Volume set to **{}%**", (volume * 100.0).round() as i64),
                )
                .await;
            }
            Action::VolumeUp => {
                let volume = self.session.step_volume(VOLUME_STEP);
                self.apply_volume(volume);
            }
            Action::VolumeDown => {
                let volume = self.session.step_volume(-VOLUME_STEP);
                self.apply_volume(volume);
            }
            Action::Search { query } => self.search(origin, &query).await,
            Action::SearchSelect { set, index } => self.select(origin, set, index).await?,
            Action::Previous => self.previous().await?,
            Action::TogglePause => {
                if let Some(transport) = &self.transport {
                    if transport.is_playing() {
                        transport.pause();
                        debug!("Room {} paused", self.room);
                    } else if transport.is_paused() {
                        transport.resume();
                        debug!("Room {} resumed", self.room);
                    }
                }
            }
            Action::Shuffle => {
                self.session.shuffle(&mut rand::thread_rng());
                debug!("Room {} queue shuffled", self.room);
            }
            Action::Stop => self.stop().await,
        }
        Ok(())
    }

    async fn play(&mut self, origin: &Origin, query: &str) -> Result<()> {
        self.ensure_voice(origin).await?;

        let timeout = self.deps.settings.resolve_timeout;
        let resolved = match tokio::time::timeout(timeout, self.deps.resolver.resolve(query)).await {
            Ok(result) => result,
            Err(_) => Err(Error::Resolution(format!(
                "timed out after {}s",
                timeout.as_secs()
            ))),
        };

        let track = match resolved {
            Ok(track) => track,
            Err(e) => {
                warn!("Room {} could not resolve {:?}: {}", self.room, query, e);
                self.reply(origin, format!("❌ Failed to fetch audio: `{}`", reason(&e)))
                    .await;
                return Err(e);
            }
        };

        let title = track.title.clone();
        self.enqueue(track);
        self.reply(origin, format!("➕ Queued: **{}**", title)).await;
        self.start_playback().await;
        Ok(())
    }

    /// Advance past the active stream right away
    ///
    /// Returns false when nothing is streaming.
    async fn skip(&mut self) -> Result<bool> {
        let Some(transport) = self.transport.clone() else {
            return Ok(false);
        };
        if !(transport.is_playing() || transport.is_paused()) {
            return Ok(false);
        }
        self.retire_stream(&transport);
        info!("Room {} skipping current track", self.room);
        self.advance(true).await?;
        Ok(true)
    }

    async fn previous(&mut self) -> Result<()> {
        self.session.rewind_approximate();
        if let Some(transport) = self.transport.clone() {
            if transport.is_playing() || transport.is_paused() {
                self.retire_stream(&transport);
            }
        }
        self.advance(true).await
    }

    /// Stop the active stream; its completion, when it arrives, is stale
    fn retire_stream(&mut self, transport: &Arc<dyn VoiceTransport>) {
        if let Some(stream) = self.session.active_stream.take() {
            debug!("Room {} retiring stream {}", self.room, stream);
        }
        transport.stop();
    }

    async fn leave(&mut self) {
        if let Some(transport) = self.transport.take() {
            self.session.active_stream = None;
            if let Err(e) = transport.disconnect().await {
                warn!("Room {} disconnect failed: {}", self.room, e);
            }
            info!("Room {} left voice", self.room);
        }
        self.session.current = None;
    }

    async fn stop(&mut self) {
        self.session.clear();
        if let Some(transport) = self.transport.take() {
            self.session.active_stream = None;
            transport.stop();
            if let Err(e) = transport.disconnect().await {
                warn!("Room {} disconnect failed: {}", self.room, e);
            }
        }
        info!("Room {} stopped and cleared", self.room);
        self.emit(JukeboxEvent::QueueCleared {
            room: self.room,
            timestamp: Self::now(),
        });
    }

    fn apply_volume(&self, volume: f32) {
        if let Some(transport) = &self.transport {
            if !transport.set_volume(volume) {
                debug!("Room {} volume stored, applies from next track", self.room);
            }
        }
        self.emit(JukeboxEvent::VolumeChanged {
            room: self.room,
            volume,
            timestamp: Self::now(),
        });
    }

    fn enqueue(&mut self, track: Track) {
        let title = track.title.clone();
        self.session.enqueue(track);
        self.emit(JukeboxEvent::TrackQueued {
            room: self.room,
            title,
            queue_len: self.session.queue_len(),
            timestamp: Self::now(),
        });
    }

    async fn show_queue(&self, origin: &Origin) {
        let description = if self.session.is_queue_empty() {
            "Queue is empty.".to_string()
        } else {
            self.session
                .queue()
                .take(QUEUE_PREVIEW)
                .enumerate()
                .map(|(i, t)| format!("`{:02}` • {}", i + 1, t.title))
                .collect::<Vec<_>>()
                .join("\n")
        };

        let footer = format!(
            "{} • Loop {} • Volume {}%",
            self.playback_state(),
            if self.session.looping { "on" } else { "off" },
            (self.session.volume() * 100.0).round() as i64
        );
        let embed = Embed::new("Up Next", description)
            .color(QUEUE_COLOR)
            .footer(footer);

        let mut message = OutgoingMessage::embed(embed);
        if origin.is_button() {
            message = message.ephemeral(origin.user);
        }
        self.post(origin.text_channel, message).await;
    }

    async fn search(&mut self, origin: &Origin, query: &str) {
        let settings = &self.deps.settings;
        let tracks = tokio::time::timeout(
            settings.resolve_timeout,
            self.deps.resolver.search(query, settings.search_limit),
        )
        .await
        .unwrap_or_else(|_| {
            warn!("Search for {:?} timed out", query);
            Vec::new()
        });

        if tracks.is_empty() {
            self.reply(origin, "❌ No results found or network error.").await;
            return;
        }

        let set = self
            .searches
            .register(origin.user, origin.text_channel, tracks.clone(), Instant::now());
        let message = render_results(set, &tracks, true);

        match self.post(origin.text_channel, message).await {
            Some(posted) => {
                self.searches.attach_message(set, posted);
                debug!("Room {} opened search {} with {} results", self.room, set, tracks.len());
            }
            None => self.searches.discard(set),
        }
    }

    async fn select(&mut self, origin: &Origin, set: SearchSetId, index: usize) -> Result<()> {
        let selection = match self.searches.select(set, origin.user, index, Instant::now()) {
            Ok(selection) => selection,
            Err(rejection) => {
                debug!("Room {} rejected selection from {}: {:?}", self.room, set, rejection);
                self.reply(origin, rejection.to_string()).await;
                return Ok(());
            }
        };

        let title = selection.track.title.clone();
        self.enqueue(selection.track);
        self.reply(origin, format!("➕ Queued: **{}**", title)).await;

        if let Some(message) = selection.message {
            let closed = render_results(set, &selection.tracks, false);
            if let Err(e) = self.deps.chat.edit(&message, closed).await {
                warn!("Could not remove buttons from used search: {}", e);
            }
        }

        self.ensure_voice(origin).await?;
        self.start_playback().await;
        Ok(())
    }
}
