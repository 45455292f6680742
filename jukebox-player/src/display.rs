//! Status display manager
//!
//! Renders the "Now Playing" message and decides between editing the last
//! display in place and posting a fresh one. A display scrolled out of the
//! most recent [`RECENT_WINDOW`] messages is replaced rather than edited, so
//! the controls stay near the bottom of the channel.

use std::sync::Arc;

use tracing::{debug, warn};

use jukebox_common::human_time::format_track_duration;
use jukebox_common::{TextChannelId, Track};

use crate::chat::{ChatSurface, Embed, MessageRef, OutgoingMessage};
use crate::control::control_rows;
use crate::error::{Error, Result};

/// Number of newest messages within which a display counts as recent
pub const RECENT_WINDOW: usize = 10;

pub const STATUS_COLOR: u32 = 0x5865F2;

/// What `refresh` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayOutcome {
    Sent(MessageRef),
    Edited(MessageRef),
}

impl DisplayOutcome {
    /// Message that now shows the status
    pub fn message(&self) -> MessageRef {
        match self {
            DisplayOutcome::Sent(m) | DisplayOutcome::Edited(m) => *m,
        }
    }
}

/// Status message body for `track`, with the control button rows
pub fn render_status(track: &Track) -> OutgoingMessage {
    let description = if track.page_url.is_empty() {
        track.title.clone()
    } else {
        format!("{}\n\n[Open source page]({})", track.title, track.page_url)
    };

    let embed = Embed::new("Now Playing", description)
        .color(STATUS_COLOR)
        .field("Duration", format_track_duration(track.duration_secs), true)
        .thumbnail(track.thumbnail.clone());

    OutgoingMessage::embed(embed).with_rows(control_rows())
}

pub struct StatusDisplay {
    chat: Arc<dyn ChatSurface>,
}

impl StatusDisplay {
    pub fn new(chat: Arc<dyn ChatSurface>) -> Self {
        Self { chat }
    }

    /// Show `track` in `channel`, reusing `previous` when it is still recent
    ///
    /// Edit failures fall back to a new message. Only a failed send is
    /// returned, as [`Error::Display`].
    pub async fn refresh(
        &self,
        channel: TextChannelId,
        previous: Option<MessageRef>,
        track: &Track,
    ) -> Result<DisplayOutcome> {
        let message = render_status(track);

        if let Some(prev) = previous {
            if self.is_recent(&prev).await && self.chat.can_edit(prev.channel).await {
                match self.chat.edit(&prev, message.clone()).await {
                    Ok(()) => {
                        debug!("Edited status display {:?}", prev);
                        return Ok(DisplayOutcome::Edited(prev));
                    }
                    Err(e) => warn!("Status display edit failed, sending new one: {}", e),
                }
            }
        }

        let sent = self
            .chat
            .send(channel, message)
            .await
            .map_err(|e| Error::Display(e.to_string()))?;
        debug!("Sent status display {:?}", sent);
        Ok(DisplayOutcome::Sent(sent))
    }

    /// Whether `message` is among the newest [`RECENT_WINDOW`] in its channel
    ///
    /// One extra message is fetched so an off-by-one history implementation
    /// still yields a full window. A history failure counts as not recent.
    async fn is_recent(&self, message: &MessageRef) -> bool {
        match self
            .chat
            .recent_message_ids(message.channel, RECENT_WINDOW + 1)
            .await
        {
            Ok(ids) => ids.iter().take(RECENT_WINDOW).any(|id| *id == message.id),
            Err(e) => {
                warn!("Could not fetch history for recency check: {}", e);
                false
            }
        }
    }
}
