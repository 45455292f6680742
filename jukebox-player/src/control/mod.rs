//! Control surface
//!
//! User-triggered actions arrive either as prefixed chat commands
//! ([`commands`]) or as button presses identified by a stable custom id
//! ([`action`]). Both become an [`Action`] that the room worker dispatches.
//! Search result sets and their single-use selection rules live in
//! [`search`].

pub mod action;
pub mod commands;
pub mod search;

pub use action::{control_rows, Action, ControlButton};
pub use commands::{parse_command, Parsed};
pub use search::{SearchSessions, SearchSetId, SelectRejection};

use jukebox_common::{MessageId, TextChannelId, UserId, VoiceChannelId};

use crate::chat::MessageRef;

/// How an action entered the system
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OriginKind {
    /// Prefixed text command
    Command,
    /// Button press; replies are ephemeral
    Button,
}

/// Who triggered an action and where
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    pub text_channel: TextChannelId,
    pub user: UserId,
    /// Voice channel the user is connected to, if any
    pub voice: Option<VoiceChannelId>,
    /// Command message, or the message carrying the pressed button
    pub message: Option<MessageId>,
    pub kind: OriginKind,
}

impl Origin {
    pub fn command(
        text_channel: TextChannelId,
        user: UserId,
        voice: Option<VoiceChannelId>,
        message: Option<MessageId>,
    ) -> Self {
        Self {
            text_channel,
            user,
            voice,
            message,
            kind: OriginKind::Command,
        }
    }

    pub fn button(
        text_channel: TextChannelId,
        user: UserId,
        voice: Option<VoiceChannelId>,
        message: Option<MessageId>,
    ) -> Self {
        Self {
            text_channel,
            user,
            voice,
            message,
            kind: OriginKind::Button,
        }
    }

    pub fn is_button(&self) -> bool {
        self.kind == OriginKind::Button
    }

    pub fn message_ref(&self) -> Option<MessageRef> {
        self.message.map(|id| MessageRef::new(self.text_channel, id))
    }
}
