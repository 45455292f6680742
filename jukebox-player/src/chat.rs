//! Chat surface seam
//!
//! The coordinator talks to the chat platform only through [`ChatSurface`]:
//! sending and editing messages with an embed and button rows, fetching recent
//! history for the status-display recency check, and reacting to messages.

use async_trait::async_trait;

use jukebox_common::{MessageId, TextChannelId, UserId};

use crate::error::Result;

/// Location of a message on the chat platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub channel: TextChannelId,
    pub id: MessageId,
}

impl MessageRef {
    pub fn new(channel: TextChannelId, id: MessageId) -> Self {
        Self { channel, id }
    }
}

/// Button colour class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonStyle {
    Primary,
    Secondary,
    Success,
    Danger,
}

/// Interactive button; `custom_id` comes back verbatim on press
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub custom_id: String,
    pub label: String,
    pub style: ButtonStyle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

/// Rich message body
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Embed {
    pub title: String,
    pub description: String,
    pub color: Option<u32>,
    pub fields: Vec<EmbedField>,
    pub thumbnail: Option<String>,
    pub footer: Option<String>,
}

impl Embed {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            ..Default::default()
        }
    }

    pub fn color(mut self, color: u32) -> Self {
        self.color = Some(color);
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }

    pub fn thumbnail(mut self, url: Option<String>) -> Self {
        self.thumbnail = url;
        self
    }

    pub fn footer(mut self, text: impl Into<String>) -> Self {
        self.footer = Some(text.into());
        self
    }
}

/// Message to send or to replace an existing message's content with
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OutgoingMessage {
    pub content: Option<String>,
    pub embed: Option<Embed>,
    /// Button rows (the platform allows at most five buttons per row)
    pub rows: Vec<Vec<Button>>,
    /// When set, only this user sees the message
    pub ephemeral_to: Option<UserId>,
}

impl OutgoingMessage {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    pub fn embed(embed: Embed) -> Self {
        Self {
            embed: Some(embed),
            ..Default::default()
        }
    }

    pub fn with_rows(mut self, rows: Vec<Vec<Button>>) -> Self {
        self.rows = rows;
        self
    }

    pub fn ephemeral(mut self, user: UserId) -> Self {
        self.ephemeral_to = Some(user);
        self
    }
}

/// Chat platform operations used by the coordinator
///
/// Implementations report failures as [`crate::Error::Display`]; callers treat
/// every failure here as recoverable.
#[async_trait]
pub trait ChatSurface: Send + Sync {
    /// Post a new message
    async fn send(&self, channel: TextChannelId, message: OutgoingMessage) -> Result<MessageRef>;

    /// Replace an existing message's content
    async fn edit(&self, target: &MessageRef, message: OutgoingMessage) -> Result<()>;

    /// Ids of the newest `limit` messages in `channel`, newest first
    async fn recent_message_ids(&self, channel: TextChannelId, limit: usize) -> Result<Vec<MessageId>>;

    /// Whether the bot may edit messages in `channel`
    async fn can_edit(&self, channel: TextChannelId) -> bool;

    /// Add a reaction to a message
    async fn react(&self, target: &MessageRef, emoji: &str) -> Result<()>;
}
