//! Console chat surface
//!
//! Messages are printed to stdout and remembered per channel so the status
//! display's recency check sees a realistic history. Lines typed on stdin are
//! chat messages from the configured console user, except `press <custom_id>`,
//! which presses a button.

use std::collections::{HashMap, VecDeque};
use std::io::BufRead;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use jukebox_common::{MessageId, TextChannelId};

use crate::chat::{ChatSurface, MessageRef, OutgoingMessage};
use crate::config::ConsoleIdentity;
use crate::coordinator::{CoordinatorHandle, Inbound};
use crate::error::Result;

/// Messages remembered per channel
const HISTORY_LIMIT: usize = 100;

/// Typed lines buffered ahead of the coordinator
const LINE_BUFFER: usize = 16;

pub struct ConsoleChat {
    next_id: AtomicU64,
    history: Mutex<HashMap<TextChannelId, VecDeque<MessageId>>>,
}

impl Default for ConsoleChat {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleChat {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            history: Mutex::new(HashMap::new()),
        }
    }

    /// Allocate an id for a message typed by the user and add it to history
    pub fn record_incoming(&self, channel: TextChannelId) -> MessageId {
        self.push(channel)
    }

    fn push(&self, channel: TextChannelId) -> MessageId {
        let id = MessageId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        let channel_history = history.entry(channel).or_default();
        channel_history.push_back(id);
        if channel_history.len() > HISTORY_LIMIT {
            channel_history.pop_front();
        }
        id
    }

    /// Turn a typed line into an inbound event
    pub fn inbound_from_line(&self, line: &str, identity: &ConsoleIdentity) -> Option<Inbound> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        if let Some(custom_id) = line.strip_prefix("press ") {
            return Some(Inbound::Interaction {
                room: identity.room,
                text_channel: identity.text_channel,
                user: identity.user,
                user_voice: Some(identity.voice_channel),
                message: None,
                custom_id: custom_id.trim().to_string(),
            });
        }

        Some(Inbound::Message {
            room: identity.room,
            text_channel: identity.text_channel,
            author: identity.user,
            author_voice: Some(identity.voice_channel),
            message: self.record_incoming(identity.text_channel),
            content: line.to_string(),
        })
    }
}

/// Plain-text rendering of a message
pub fn render(message: &OutgoingMessage) -> String {
    let mut out = Vec::new();

    if let Some(user) = message.ephemeral_to {
        out.push(format!("(only visible to {})", user));
    }
    if let Some(content) = &message.content {
        out.push(content.clone());
    }
    if let Some(embed) = &message.embed {
        out.push(format!("== {} ==", embed.title));
        if !embed.description.is_empty() {
            out.push(embed.description.clone());
        }
        for field in &embed.fields {
            out.push(format!("{}: {}", field.name, field.value));
        }
        if let Some(thumbnail) = &embed.thumbnail {
            out.push(format!("thumbnail: {}", thumbnail));
        }
        if let Some(footer) = &embed.footer {
            out.push(format!("-- {}", footer));
        }
    }
    for row in &message.rows {
        let buttons: Vec<String> = row
            .iter()
            .map(|b| format!("[{} {}]", b.label, b.custom_id))
            .collect();
        out.push(buttons.join(" "));
    }

    out.join("\n")
}

#[async_trait]
impl ChatSurface for ConsoleChat {
    async fn send(&self, channel: TextChannelId, message: OutgoingMessage) -> Result<MessageRef> {
        let id = self.push(channel);
        println!("[#{} msg {}]\n{}\n", channel, id, render(&message));
        Ok(MessageRef::new(channel, id))
    }

    async fn edit(&self, target: &MessageRef, message: OutgoingMessage) -> Result<()> {
        println!("[#{} msg {} edited]\n{}\n", target.channel, target.id, render(&message));
        Ok(())
    }

    async fn recent_message_ids(&self, channel: TextChannelId, limit: usize) -> Result<Vec<MessageId>> {
        let history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(history
            .get(&channel)
            .map(|h| h.iter().rev().take(limit).copied().collect())
            .unwrap_or_default())
    }

    async fn can_edit(&self, _channel: TextChannelId) -> bool {
        true
    }

    async fn react(&self, target: &MessageRef, emoji: &str) -> Result<()> {
        println!("[#{} msg {} reaction {}]", target.channel, target.id, emoji);
        Ok(())
    }
}

/// Feed stdin lines to the coordinator until EOF
///
/// Stdin is read on a detached thread so a pending read never holds up
/// runtime shutdown.
pub async fn run_console(
    handle: CoordinatorHandle,
    chat: Arc<ConsoleChat>,
    identity: ConsoleIdentity,
) -> Result<()> {
    let (tx, mut rx) = mpsc::channel::<String>(LINE_BUFFER);
    thread::Builder::new()
        .name("console-input".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.blocking_send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("Console input error: {}", e);
                        break;
                    }
                }
            }
        })?;

    info!("Console ready: type commands (e.g. !play <query>) or `press <button id>`");

    while let Some(line) = rx.recv().await {
        if let Some(inbound) = chat.inbound_from_line(&line, &identity) {
            handle.submit(inbound).await?;
        }
    }

    debug!("Console input closed");
    Ok(())
}
