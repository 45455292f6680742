//! Search result sets
//!
//! A search posts numbered candidates with one button each. The set is
//! single-use: only the requester may pick, the first successful pick consumes
//! it, and it expires after a window of inactivity. Invalid picks by the
//! requester keep the set alive and refresh the window.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use uuid::Uuid;

use jukebox_common::{TextChannelId, Track, UserId};

use crate::chat::{Button, ButtonStyle, Embed, MessageRef, OutgoingMessage};
use crate::control::action::BUTTONS_PER_ROW;

const BUTTON_PREFIX: &str = "search:";

/// Closed sets remembered so late presses get the right rejection
const FINISHED_MEMORY: usize = 32;

pub const RESULTS_COLOR: u32 = 0x5865F2;

/// Identifier of one posted result set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SearchSetId(pub Uuid);

impl SearchSetId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SearchSetId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SearchSetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Custom id of the button for candidate `index` (0-based)
pub fn button_id(set: SearchSetId, index: usize) -> String {
    format!("{}{}:{}", BUTTON_PREFIX, set.0, index)
}

pub fn parse_button_id(custom_id: &str) -> Option<(SearchSetId, usize)> {
    let rest = custom_id.strip_prefix(BUTTON_PREFIX)?;
    let (uuid, index) = rest.rsplit_once(':')?;
    let uuid = Uuid::parse_str(uuid).ok()?;
    let index = index.parse().ok()?;
    Some((SearchSetId(uuid), index))
}

/// Results message; `with_buttons` false renders the closed form
pub fn render_results(set: SearchSetId, tracks: &[Track], with_buttons: bool) -> OutgoingMessage {
    let description = tracks
        .iter()
        .enumerate()
        .map(|(i, t)| {
            if t.page_url.is_empty() {
                format!("`{}` • {}", i + 1, t.title)
            } else {
                format!("`{}` • [{}]({})", i + 1, t.title, t.page_url)
            }
        })
        .collect::<Vec<_>>()
        .join("\n");

    let message = OutgoingMessage::embed(Embed::new("Search Results", description).color(RESULTS_COLOR));
    if !with_buttons {
        return message;
    }

    let buttons: Vec<Button> = (0..tracks.len())
        .map(|i| Button {
            custom_id: button_id(set, i),
            label: (i + 1).to_string(),
            style: ButtonStyle::Primary,
        })
        .collect();
    let rows = buttons.chunks(BUTTONS_PER_ROW).map(|r| r.to_vec()).collect();
    message.with_rows(rows)
}

/// Why a selection was refused; the message is shown to the presser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SelectRejection {
    #[error("Only the requester can choose from these results.")]
    NotOwner,
    #[error("This search has already been used.")]
    AlreadyUsed,
    #[error("This search has expired.")]
    Expired,
    #[error("No such result.")]
    NoSuchResult,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Closed {
    Consumed,
    Expired,
}

#[derive(Debug)]
struct SearchSet {
    owner: UserId,
    channel: TextChannelId,
    tracks: Vec<Track>,
    message: Option<MessageRef>,
    deadline: Instant,
}

/// Successful pick
#[derive(Debug, Clone)]
pub struct Selection {
    pub set: SearchSetId,
    pub track: Track,
    /// All candidates, for re-rendering the closed results message
    pub tracks: Vec<Track>,
    pub message: Option<MessageRef>,
}

/// Set that ran out its window unused
#[derive(Debug, Clone)]
pub struct ExpiredSearch {
    pub set: SearchSetId,
    pub channel: TextChannelId,
    pub tracks: Vec<Track>,
    pub message: Option<MessageRef>,
}

/// Open result sets of one room
#[derive(Debug)]
pub struct SearchSessions {
    timeout: Duration,
    open: HashMap<SearchSetId, SearchSet>,
    closed: VecDeque<(SearchSetId, Closed)>,
}

impl SearchSessions {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            open: HashMap::new(),
            closed: VecDeque::new(),
        }
    }

    /// Open a set for `owner`; the window starts at `now`
    pub fn register(
        &mut self,
        owner: UserId,
        channel: TextChannelId,
        tracks: Vec<Track>,
        now: Instant,
    ) -> SearchSetId {
        let id = SearchSetId::new();
        self.open.insert(
            id,
            SearchSet {
                owner,
                channel,
                tracks,
                message: None,
                deadline: now + self.timeout,
            },
        );
        id
    }

    /// Record where the set's results message was posted
    pub fn attach_message(&mut self, id: SearchSetId, message: MessageRef) {
        if let Some(set) = self.open.get_mut(&id) {
            set.message = Some(message);
        }
    }

    /// Drop a set whose results message could not be posted
    pub fn discard(&mut self, id: SearchSetId) {
        self.open.remove(&id);
    }

    pub fn select(
        &mut self,
        id: SearchSetId,
        user: UserId,
        index: usize,
        now: Instant,
    ) -> Result<Selection, SelectRejection> {
        if let Some(state) = self.closed_state(id) {
            return Err(match state {
                Closed::Consumed => SelectRejection::AlreadyUsed,
                Closed::Expired => SelectRejection::Expired,
            });
        }

        // Unknown ids belong to a dropped session
        let set = self.open.get_mut(&id).ok_or(SelectRejection::Expired)?;

        if set.deadline <= now {
            self.open.remove(&id);
            self.close(id, Closed::Expired);
            return Err(SelectRejection::Expired);
        }

        if set.owner != user {
            return Err(SelectRejection::NotOwner);
        }

        if index >= set.tracks.len() {
            set.deadline = now + self.timeout;
            return Err(SelectRejection::NoSuchResult);
        }

        let set = self.open.remove(&id).ok_or(SelectRejection::Expired)?;
        self.close(id, Closed::Consumed);

        Ok(Selection {
            set: id,
            track: set.tracks[index].clone(),
            tracks: set.tracks,
            message: set.message,
        })
    }

    /// Close and return every set whose window has elapsed
    pub fn expire_due(&mut self, now: Instant) -> Vec<ExpiredSearch> {
        let due: Vec<SearchSetId> = self
            .open
            .iter()
            .filter(|(_, set)| set.deadline <= now)
            .map(|(id, _)| *id)
            .collect();

        let mut expired = Vec::with_capacity(due.len());
        for id in due {
            if let Some(set) = self.open.remove(&id) {
                self.close(id, Closed::Expired);
                expired.push(ExpiredSearch {
                    set: id,
                    channel: set.channel,
                    tracks: set.tracks,
                    message: set.message,
                });
            }
        }
        expired
    }

    /// Earliest deadline among open sets
    pub fn next_deadline(&self) -> Option<Instant> {
        self.open.values().map(|s| s.deadline).min()
    }

    /// No set is open
    pub fn is_empty(&self) -> bool {
        self.open.is_empty()
    }

    fn closed_state(&self, id: SearchSetId) -> Option<Closed> {
        self.closed.iter().find(|(c, _)| *c == id).map(|(_, s)| *s)
    }

    fn close(&mut self, id: SearchSetId, state: Closed) {
        if self.closed.len() == FINISHED_MEMORY {
            self.closed.pop_front();
        }
        self.closed.push_back((id, state));
    }
}
