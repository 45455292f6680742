//! Track value type
//!
//! A resolved, playable unit with metadata. Created by a resolver adapter and
//! never mutated afterwards; sessions hold clones.

use serde::{Deserialize, Serialize};

/// Title used when the backend does not report one
pub const UNKNOWN_TITLE: &str = "Unknown Title";

/// Resolved track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    /// Direct stream URL handed to the audio transport
    pub stream_url: String,

    /// Display title
    pub title: String,

    /// Canonical page URL (may be empty)
    pub page_url: String,

    /// Duration in whole seconds; None for live or unknown
    pub duration_secs: Option<u64>,

    /// Optional thumbnail image URL
    pub thumbnail: Option<String>,
}

impl Track {
    pub fn new(
        stream_url: impl Into<String>,
        title: impl Into<String>,
        page_url: impl Into<String>,
    ) -> Self {
        Self {
            stream_url: stream_url.into(),
            title: title.into(),
            page_url: page_url.into(),
            duration_secs: None,
            thumbnail: None,
        }
    }

    /// Set duration; zero means unknown/live and is stored as None
    pub fn with_duration(mut self, secs: u64) -> Self {
        self.duration_secs = (secs > 0).then_some(secs);
        self
    }

    pub fn with_thumbnail(mut self, url: impl Into<String>) -> Self {
        self.thumbnail = Some(url.into());
        self
    }

    /// True when the duration is unknown (live streams report none)
    pub fn is_live_or_unknown(&self) -> bool {
        matches!(self.duration_secs, None | Some(0))
    }
}
