//! Audio source construction
//!
//! Wraps a track's stream reference into what the transport plays: the URL,
//! the session volume at start time, and the ffmpeg input/output options that
//! keep long network streams alive.

use jukebox_common::Track;

use crate::error::{Error, Result};
use crate::session::clamp_volume;

/// ffmpeg options placed before the input (reconnect on dropped streams)
pub const FFMPEG_BEFORE_OPTIONS: &str =
    "-nostdin -reconnect 1 -reconnect_streamed 1 -reconnect_delay_max 5 -rw_timeout 10000000";

/// ffmpeg options placed after the input (audio only)
pub const FFMPEG_OPTIONS: &str = "-vn -timeout 10";

/// Playable source handed to a transport
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSource {
    pub url: String,
    /// Initial volume (0.0-2.0)
    pub volume: f32,
    pub before_options: &'static str,
    pub options: &'static str,
}

impl AudioSource {
    /// Build a source for `track` at `volume`
    ///
    /// Fails with [`Error::Source`] when the track has no usable stream URL.
    pub fn from_track(track: &Track, volume: f32) -> Result<Self> {
        let url = track.stream_url.trim();
        if url.is_empty() {
            return Err(Error::Source(format!("no stream URL for '{}'", track.title)));
        }
        if !url.contains("://") {
            return Err(Error::Source(format!(
                "unsupported stream reference for '{}': {}",
                track.title, url
            )));
        }

        Ok(Self {
            url: url.to_string(),
            volume: clamp_volume(volume),
            before_options: FFMPEG_BEFORE_OPTIONS,
            options: FFMPEG_OPTIONS,
        })
    }
}
