//! Playback state per room

use std::fmt;

/// Observable playback state of one room
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// No current track, queue empty, transport disconnected or silent
    Idle,
    Playing,
    Paused,
    /// Transient: handling a stream completion
    Advancing,
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackState::Idle => write!(f, "Idle"),
            PlaybackState::Playing => write!(f, "Playing"),
            PlaybackState::Paused => write!(f, "Paused"),
            PlaybackState::Advancing => write!(f, "Advancing"),
        }
    }
}
