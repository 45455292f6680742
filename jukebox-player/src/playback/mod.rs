//! Playback building blocks shared by the room driver and transports
//!
//! - [`source`]: audio source construction from a track
//! - [`bridge`]: completion handoff from transport threads into room workers
//! - [`state`]: per-room playback state

pub mod bridge;
pub mod source;
pub mod state;

pub use bridge::{CompletionHandle, StreamToken};
pub use source::AudioSource;
pub use state::PlaybackState;
