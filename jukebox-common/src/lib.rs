//! # Jukebox Common Library
//!
//! Shared code for the jukebox coordinator and its adapters including:
//! - Track value type and room/channel/user identifiers
//! - Event types (JukeboxEvent enum) and the broadcast EventBus
//! - Bootstrap configuration discovery and secret token resolution
//! - Human-readable duration formatting

pub mod config;
pub mod error;
pub mod events;
pub mod human_time;
pub mod ids;
pub mod track;

pub use error::{Error, Result};
pub use ids::{MessageId, RoomId, TextChannelId, UserId, VoiceChannelId};
pub use track::Track;
