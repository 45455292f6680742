//! # Jukebox Player Library (jukebox-player)
//!
//! Per-room media-queue coordinator for a chat-platform music bot.
//!
//! **Purpose:** Keep an ordered queue, current track, loop and volume state per
//! room; drive one audio stream at a time and advance when it completes; keep
//! a "Now Playing" status display with interactive controls.
//!
//! **Architecture:** One coordinator task routes inbound commands and button
//! presses to per-room worker tasks. Each worker owns its session outright;
//! transport completions re-enter that worker through a message channel with
//! a synchronous acknowledgement. The chat platform, voice transport and media
//! resolver sit behind the [`chat`], [`transport`] and [`resolver`] traits.

pub mod chat;
pub mod config;
pub mod control;
pub mod coordinator;
pub mod display;
pub mod error;
pub mod host;
pub mod liveness;
pub mod playback;
pub mod resolver;
pub mod room;
pub mod session;
pub mod transport;

pub use coordinator::{Coordinator, CoordinatorHandle, Inbound};
pub use error::{Error, Result};
pub use session::SessionState;
