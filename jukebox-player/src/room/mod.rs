//! Per-room worker
//!
//! Each room runs one task that exclusively owns its [`SessionState`], voice
//! transport, search sets and status display. Commands from the coordinator
//! and stream completions from the transport arrive on the same inbox, so
//! every mutation of a room is totally ordered without locks.
//!
//! **Module Structure:**
//! - `core.rs`: worker lifecycle, inbox, voice presence, replies
//! - `playback.rs`: the playback driver (start, advance, completion handling)
//! - `controls.rs`: control-surface dispatch
//!
//! [`SessionState`]: crate::session::SessionState

mod controls;
mod core;
mod playback;

pub use self::core::{Room, RoomActivity, RoomDeps, RoomHandle, RoomMailbox, RoomMessage};
