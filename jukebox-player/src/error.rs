//! Error types for jukebox-player
//!
//! The playback-facing variants follow how each failure is handled:
//! voice and resolution errors surface to the originating channel and abort
//! only that action, source errors auto-advance, display errors fall back.

use std::time::Duration;
use thiserror::Error;

/// Main error type for jukebox-player
#[derive(Error, Debug)]
pub enum Error {
    /// Invoking user is not in a voice channel
    #[error("You must be connected to a voice channel.")]
    NotInVoice,

    /// Voice connect or move failed
    #[error("Voice connection error: {0}")]
    VoiceConnect(String),

    /// Voice connect did not complete in time
    #[error("Timed out connecting to voice after {0:?}")]
    ConnectTimeout(Duration),

    /// Resolver returned nothing usable or the backend failed
    #[error("Resolution error: {0}")]
    Resolution(String),

    /// Audio source could not be constructed or started
    #[error("Source error: {0}")]
    Source(String),

    /// Pop from an empty queue (guarded before it can happen)
    #[error("Queue is empty")]
    EmptyQueue,

    /// Status display send/edit failure
    #[error("Display error: {0}")]
    Display(String),

    /// Configuration file loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP server errors
    #[error("HTTP server error: {0}")]
    Http(String),

    /// File or process I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors from the shared crate
    #[error(transparent)]
    Common(#[from] jukebox_common::Error),

    /// Coordinator or room inbox closed
    #[error("Coordinator shut down")]
    Shutdown,
}

/// Convenience Result type using jukebox-player Error
pub type Result<T> = std::result::Result<T, Error>;
