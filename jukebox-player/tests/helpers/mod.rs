//! Test helper modules for jukebox-player integration tests
//!
//! Provides reusable test infrastructure components:
//! - Recording fakes for the voice, chat and resolver seams
//! - Harness: wires fakes into rooms and coordinators, plus event waiting

#![allow(dead_code)]

pub mod fakes;
pub mod harness;

// Re-export commonly used types
pub use fakes::{track, ConnectMode, FakeChat, FakeGateway, FakeResolver, FakeTransport, SentMessage};
pub use harness::{
    button, command, expect_no_event, pump, wait_for_event, Harness, ROOM, TEXT, USER, VOICE,
};
