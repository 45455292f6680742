//! Completion bridge
//!
//! Transports report "stream finished" from their own thread or task. The
//! report must run on the room worker, because advancing mutates the session.
//! A [`CompletionHandle`] posts a [`RoomMessage::StreamFinished`] into the
//! room's inbox and waits for the worker's acknowledgement, so an error during
//! advancement is logged here, at the point the transport handed over
//! control, and never re-raised into the transport.
//!
//! The handle holds a weak sender: an evicted room's handles go inert instead
//! of keeping the room alive.

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, warn};

use jukebox_common::RoomId;

use crate::error::Result;
use crate::room::RoomMessage;

/// Identifies one started stream within a room
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StreamToken(pub u64);

impl std::fmt::Display for StreamToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One-shot completion callback bound to a room and a stream
#[derive(Debug)]
pub struct CompletionHandle {
    room: RoomId,
    stream: StreamToken,
    tx: mpsc::WeakUnboundedSender<RoomMessage>,
}

impl CompletionHandle {
    pub fn new(room: RoomId, stream: StreamToken, tx: mpsc::WeakUnboundedSender<RoomMessage>) -> Self {
        Self { room, stream, tx }
    }

    pub fn room(&self) -> RoomId {
        self.room
    }

    pub fn stream(&self) -> StreamToken {
        self.stream
    }

    /// Report the end of the stream from a non-async thread
    ///
    /// Blocks until the room worker has finished advancing. Must not be called
    /// from inside an async runtime; use [`CompletionHandle::notify`] there.
    pub fn notify_blocking(self, error: Option<String>) {
        let room = self.room;
        let stream = self.stream;
        if let Some(ack) = self.dispatch(error) {
            Self::log_outcome(room, stream, ack.blocking_recv());
        }
    }

    /// Report the end of the stream from an async transport task
    pub async fn notify(self, error: Option<String>) {
        let room = self.room;
        let stream = self.stream;
        if let Some(ack) = self.dispatch(error) {
            Self::log_outcome(room, stream, ack.await);
        }
    }

    fn dispatch(self, error: Option<String>) -> Option<oneshot::Receiver<Result<()>>> {
        if let Some(err) = &error {
            warn!("Player error in room {} stream {}: {}", self.room, self.stream, err);
        }

        let Some(tx) = self.tx.upgrade() else {
            debug!(
                "Room {} no longer active, dropping completion for stream {}",
                self.room, self.stream
            );
            return None;
        };

        let (ack_tx, ack_rx) = oneshot::channel();
        let message = RoomMessage::StreamFinished {
            stream: self.stream,
            error,
            ack: ack_tx,
        };

        if tx.send(message).is_err() {
            debug!(
                "Room {} inbox closed, dropping completion for stream {}",
                self.room, self.stream
            );
            return None;
        }

        Some(ack_rx)
    }

    fn log_outcome(
        room: RoomId,
        stream: StreamToken,
        outcome: std::result::Result<Result<()>, oneshot::error::RecvError>,
    ) {
        match outcome {
            Ok(Ok(())) => debug!("Room {} advanced after stream {}", room, stream),
            Ok(Err(e)) => error!("Advance after stream {} in room {} failed: {}", stream, room, e),
            Err(_) => warn!(
                "Room {} dropped completion for stream {} without acknowledging",
                room, stream
            ),
        }
    }
}
