//! Track resolver seam
//!
//! Turns a query (URL or free text) into playable [`Track`]s. Resolvers are
//! stateless with respect to sessions.

pub mod ytdlp;

use async_trait::async_trait;

use jukebox_common::Track;

use crate::error::Result;

pub use ytdlp::YtDlpResolver;

#[async_trait]
pub trait TrackResolver: Send + Sync {
    /// Best single match for `query`
    ///
    /// Fails with [`crate::Error::Resolution`] on no result, an empty result
    /// set, or a backend/timeout failure.
    async fn resolve(&self, query: &str) -> Result<Track>;

    /// Up to `limit` ordered candidates
    ///
    /// Failures are reported as an empty list.
    async fn search(&self, query: &str, limit: usize) -> Vec<Track>;
}
