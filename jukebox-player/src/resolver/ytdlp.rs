//! yt-dlp resolver adapter
//!
//! Runs `yt-dlp -J` as a child process and maps its JSON info dict to
//! [`Track`]s. Each invocation is bounded by the configured timeout; the child
//! is killed when the bound is hit.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::process::Command;
use tracing::{debug, warn};

use jukebox_common::track::UNKNOWN_TITLE;
use jukebox_common::Track;

use super::TrackResolver;
use crate::error::{Error, Result};

/// Socket timeout handed to yt-dlp itself (seconds)
const SOCKET_TIMEOUT_SECS: &str = "10";

/// Resolver backed by the yt-dlp executable
#[derive(Debug, Clone)]
pub struct YtDlpResolver {
    command: String,
    timeout: Duration,
}

impl YtDlpResolver {
    pub fn new(command: impl Into<String>, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            timeout,
        }
    }

    fn base_args() -> [&'static str; 11] {
        [
            "-J",
            "--no-playlist",
            "-f",
            "bestaudio/best",
            "--default-search",
            "ytsearch",
            "--no-warnings",
            "--geo-bypass",
            "--socket-timeout",
            SOCKET_TIMEOUT_SECS,
            "--",
        ]
    }

    /// Run yt-dlp for `target` and parse its JSON output
    async fn extract_info(&self, target: &str) -> Result<Value> {
        let mut cmd = Command::new(&self.command);
        cmd.args(Self::base_args())
            .arg(target)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!("Running {} for {:?}", self.command, target);

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Err(_) => {
                return Err(Error::Resolution(format!(
                    "yt-dlp timed out after {}s",
                    self.timeout.as_secs()
                )))
            }
            Ok(Err(e)) => return Err(Error::Resolution(format!("yt-dlp error: {}", e))),
            Ok(Ok(output)) => output,
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = stderr
                .lines()
                .rev()
                .find(|l| !l.trim().is_empty())
                .unwrap_or("no output")
                .trim()
                .to_string();
            return Err(Error::Resolution(format!("yt-dlp error: {}", reason)));
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| Error::Resolution(format!("yt-dlp returned invalid JSON: {}", e)))
    }
}

#[async_trait]
impl TrackResolver for YtDlpResolver {
    async fn resolve(&self, query: &str) -> Result<Track> {
        let info = self.extract_info(query).await?;
        track_from_resolved(&info)
    }

    async fn search(&self, query: &str, limit: usize) -> Vec<Track> {
        let target = search_target(query, limit);
        match self.extract_info(&target).await {
            Ok(info) => tracks_from_search(&info, limit),
            Err(e) => {
                warn!("Search for {:?} failed: {}", query, e);
                Vec::new()
            }
        }
    }
}

/// URLs are passed through; free text becomes a `ytsearchN:` query
pub fn search_target(query: &str, limit: usize) -> String {
    let query = query.trim();
    if looks_like_url(query) {
        query.to_string()
    } else {
        format!("ytsearch{}:{}", limit.max(1), query)
    }
}

fn looks_like_url(query: &str) -> bool {
    query.starts_with("http://") || query.starts_with("https://")
}

/// Single-track result; search/playlist results yield their first entry
pub fn track_from_resolved(info: &Value) -> Result<Track> {
    if info.is_null() {
        return Err(Error::Resolution("No results from yt-dlp.".to_string()));
    }

    let info = match info.get("entries") {
        Some(entries) => entries
            .as_array()
            .and_then(|list| list.iter().find(|e| !e.is_null()))
            .ok_or_else(|| Error::Resolution("No playable entry found.".to_string()))?,
        None => info,
    };

    Ok(track_from_info(info))
}

/// Candidate list from a search result; a single video counts as one result
pub fn tracks_from_search(info: &Value, limit: usize) -> Vec<Track> {
    let entries: Vec<&Value> = match info.get("entries").and_then(Value::as_array) {
        Some(list) => list.iter().filter(|e| !e.is_null()).collect(),
        None if info.get("webpage_url").is_some() && info.get("title").is_some() => vec![info],
        None => Vec::new(),
    };

    entries.into_iter().take(limit).map(track_from_info).collect()
}

fn track_from_info(info: &Value) -> Track {
    let stream_url = info
        .get("url")
        .and_then(Value::as_str)
        .or_else(|| {
            info.get("formats")
                .and_then(Value::as_array)
                .and_then(|formats| formats.first())
                .and_then(|f| f.get("url"))
                .and_then(Value::as_str)
        })
        .unwrap_or_default();

    let title = info
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or(UNKNOWN_TITLE);

    let page_url = info
        .get("webpage_url")
        .and_then(Value::as_str)
        .unwrap_or_default();

    // yt-dlp reports duration as an int or a float depending on the extractor
    let duration = info
        .get("duration")
        .and_then(|d| d.as_u64().or_else(|| d.as_f64().map(|f| f.max(0.0) as u64)))
        .unwrap_or(0);

    let mut track = Track::new(stream_url, title, page_url).with_duration(duration);
    if let Some(thumb) = info.get("thumbnail").and_then(Value::as_str) {
        track = track.with_thumbnail(thumb);
    }
    track
}
