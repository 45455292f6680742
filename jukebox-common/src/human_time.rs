//! Human-readable duration formatting
//!
//! Provides the track duration display used by status displays and queue
//! listings.

/// Label shown when a track has no known duration
pub const LIVE_OR_UNKNOWN: &str = "live/unknown";

/// Format a track duration as `minutes:seconds`.
///
/// Minutes are not padded and keep counting past the hour; seconds are
/// always two digits. A missing or zero duration renders as `live/unknown`.
///
/// # Examples
///
/// ```
/// use jukebox_common::human_time::format_track_duration;
///
/// assert_eq!(format_track_duration(Some(185)), "3:05");
/// assert_eq!(format_track_duration(Some(59)), "0:59");
/// assert_eq!(format_track_duration(Some(3725)), "62:05");
/// assert_eq!(format_track_duration(Some(0)), "live/unknown");
/// assert_eq!(format_track_duration(None), "live/unknown");
/// ```
pub fn format_track_duration(seconds: Option<u64>) -> String {
    match seconds {
        Some(secs) if secs > 0 => format!("{}:{:02}", secs / 60, secs % 60),
        _ => LIVE_OR_UNKNOWN.to_string(),
    }
}
