//! Configuration management for jukebox-player
//!
//! Two layers:
//! 1. **TOML bootstrap** ([`TomlConfig`]): ports, timeouts, external commands,
//!    logging, console host identities. Every key has a built-in default.
//! 2. **Runtime settings** ([`Settings`]): the typed view the coordinator,
//!    room workers and resolver consume, built from the TOML layer after
//!    command-line overrides are applied.
//!
//! The secret token is not part of either layer; it comes from the
//! environment only (see `jukebox_common::config::resolve_secret_token`).

use serde::Deserialize;
use std::time::Duration;

use jukebox_common::{RoomId, TextChannelId, UserId, VoiceChannelId};

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Liveness HTTP port
    pub liveness_port: u16,

    /// Prefix that marks a chat message as a command
    pub command_prefix: String,

    /// Upper bound on a single resolver call
    pub resolve_timeout_secs: u64,

    /// Upper bound on a voice connect
    pub connect_timeout_secs: u64,

    /// Maximum candidates returned by a search
    pub search_limit: usize,

    /// Inactivity window after which a search result set expires
    pub search_timeout_secs: u64,

    /// Idle time before a session is evicted (0 disables eviction)
    pub idle_eviction_secs: u64,

    /// How often the coordinator looks for idle sessions
    pub eviction_sweep_secs: u64,

    /// Player executable used by the local transport
    pub player_command: String,

    /// yt-dlp executable used by the resolver
    pub ytdlp_command: String,

    pub logging: LoggingConfig,

    pub console: ConsoleConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

/// Identities the console host uses for commands typed on stdin
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub room: u64,
    pub text_channel: u64,
    pub voice_channel: u64,
    pub user: u64,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            liveness_port: 8080,
            command_prefix: "!".to_string(),
            resolve_timeout_secs: 10,
            connect_timeout_secs: 15,
            search_limit: 10,
            search_timeout_secs: 60,
            idle_eviction_secs: 900,
            eviction_sweep_secs: 30,
            player_command: "ffplay".to_string(),
            ytdlp_command: "yt-dlp".to_string(),
            logging: LoggingConfig::default(),
            console: ConsoleConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            room: 1,
            text_channel: 1,
            voice_channel: 1,
            user: 1,
        }
    }
}

impl TomlConfig {
    pub fn settings(&self) -> Settings {
        Settings {
            command_prefix: self.command_prefix.clone(),
            resolve_timeout: Duration::from_secs(self.resolve_timeout_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            search_limit: self.search_limit.max(1),
            search_timeout: Duration::from_secs(self.search_timeout_secs),
            idle_eviction: (self.idle_eviction_secs > 0)
                .then(|| Duration::from_secs(self.idle_eviction_secs)),
            eviction_sweep: Duration::from_secs(self.eviction_sweep_secs.max(1)),
        }
    }

    pub fn console_identity(&self) -> ConsoleIdentity {
        ConsoleIdentity {
            room: RoomId(self.console.room),
            text_channel: TextChannelId(self.console.text_channel),
            voice_channel: VoiceChannelId(self.console.voice_channel),
            user: UserId(self.console.user),
        }
    }
}

/// Typed console identities
#[derive(Debug, Clone, Copy)]
pub struct ConsoleIdentity {
    pub room: RoomId,
    pub text_channel: TextChannelId,
    pub voice_channel: VoiceChannelId,
    pub user: UserId,
}

/// Runtime settings shared by the coordinator and room workers
#[derive(Debug, Clone)]
pub struct Settings {
    pub command_prefix: String,
    pub resolve_timeout: Duration,
    pub connect_timeout: Duration,
    pub search_limit: usize,
    pub search_timeout: Duration,
    /// None disables eviction
    pub idle_eviction: Option<Duration>,
    pub eviction_sweep: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        TomlConfig::default().settings()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.command_prefix, "!");
        assert_eq!(settings.resolve_timeout, Duration::from_secs(10));
        assert_eq!(settings.connect_timeout, Duration::from_secs(15));
        assert_eq!(settings.search_limit, 10);
        assert_eq!(settings.search_timeout, Duration::from_secs(60));
        assert_eq!(settings.idle_eviction, Some(Duration::from_secs(900)));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: TomlConfig = toml::from_str(
            r#"
            command_prefix = "?"
            idle_eviction_secs = 0

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.command_prefix, "?");
        assert_eq!(config.liveness_port, 8080);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.console.room, 1);
        assert_eq!(config.settings().idle_eviction, None);
    }
}
