//! Bootstrap configuration discovery and secret token resolution
//!
//! Configuration sources, highest priority first:
//! 1. Command-line arguments (handled by the binary)
//! 2. Environment variables
//! 3. TOML config file
//! 4. Built-in defaults
//!
//! A missing TOML file is not an error unless the caller named it explicitly;
//! a missing secret token always is.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Directory name used under the platform config directory
pub const CONFIG_DIR_NAME: &str = "jukebox";

/// Environment variable holding the chat platform token
pub const TOKEN_ENV_VAR: &str = "DISCORD_TOKEN";

/// Secret chat-platform token
///
/// The value never appears in `Debug` or `Display` output.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretToken(String);

impl SecretToken {
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into().trim().to_string();
        if value.is_empty() {
            return Err(Error::Config("secret token is empty".to_string()));
        }
        Ok(Self(value))
    }

    /// Raw token, for handing to the platform client only
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretToken(<redacted, {} chars>)", self.0.len())
    }
}

impl fmt::Display for SecretToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

/// Read the required secret token from the environment
///
/// Fails with [`Error::Config`] when the variable is unset, not valid
/// unicode, or blank.
pub fn resolve_secret_token(env_var_name: &str) -> Result<SecretToken> {
    match std::env::var(env_var_name) {
        Ok(value) => SecretToken::new(value)
            .map_err(|_| Error::Config(format!("{} is set but empty", env_var_name))),
        Err(std::env::VarError::NotPresent) => Err(Error::Config(format!(
            "{} not set (export it or add it to .env)",
            env_var_name
        ))),
        Err(std::env::VarError::NotUnicode(_)) => Err(Error::Config(format!(
            "{} is not valid unicode",
            env_var_name
        ))),
    }
}

/// Default configuration file location for the platform
///
/// Linux checks `~/.config/jukebox/config.toml` then
/// `/etc/jukebox/config.toml`; other platforms use the user config directory.
/// Returns None when no candidate exists.
pub fn default_config_path() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join("config.toml"));

    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc").join(CONFIG_DIR_NAME).join("config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Load a TOML bootstrap file into `T`
///
/// - `explicit` set: the file must exist and parse
/// - `explicit` unset: the platform default is used if present, otherwise
///   `T::default()` with a warning
pub fn load_toml_config<T>(explicit: Option<&Path>) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            path.to_path_buf()
        }
        None => match default_config_path() {
            Some(path) => path,
            None => {
                warn!("No config file found, using built-in defaults");
                return Ok(T::default());
            }
        },
    };

    let content = std::fs::read_to_string(&path)?;
    let config = toml::from_str::<T>(&content)?;
    info!("Loaded configuration from {}", path.display());
    Ok(config)
}
