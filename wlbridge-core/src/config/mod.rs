//! Configuration for the bridge
//!
//! Configuration comes from a TOML file, optionally overridden by
//! `WLBRIDGE_<SECTION>_<KEY>` environment variables, and is validated as a
//! whole before anything is built from it. A reload goes through exactly the
//! same path, so a bad edit is rejected before it can replace a good config.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::logging::LogLevel;

mod error;

pub use error::ConfigError;

/// Prefix used when none is configured
pub const DEFAULT_PREFIX: &str = "!";

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Locale selector, picks `locale_<locale>.toml` from the data dir
    pub locale: String,

    /// Chat-side settings: prefix, who may run commands
    pub discord: DiscordConfig,

    /// Message template overrides, same key layout as the locale files
    pub messages: toml::Table,

    /// Where the whitelist and audit log live
    pub storage: StorageConfig,

    pub logging: LoggingConfig,

    pub shutdown: ShutdownConfig,
}

/// Chat network configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    /// Leading string that marks a message as a command attempt
    pub prefix: String,

    /// Identities allowed to run commands, in configuration order
    #[serde(alias = "authorized_roles")]
    pub authorized_users: Vec<String>,

    /// The bridge's own identity; messages from it are never dispatched
    pub bot_id: Option<String>,

    /// Extra aliases for the whitelist command, on top of `wl`
    pub aliases: Vec<String>,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Base directory for locale files, the whitelist and the audit log
    pub data_dir: PathBuf,

    /// Whitelist file name, relative to `data_dir`
    pub whitelist_file: String,

    /// Audit log file name, relative to `data_dir`
    pub audit_file: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Enable JSON formatting
    pub json_format: bool,

    /// Include target module
    pub with_target: bool,
}

/// Shutdown configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// Grace period for in-flight dispatches once shutdown starts
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            authorized_users: Vec::new(),
            bot_id: None,
            aliases: Vec::new(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            whitelist_file: "whitelist.json".to_string(),
            audit_file: "whitelist_log.txt".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            with_target: true,
        }
    }
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
        }
    }
}

impl StorageConfig {
    pub fn whitelist_path(&self) -> PathBuf {
        self.data_dir.join(&self.whitelist_file)
    }

    pub fn audit_path(&self) -> PathBuf {
        self.data_dir.join(&self.audit_file)
    }

    pub fn locale_path(&self, locale: &str) -> PathBuf {
        self.data_dir.join(format!("locale_{}.toml", locale))
    }
}

impl Config {
    /// Defaults plus environment overrides
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = Self::read_file(path.as_ref())?;
        config.validate()?;
        Ok(config)
    }

    /// File (if it exists) then environment overrides, validated
    ///
    /// This is what startup and reload both use.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            Self::read_file(path)?
        } else {
            Self::default()
        };
        config.apply_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Apply `WLBRIDGE_*` overrides looked up through `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(prefix) = lookup("WLBRIDGE_DISCORD_PREFIX") {
            self.discord.prefix = prefix;
        }
        if let Some(users) = lookup("WLBRIDGE_DISCORD_AUTHORIZED_USERS") {
            self.discord.authorized_users = users
                .split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(bot_id) = lookup("WLBRIDGE_DISCORD_BOT_ID") {
            self.discord.bot_id = Some(bot_id).filter(|id| !id.is_empty());
        }
        if let Some(locale) = lookup("WLBRIDGE_LOCALE") {
            self.locale = locale;
        }
        if let Some(data_dir) = lookup("WLBRIDGE_STORAGE_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(data_dir);
        }
        if let Some(level) = lookup("WLBRIDGE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(json) = lookup("WLBRIDGE_LOG_JSON") {
            self.logging.json_format = json
                .parse()
                .map_err(|e: std::str::ParseBoolError| ConfigError::InvalidOverride {
                    var: "WLBRIDGE_LOG_JSON",
                    reason: e.to_string(),
                })?;
        }
        if let Some(timeout) = lookup("WLBRIDGE_SHUTDOWN_TIMEOUT") {
            self.shutdown.timeout = humantime_serde::re::humantime::parse_duration(&timeout)
                .map_err(|e| ConfigError::InvalidOverride {
                    var: "WLBRIDGE_SHUTDOWN_TIMEOUT",
                    reason: e.to_string(),
                })?;
        }
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let prefix = &self.discord.prefix;
        if prefix.is_empty() || prefix.chars().any(char::is_whitespace) {
            return Err(ConfigError::Invalid(format!(
                "prefix must be non-empty and contain no whitespace, got {:?}",
                prefix
            )));
        }

        if let Some(id) = self.discord.authorized_users.iter().find(|id| id.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "authorized user id must not be blank, got {:?}",
                id
            )));
        }

        if self.storage.whitelist_file.is_empty() || self.storage.audit_file.is_empty() {
            return Err(ConfigError::Invalid(
                "whitelist_file and audit_file must be set".to_string(),
            ));
        }

        if !LogLevel::NAMES.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "Invalid log level: {}",
                self.logging.level
            )));
        }

        if self.shutdown.timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "shutdown timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Effective locale, `en` when unset
    pub fn locale(&self) -> &str {
        if self.locale.trim().is_empty() {
            "en"
        } else {
            self.locale.trim()
        }
    }

    /// Save configuration to file
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = toml::to_string_pretty(self)?;

        std::fs::write(path, contents).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(())
    }
}
