//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.huddle/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::context::Strings;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct HuddleConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub thread: ThreadConfig,
    #[serde(default)]
    pub compliance: ComplianceConfig,
    /// Partial string table; missing keys keep their English default.
    #[serde(default)]
    pub strings: Option<Strings>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    pub log_file: Option<String>,
    pub log_level: Option<String>,
    pub locale: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ThreadConfig {
    pub disable_read_receipt: Option<bool>,
    pub disable_jump_to_new_message_button: Option<bool>,
    pub number_of_messages_to_reload: Option<u32>,
    pub show_message_status: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ComplianceConfig {
    pub banner_overwrite_delay_ms: Option<u64>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_DISABLE_READ_RECEIPT: bool = true;
pub const DEFAULT_DISABLE_JUMP_TO_NEW_MESSAGE_BUTTON: bool = false;
pub const DEFAULT_NUMBER_OF_MESSAGES_TO_RELOAD: u32 = 0;
pub const DEFAULT_BANNER_OVERWRITE_DELAY_MS: u64 = 3000;
pub const DEFAULT_LOG_FILE: &str = "huddle.log";
pub const DEFAULT_LOCALE: &str = "en-US";

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub disable_read_receipt: bool,
    pub disable_jump_to_new_message_button: bool,
    pub number_of_messages_to_reload: u32,
    pub show_message_status: bool,
    /// Zero disables the banner debounce.
    pub banner_overwrite_delay_ms: u64,
    pub log_file: String,
    pub log_level: log::LevelFilter,
    pub locale: String,
    pub strings: Strings,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        resolve(&HuddleConfig::default(), &CliOverrides::default())
    }
}

/// Values given on the command line (None = not specified).
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub read_receipts: Option<bool>,
    pub banner_delay_ms: Option<u64>,
    pub log_file: Option<String>,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.huddle/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".huddle").join("config.toml"))
}

/// Load config from `~/.huddle/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `HuddleConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<HuddleConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(HuddleConfig::default());
        }
    };

    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(&path);
        return Ok(HuddleConfig::default());
    }

    load_config_from(&path)
}

/// Load and parse a specific config file.
pub fn load_config_from(path: &Path) -> Result<HuddleConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: HuddleConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) {
    let default_content = r#"# Huddle Configuration
# All settings are optional. Defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [general]
# log_file = "huddle.log"
# log_level = "debug"                    # "error", "warn", "info", "debug", "trace"
# locale = "en-US"

# [thread]
# disable_read_receipt = true             # Or HUDDLE_DISABLE_READ_RECEIPT
# disable_jump_to_new_message_button = false
# number_of_messages_to_reload = 0        # Page size when scrolling into history
# show_message_status = true              # Sending / delivered / seen tags

# [compliance]
# banner_overwrite_delay_ms = 3000        # 0 disables the debounce

# [strings]
# recording_started = "Recording has started."
# recording_stopped = "Recording has stopped."
"#;

    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!("Failed to create config directory: {}", e);
            return;
        }
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

fn env_bool(key: &str) -> Option<bool> {
    let value = std::env::var(key).ok()?;
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        other => {
            warn!("Ignoring {}={:?}: not a boolean", key, other);
            None
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let value = std::env::var(key).ok()?;
    match value.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!("Ignoring {}={:?}: not a number", key, value);
            None
        }
    }
}

fn parse_level(level: &str) -> log::LevelFilter {
    level.parse().unwrap_or_else(|_| {
        warn!("Unknown log level {:?}, using debug", level);
        log::LevelFilter::Debug
    })
}

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
pub fn resolve(config: &HuddleConfig, cli: &CliOverrides) -> ResolvedConfig {
    // Read receipts: CLI → env → config → default
    let disable_read_receipt = cli
        .read_receipts
        .map(|enabled| !enabled)
        .or_else(|| env_bool("HUDDLE_DISABLE_READ_RECEIPT"))
        .or(config.thread.disable_read_receipt)
        .unwrap_or(DEFAULT_DISABLE_READ_RECEIPT);

    let disable_jump_to_new_message_button = env_bool("HUDDLE_DISABLE_JUMP_TO_NEW_MESSAGE_BUTTON")
        .or(config.thread.disable_jump_to_new_message_button)
        .unwrap_or(DEFAULT_DISABLE_JUMP_TO_NEW_MESSAGE_BUTTON);

    let number_of_messages_to_reload = env_parse("HUDDLE_NUMBER_OF_MESSAGES_TO_RELOAD")
        .or(config.thread.number_of_messages_to_reload)
        .unwrap_or(DEFAULT_NUMBER_OF_MESSAGES_TO_RELOAD);

    // Banner delay: CLI → env → config → default
    let banner_overwrite_delay_ms = cli
        .banner_delay_ms
        .or_else(|| env_parse("HUDDLE_BANNER_OVERWRITE_DELAY_MS"))
        .or(config.compliance.banner_overwrite_delay_ms)
        .unwrap_or(DEFAULT_BANNER_OVERWRITE_DELAY_MS);

    let log_file = cli
        .log_file
        .clone()
        .or_else(|| std::env::var("HUDDLE_LOG_FILE").ok())
        .or_else(|| config.general.log_file.clone())
        .unwrap_or_else(|| DEFAULT_LOG_FILE.to_string());

    let log_level = std::env::var("HUDDLE_LOG_LEVEL")
        .ok()
        .or_else(|| config.general.log_level.clone())
        .map(|l| parse_level(&l))
        .unwrap_or(log::LevelFilter::Debug);

    ResolvedConfig {
        disable_read_receipt,
        disable_jump_to_new_message_button,
        number_of_messages_to_reload,
        show_message_status: config.thread.show_message_status.unwrap_or(true),
        banner_overwrite_delay_ms,
        log_file,
        log_level,
        locale: config
            .general
            .locale
            .clone()
            .unwrap_or_else(|| DEFAULT_LOCALE.to_string()),
        strings: config.strings.clone().unwrap_or_default(),
    }
}
