//! Configuration module for SerialVis-RS
//!
//! This module handles application configuration including:
//! - The user-editable config file (`config.toml`)
//! - Application state persistence (recently used ports)
//!
//! # App Data Location
//!
//! Application data is stored in the platform-appropriate location:
//! - **Linux**: `~/.local/share/dev.serialvis.serialvis-rs/`
//! - **macOS**: `~/Library/Application Support/dev.serialvis.serialvis-rs/`
//! - **Windows**: `%APPDATA%\dev.serialvis.serialvis-rs\`
//!
//! # Files
//!
//! - `config.toml` - Connection, window, and logging settings
//! - `app_state.json` - Recently used ports and last session info
//!
//! # Example
//!
//! ```ignore
//! use serialvis_rs::config::{AppState, Config};
//!
//! let config = Config::load_or_default();
//! let mut state = AppState::load_or_default();
//!
//! // After a successful connection
//! state.add_recent_port("/dev/ttyUSB0");
//! state.save()?;
//! ```

use crate::error::{Result, SerialVisError};
use crate::parser::ValueBounds;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Application identifier for data directories
pub const APP_ID: &str = "dev.serialvis.serialvis-rs";

/// Config filename
pub const CONFIG_FILE: &str = "config.toml";

/// App state filename
pub const APP_STATE_FILE: &str = "app_state.json";

/// Maximum number of recent ports to remember
pub const MAX_RECENT_PORTS: usize = 10;

/// Default baud rate for the serial connection
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Default sliding window duration in minutes
pub const DEFAULT_WINDOW_MINUTES: f64 = 25.0;

/// Default pause after opening the port, before trusting incoming data
pub const DEFAULT_STABILIZE_DELAY_MS: u64 = 2000;

/// Default timeout for a single blocking read in milliseconds
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 100;

/// Port preferred when present among the enumerated ports
pub const DEFAULT_PREFERRED_PORT: &str = "/dev/cu.usbserial-0001";

// ==================== App Data Directory ====================

/// Get the application data directory path
pub fn app_data_dir() -> Option<PathBuf> {
    dirs_next::data_dir().map(|p| p.join(APP_ID))
}

/// Ensure the app data directory exists
pub fn ensure_app_data_dir() -> Result<PathBuf> {
    let dir = app_data_dir().ok_or_else(|| {
        SerialVisError::Config("Could not determine app data directory".to_string())
    })?;

    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| {
            SerialVisError::Config(format!("Failed to create app data directory: {}", e))
        })?;
    }

    Ok(dir)
}

/// Get the path to the config file
pub fn config_path() -> Option<PathBuf> {
    app_data_dir().map(|p| p.join(CONFIG_FILE))
}

/// Get the path to the app state file
pub fn app_state_path() -> Option<PathBuf> {
    app_data_dir().map(|p| p.join(APP_STATE_FILE))
}

// ==================== Config ====================

/// Application configuration loaded from `config.toml`
///
/// Every field has a default, so a missing or partial file still yields
/// a usable configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Serial connection configuration
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// Sliding-window and value-limit configuration
    #[serde(default)]
    pub window: WindowConfig,

    /// Scrolling-log and diagnostics configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            SerialVisError::Config(format!("Failed to read config {:?}: {}", path, e))
        })?;

        toml::from_str(&content).map_err(|e| {
            SerialVisError::Config(format!("Failed to parse config {:?}: {}", path, e))
        })
    }

    /// Load configuration from the default location, falling back to
    /// defaults when the file is missing or unreadable
    pub fn load_or_default() -> Self {
        let Some(path) = config_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        Self::load(&path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save configuration to a file as TOML
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                SerialVisError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| SerialVisError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content).map_err(|e| {
            SerialVisError::Config(format!("Failed to write config {:?}: {}", path, e))
        })
    }
}

// ==================== Connection Config ====================

/// Serial connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Port to prefer when it appears among the enumerated ports.
    /// Falls back to the first enumerated port otherwise.
    #[serde(default = "default_preferred_port")]
    pub preferred_port: String,

    /// Baud rate for the serial connection
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Pause after opening the port before trusting incoming data
    /// (milliseconds). Input is discarded before and after the pause to
    /// drop device boot-up noise.
    #[serde(default = "default_stabilize_delay_ms")]
    pub stabilize_delay_ms: u64,

    /// Timeout for a single blocking read in milliseconds
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

fn default_preferred_port() -> String {
    DEFAULT_PREFERRED_PORT.to_string()
}

fn default_baud_rate() -> u32 {
    DEFAULT_BAUD_RATE
}

fn default_stabilize_delay_ms() -> u64 {
    DEFAULT_STABILIZE_DELAY_MS
}

fn default_read_timeout_ms() -> u64 {
    DEFAULT_READ_TIMEOUT_MS
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            preferred_port: DEFAULT_PREFERRED_PORT.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            stabilize_delay_ms: DEFAULT_STABILIZE_DELAY_MS,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
        }
    }
}

// ==================== Window Config ====================

/// Sliding-window and value-limit configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Sliding window duration in minutes
    #[serde(default = "default_window_minutes")]
    pub duration_minutes: f64,

    /// Lowest accepted value; parsed readings below it are dropped
    #[serde(default = "default_min_value")]
    pub min_value: f64,

    /// Highest accepted value; parsed readings above it are dropped
    #[serde(default = "default_max_value")]
    pub max_value: f64,
}

fn default_window_minutes() -> f64 {
    DEFAULT_WINDOW_MINUTES
}

fn default_min_value() -> f64 {
    f64::MIN
}

fn default_max_value() -> f64 {
    f64::MAX
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            duration_minutes: DEFAULT_WINDOW_MINUTES,
            min_value: f64::MIN,
            max_value: f64::MAX,
        }
    }
}

impl WindowConfig {
    /// The accepted value range as parser bounds
    pub fn value_bounds(&self) -> ValueBounds {
        ValueBounds::new(self.min_value, self.max_value)
    }
}

// ==================== Logging Config ====================

/// Scrolling-log and diagnostics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Maximum retained lines in the scrolling log
    #[serde(default = "default_max_log_entries")]
    pub max_log_entries: usize,

    /// Also write tracing output to a daily-rolling file in the app
    /// data directory
    #[serde(default)]
    pub log_to_file: bool,
}

fn default_max_log_entries() -> usize {
    crate::types::MAX_LOG_ENTRIES
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            max_log_entries: crate::types::MAX_LOG_ENTRIES,
            log_to_file: false,
        }
    }
}

// ==================== Recent Port Entry ====================

/// Information about a recently used serial port
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentPort {
    /// Port name as enumerated by the system
    pub name: String,

    /// Last used timestamp (Unix seconds)
    pub last_used: u64,
}

impl RecentPort {
    /// Create a new recent port entry stamped now
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            last_used: unix_now(),
        }
    }

    /// Update the last used timestamp
    pub fn touch(&mut self) {
        self.last_used = unix_now();
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

// ==================== App State ====================

/// Persistent application state
///
/// This stores session history that persists across runs, separate
/// from the user-editable config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppState {
    /// Version for future migration support
    #[serde(default = "default_app_state_version")]
    pub version: u32,

    /// Recently used ports, most recent first
    #[serde(default)]
    pub recent_ports: Vec<RecentPort>,

    /// The port used in the last session (for quick reconnect)
    #[serde(default)]
    pub last_port: Option<String>,
}

fn default_app_state_version() -> u32 {
    1
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            version: 1,
            recent_ports: Vec::new(),
            last_port: None,
        }
    }
}

impl AppState {
    /// Load app state from the default location
    pub fn load() -> Result<Self> {
        let path = app_state_path().ok_or_else(|| {
            SerialVisError::Config("Could not determine app state path".to_string())
        })?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|e| SerialVisError::Config(format!("Failed to read app state: {}", e)))?;

        serde_json::from_str(&content)
            .map_err(|e| SerialVisError::Config(format!("Failed to parse app state: {}", e)))
    }

    /// Load app state, returning defaults on any error
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!("Failed to load app state, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save app state to the default location
    pub fn save(&self) -> Result<()> {
        let dir = ensure_app_data_dir()?;
        let path = dir.join(APP_STATE_FILE);

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| SerialVisError::Config(format!("Failed to serialize app state: {}", e)))?;

        std::fs::write(&path, content)
            .map_err(|e| SerialVisError::Config(format!("Failed to write app state: {}", e)))
    }

    /// Record a port as recently used, moving it to the front
    pub fn add_recent_port(&mut self, name: impl Into<String>) {
        let name = name.into();

        if let Some(pos) = self.recent_ports.iter().position(|p| p.name == name) {
            let mut entry = self.recent_ports.remove(pos);
            entry.touch();
            self.recent_ports.insert(0, entry);
        } else {
            self.recent_ports.insert(0, RecentPort::new(name.as_str()));
            self.recent_ports.truncate(MAX_RECENT_PORTS);
        }

        self.last_port = Some(name);
    }

    /// Forget a port (e.g. if it no longer enumerates)
    pub fn remove_recent_port(&mut self, name: &str) {
        self.recent_ports.retain(|p| p.name != name);

        if self.last_port.as_deref() == Some(name) {
            self.last_port = None;
        }
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.connection.baud_rate, 9600);
        assert_eq!(config.connection.preferred_port, DEFAULT_PREFERRED_PORT);
        assert_eq!(config.connection.stabilize_delay_ms, 2000);
        assert_eq!(config.window.duration_minutes, 25.0);
        assert_eq!(config.logging.max_log_entries, 100);
        assert!(!config.logging.log_to_file);
    }

    #[test]
    fn test_default_bounds_are_unbounded() {
        let config = Config::default();
        let bounds = config.window.value_bounds();
        assert!(bounds.accepts(1e300));
        assert!(bounds.accepts(-1e300));
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.connection.preferred_port = "/dev/ttyACM3".to_string();
        config.connection.baud_rate = 115_200;
        config.window.duration_minutes = 10.0;
        config.window.min_value = -50.0;
        config.window.max_value = 150.0;
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.connection.preferred_port, "/dev/ttyACM3");
        assert_eq!(loaded.connection.baud_rate, 115_200);
        assert_eq!(loaded.window.duration_minutes, 10.0);
        assert_eq!(loaded.window.min_value, -50.0);
        assert_eq!(loaded.window.max_value, 150.0);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [connection]
            preferred_port = "COM7"
            "#,
        )
        .unwrap();

        assert_eq!(config.connection.preferred_port, "COM7");
        assert_eq!(config.connection.baud_rate, DEFAULT_BAUD_RATE);
        assert_eq!(config.window.duration_minutes, DEFAULT_WINDOW_MINUTES);
    }

    #[test]
    fn test_app_state_default() {
        let state = AppState::default();
        assert!(state.recent_ports.is_empty());
        assert!(state.last_port.is_none());
        assert_eq!(state.version, 1);
    }

    #[test]
    fn test_add_recent_port() {
        let mut state = AppState::default();

        state.add_recent_port("/dev/ttyUSB0");
        assert_eq!(state.recent_ports.len(), 1);
        assert_eq!(state.last_port.as_deref(), Some("/dev/ttyUSB0"));

        state.add_recent_port("/dev/ttyUSB1");
        assert_eq!(state.recent_ports.len(), 2);
        assert_eq!(state.recent_ports[0].name, "/dev/ttyUSB1"); // Most recent first

        // Adding the same port again should move it, not duplicate it
        state.add_recent_port("/dev/ttyUSB0");
        assert_eq!(state.recent_ports.len(), 2);
        assert_eq!(state.recent_ports[0].name, "/dev/ttyUSB0");
    }

    #[test]
    fn test_recent_ports_max_limit() {
        let mut state = AppState::default();

        for i in 0..15 {
            state.add_recent_port(format!("/dev/ttyUSB{}", i));
        }

        assert_eq!(state.recent_ports.len(), MAX_RECENT_PORTS);
    }

    #[test]
    fn test_remove_recent_port() {
        let mut state = AppState::default();
        state.add_recent_port("COM3");
        state.add_recent_port("COM4");

        state.remove_recent_port("COM4");
        assert_eq!(state.recent_ports.len(), 1);
        assert!(state.last_port.is_none());
    }

    #[test]
    fn test_app_state_serialization() {
        let mut state = AppState::default();
        state.add_recent_port("/dev/cu.usbserial-0001");

        let json = serde_json::to_string_pretty(&state).unwrap();
        let parsed: AppState = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.recent_ports.len(), 1);
        assert_eq!(parsed.last_port.as_deref(), Some("/dev/cu.usbserial-0001"));
    }
}
