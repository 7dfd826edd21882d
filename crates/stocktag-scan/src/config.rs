//! # Scan Configuration
//!
//! Configuration management for scan sessions and label generation.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     STOCKTAG_SCAN_INTERVAL_MS=250                                      │
//! │     STOCKTAG_MAX_REJECTED=20                                           │
//! │     STOCKTAG_SCAN_TIMEOUT_SECS=60                                      │
//! │     STOCKTAG_ACCEPT_LEGACY=false                                       │
//! │     STOCKTAG_EC_LEVEL=M                                                │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/stocktag/scan.toml (Linux)                               │
//! │     ~/Library/Application Support/com.stocktag.stocktag/scan.toml      │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     500 ms cadence, no limits, legacy labels accepted                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # scan.toml
//! [scan]
//! interval_ms = 500          # sampling cadence
//! decode_timeout_ms = 2000   # a slower decode job is logged as slow
//! max_rejected = 0           # unreadable payloads before failing, 0 = unlimited
//! timeout_secs = 0           # session time limit, 0 = unlimited
//! accept_legacy_labels = true
//!
//! [label]
//! ec_level = "L"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use stocktag_core::{EcLevel, Symbology};

use crate::error::{ScanError, ScanResult};
use crate::session::ScanPolicy;

/// Shortest accepted sampling interval.
pub const MIN_INTERVAL_MS: u64 = 10;

// =============================================================================
// Scan Settings
// =============================================================================

/// Scan loop behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSettings {
    /// Time between sampling ticks (milliseconds).
    #[serde(default = "default_interval")]
    pub interval_ms: u64,

    /// Time budget for one locate+decode job (milliseconds). A job running
    /// longer is logged and counted; the next job still waits for it.
    #[serde(default = "default_decode_timeout")]
    pub decode_timeout_ms: u64,

    /// Unreadable payloads tolerated before the session fails.
    /// Set to 0 for no limit.
    #[serde(default)]
    pub max_rejected: u32,

    /// Session time limit (seconds).
    /// Set to 0 for no limit.
    #[serde(default)]
    pub timeout_secs: u64,

    /// Also accept labels printed with the standard base64 alphabet.
    #[serde(default = "default_true")]
    pub accept_legacy_labels: bool,
}

fn default_interval() -> u64 {
    500
}

fn default_decode_timeout() -> u64 {
    2000
}

fn default_true() -> bool {
    true
}

impl Default for ScanSettings {
    fn default() -> Self {
        ScanSettings {
            interval_ms: default_interval(),
            decode_timeout_ms: default_decode_timeout(),
            max_rejected: 0,
            timeout_secs: 0,
            accept_legacy_labels: true,
        }
    }
}

// =============================================================================
// Label Settings
// =============================================================================

/// Label generation settings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LabelSettings {
    /// QR error correction level for printed labels.
    #[serde(default)]
    pub ec_level: EcLevel,
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete stocktag configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Scan loop settings.
    #[serde(default)]
    pub scan: ScanSettings,

    /// Label generation settings.
    #[serde(default)]
    pub label: LabelSettings,
}

impl ScanConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (scan.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ScanResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading scan config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load scan config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> ScanResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ScanError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ScanError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| ScanError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Scan config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ScanResult<()> {
        if self.scan.interval_ms < MIN_INTERVAL_MS {
            return Err(ScanError::InvalidConfig(format!(
                "interval_ms must be at least {}, got {}",
                MIN_INTERVAL_MS, self.scan.interval_ms
            )));
        }

        if self.scan.decode_timeout_ms == 0 {
            return Err(ScanError::InvalidConfig(
                "decode_timeout_ms must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from any key lookup. Unparseable values are logged
    /// and ignored.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(value) = lookup("STOCKTAG_SCAN_INTERVAL_MS") {
            match value.parse::<u64>() {
                Ok(ms) => {
                    debug!(interval_ms = ms, "Overriding scan interval from environment");
                    self.scan.interval_ms = ms;
                }
                Err(_) => warn!(value = %value, "Invalid STOCKTAG_SCAN_INTERVAL_MS"),
            }
        }

        if let Some(value) = lookup("STOCKTAG_MAX_REJECTED") {
            match value.parse::<u32>() {
                Ok(n) => self.scan.max_rejected = n,
                Err(_) => warn!(value = %value, "Invalid STOCKTAG_MAX_REJECTED"),
            }
        }

        if let Some(value) = lookup("STOCKTAG_SCAN_TIMEOUT_SECS") {
            match value.parse::<u64>() {
                Ok(secs) => self.scan.timeout_secs = secs,
                Err(_) => warn!(value = %value, "Invalid STOCKTAG_SCAN_TIMEOUT_SECS"),
            }
        }

        if let Some(value) = lookup("STOCKTAG_ACCEPT_LEGACY") {
            match value.to_lowercase().as_str() {
                "1" | "true" | "yes" => self.scan.accept_legacy_labels = true,
                "0" | "false" | "no" => self.scan.accept_legacy_labels = false,
                _ => warn!(value = %value, "Invalid STOCKTAG_ACCEPT_LEGACY"),
            }
        }

        if let Some(value) = lookup("STOCKTAG_EC_LEVEL") {
            match value.parse::<EcLevel>() {
                Ok(level) => self.label.ec_level = level,
                Err(_) => warn!(value = %value, "Invalid STOCKTAG_EC_LEVEL"),
            }
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "stocktag", "stocktag")
            .map(|dirs| dirs.config_dir().join("scan.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Sampling interval.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.scan.interval_ms)
    }

    /// Per-job decode timeout.
    pub fn decode_timeout(&self) -> Duration {
        Duration::from_millis(self.scan.decode_timeout_ms)
    }

    /// Session limits derived from the settings.
    pub fn policy(&self) -> ScanPolicy {
        ScanPolicy {
            accept_legacy_labels: self.scan.accept_legacy_labels,
            max_rejected: (self.scan.max_rejected > 0).then_some(self.scan.max_rejected),
            timeout: (self.scan.timeout_secs > 0)
                .then(|| Duration::from_secs(self.scan.timeout_secs)),
        }
    }

    /// Symbology used for printed labels.
    pub fn symbology(&self) -> Symbology {
        Symbology::Qr(self.label.ec_level)
    }
}
