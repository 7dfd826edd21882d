//! # Scan Error Types
//!
//! Error types for camera access and scan sessions.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Scan Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │     Device      │  │       Session           │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Unavailable    │  │  Abandoned              │ │
//! │  │  ConfigLoad     │  │  Lost           │  │  RejectLimitReached     │ │
//! │  │  ConfigSave     │  │                 │  │  TimedOut               │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  NOT errors (handled inside a session):                                │
//! │  • no frame ready            → try again next tick                     │
//! │  • no code in frame          → try again next tick                     │
//! │  • MalformedPayloadError     → counted, logged, try again next tick    │
//! │  • Cancelled                 → a ScanOutcome, not a failure            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Result type alias for scan operations.
pub type ScanResult<T> = Result<T, ScanError>;

// =============================================================================
// Device Error
// =============================================================================

/// Failures reported by a [`FrameSource`](crate::frame::FrameSource) or
/// [`CameraDevice`](crate::frame::CameraDevice).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    /// The camera could not be opened (missing, busy, permission denied).
    #[error("Camera unavailable: {0}")]
    Unavailable(String),

    /// The camera stopped delivering frames mid-session (unplugged, revoked).
    #[error("Camera lost: {0}")]
    Lost(String),
}

// =============================================================================
// Scan Error
// =============================================================================

/// Terminal scan failures and configuration errors.
///
/// Session failures are carried inside `ScanState::Failed`, so the type is
/// `Clone` and comparable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid scan configuration.
    #[error("Invalid scan configuration: {0}")]
    InvalidConfig(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Device Errors
    // =========================================================================
    /// The camera could not be opened, or was lost mid-session.
    #[error("Device unavailable: {0}")]
    DeviceUnavailable(#[from] DeviceError),

    // =========================================================================
    // Session Errors
    // =========================================================================
    /// The caller abandoned the session.
    #[error("Scan abandoned")]
    Abandoned,

    /// Too many codes were seen that did not decode as product payloads.
    #[error("Gave up after {0} unreadable payloads")]
    RejectLimitReached(u32),

    /// No product was read within the configured time.
    #[error("No product read within {0} ms")]
    TimedOut(u64),

    // =========================================================================
    // Internal Errors
    // =========================================================================
    /// Internal driver error (task panicked, channel closed).
    #[error("Internal error: {0}")]
    Internal(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<std::io::Error> for ScanError {
    fn from(err: std::io::Error) -> Self {
        ScanError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for ScanError {
    fn from(err: toml::de::Error) -> Self {
        ScanError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for ScanError {
    fn from(err: toml::ser::Error) -> Self {
        ScanError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl ScanError {
    /// Returns true if starting a new session may succeed.
    ///
    /// ## Retryable Errors
    /// - Device unavailable or lost (user plugs the camera back in)
    /// - Time or reject limits (user repositions the label)
    ///
    /// ## Non-Retryable Errors
    /// - Configuration errors
    /// - Explicit abandon
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ScanError::DeviceUnavailable(_)
                | ScanError::RejectLimitReached(_)
                | ScanError::TimedOut(_)
        )
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ScanError::InvalidConfig(_)
                | ScanError::ConfigLoadFailed(_)
                | ScanError::ConfigSaveFailed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(ScanError::DeviceUnavailable(DeviceError::Lost("unplugged".into())).is_retryable());
        assert!(ScanError::TimedOut(30_000).is_retryable());
        assert!(ScanError::RejectLimitReached(5).is_retryable());

        assert!(!ScanError::Abandoned.is_retryable());
        assert!(!ScanError::InvalidConfig("interval_ms".into()).is_retryable());
    }

    #[test]
    fn test_config_errors() {
        assert!(ScanError::ConfigLoadFailed("x".into()).is_config_error());
        assert!(!ScanError::Abandoned.is_config_error());
    }

    #[test]
    fn test_device_error_converts() {
        let err: ScanError = DeviceError::Unavailable("no camera".into()).into();
        assert_eq!(err.to_string(), "Device unavailable: Camera unavailable: no camera");
    }
}
