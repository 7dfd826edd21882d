//! # Error Types
//!
//! Domain-specific error types for stocktag-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  stocktag-core errors (this file)                                       │
//! │  ├── CoreError              - General domain errors                     │
//! │  ├── ValidationError        - Record rejected before encoding           │
//! │  └── MalformedPayloadError  - Payload rejected while decoding           │
//! │      └── MalformedReason    - Which decode stage failed                 │
//! │                                                                         │
//! │  stocktag-scan errors (separate crate)                                  │
//! │  ├── DeviceError            - Camera open/read failures                 │
//! │  └── ScanError              - Terminal session failures                 │
//! │                                                                         │
//! │  Flow: MalformedPayloadError ──► swallowed inside a scan cycle          │
//! │                              └─► returned to direct callers             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (field, length, capacity)
//! 3. Errors are enum variants, never String
//! 4. Decoding only ever fails with `MalformedPayloadError`

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core domain errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A payload is longer than the target symbology can hold.
    ///
    /// ## When This Occurs
    /// - Very long product names encoded with the full (pricing) variant
    /// - A high error-correction level was chosen for a long payload
    #[error("Payload of {len} bytes exceeds {symbology} capacity of {capacity} bytes")]
    CapacityExceeded {
        symbology: String,
        len: usize,
        capacity: usize,
    },

    /// Text does not match the generated optical tag format.
    #[error("Invalid optical tag '{0}'")]
    InvalidTag(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Decode error (wraps MalformedPayloadError).
    #[error(transparent)]
    Malformed(#[from] MalformedPayloadError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Record validation errors.
///
/// Raised by `PayloadCodec::encode` before anything is serialized, and reused
/// while decoding to check the parsed record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Invalid format.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Malformed Payload
// =============================================================================

/// A payload that could not be turned back into a product record.
///
/// ## Recovery
/// ```text
/// Inside a scan session:   logged at debug, scanning continues
/// Direct decode call:      returned to the caller as-is
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Malformed payload: {reason}")]
pub struct MalformedPayloadError {
    reason: MalformedReason,
}

impl MalformedPayloadError {
    /// Creates an error for the given reason.
    pub fn new(reason: MalformedReason) -> Self {
        MalformedPayloadError { reason }
    }

    /// Returns the decode stage that failed.
    pub fn reason(&self) -> &MalformedReason {
        &self.reason
    }
}

impl From<MalformedReason> for MalformedPayloadError {
    fn from(reason: MalformedReason) -> Self {
        MalformedPayloadError::new(reason)
    }
}

/// Why a payload failed to decode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedReason {
    /// Payload was empty (or only whitespace).
    #[error("payload is empty")]
    Empty,

    /// A character outside the accepted alphabet.
    #[error("invalid character {character:?} at position {position}")]
    InvalidAlphabet { character: char, position: usize },

    /// Base64 decoding failed.
    #[error("base64 decoding failed: {0}")]
    Base64(String),

    /// Decoded bytes are not UTF-8.
    #[error("decoded bytes are not valid UTF-8: {0}")]
    Utf8(String),

    /// Decoded text is not a well-formed record object.
    #[error("not a product record: {0}")]
    Structure(String),

    /// A mandatory key is absent or null.
    #[error("missing mandatory key '{0}'")]
    MissingField(&'static str),

    /// A key is present but its value is unacceptable.
    #[error("invalid value for '{field}': {reason}")]
    InvalidField { field: &'static str, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "code".to_string(),
        };
        assert_eq!(err.to_string(), "code is required");

        let err = ValidationError::Negative {
            field: "price".to_string(),
        };
        assert_eq!(err.to_string(), "price must not be negative");
    }

    #[test]
    fn test_malformed_messages() {
        let err = MalformedPayloadError::new(MalformedReason::MissingField("_id"));
        assert_eq!(err.to_string(), "Malformed payload: missing mandatory key '_id'");
        assert_eq!(err.reason(), &MalformedReason::MissingField("_id"));
    }

    #[test]
    fn test_capacity_message() {
        let err = CoreError::CapacityExceeded {
            symbology: "QR/L".into(),
            len: 3000,
            capacity: 2953,
        };
        assert_eq!(
            err.to_string(),
            "Payload of 3000 bytes exceeds QR/L capacity of 2953 bytes"
        );
    }

    #[test]
    fn test_conversions_into_core_error() {
        let core: CoreError = ValidationError::Required {
            field: "id".to_string(),
        }
        .into();
        assert!(matches!(core, CoreError::Validation(_)));

        let core: CoreError = MalformedPayloadError::from(MalformedReason::Empty).into();
        assert!(matches!(core, CoreError::Malformed(_)));
    }
}
