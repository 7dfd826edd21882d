//! # Symbology
//!
//! What the optical code can hold, and the seam to whatever renders it.
//!
//! The codec never enforces a length limit. Label generation checks the
//! payload against the target symbology before handing it to a
//! [`CodeImageProducer`].
//!
//! ## QR Byte-Mode Capacity (version 40)
//! ```text
//! ┌──────────┬──────────────┬───────────┐
//! │ EC level │ recovery     │ max bytes │
//! ├──────────┼──────────────┼───────────┤
//! │ L        │ ~7%          │ 2953      │
//! │ M        │ ~15%         │ 2331      │
//! │ Q        │ ~25%         │ 1663      │
//! │ H        │ ~30%         │ 1273      │
//! └──────────┴──────────────┴───────────┘
//! ```
//! Payloads use lower-case letters, so they always land in byte mode.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::codec::Payload;
use crate::error::{CoreError, CoreResult};

/// QR error correction level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EcLevel {
    /// Low. Used by the deployed label sheets.
    #[default]
    L,
    /// Medium.
    M,
    /// Quartile.
    Q,
    /// High.
    H,
}

impl EcLevel {
    /// Byte-mode capacity at the largest symbol version.
    pub const fn max_bytes(&self) -> usize {
        match self {
            EcLevel::L => 2953,
            EcLevel::M => 2331,
            EcLevel::Q => 1663,
            EcLevel::H => 1273,
        }
    }
}

impl std::str::FromStr for EcLevel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "L" => Ok(EcLevel::L),
            "M" => Ok(EcLevel::M),
            "Q" => Ok(EcLevel::Q),
            "H" => Ok(EcLevel::H),
            other => Err(CoreError::Validation(
                crate::error::ValidationError::InvalidFormat {
                    field: "ec_level".to_string(),
                    reason: format!("unknown level '{other}', expected L, M, Q or H"),
                },
            )),
        }
    }
}

/// An optical code family a payload can be embedded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "ec_level", rename_all = "snake_case")]
pub enum Symbology {
    /// QR code at the given error correction level.
    Qr(EcLevel),
}

impl Default for Symbology {
    fn default() -> Self {
        Symbology::Qr(EcLevel::default())
    }
}

impl Symbology {
    /// Maximum payload length in bytes.
    pub const fn capacity(&self) -> usize {
        match self {
            Symbology::Qr(level) => level.max_bytes(),
        }
    }

    /// Whether the payload fits.
    pub fn fits(&self, payload: &Payload) -> bool {
        payload.len() <= self.capacity()
    }

    /// Checks that the payload fits, with a descriptive error when it does not.
    ///
    /// ## Example
    /// ```rust
    /// use stocktag_core::{PayloadCodec, ProductRecord, Symbology};
    ///
    /// let payload = PayloadCodec::encode(&ProductRecord::new("a", "b", "c")).unwrap();
    /// assert!(Symbology::default().check(&payload).is_ok());
    /// ```
    pub fn check(&self, payload: &Payload) -> CoreResult<()> {
        if self.fits(payload) {
            Ok(())
        } else {
            Err(CoreError::CapacityExceeded {
                symbology: self.to_string(),
                len: payload.len(),
                capacity: self.capacity(),
            })
        }
    }
}

impl fmt::Display for Symbology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbology::Qr(level) => write!(f, "QR/{:?}", level),
        }
    }
}

// =============================================================================
// Code Image Producer
// =============================================================================

/// Renders a payload into a printable image.
///
/// Implemented outside this crate (a QR rendering library, a print service).
/// Callers should run [`Symbology::check`] first; implementations may assume
/// the payload fits.
pub trait CodeImageProducer {
    /// Rendered image type (PNG bytes, raster buffer, SVG text, ...).
    type Image;
    /// Rendering failure.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Renders `payload` as `symbology`.
    fn produce(&self, payload: &Payload, symbology: Symbology) -> Result<Self::Image, Self::Error>;
}
