//! # stocktag-core: Product Identity Payloads
//!
//! This crate turns a product record into the text printed inside an optical
//! code, and back. It contains no I/O; the camera side lives in
//! `stocktag-scan`.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        stocktag Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    stocktag-cli                                 │   │
//! │  │    encode ──► tag ──► capacity          decode ◄── scan         │   │
//! │  └──────────────┬─────────────────────────────────────┬────────────┘   │
//! │                 │                                     │                 │
//! │  ┌──────────────▼──────────────────────┐  ┌───────────▼─────────────┐   │
//! │  │     ★ stocktag-core (THIS CRATE) ★  │◄─┤     stocktag-scan       │   │
//! │  │                                     │  │  camera ─► frame ─►     │   │
//! │  │  ┌────────┐ ┌───────┐ ┌───────────┐ │  │  locator ─► decode      │   │
//! │  │  │ codec  │ │ types │ │ validation│ │  │  (tokio driver)         │   │
//! │  │  │Payload │ │Product│ │  rules    │ │  └─────────────────────────┘   │
//! │  │  └────────┘ └───────┘ └───────────┘ │                                │
//! │  │  ┌────────┐ ┌───────┐ ┌───────────┐ │                                │
//! │  │  │  tag   │ │ money │ │ symbology │ │                                │
//! │  │  └────────┘ └───────┘ └───────────┘ │                                │
//! │  │                                     │                                │
//! │  │  NO I/O • NO CAMERA • PURE FUNCTIONS│                                │
//! │  └─────────────────────────────────────┘                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`codec`] - Payload encode/decode (JSON body, URL-safe base64)
//! - [`types`] - `ProductRecord` and `TaxRate`
//! - [`money`] - Integer cents for the price fields
//! - [`tag`] - Optical tag generation
//! - [`symbology`] - Capacity limits and the image producer seam
//! - [`validation`] - Field rules shared by encode and decode
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use stocktag_core::{PayloadCodec, ProductRecord, Symbology};
//!
//! let record = ProductRecord::new("m16x50", "M16X50 Akb Civata", "M16X50AKB")
//!     .with_generated_tag();
//!
//! let payload = PayloadCodec::encode(&record).unwrap();
//! assert!(Symbology::default().fits(&payload));
//!
//! let back = PayloadCodec::decode(payload.as_str()).unwrap();
//! assert_eq!(back, record);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod codec;
pub mod error;
pub mod money;
pub mod symbology;
pub mod tag;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use codec::{Payload, PayloadCodec, PayloadVariant};
pub use error::{CoreError, CoreResult, MalformedPayloadError, MalformedReason, ValidationError};
pub use money::Money;
pub use symbology::{CodeImageProducer, EcLevel, Symbology};
pub use tag::OpticalTag;
pub use types::*;
