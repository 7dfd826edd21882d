//! # Domain Types
//!
//! Core domain types used throughout stocktag.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────────┐   ┌─────────────────┐   ┌─────────────────┐   │
//! │  │   ProductRecord     │   │     Money       │   │    TaxRate      │   │
//! │  │  ─────────────────  │   │  ─────────────  │   │  ─────────────  │   │
//! │  │  id (catalog)       │   │  cents (i64)    │   │  bps (u32)      │   │
//! │  │  name (Unicode)     │   │  1099 = 10.99   │   │  1800 = 18%     │   │
//! │  │  code (catalog)     │   └─────────────────┘   └─────────────────┘   │
//! │  │  optical_tag?       │                                               │
//! │  │  price?, alt price? │                                               │
//! │  │  tax_rate?          │                                               │
//! │  └─────────────────────┘                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! `id` and `code` are assigned by the external product catalog and are never
//! regenerated here. `optical_tag` is the identifier physically printed on the
//! label; a record without one has no physical tag yet.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::tag::OpticalTag;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 1800 bps = 18% (e.g., Turkish KDV)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a percentage, rounding to the nearest basis point.
    ///
    /// Returns `None` for negative, non-finite, or out-of-range percentages.
    pub fn from_percentage(pct: f64) -> Option<Self> {
        if !pct.is_finite() || pct < 0.0 {
            return None;
        }
        let bps = (pct * 100.0).round();
        if bps > u32::MAX as f64 {
            return None;
        }
        Some(TaxRate(bps as u32))
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    /// Checks if tax rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Converts to the JSON number written into a payload (percent).
    pub fn to_wire_number(&self) -> serde_json::Number {
        if self.0 % 100 == 0 {
            serde_json::Number::from(self.0 / 100)
        } else {
            serde_json::Number::from_f64(self.percentage())
                .unwrap_or_else(|| serde_json::Number::from(0))
        }
    }

    /// Reads a JSON percentage number.
    pub fn from_wire_number(number: &serde_json::Number) -> Option<Self> {
        number.as_f64().and_then(TaxRate::from_percentage)
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// Product Record
// =============================================================================

/// A sellable item, as identified by its printed optical code.
///
/// Numeric fields are optional. Absent values stay `None`; use the
/// `*_or_zero` accessors where a number is needed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProductRecord {
    /// Stable catalog identifier.
    pub id: String,

    /// Display name. Any Unicode text.
    pub name: String,

    /// Short catalog code, unique within the catalog.
    pub code: String,

    /// Identifier physically printed on the label, if one was assigned.
    pub optical_tag: Option<String>,

    /// Primary sale price.
    pub price: Option<Money>,

    /// Secondary price (wholesale, card, ...).
    pub alternate_price: Option<Money>,

    /// Tax rate applied to the price.
    pub tax_rate: Option<TaxRate>,
}

impl ProductRecord {
    /// Creates a record with the three mandatory identity fields.
    ///
    /// ## Example
    /// ```rust
    /// use stocktag_core::ProductRecord;
    ///
    /// let record = ProductRecord::new("m16x50", "M16X50 Akb Civata", "M16X50AKB");
    /// assert!(!record.has_optical_tag());
    /// ```
    pub fn new(id: impl Into<String>, name: impl Into<String>, code: impl Into<String>) -> Self {
        ProductRecord {
            id: id.into(),
            name: name.into(),
            code: code.into(),
            optical_tag: None,
            price: None,
            alternate_price: None,
            tax_rate: None,
        }
    }

    /// Attaches an optical tag.
    pub fn with_optical_tag(mut self, tag: impl Into<String>) -> Self {
        self.optical_tag = Some(tag.into());
        self
    }

    /// Attaches a freshly generated optical tag, replacing any existing one.
    pub fn with_generated_tag(self) -> Self {
        self.with_optical_tag(OpticalTag::generate())
    }

    /// Sets the pricing fields.
    pub fn with_pricing(
        mut self,
        price: Option<Money>,
        alternate_price: Option<Money>,
        tax_rate: Option<TaxRate>,
    ) -> Self {
        self.price = price;
        self.alternate_price = alternate_price;
        self.tax_rate = tax_rate;
        self
    }

    /// Whether the product already has a physical tag.
    #[inline]
    pub fn has_optical_tag(&self) -> bool {
        self.optical_tag.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Returns the price, defaulting to zero when absent.
    #[inline]
    pub fn price_or_zero(&self) -> Money {
        self.price.unwrap_or_default()
    }

    /// Returns the alternate price, defaulting to zero when absent.
    #[inline]
    pub fn alternate_price_or_zero(&self) -> Money {
        self.alternate_price.unwrap_or_default()
    }

    /// Returns the tax rate, defaulting to zero when absent.
    #[inline]
    pub fn tax_rate_or_zero(&self) -> TaxRate {
        self.tax_rate.unwrap_or_default()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tax_rate_from_bps() {
        let rate = TaxRate::from_bps(825);
        assert_eq!(rate.bps(), 825);
        assert!((rate.percentage() - 8.25).abs() < 0.001);
    }

    #[test]
    fn test_tax_rate_from_percentage() {
        assert_eq!(TaxRate::from_percentage(8.25), Some(TaxRate::from_bps(825)));
        assert_eq!(TaxRate::from_percentage(18.0), Some(TaxRate::from_bps(1800)));
        assert_eq!(TaxRate::from_percentage(-1.0), None);
        assert_eq!(TaxRate::from_percentage(f64::NAN), None);
    }

    #[test]
    fn test_tax_rate_wire_number() {
        assert_eq!(TaxRate::from_bps(1800).to_wire_number().to_string(), "18");
        let fractional = TaxRate::from_bps(825).to_wire_number();
        assert_eq!(TaxRate::from_wire_number(&fractional), Some(TaxRate::from_bps(825)));
    }

    #[test]
    fn test_numeric_fields_default_to_zero() {
        let record = ProductRecord::new("a", "b", "c");
        assert!(record.price_or_zero().is_zero());
        assert!(record.alternate_price_or_zero().is_zero());
        assert!(record.tax_rate_or_zero().is_zero());
        assert_eq!(record.price, None);
    }

    #[test]
    fn test_optical_tag_presence() {
        let record = ProductRecord::new("a", "b", "c");
        assert!(!record.has_optical_tag());
        assert!(!record.clone().with_optical_tag("").has_optical_tag());
        assert!(record.with_generated_tag().has_optical_tag());
    }
}
