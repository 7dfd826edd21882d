//! # Money Module
//!
//! Provides the `Money` type for the price fields carried in a payload.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE WIRE FORMAT PROBLEM                                                │
//! │                                                                         │
//! │  Printed labels carry prices as JSON numbers in major units:            │
//! │    { "price": 12.5, "price2": 10.99 }                                   │
//! │                                                                         │
//! │  10.99 is not representable in binary floating point. Holding it as    │
//! │  f64 means a decode → edit → re-encode cycle can drift.                 │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    wire 10.99  ──► Money(1099) ──► wire 10.99                           │
//! │    Conversion rounds once, at the boundary, to the nearest cent        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use stocktag_core::money::Money;
//!
//! let price = Money::from_cents(1099);
//! assert_eq!(price.to_string(), "10.99");
//!
//! let number = price.to_wire_number();
//! assert_eq!(Money::from_wire_number(&number), Some(price));
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Number;
use std::fmt;
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents, kuruş, ...).
///
/// Payload amounts are non-negative, but the type itself is signed so that
/// a negative wire value can be represented long enough to be rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use stocktag_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    // =========================================================================
    // Wire Conversion
    // =========================================================================

    /// Converts to the JSON number written into a payload (major units).
    ///
    /// Whole amounts are written as integers (`12`), everything else as the
    /// shortest decimal that round-trips (`10.99`). The output depends only
    /// on the value, which keeps encoding deterministic.
    pub fn to_wire_number(&self) -> Number {
        if self.0 % 100 == 0 {
            Number::from(self.0 / 100)
        } else {
            // Non-finite is impossible here: i64 / 100 is always finite.
            Number::from_f64(self.0 as f64 / 100.0).unwrap_or_else(|| Number::from(0))
        }
    }

    /// Reads a JSON number in major units, rounding to the nearest cent.
    ///
    /// Returns `None` for values that do not fit in cents.
    ///
    /// ## Example
    /// ```rust
    /// use stocktag_core::money::Money;
    /// use serde_json::Number;
    ///
    /// let n = Number::from_f64(10.99).unwrap();
    /// assert_eq!(Money::from_wire_number(&n), Some(Money::from_cents(1099)));
    /// ```
    pub fn from_wire_number(number: &Number) -> Option<Self> {
        if let Some(whole) = number.as_i64() {
            return whole.checked_mul(100).map(Money);
        }

        let value = number.as_f64()?;
        if !value.is_finite() {
            return None;
        }

        let cents = (value * 100.0).round();
        if cents < i64::MIN as f64 || cents > i64::MAX as f64 {
            return None;
        }

        Some(Money(cents as i64))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Shows the amount with two decimals and no currency symbol.
///
/// Currency formatting belongs to the consuming screen.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.major(), 10);
        assert_eq!(money.minor(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "10.99");
        assert_eq!(Money::from_cents(500).to_string(), "5.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn test_whole_amounts_are_written_as_integers() {
        let number = Money::from_cents(1200).to_wire_number();
        assert!(number.is_i64());
        assert_eq!(number.to_string(), "12");
    }

    #[test]
    fn test_fractional_amounts_survive_the_wire() {
        for cents in [1, 5, 10, 99, 1099, 123_456_789, 50] {
            let money = Money::from_cents(cents);
            let number = money.to_wire_number();
            assert_eq!(Money::from_wire_number(&number), Some(money), "cents={cents}");
        }
    }

    #[test]
    fn test_wire_rounds_to_nearest_cent() {
        let number = Number::from_f64(1.239).unwrap();
        assert_eq!(Money::from_wire_number(&number), Some(Money::from_cents(124)));
    }

    #[test]
    fn test_wire_rejects_overflow() {
        assert_eq!(Money::from_wire_number(&Number::from(i64::MAX)), None);
        let huge = Number::from_f64(1e300).unwrap();
        assert_eq!(Money::from_wire_number(&huge), None);
    }

    #[test]
    fn test_zero_and_checks() {
        assert!(Money::zero().is_zero());
        assert!(!Money::zero().is_negative());
        assert!(Money::from_cents(-1).is_negative());
        assert_eq!(Money::default(), Money::zero());
    }
}
