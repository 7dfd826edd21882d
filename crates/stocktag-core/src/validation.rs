//! # Validation Module
//!
//! Record validation for stocktag.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Where Validation Runs                              │
//! │                                                                         │
//! │  Encode path                                                           │
//! │  ├── validate_record() before serialization                            │
//! │  └── ValidationError returned to the label generator                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Decode path                                                           │
//! │  ├── same field rules applied to the parsed record                     │
//! │  └── failures become MalformedReason::InvalidField                     │
//! │                                                                         │
//! │  A record that encodes always decodes                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! There are no length limits here. How long a payload may get is decided
//! by the symbology it is printed in (`Symbology::check`).
//!
//! ## Usage
//! ```rust
//! use stocktag_core::validation::{validate_code, validate_record};
//! use stocktag_core::ProductRecord;
//!
//! validate_code("M16X50AKB").unwrap();
//! validate_record(&ProductRecord::new("m16x50", "M16X50 Akb Civata", "M16X50AKB")).unwrap();
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::ProductRecord;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

fn validate_required(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a catalog identifier: must not be empty or whitespace.
pub fn validate_id(id: &str) -> ValidationResult<()> {
    validate_required("id", id)
}

/// Validates a product name.
///
/// ## Example
/// ```rust
/// use stocktag_core::validation::validate_name;
///
/// assert!(validate_name("Çelik Somun M8").is_ok());
/// assert!(validate_name("  ").is_err());
/// ```
pub fn validate_name(name: &str) -> ValidationResult<()> {
    validate_required("name", name)
}

/// Validates a catalog code: must not be empty or whitespace.
pub fn validate_code(code: &str) -> ValidationResult<()> {
    validate_required("code", code)
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates an optional amount.
///
/// ## Rules
/// - Absent is fine
/// - Zero is allowed (free items)
/// - Negative is rejected
pub fn validate_amount(field: &str, amount: Option<Money>) -> ValidationResult<()> {
    match amount {
        Some(money) if money.is_negative() => Err(ValidationError::Negative {
            field: field.to_string(),
        }),
        _ => Ok(()),
    }
}

// =============================================================================
// Record Validator
// =============================================================================

/// Validates every field of a record, stopping at the first violation.
///
/// Tax rates need no check: `TaxRate` cannot hold a negative value.
pub fn validate_record(record: &ProductRecord) -> ValidationResult<()> {
    validate_id(&record.id)?;
    validate_name(&record.name)?;
    validate_code(&record.code)?;
    validate_amount("price", record.price)?;
    validate_amount("alternate_price", record.alternate_price)?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TaxRate;

    #[test]
    fn test_validate_id() {
        assert!(validate_id("m16x50").is_ok());
        assert!(validate_id("6543a1f2e4b0c7d8e9f01234").is_ok());
        assert!(validate_id("").is_err());
        assert!(validate_id(" \t").is_err());
    }

    #[test]
    fn test_long_text_is_not_capped() {
        assert!(validate_id(&"x".repeat(500)).is_ok());
        assert!(validate_name(&"ş".repeat(1000)).is_ok());
        assert!(validate_code(&"c".repeat(65)).is_ok());
        assert!(validate_name("").is_err());
    }

    #[test]
    fn test_validate_code() {
        assert!(validate_code("M16X50AKB").is_ok());
        assert!(validate_code("   ").is_err());
    }

    #[test]
    fn test_validate_amounts() {
        assert!(validate_amount("price", None).is_ok());
        assert!(validate_amount("price", Some(Money::zero())).is_ok());
        assert_eq!(
            validate_amount("price", Some(Money::from_cents(-1))),
            Err(ValidationError::Negative {
                field: "price".to_string()
            })
        );
    }

    #[test]
    fn test_any_tax_rate_is_accepted() {
        let record = ProductRecord::new("a", "b", "c").with_pricing(
            None,
            None,
            Some(TaxRate::from_bps(15_000)),
        );
        assert!(validate_record(&record).is_ok());
    }

    #[test]
    fn test_validate_record_reports_first_violation() {
        let record = ProductRecord::new("id", "", "");
        assert_eq!(
            validate_record(&record),
            Err(ValidationError::Required {
                field: "name".to_string()
            })
        );
    }
}
