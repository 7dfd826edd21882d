//! # Payload Codec
//!
//! Turns a [`ProductRecord`] into the text embedded in an optical code, and
//! back.
//!
//! ## Encoding Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Payload Encoding                                │
//! │                                                                         │
//! │  ProductRecord                                                          │
//! │       │  validate_record()                                              │
//! │       ▼                                                                 │
//! │  field subset (Label | Full)                                            │
//! │       │  serde_json                                                     │
//! │       ▼                                                                 │
//! │  {"_id":"m16x50","name":"M16X50 Akb Civata","code":"M16X50AKB",...}     │
//! │       │  UTF-8 bytes                                                    │
//! │       ▼                                                                 │
//! │  base64, URL-safe alphabet ('+'→'-', '/'→'_'), no '=' padding          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Payload  "eyJfaWQiOiJtMTZ4NTAiLC..."                                   │
//! │                                                                         │
//! │  Decoding runs the same pipeline backwards. Every failure on the way   │
//! │  back is a MalformedPayloadError, never anything else.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Keys
//! | Record field      | Key         | Variant      |
//! |-------------------|-------------|--------------|
//! | `id`              | `_id`       | Label, Full  |
//! | `name`            | `name`      | Label, Full  |
//! | `code`            | `code`      | Label, Full  |
//! | `optical_tag`     | `barcode`   | Label, Full  |
//! | `price`           | `price`     | Full         |
//! | `alternate_price` | `price2`    | Full         |
//! | `tax_rate`        | `KDV_ORANI` | Full         |
//!
//! The keys match labels already printed in the field, so those keep
//! scanning.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::Number;
use std::fmt;

use crate::error::{MalformedPayloadError, MalformedReason, ValidationError};
use crate::money::Money;
use crate::types::{ProductRecord, TaxRate};
use crate::validation::{self, ValidationResult};

type DecodeResult<T> = Result<T, MalformedPayloadError>;

// =============================================================================
// Payload
// =============================================================================

/// Opaque URL-safe text produced by [`PayloadCodec`].
///
/// Only the codec constructs payloads, so every `Payload` value is known to
/// use the alphabet `[A-Za-z0-9_-]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Payload(String);

impl Payload {
    /// Returns the payload text.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in bytes (equal to characters, the alphabet is ASCII).
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false for codec output; present for API completeness.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consumes the payload, returning its text.
    pub fn into_string(self) -> String {
        self.0
    }

    #[cfg(test)]
    pub(crate) fn from_trusted(text: String) -> Self {
        Payload(text)
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Payload {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// Variants
// =============================================================================

/// Which field subset is embedded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadVariant {
    /// Identity only: id, name, code, optical tag. Used for printable labels.
    #[default]
    Label,
    /// Identity plus pricing. Absent amounts are written as 0.
    Full,
}

// =============================================================================
// Wire Schema
// =============================================================================

/// Outgoing body. Field order here is the key order in the payload.
#[derive(Serialize)]
struct WireBodyRef<'a> {
    #[serde(rename = "_id")]
    id: &'a str,
    name: &'a str,
    code: &'a str,
    barcode: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    price: Option<Number>,
    #[serde(rename = "price2", skip_serializing_if = "Option::is_none")]
    alternate_price: Option<Number>,
    #[serde(rename = "KDV_ORANI", skip_serializing_if = "Option::is_none")]
    tax_rate: Option<Number>,
}

impl<'a> WireBodyRef<'a> {
    fn new(record: &'a ProductRecord, variant: PayloadVariant) -> Self {
        let full = variant == PayloadVariant::Full;
        WireBodyRef {
            id: &record.id,
            name: &record.name,
            code: &record.code,
            barcode: record.optical_tag.as_deref(),
            price: full.then(|| record.price_or_zero().to_wire_number()),
            alternate_price: full.then(|| record.alternate_price_or_zero().to_wire_number()),
            tax_rate: full.then(|| record.tax_rate_or_zero().to_wire_number()),
        }
    }
}

/// Incoming body. Mandatory keys are `Option` so that a missing key can be
/// reported by name instead of as a generic parse failure.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct WireBody {
    #[serde(rename = "_id", default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    barcode: Option<String>,
    #[serde(default)]
    price: Option<Number>,
    #[serde(rename = "price2", default)]
    alternate_price: Option<Number>,
    #[serde(rename = "KDV_ORANI", default)]
    tax_rate: Option<Number>,
}

impl WireBody {
    fn into_record(self) -> DecodeResult<ProductRecord> {
        let id = self.id.ok_or(MalformedReason::MissingField("_id"))?;
        let name = self.name.ok_or(MalformedReason::MissingField("name"))?;
        let code = self.code.ok_or(MalformedReason::MissingField("code"))?;

        field("_id", validation::validate_id(&id))?;
        field("name", validation::validate_name(&name))?;
        field("code", validation::validate_code(&code))?;

        let price = self.price.as_ref().map(|n| amount("price", n)).transpose()?;
        let alternate_price = self
            .alternate_price
            .as_ref()
            .map(|n| amount("price2", n))
            .transpose()?;
        let tax_rate = self.tax_rate.as_ref().map(rate).transpose()?;

        Ok(ProductRecord {
            id,
            name,
            code,
            optical_tag: self.barcode,
            price,
            alternate_price,
            tax_rate,
        })
    }
}

fn field(name: &'static str, result: ValidationResult<()>) -> DecodeResult<()> {
    result.map_err(|e| {
        MalformedReason::InvalidField {
            field: name,
            reason: e.to_string(),
        }
        .into()
    })
}

fn amount(name: &'static str, number: &Number) -> DecodeResult<Money> {
    let money = Money::from_wire_number(number).ok_or_else(|| MalformedReason::InvalidField {
        field: name,
        reason: format!("{number} is not a representable amount"),
    })?;
    field(name, validation::validate_amount(name, Some(money)))?;
    Ok(money)
}

fn rate(number: &Number) -> DecodeResult<TaxRate> {
    TaxRate::from_wire_number(number).ok_or_else(|| {
        MalformedReason::InvalidField {
            field: "KDV_ORANI",
            reason: format!("{number} is not a valid percentage"),
        }
        .into()
    })
}

// =============================================================================
// Payload Codec
// =============================================================================

/// Stateless encoder/decoder for product payloads.
pub struct PayloadCodec;

impl PayloadCodec {
    /// Encodes the label (identity-only) subset of a record.
    ///
    /// ## Example
    /// ```rust
    /// use stocktag_core::{PayloadCodec, ProductRecord};
    ///
    /// let record = ProductRecord::new("m16x50", "M16X50 Akb Civata", "M16X50AKB");
    /// let payload = PayloadCodec::encode(&record).unwrap();
    ///
    /// let decoded = PayloadCodec::decode(payload.as_str()).unwrap();
    /// assert_eq!(decoded, record);
    /// ```
    pub fn encode(record: &ProductRecord) -> Result<Payload, ValidationError> {
        Self::encode_variant(record, PayloadVariant::Label)
    }

    /// Encodes identity plus pricing, for archival labels.
    pub fn encode_full(record: &ProductRecord) -> Result<Payload, ValidationError> {
        Self::encode_variant(record, PayloadVariant::Full)
    }

    /// Encodes the chosen subset of a record.
    ///
    /// The output depends only on the embedded field values.
    pub fn encode_variant(
        record: &ProductRecord,
        variant: PayloadVariant,
    ) -> Result<Payload, ValidationError> {
        validation::validate_record(record)?;

        let json = serde_json::to_string(&WireBodyRef::new(record, variant)).map_err(|e| {
            ValidationError::InvalidFormat {
                field: "record".to_string(),
                reason: e.to_string(),
            }
        })?;

        Ok(Payload(URL_SAFE_NO_PAD.encode(json.as_bytes())))
    }

    /// Decodes a payload in the URL-safe alphabet.
    ///
    /// Fields absent from the payload are absent from the record; nothing is
    /// invented.
    ///
    /// ## Errors
    /// `MalformedPayloadError` for any of: empty input, a character outside
    /// `[A-Za-z0-9_-]`, bad base64, bad UTF-8, a body that is not a record
    /// object, a missing `_id`/`name`/`code`, or an unacceptable field value.
    pub fn decode(payload: &str) -> Result<ProductRecord, MalformedPayloadError> {
        if payload.is_empty() {
            return Err(MalformedReason::Empty.into());
        }

        if let Some((position, character)) = payload
            .char_indices()
            .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            return Err(MalformedReason::InvalidAlphabet {
                character,
                position,
            }
            .into());
        }

        let bytes = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|e| MalformedReason::Base64(e.to_string()))?;

        let text = String::from_utf8(bytes).map_err(|e| MalformedReason::Utf8(e.to_string()))?;

        let body: WireBody =
            serde_json::from_str(&text).map_err(|e| MalformedReason::Structure(e.to_string()))?;

        body.into_record()
    }

    /// Decodes a payload that may have been printed with the standard base64
    /// alphabet (`+`, `/`, `=` padding) or picked up surrounding whitespace.
    ///
    /// Older archival label sheets used the standard alphabet. The text is
    /// normalised to the URL-safe form and then decoded strictly.
    pub fn decode_lenient(payload: &str) -> Result<ProductRecord, MalformedPayloadError> {
        let trimmed = payload.trim().trim_end_matches('=');
        let normalised: String = trimmed
            .chars()
            .map(|c| match c {
                '+' => '-',
                '/' => '_',
                other => other,
            })
            .collect();
        Self::decode(&normalised)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;

    fn sample() -> ProductRecord {
        ProductRecord::new("m16x50", "M16X50 Akb Civata", "M16X50AKB")
    }

    fn payload_of(json: &str) -> String {
        URL_SAFE_NO_PAD.encode(json.as_bytes())
    }

    fn reason(payload: &str) -> MalformedReason {
        PayloadCodec::decode(payload)
            .expect_err("payload should be rejected")
            .reason()
            .clone()
    }

    #[test]
    fn test_reference_record_round_trips() {
        let payload = PayloadCodec::encode(&sample()).unwrap();
        let decoded = PayloadCodec::decode(payload.as_str()).unwrap();
        assert_eq!(decoded.id, "m16x50");
        assert_eq!(decoded.name, "M16X50 Akb Civata");
        assert_eq!(decoded.code, "M16X50AKB");
        assert_eq!(decoded.optical_tag, None);
    }

    #[test]
    fn test_unicode_names_round_trip() {
        let names = [
            "Çelik Somun Ğ8 İnce Şapka Ölçü Ü",
            "ボルト M16 × 50",
            "Гайка шестигранная",
            "صامولة",
            "🔩 bolt 🔩",
            "  leading and trailing spaces  ",
            "quote \" backslash \\ tab\there",
        ];
        for name in names {
            let record = ProductRecord::new("id-1", name, "CODE").with_optical_tag("BC123456789");
            let payload = PayloadCodec::encode(&record).unwrap();
            assert_eq!(PayloadCodec::decode(payload.as_str()).unwrap(), record, "{name}");
        }
    }

    #[test]
    fn test_full_variant_round_trips_pricing() {
        let record = sample().with_optical_tag("BC7K2Q9X0AM").with_pricing(
            Some(Money::from_cents(1250)),
            Some(Money::from_cents(1099)),
            Some(TaxRate::from_bps(1800)),
        );
        let payload = PayloadCodec::encode_full(&record).unwrap();
        assert_eq!(PayloadCodec::decode(payload.as_str()).unwrap(), record);
    }

    #[test]
    fn test_full_variant_defaults_absent_numbers_to_zero() {
        let payload = PayloadCodec::encode_full(&sample()).unwrap();
        let decoded = PayloadCodec::decode(payload.as_str()).unwrap();
        assert_eq!(decoded.price, Some(Money::zero()));
        assert_eq!(decoded.alternate_price, Some(Money::zero()));
        assert_eq!(decoded.tax_rate, Some(TaxRate::zero()));
    }

    #[test]
    fn test_label_variant_drops_pricing() {
        let record = sample().with_pricing(Some(Money::from_cents(500)), None, None);
        let payload = PayloadCodec::encode(&record).unwrap();
        let decoded = PayloadCodec::decode(payload.as_str()).unwrap();
        assert_eq!(decoded.price, None);
    }

    #[test]
    fn test_payload_alphabet_is_url_safe() {
        // Names chosen so that standard base64 would produce '+' and '/'.
        for name in ["???>>>~~~", "ÿÿÿ¿¿¿", "ﾟﾟﾟ", "a>b?c~d"] {
            let record = ProductRecord::new("id", name, "c");
            for payload in [
                PayloadCodec::encode(&record).unwrap(),
                PayloadCodec::encode_full(&record).unwrap(),
            ] {
                let text = payload.as_str();
                assert!(!text.contains(['+', '/', '=']), "{text}");
                assert!(text
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
            }
        }
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let a = PayloadCodec::encode_full(&sample()).unwrap();
        let b = PayloadCodec::encode_full(&sample()).unwrap();
        assert_eq!(a, b);

        let renamed = ProductRecord {
            name: "M16X50 Akb Civata 2".to_string(),
            ..sample()
        };
        assert_ne!(PayloadCodec::encode(&renamed).unwrap(), PayloadCodec::encode(&sample()).unwrap());
    }

    #[test]
    fn test_encode_rejects_missing_identity() {
        let record = ProductRecord::new("", "name", "code");
        assert_eq!(
            PayloadCodec::encode(&record),
            Err(ValidationError::Required {
                field: "id".to_string()
            })
        );

        let record = sample().with_pricing(Some(Money::from_cents(-5)), None, None);
        assert!(matches!(
            PayloadCodec::encode_full(&record),
            Err(ValidationError::Negative { .. })
        ));
    }

    #[test]
    fn test_not_base64_is_malformed() {
        assert!(matches!(
            reason("not-valid-base64!!"),
            MalformedReason::InvalidAlphabet { character: '!', position: 16 }
        ));
        assert_eq!(reason(""), MalformedReason::Empty);
        // Length 4n+1 can never be valid base64.
        assert!(matches!(reason("abcde"), MalformedReason::Base64(_)));
    }

    #[test]
    fn test_standard_alphabet_rejected_by_strict_decode() {
        // 34 bytes, so the standard encoding ends in "==".
        let payload = STANDARD.encode(br#"{"_id":"a","name":"bb","code":"c"}"#);
        assert!(payload.ends_with("=="));
        assert!(matches!(reason(&payload), MalformedReason::InvalidAlphabet { .. }));
    }

    #[test]
    fn test_invalid_utf8_is_malformed() {
        let payload = URL_SAFE_NO_PAD.encode([0xff, 0xfe, 0x7b]);
        assert!(matches!(reason(&payload), MalformedReason::Utf8(_)));
    }

    #[test]
    fn test_non_record_bodies_are_malformed() {
        for body in ["hello", "[1,2,3]", "42", "{\"_id\":", "null"] {
            assert!(
                matches!(reason(&payload_of(body)), MalformedReason::Structure(_)),
                "{body}"
            );
        }
    }

    #[test]
    fn test_missing_id_is_malformed() {
        let payload = payload_of(r#"{"name":"b","code":"c"}"#);
        assert_eq!(reason(&payload), MalformedReason::MissingField("_id"));

        let payload = payload_of(r#"{"_id":null,"name":"b","code":"c"}"#);
        assert_eq!(reason(&payload), MalformedReason::MissingField("_id"));

        let payload = payload_of(r#"{"_id":"a","code":"c"}"#);
        assert_eq!(reason(&payload), MalformedReason::MissingField("name"));
    }

    #[test]
    fn test_schema_is_explicit() {
        // Wrong type for a mandatory key.
        let payload = payload_of(r#"{"_id":7,"name":"b","code":"c"}"#);
        assert!(matches!(reason(&payload), MalformedReason::Structure(_)));

        // Unknown key.
        let payload = payload_of(r#"{"_id":"a","name":"b","code":"c","stock":4}"#);
        assert!(matches!(reason(&payload), MalformedReason::Structure(_)));

        // Empty mandatory value.
        let payload = payload_of(r#"{"_id":"a","name":"","code":"c"}"#);
        assert!(matches!(
            reason(&payload),
            MalformedReason::InvalidField { field: "name", .. }
        ));

        // Negative price.
        let payload = payload_of(r#"{"_id":"a","name":"b","code":"c","price":-1}"#);
        assert!(matches!(
            reason(&payload),
            MalformedReason::InvalidField { field: "price", .. }
        ));
    }

    #[test]
    fn test_key_order_does_not_matter() {
        let payload = payload_of(r#"{"code":"M16X50AKB","barcode":null,"name":"M16X50 Akb Civata","_id":"m16x50"}"#);
        assert_eq!(PayloadCodec::decode(&payload).unwrap(), sample());
    }

    #[test]
    fn test_archival_numbers_are_read() {
        let payload = payload_of(
            r#"{"_id":"a","name":"b","code":"c","barcode":"BC1","price":12.5,"price2":0,"KDV_ORANI":18}"#,
        );
        let record = PayloadCodec::decode(&payload).unwrap();
        assert_eq!(record.price, Some(Money::from_cents(1250)));
        assert_eq!(record.alternate_price, Some(Money::zero()));
        assert_eq!(record.tax_rate, Some(TaxRate::from_bps(1800)));
        assert_eq!(record.optical_tag.as_deref(), Some("BC1"));
    }

    #[test]
    fn test_long_fields_round_trip() {
        let record = ProductRecord::new("i".repeat(300), "x".repeat(300), "c".repeat(65))
            .with_optical_tag("t".repeat(100));
        let payload = PayloadCodec::encode(&record).unwrap();
        assert_eq!(PayloadCodec::decode(payload.as_str()).unwrap(), record);
    }

    #[test]
    fn test_tax_rate_above_hundred_percent_is_read() {
        let payload = payload_of(r#"{"_id":"a","name":"b","code":"c","KDV_ORANI":150}"#);
        let record = PayloadCodec::decode(&payload).unwrap();
        assert_eq!(record.tax_rate, Some(TaxRate::from_bps(15_000)));

        let full = PayloadCodec::encode_full(&record).unwrap();
        assert_eq!(PayloadCodec::decode(full.as_str()).unwrap(), record);
    }

    #[test]
    fn test_negative_numbers_still_rejected() {
        let payload = payload_of(r#"{"_id":"a","name":"b","code":"c","price":-1}"#);
        assert!(matches!(reason(&payload), MalformedReason::InvalidField { field: "price", .. }));

        let payload = payload_of(r#"{"_id":"a","name":"b","code":"c","KDV_ORANI":-5}"#);
        assert!(matches!(reason(&payload), MalformedReason::InvalidField { field: "KDV_ORANI", .. }));
    }

    #[test]
    fn test_lenient_decode_accepts_legacy_labels() {
        let mut json =
            r#"{"_id":"a","name":"Ölçü ÿ?>","code":"c","price":1,"price2":2,"KDV_ORANI":8}"#
                .to_string();
        // Force padding so the legacy text is outside the URL-safe alphabet.
        while json.len() % 3 != 1 {
            json.push(' ');
        }
        let legacy = STANDARD.encode(json.as_bytes());
        assert!(PayloadCodec::decode(&legacy).is_err());

        let record = PayloadCodec::decode_lenient(&format!(" {legacy}\n")).unwrap();
        assert_eq!(record.name, "Ölçü ÿ?>");

        let modern = PayloadCodec::encode(&sample()).unwrap();
        assert_eq!(PayloadCodec::decode_lenient(modern.as_str()).unwrap(), sample());
    }

    #[test]
    fn test_lenient_decode_still_rejects_garbage() {
        assert!(PayloadCodec::decode_lenient("not-valid-base64!!").is_err());
        assert!(PayloadCodec::decode_lenient("   ").is_err());
    }
}
