//! # Optical Tags
//!
//! Generation of the short identifier printed on a product label.
//!
//! ## Format
//! ```text
//!   B C 7 K 2 Q 9 X 0 A M
//!   └─┘ └───────────────┘
//!   prefix   9 × [0-9A-Z]  (base 36, ~46 bits)
//! ```
//!
//! Tags are assigned once, when a product first gets a label, and are then
//! stored by the external catalog alongside the record.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};

/// Prefix shared by every generated tag.
pub const TAG_PREFIX: &str = "BC";

/// Number of random base-36 characters after the prefix.
pub const TAG_RANDOM_CHARS: usize = 9;

const BASE36: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// A generated optical tag, e.g. `BC7K2Q9X0AM`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OpticalTag(String);

impl OpticalTag {
    /// Generates a fresh random tag.
    ///
    /// Randomness comes from a v4 UUID; 122 random bits comfortably cover
    /// the 9 base-36 digits.
    ///
    /// ## Example
    /// ```rust
    /// use stocktag_core::tag::OpticalTag;
    ///
    /// let tag = OpticalTag::generate();
    /// assert!(tag.as_str().starts_with("BC"));
    /// assert_eq!(tag.as_str().len(), 11);
    /// ```
    pub fn generate() -> Self {
        let mut entropy = Uuid::new_v4().as_u128();
        let mut tag = String::with_capacity(TAG_PREFIX.len() + TAG_RANDOM_CHARS);
        tag.push_str(TAG_PREFIX);

        for _ in 0..TAG_RANDOM_CHARS {
            tag.push(BASE36[(entropy % 36) as usize] as char);
            entropy /= 36;
        }

        OpticalTag(tag)
    }

    /// Parses text that should be a generated tag.
    pub fn parse(text: &str) -> CoreResult<Self> {
        if Self::is_generated_format(text) {
            Ok(OpticalTag(text.to_string()))
        } else {
            Err(CoreError::InvalidTag(text.to_string()))
        }
    }

    /// Whether `text` has the shape of a generated tag.
    ///
    /// Catalogs may also hold hand-entered tags in other shapes; those are
    /// still valid `ProductRecord::optical_tag` values.
    pub fn is_generated_format(text: &str) -> bool {
        match text.strip_prefix(TAG_PREFIX) {
            Some(rest) => {
                rest.len() == TAG_RANDOM_CHARS
                    && rest
                        .bytes()
                        .all(|b| b.is_ascii_digit() || b.is_ascii_uppercase())
            }
            None => false,
        }
    }

    /// Returns the tag text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OpticalTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<OpticalTag> for String {
    fn from(tag: OpticalTag) -> Self {
        tag.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generated_tags_have_expected_shape() {
        for _ in 0..100 {
            let tag = OpticalTag::generate();
            assert!(OpticalTag::is_generated_format(tag.as_str()), "{tag}");
        }
    }

    #[test]
    fn test_generated_tags_do_not_repeat() {
        let tags: HashSet<_> = (0..1000).map(|_| OpticalTag::generate()).collect();
        assert_eq!(tags.len(), 1000);
    }

    #[test]
    fn test_parse() {
        assert!(OpticalTag::parse("BC7K2Q9X0AM").is_ok());
        assert!(OpticalTag::parse("bc7k2q9x0am").is_err());
        assert!(OpticalTag::parse("BC7K2").is_err());
        assert!(OpticalTag::parse("XX7K2Q9X0AM").is_err());
        assert!(matches!(
            OpticalTag::parse("nope"),
            Err(CoreError::InvalidTag(t)) if t == "nope"
        ));
    }
}
