//! Algerian mobile phone number type.

use core::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Mobile operator prefixes (Mobilis, Djezzy, Ooredoo) followed by eight digits.
static MOBILE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^0[567][0-9]{8}$").expect("mobile number pattern is a valid regex")
});

/// Errors that can occur when parsing a [`PhoneNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    /// The input is empty (after removing whitespace).
    #[error("phone number is required")]
    Empty,
    /// The input is not a 10-digit number starting with 05, 06 or 07.
    #[error("invalid phone format, must start with 05/06/07 and be 10 digits")]
    InvalidFormat,
}

/// A local-market mobile phone number.
///
/// ## Constraints
///
/// - Whitespace anywhere in the input is ignored
/// - Exactly 10 ASCII digits
/// - Starts with `05`, `06` or `07`
///
/// ## Examples
///
/// ```
/// use royshop_core::PhoneNumber;
///
/// assert!(PhoneNumber::parse("0561234567").is_ok());
/// assert!(PhoneNumber::parse("05 61 23 45 67").is_ok());
///
/// assert!(PhoneNumber::parse("0461234567").is_err()); // landline prefix
/// assert!(PhoneNumber::parse("056123456").is_err());  // too short
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Parse a `PhoneNumber`, normalising away whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`PhoneError::Empty`] for blank input and
    /// [`PhoneError::InvalidFormat`] when the digits do not match the
    /// mobile format.
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();

        if compact.is_empty() {
            return Err(PhoneError::Empty);
        }

        if !MOBILE_PATTERN.is_match(&compact) {
            return Err(PhoneError::InvalidFormat);
        }

        Ok(Self(compact))
    }

    /// Returns the normalised number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl core::str::FromStr for PhoneNumber {
    type Err = PhoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_prefixes() {
        assert!(PhoneNumber::parse("0561234567").is_ok());
        assert!(PhoneNumber::parse("0661234567").is_ok());
        assert!(PhoneNumber::parse("0771234567").is_ok());
    }

    #[test]
    fn test_parse_strips_whitespace() {
        let phone = PhoneNumber::parse(" 0561 23 45 67 ").unwrap();
        assert_eq!(phone.as_str(), "0561234567");
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(PhoneNumber::parse(""), Err(PhoneError::Empty));
        assert_eq!(PhoneNumber::parse("   "), Err(PhoneError::Empty));
    }

    #[test]
    fn test_parse_wrong_prefix() {
        assert_eq!(
            PhoneNumber::parse("0861234567"),
            Err(PhoneError::InvalidFormat)
        );
        assert_eq!(
            PhoneNumber::parse("5612345678"),
            Err(PhoneError::InvalidFormat)
        );
    }

    #[test]
    fn test_parse_wrong_length() {
        assert_eq!(
            PhoneNumber::parse("056123456"),
            Err(PhoneError::InvalidFormat)
        );
        assert_eq!(
            PhoneNumber::parse("05612345678"),
            Err(PhoneError::InvalidFormat)
        );
    }

    #[test]
    fn test_parse_rejects_non_digits() {
        assert_eq!(
            PhoneNumber::parse("05612345a7"),
            Err(PhoneError::InvalidFormat)
        );
        assert_eq!(
            PhoneNumber::parse("+213561234567"),
            Err(PhoneError::InvalidFormat)
        );
    }

    #[test]
    fn test_from_str() {
        let phone: PhoneNumber = "0661234567".parse().unwrap();
        assert_eq!(phone.to_string(), "0661234567");
    }
}
