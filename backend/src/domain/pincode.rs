//! Indian postal index number (PIN code) value type.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Number of digits in a pincode.
pub const PINCODE_LENGTH: usize = 6;

/// Validation errors raised when parsing a [`Pincode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PincodeValidationError {
    #[error("pincode must not be empty")]
    Empty,
    #[error("pincode must contain exactly {PINCODE_LENGTH} digits, got {length}")]
    WrongLength { length: usize },
    #[error("pincode must contain only ASCII digits")]
    NonDigit,
}

/// A six-digit pincode.
///
/// Surrounding whitespace is trimmed before validation; anything other than
/// exactly six ASCII digits is rejected.
///
/// # Examples
/// ```
/// use delivery_zones::domain::Pincode;
///
/// let pincode = Pincode::parse(" 632001 ").expect("valid pincode");
/// assert_eq!(pincode.as_str(), "632001");
/// assert!(Pincode::parse("63200").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pincode(String);

impl Pincode {
    pub fn parse(raw: &str) -> Result<Self, PincodeValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(PincodeValidationError::Empty);
        }
        if !trimmed.bytes().all(|byte| byte.is_ascii_digit()) {
            return Err(PincodeValidationError::NonDigit);
        }
        // All bytes are ASCII here, so the byte length equals the digit count.
        if trimmed.len() != PINCODE_LENGTH {
            return Err(PincodeValidationError::WrongLength {
                length: trimmed.len(),
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Pincode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Pincode {
    type Err = PincodeValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Pincode {
    type Error = PincodeValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Pincode> for String {
    fn from(value: Pincode) -> Self {
        value.0
    }
}
