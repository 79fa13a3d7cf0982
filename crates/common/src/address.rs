use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Maximum number of hex digits in an account address (32 bytes)
const MAX_HEX_DIGITS: usize = 64;

/// An on-chain account address such as `0x1a2b...`
///
/// The original spelling is kept; comparisons through [`Address::matches`]
/// ignore case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Parse and validate an address
    ///
    /// Accepts `0x` followed by 1 to 64 hex digits.
    pub fn parse(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| Error::InvalidAddress(s.to_string()))?;

        if digits.is_empty()
            || digits.len() > MAX_HEX_DIGITS
            || !digits.chars().all(|c| c.is_ascii_hexdigit())
        {
            return Err(Error::InvalidAddress(s.to_string()));
        }

        Ok(Self(trimmed.to_string()))
    }

    /// Whether a string passes address validation
    pub fn is_valid(s: &str) -> bool {
        Self::parse(s).is_ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison against another spelling
    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other.trim())
    }

    /// Shortened form for logs and notifications, e.g. `0x19d3...021b`
    pub fn short(&self) -> String {
        shorten(&self.0)
    }
}

/// Shorten any address-like string to its first 6 and last 4 characters
pub fn shorten(s: &str) -> String {
    if s.len() <= 10 || !s.is_ascii() {
        return s.to_string();
    }
    format!("{}...{}", &s[..6], &s[s.len() - 4..])
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Address {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_addresses() {
        assert!(Address::is_valid("0xABC"));
        assert!(Address::is_valid(
            "0x19d3828d73b632f813cdc5c3ef2823268b7001011992a003cb0ca02916a2021b"
        ));
        assert!(Address::is_valid("  0x1234567890abcdef "));
    }

    #[test]
    fn test_invalid_addresses() {
        assert!(!Address::is_valid(""));
        assert!(!Address::is_valid("0x"));
        assert!(!Address::is_valid("ABC"));
        assert!(!Address::is_valid("0xXYZ"));
        assert!(!Address::is_valid(&format!("0x{}", "a".repeat(65))));

        match Address::parse("pharmacy") {
            Err(Error::InvalidAddress(addr)) => assert_eq!(addr, "pharmacy"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_case_insensitive_match() {
        let addr = Address::parse("0xAbCdEf").unwrap();
        assert!(addr.matches("0xabcdef"));
        assert!(addr.matches("0xABCDEF"));
        assert!(!addr.matches("0xabcdee"));
    }

    #[test]
    fn test_short_form() {
        let addr = Address::parse(
            "0x19d3828d73b632f813cdc5c3ef2823268b7001011992a003cb0ca02916a2021b",
        )
        .unwrap();
        assert_eq!(addr.short(), "0x19d3...021b");
        assert_eq!(shorten("0xABC"), "0xABC");
    }

    #[test]
    fn test_serde_rejects_invalid() {
        let ok: Address = serde_json::from_str("\"0xabc\"").unwrap();
        assert_eq!(ok.as_str(), "0xabc");
        assert!(serde_json::from_str::<Address>("\"not-an-address\"").is_err());
    }
}
