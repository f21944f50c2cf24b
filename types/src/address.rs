//! Account address type.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::TypesError;

/// An account address as reported by a wallet provider or the contract.
///
/// Addresses are opaque to the client: they are stored lower-cased so that
/// equality is case-insensitive (checksummed and plain hex forms of the same
/// account compare equal). Only the ABI encoder needs the raw 20 bytes, see
/// [`Address::to_bytes`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// The prefix used by hex-encoded account addresses.
    pub const PREFIX: &'static str = "0x";

    /// Length of a raw account address in bytes.
    pub const LEN: usize = 20;

    /// Create an address from a raw string. Surrounding whitespace is trimmed.
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, TypesError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TypesError::InvalidAddress("address is empty".into()));
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    /// Build an address from its 20 raw bytes.
    pub fn from_bytes(bytes: [u8; Self::LEN]) -> Self {
        Self(format!("{}{}", Self::PREFIX, hex::encode(bytes)))
    }

    /// Return the normalized (lower-case) address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is a well-formed `0x` + 40 hex digit account address.
    pub fn is_hex_account(&self) -> bool {
        self.to_bytes().is_ok()
    }

    /// Decode the 20 raw bytes of a hex account address.
    pub fn to_bytes(&self) -> Result<[u8; Self::LEN], TypesError> {
        let digits = self
            .0
            .strip_prefix(Self::PREFIX)
            .ok_or_else(|| TypesError::InvalidAddress(format!("{} lacks 0x prefix", self.0)))?;
        let decoded =
            hex::decode(digits).map_err(|e| TypesError::InvalidAddress(format!("{}: {e}", self.0)))?;
        decoded
            .try_into()
            .map_err(|_| TypesError::InvalidAddress(format!("{} is not 20 bytes", self.0)))
    }

    /// Shortened form for display, e.g. `0x1234...abcd`.
    pub fn short(&self) -> String {
        if self.0.len() <= 10 {
            return self.0.clone();
        }
        format!("{}...{}", &self.0[..6], &self.0[self.0.len() - 4..])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Address {
    type Error = TypesError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

impl std::str::FromStr for Address {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHECKSUMMED: &str = "0x8E7AB13e7703888FCD0953582BD633e66675F778";

    #[test]
    fn comparison_ignores_case() {
        let a = Address::parse(CHECKSUMMED).unwrap();
        let b = Address::parse(CHECKSUMMED.to_lowercase()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), CHECKSUMMED.to_lowercase());
    }

    #[test]
    fn empty_address_is_rejected() {
        assert!(Address::parse("   ").is_err());
    }

    #[test]
    fn opaque_identities_are_allowed_but_not_hex_accounts() {
        let a = Address::parse("0xA").unwrap();
        assert!(!a.is_hex_account());
        assert!(a.to_bytes().is_err());
    }

    #[test]
    fn bytes_round_trip_through_hex_form() {
        let a = Address::parse(CHECKSUMMED).unwrap();
        let bytes = a.to_bytes().unwrap();
        assert_eq!(Address::from_bytes(bytes), a);
    }

    #[test]
    fn short_form_keeps_prefix_and_tail() {
        let a = Address::parse(CHECKSUMMED).unwrap();
        assert_eq!(a.short(), "0x8e7a...f778");
        assert_eq!(Address::parse("0xB").unwrap().short(), "0xb");
    }

    #[test]
    fn deserializes_from_json_string() {
        let a: Address = serde_json::from_str(&format!("\"{CHECKSUMMED}\"")).unwrap();
        assert!(a.is_hex_account());
        assert!(serde_json::from_str::<Address>("\"\"").is_err());
    }
}
