//! Chain and network identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::TypesError;

/// EIP-155 chain identifier, as returned by `eth_chainId`.
///
/// Wallet providers exchange it as a `0x`-prefixed hex quantity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChainId(pub u64);

impl ChainId {
    /// Ethereum mainnet.
    pub const MAINNET: ChainId = ChainId(1);
    /// Sepolia test network, where the voting contract is deployed.
    pub const SEPOLIA: ChainId = ChainId(11_155_111);
    /// Local development chain (Ganache / Truffle develop).
    pub const DEV: ChainId = ChainId(1337);

    /// Parse a hex quantity (`0xaa36a7`) or a decimal string (`11155111`).
    pub fn parse(raw: &str) -> Result<Self, TypesError> {
        let raw = raw.trim();
        let parsed = match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
            Some(digits) => u64::from_str_radix(digits, 16),
            None => raw.parse::<u64>(),
        };
        parsed
            .map(ChainId)
            .map_err(|e| TypesError::InvalidChainId(format!("{raw}: {e}")))
    }

    /// Hex quantity form used on the wire.
    pub fn to_hex(&self) -> String {
        format!("0x{:x}", self.0)
    }

    /// Human-readable name for well-known chains.
    pub fn name(&self) -> &'static str {
        match *self {
            Self::MAINNET => "mainnet",
            Self::SEPOLIA => "sepolia",
            Self::DEV => "dev",
            _ => "unknown",
        }
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.to_hex(), self.name())
    }
}

impl std::str::FromStr for ChainId {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ChainId {
    type Error = TypesError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<ChainId> for String {
    fn from(id: ChainId) -> Self {
        id.to_hex()
    }
}

/// Network identifier as returned by `net_version`.
///
/// Deployment artifacts are keyed by this value rather than by chain id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NetworkId(pub u64);

impl NetworkId {
    /// Parse the decimal string returned by `net_version`.
    pub fn parse(raw: &str) -> Result<Self, TypesError> {
        raw.trim()
            .parse::<u64>()
            .map(NetworkId)
            .map_err(|e| TypesError::InvalidNetworkId(format!("{raw}: {e}")))
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sepolia_hex_round_trip() {
        let id = ChainId::parse("0xaa36a7").unwrap();
        assert_eq!(id, ChainId::SEPOLIA);
        assert_eq!(id.to_hex(), "0xaa36a7");
        assert_eq!(id.name(), "sepolia");
    }

    #[test]
    fn decimal_chain_ids_are_accepted() {
        assert_eq!(ChainId::parse("1337").unwrap(), ChainId::DEV);
    }

    #[test]
    fn garbage_chain_id_is_rejected() {
        assert!(ChainId::parse("0xzz").is_err());
        assert!(ChainId::parse("").is_err());
    }

    #[test]
    fn network_id_parses_net_version() {
        assert_eq!(NetworkId::parse("11155111").unwrap(), NetworkId(11_155_111));
        assert!(NetworkId::parse("sepolia").is_err());
    }
}
