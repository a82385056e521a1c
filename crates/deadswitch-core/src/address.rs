//! Wallet identities
//!
//! An [`Address`] is 20 bytes: the HASH160 of a compressed secp256k1 public
//! key. Rendered as `0x`-prefixed lowercase hex.

use bitcoin::hashes::{hash160, Hash};
use bitcoin::secp256k1::PublicKey;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Length of an address in bytes
pub const ADDRESS_LEN: usize = 20;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AddressError {
    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    #[error("Invalid length: expected 20 bytes, got {0}")]
    InvalidLength(usize),
}

/// A ledger identity (owner, heir, wallet or any counterparty)
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    /// The all-zero address. Never a valid heir.
    pub const ZERO: Address = Address([0u8; ADDRESS_LEN]);

    pub const fn from_bytes(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// Derive the address controlled by a public key
    pub fn from_public_key(pubkey: &PublicKey) -> Self {
        let hash = hash160::Hash::hash(&pubkey.serialize());
        Self(hash.to_byte_array())
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; ADDRESS_LEN]
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let hex_part = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        let bytes = hex::decode(hex_part).map_err(|e| AddressError::InvalidHex(e.to_string()))?;
        let array: [u8; ADDRESS_LEN] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| AddressError::InvalidLength(bytes.len()))?;
        Ok(Self(array))
    }
}

impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Address::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::secp256k1::{Secp256k1, SecretKey};

    fn test_pubkey(seed: u8) -> PublicKey {
        let secp = Secp256k1::new();
        let mut bytes = [0u8; 32];
        bytes[31] = seed;
        bytes[0] = 0x01;
        let sk = SecretKey::from_slice(&bytes).unwrap();
        sk.public_key(&secp)
    }

    #[test]
    fn test_from_public_key_is_deterministic() {
        let a = Address::from_public_key(&test_pubkey(1));
        let b = Address::from_public_key(&test_pubkey(1));
        let c = Address::from_public_key(&test_pubkey(2));

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(!a.is_zero());
    }

    #[test]
    fn test_display_and_parse() {
        let addr = Address::from_bytes([0xAB; ADDRESS_LEN]);
        let s = addr.to_string();

        assert_eq!(s, format!("0x{}", "ab".repeat(ADDRESS_LEN)));
        assert_eq!(Address::from_str(&s).unwrap(), addr);
        // Prefix is optional
        assert_eq!(Address::from_str(&"ab".repeat(ADDRESS_LEN)).unwrap(), addr);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(matches!(
            Address::from_str("0x1234"),
            Err(AddressError::InvalidLength(2))
        ));
        assert!(matches!(
            Address::from_str("0xzz"),
            Err(AddressError::InvalidHex(_))
        ));
    }

    #[test]
    fn test_zero_address() {
        let zero = Address::from_str("0x0000000000000000000000000000000000000000").unwrap();
        assert_eq!(zero, Address::ZERO);
        assert!(zero.is_zero());
    }

    #[test]
    fn test_serde_as_string() {
        let addr = Address::from_public_key(&test_pubkey(7));
        let json = serde_json::to_string(&addr).unwrap();

        assert_eq!(json, format!("\"{}\"", addr));
        let restored: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, addr);
    }
}
