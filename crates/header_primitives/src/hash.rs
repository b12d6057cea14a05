use core::fmt;
use core::str::FromStr;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

/// Errors produced when parsing a [`BlockHash`] from its hex form.
#[derive(Debug, Error, PartialEq)]
pub enum HashParseError {
    #[error("hex decoding error: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("block hash must be 32 bytes, got {0}")]
    Length(usize),
}

/// A 32-byte block identifier.
///
/// Bytes are kept in internal (little-endian) order. The textual form, used both for
/// display and on the wire, is the conventional byte-reversed hex string.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockHash(pub [u8; 32]);

impl BlockHash {
    /// The all-zero hash carried as the parent of a genesis header.
    pub const ZERO: BlockHash = BlockHash([0u8; 32]);

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    pub fn try_from_slice(bytes: &[u8]) -> Option<Self> {
        <[u8; 32]>::try_from(bytes).ok().map(BlockHash)
    }

    /// Reversed hex form, as used in resource paths.
    pub fn to_hex(&self) -> String {
        let mut bytes = self.0;
        bytes.reverse();
        hex::encode(bytes)
    }
}

impl FromStr for BlockHash {
    type Err = HashParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = hex::decode(s)?;
        bytes.reverse();
        BlockHash::try_from_slice(&bytes).ok_or(HashParseError::Length(bytes.len()))
    }
}

impl fmt::Display for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockHash({})", self.to_hex())
    }
}

impl Serialize for BlockHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

struct BlockHashVisitor;

impl Visitor<'_> for BlockHashVisitor {
    type Value = BlockHash;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a 64 character hex-encoded block hash")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        v.parse().map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for BlockHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_str(BlockHashVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GENESIS: &str = "000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f";

    #[test]
    fn parses_reversed_hex() {
        let hash: BlockHash = GENESIS.parse().unwrap();
        assert_eq!(hash.0[0], 0x6f);
        assert_eq!(hash.0[31], 0x00);
        assert_eq!(hash.to_string(), GENESIS);
    }

    #[test]
    fn rejects_wrong_length() {
        assert_eq!("abcd".parse::<BlockHash>(), Err(HashParseError::Length(2)));
        assert!(matches!("zz".parse::<BlockHash>(), Err(HashParseError::Hex(_))));
    }

    #[test]
    fn serde_uses_hex_string() {
        let hash: BlockHash = GENESIS.parse().unwrap();
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, format!("\"{GENESIS}\""));
        let back: BlockHash = serde_json::from_str(&json).unwrap();
        assert_eq!(back, hash);
    }

    #[test]
    fn zero_hash() {
        assert!(BlockHash::ZERO.is_zero());
        assert!(BlockHash::default().is_zero());
    }
}
