use serde::{Deserialize, Serialize};

use crate::hash::BlockHash;

/// A block header as reported by the header service.
///
/// `height` is only authoritative once the header has been resolved against its
/// [`HeaderState`]; a header returned by a fetch-by-height may carry a placeholder.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    #[serde(default)]
    pub height: u32,
    pub hash: BlockHash,
    pub version: u32,
    #[serde(rename = "merkleRoot")]
    pub merkle_root: BlockHash,
    #[serde(rename = "creationTimestamp")]
    pub timestamp: u32,
    #[serde(rename = "difficultyTarget")]
    pub bits: u32,
    pub nonce: u32,
    #[serde(rename = "prevBlockHash", default)]
    pub previous_block_hash: BlockHash,
}

impl Header {
    pub fn is_genesis(&self) -> bool {
        self.previous_block_hash.is_zero()
    }

    /// Returns `true` if `self` is the direct parent of `child`.
    pub fn is_parent_of(&self, child: &Header) -> bool {
        child.previous_block_hash == self.hash
    }
}

/// Chain membership label attached to a header by the service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChainState {
    LongestChain,
    Stale,
    Orphan,
    Rejected,
    #[serde(other)]
    Unknown,
}

impl ChainState {
    pub fn is_longest_chain(self) -> bool {
        self == ChainState::LongestChain
    }
}

/// A header together with its chain-state label and authoritative height.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderState {
    pub header: Header,
    pub state: ChainState,
    pub height: u32,
}

impl HeaderState {
    pub fn is_longest_chain(&self) -> bool {
        self.state.is_longest_chain()
    }

    /// Returns the embedded header with its height replaced by the state's height.
    pub fn into_header(self) -> Header {
        let mut header = self.header;
        header.height = self.height;
        header
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATE_JSON: &str = r#"{
        "header": {
            "height": 0,
            "hash": "00000000000000000001f3ad6bd8e2d5b49ec2d4cf4a3fe0ac9c3fe3e1f8d8a1",
            "version": 536870912,
            "merkleRoot": "5e3c8e0b2d3a4a1f7f0b7f2e1b0c6d8a3e1f2b4c5d6e7f8091a2b3c4d5e6f708",
            "creationTimestamp": 1700000000,
            "difficultyTarget": 386089497,
            "nonce": 42,
            "prevBlockHash": "00000000000000000002a1b2c3d4e5f60718293a4b5c6d7e8f90a1b2c3d4e5f6"
        },
        "state": "LONGEST_CHAIN",
        "height": 817000,
        "chainWork": "ignored"
    }"#;

    #[test]
    fn decodes_service_payload() {
        let state: HeaderState = serde_json::from_str(STATE_JSON).unwrap();
        assert!(state.is_longest_chain());
        assert_eq!(state.header.bits, 386089497);
        assert_eq!(state.header.timestamp, 1700000000);
        assert_eq!(state.header.height, 0);

        let header = state.into_header();
        assert_eq!(header.height, 817000);
        assert!(!header.is_genesis());
    }

    #[test]
    fn unknown_state_label_is_not_canonical() {
        let state: ChainState = serde_json::from_str("\"SOMETHING_NEW\"").unwrap();
        assert_eq!(state, ChainState::Unknown);
        assert!(!state.is_longest_chain());
        let stale: ChainState = serde_json::from_str("\"STALE\"").unwrap();
        assert_eq!(stale, ChainState::Stale);
    }

    #[test]
    fn missing_parent_is_genesis() {
        let json = r#"{
            "hash": "000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f",
            "version": 1,
            "merkleRoot": "4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b",
            "creationTimestamp": 1231006505,
            "difficultyTarget": 486604799,
            "nonce": 2083236893
        }"#;
        let header: Header = serde_json::from_str(json).unwrap();
        assert!(header.is_genesis());
        assert_eq!(header.height, 0);
    }
}
