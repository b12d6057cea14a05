#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use headers_client::{BlockHash, ChainState, Header, HeaderState, HeaderTransport, TransportError};
use reqwest::StatusCode;

/// Deterministic hash: `n` in the first four bytes, `fork` in the fifth.
pub fn hash(n: u32, fork: u8) -> BlockHash {
    let mut bytes = [0u8; 32];
    bytes[..4].copy_from_slice(&n.to_le_bytes());
    bytes[4] = fork;
    bytes[31] = 0xaa;
    BlockHash(bytes)
}

pub fn merkle_root(hash: &BlockHash) -> BlockHash {
    let mut bytes = hash.0;
    bytes.reverse();
    BlockHash(bytes)
}

/// Header at `height` on branch `fork`, child of `parent`.
///
/// The `height` field is left at zero, as a raw fetch-by-height may not carry it.
pub fn header(height: u32, fork: u8, parent: BlockHash) -> Header {
    let hash = hash(height, fork);
    Header {
        height: 0,
        hash,
        version: 0x2000_0000,
        merkle_root: merkle_root(&hash),
        timestamp: 1_700_000_000 + height * 600,
        bits: 0x1703_4219,
        nonce: height,
        previous_block_hash: parent,
    }
}

pub fn state(header: &Header, state: ChainState, height: u32) -> HeaderState {
    HeaderState {
        header: header.clone(),
        state,
        height,
    }
}

/// In-memory header service with call counters.
#[derive(Default)]
pub struct FakeTransport {
    by_height: Mutex<HashMap<u32, Vec<Header>>>,
    states: Mutex<HashMap<BlockHash, HeaderState>>,
    tip: Mutex<Option<HeaderState>>,
    pub tip_calls: AtomicUsize,
    pub height_calls: AtomicUsize,
    pub state_calls: AtomicUsize,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lists `header` at `height` and labels it with `label`.
    pub fn insert(&self, height: u32, header: Header, label: ChainState) {
        self.insert_with_state_height(height, header, label, height);
    }

    /// Lists `header` at `listed_height` while its state reports `state_height`.
    pub fn insert_with_state_height(
        &self,
        listed_height: u32,
        header: Header,
        label: ChainState,
        state_height: u32,
    ) {
        self.states
            .lock()
            .unwrap()
            .insert(header.hash, state(&header, label, state_height));
        self.by_height
            .lock()
            .unwrap()
            .entry(listed_height)
            .or_default()
            .push(header);
    }

    /// Lists `header` at `height` without any state record.
    pub fn insert_unlabelled(&self, height: u32, header: Header) {
        self.by_height
            .lock()
            .unwrap()
            .entry(height)
            .or_default()
            .push(header);
    }

    /// Builds a linked run of longest-chain headers for `heights`, returning them in order.
    pub fn insert_chain(&self, heights: std::ops::Range<u32>, parent: BlockHash) -> Vec<Header> {
        let mut parent = parent;
        let mut out = Vec::new();
        for height in heights {
            let h = header(height, 0, parent);
            parent = h.hash;
            self.insert(height, h.clone(), ChainState::LongestChain);
            out.push(h);
        }
        out
    }

    pub fn relabel(&self, hash: &BlockHash, label: ChainState) {
        if let Some(state) = self.states.lock().unwrap().get_mut(hash) {
            state.state = label;
        }
    }

    pub fn set_tip(&self, header: &Header, height: u32) {
        *self.tip.lock().unwrap() = Some(state(header, ChainState::LongestChain, height));
    }

    pub fn clear_tip(&self) {
        *self.tip.lock().unwrap() = None;
    }

    pub fn tip_calls(&self) -> usize {
        self.tip_calls.load(Ordering::SeqCst)
    }

    pub fn state_calls(&self) -> usize {
        self.state_calls.load(Ordering::SeqCst)
    }

    pub fn height_calls(&self) -> usize {
        self.height_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HeaderTransport for FakeTransport {
    async fn tip(&self) -> Result<HeaderState, TransportError> {
        self.tip_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.tip
            .lock()
            .unwrap()
            .clone()
            .ok_or(TransportError::Status(StatusCode::SERVICE_UNAVAILABLE))
    }

    async fn headers_at_height(
        &self,
        height: u32,
        count: Option<u32>,
    ) -> Result<Vec<Header>, TransportError> {
        self.height_calls.fetch_add(1, Ordering::SeqCst);
        let by_height = self.by_height.lock().unwrap();
        let end = height.saturating_add(count.unwrap_or(1));
        Ok((height..end)
            .filter_map(|h| by_height.get(&h))
            .flatten()
            .cloned()
            .collect())
    }

    async fn header_state(&self, hash: &BlockHash) -> Result<HeaderState, TransportError> {
        self.state_calls.fetch_add(1, Ordering::SeqCst);
        self.states
            .lock()
            .unwrap()
            .get(hash)
            .cloned()
            .ok_or(TransportError::Status(StatusCode::NOT_FOUND))
    }
}

/// Asserts that every pair of consecutive populated slots is parent-linked.
pub fn assert_linked(slots: &[Option<Header>]) {
    let populated: Vec<&Header> = slots.iter().flatten().collect();
    for pair in populated.windows(2) {
        assert!(
            pair[0].is_parent_of(pair[1]),
            "broken link at height {}",
            pair[1].height
        );
        assert_eq!(pair[1].height, pair[0].height + 1);
    }
}
