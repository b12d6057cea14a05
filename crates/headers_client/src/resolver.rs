//! Longest-chain resolution on top of a [`HeaderTransport`].
//!
//! Height lookups never consult the tip cache; every disambiguation is done with fresh
//! per-hash state lookups.
use std::collections::HashMap;
use std::sync::Arc;

use header_primitives::{BlockHash, Header};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ClientError, ClientResult};
use crate::net::HeaderTransport;
use crate::segment::{ChainSegment, RangeHeaders};

/// What [`ChainResolver::header_at_height`] does when no candidate at a height is
/// labelled longest chain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForkPolicy {
    /// Return the first candidate the service listed, with the requested height.
    /// Availability over correctness: the returned header may belong to a stale fork.
    #[default]
    BestEffort,
    /// Fail with [`ClientError::UnresolvedFork`].
    Strict,
}

pub struct ChainResolver<T: ?Sized> {
    transport: Arc<T>,
    policy: ForkPolicy,
}

impl<T: HeaderTransport + ?Sized> ChainResolver<T> {
    pub fn new(transport: Arc<T>, policy: ForkPolicy) -> Self {
        Self { transport, policy }
    }

    pub fn policy(&self) -> ForkPolicy {
        self.policy
    }

    /// Returns the longest-chain header at `height`.
    ///
    /// Candidates are checked in the order the service returns them. Under
    /// [`ForkPolicy::BestEffort`], if none is labelled longest chain the first candidate
    /// is returned anyway; this is a best-effort answer, not a guarantee.
    pub async fn header_at_height(&self, height: u32) -> ClientResult<Header> {
        let candidates = self.transport.headers_at_height(height, None).await?;

        for candidate in &candidates {
            let state = self.transport.header_state(&candidate.hash).await?;
            if state.is_longest_chain() {
                debug!(
                    height = state.height,
                    hash = %candidate.hash,
                    "resolved longest-chain header"
                );
                let mut header = candidate.clone();
                header.height = state.height;
                return Ok(header);
            }
        }

        if self.policy == ForkPolicy::Strict && !candidates.is_empty() {
            return Err(ClientError::UnresolvedFork { height });
        }

        let mut header = candidates
            .into_iter()
            .next()
            .ok_or(ClientError::NoHeaders { height })?;
        warn!(
            height,
            hash = %header.hash,
            "no longest-chain candidate, falling back to first header"
        );
        header.height = height;
        Ok(header)
    }

    /// Returns the header identified by `hash`, whichever chain it belongs to.
    pub async fn header_by_hash(&self, hash: &BlockHash) -> ClientResult<Header> {
        let state = self.transport.header_state(hash).await?;
        Ok(state.into_header())
    }

    /// Reports whether `root` is the merkle root of the longest-chain header at `height`.
    pub async fn is_valid_root_for_height(
        &self,
        root: &BlockHash,
        height: u32,
    ) -> ClientResult<bool> {
        let header = self.header_at_height(height).await?;
        Ok(header.merkle_root == *root)
    }

    /// Rebuilds the longest-chain run within `[from_height, from_height + count)`.
    ///
    /// The window tip is the last fetched candidate (in service order) labelled longest
    /// chain. If the service's labelling lags the real tip, the segment ends below the
    /// highest fetched height. The resulting segment spans `[from_height, tip height]`,
    /// and heights whose ancestor is missing from the window are left empty: request a
    /// wider window when a complete run is required.
    pub async fn headers_in_range(
        &self,
        from_height: u32,
        count: u32,
    ) -> ClientResult<RangeHeaders> {
        if count == 0 {
            return Ok(RangeHeaders::Resolved(ChainSegment::empty(from_height)));
        }

        let candidates = self
            .transport
            .headers_at_height(from_height, Some(count))
            .await?;
        if candidates.is_empty() {
            debug!(from_height, count, "empty header window");
            return Ok(RangeHeaders::Resolved(ChainSegment::empty(from_height)));
        }

        let by_hash: HashMap<BlockHash, &Header> = candidates
            .iter()
            .map(|header| (header.hash, header))
            .collect();

        for candidate in candidates.iter().rev() {
            let state = self.transport.header_state(&candidate.hash).await?;
            if !state.is_longest_chain() {
                continue;
            }
            if state.height < from_height {
                warn!(
                    from_height,
                    height = state.height,
                    hash = %candidate.hash,
                    "longest-chain candidate below requested window, skipping"
                );
                continue;
            }

            let tip = state.into_header();
            debug!(from_height, tip_height = tip.height, "resolved window tip");
            let segment = ChainSegment::reconstruct(from_height, tip, &by_hash);
            debug!(
                from_height,
                slots = segment.len(),
                populated = segment.populated(),
                "reconstructed chain segment"
            );
            return Ok(RangeHeaders::Resolved(segment));
        }

        warn!(
            from_height,
            count,
            candidates = candidates.len(),
            "no longest-chain header in window"
        );
        Ok(RangeHeaders::Unresolved(candidates))
    }
}
