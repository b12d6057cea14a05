//! Height-indexed runs of longest-chain headers.
use std::collections::HashMap;

use header_primitives::{BlockHash, Header};
use serde::Serialize;

/// Headers covering `[from_height, from_height + len)`, indexed by `height - from_height`.
///
/// Every populated slot is the parent of the next populated slot above it. Empty slots
/// mark heights that could not be linked back from the segment tip, i.e. gaps.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ChainSegment {
    from_height: u32,
    slots: Vec<Option<Header>>,
}

impl ChainSegment {
    pub fn empty(from_height: u32) -> Self {
        Self {
            from_height,
            slots: Vec::new(),
        }
    }

    /// Rebuilds the segment ending at `tip` by following parent links through `by_hash`.
    ///
    /// The walk never descends below `from_height` and stops at the first parent missing
    /// from `by_hash`. Heights are assigned from the tip downwards; heights carried by the
    /// looked-up headers are ignored. A tip below `from_height` yields an empty segment.
    pub fn reconstruct(
        from_height: u32,
        tip: Header,
        by_hash: &HashMap<BlockHash, &Header>,
    ) -> Self {
        if tip.height < from_height {
            return Self::empty(from_height);
        }
        let mut slots = vec![None; (tip.height - from_height) as usize + 1];

        let mut height = tip.height;
        let mut parent_hash = tip.previous_block_hash;
        slots[(height - from_height) as usize] = Some(tip);

        while height > from_height {
            let Some(parent) = by_hash.get(&parent_hash) else {
                break;
            };
            height -= 1;
            let mut parent = (*parent).clone();
            parent.height = height;
            parent_hash = parent.previous_block_hash;
            slots[(height - from_height) as usize] = Some(parent);
        }

        Self { from_height, slots }
    }

    pub fn from_height(&self) -> u32 {
        self.from_height
    }

    /// Number of slots, populated or not.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[Option<Header>] {
        &self.slots
    }

    pub fn get(&self, height: u32) -> Option<&Header> {
        let index = height.checked_sub(self.from_height)? as usize;
        self.slots.get(index)?.as_ref()
    }

    /// Populated headers in ascending height order.
    pub fn iter(&self) -> impl Iterator<Item = &Header> {
        self.slots.iter().flatten()
    }

    pub fn populated(&self) -> usize {
        self.iter().count()
    }

    /// The highest populated header.
    pub fn tip(&self) -> Option<&Header> {
        self.slots.iter().rev().flatten().next()
    }

    /// `true` when no slot is empty.
    pub fn is_contiguous(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    pub fn into_slots(self) -> Vec<Option<Header>> {
        self.slots
    }
}

/// Outcome of a range request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "headers", rename_all = "snake_case")]
pub enum RangeHeaders {
    /// A longest-chain tip was found in the window and the segment was rebuilt from it.
    Resolved(ChainSegment),
    /// No fetched header is labelled longest chain; the raw fetch, forks included.
    Unresolved(Vec<Header>),
}

impl RangeHeaders {
    pub fn is_resolved(&self) -> bool {
        matches!(self, RangeHeaders::Resolved(_))
    }

    pub fn segment(&self) -> Option<&ChainSegment> {
        match self {
            RangeHeaders::Resolved(segment) => Some(segment),
            RangeHeaders::Unresolved(_) => None,
        }
    }

    pub fn into_segment(self) -> Option<ChainSegment> {
        match self {
            RangeHeaders::Resolved(segment) => Some(segment),
            RangeHeaders::Unresolved(_) => None,
        }
    }
}
