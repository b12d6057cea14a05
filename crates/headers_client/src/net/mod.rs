//! Access to the remote header service.
//!
//! [`HeaderTransport`] is the seam between the chain logic and the network; [`http`]
//! provides the production implementation.
use async_trait::async_trait;
use header_primitives::{BlockHash, Header, HeaderState};

use crate::error::TransportError;

pub mod http;

pub use http::HttpTransport;

/// Fetches header records from a header service.
///
/// Implementations are stateless with respect to the caller: every call is independent
/// and may run concurrently with any other.
#[async_trait]
pub trait HeaderTransport: Send + Sync {
    /// Returns the state of the current longest-chain tip.
    async fn tip(&self) -> Result<HeaderState, TransportError>;

    /// Returns every header known at `height`, or at `height..height + count` when a
    /// count is given. Competing forks may yield several headers per height, and the
    /// `height` field of the returned headers is not guaranteed to be meaningful.
    async fn headers_at_height(
        &self,
        height: u32,
        count: Option<u32>,
    ) -> Result<Vec<Header>, TransportError>;

    /// Returns the state of the header identified by `hash`.
    async fn header_state(&self, hash: &BlockHash) -> Result<HeaderState, TransportError>;
}
