use std::sync::Arc;

use async_trait::async_trait;
use header_primitives::{BlockHash, Header};
use tokio_util::sync::CancellationToken;

use crate::config::ClientConfig;
use crate::error::{ClientResult, TransportError};
use crate::net::{HeaderTransport, HttpTransport};
use crate::resolver::{ChainResolver, ForkPolicy};
use crate::segment::RangeHeaders;
use crate::tip::{TipCache, TipSubscriber, TipSubscription};

/// Verifies merkle roots against the longest chain and reports its height.
#[async_trait]
pub trait ChainTracker: Send + Sync {
    /// Returns `Ok(true)` if `root` is the merkle root of the longest-chain block at `height`.
    async fn is_valid_root_for_height(&self, root: &BlockHash, height: u32) -> ClientResult<bool>;

    /// Returns the height of the current chain tip.
    async fn current_height(&self) -> ClientResult<u32>;
}

/// Header service client: chain resolution plus a cached, optionally self-refreshing tip.
pub struct HeadersClient<T: ?Sized = HttpTransport> {
    resolver: ChainResolver<T>,
    tip: Arc<TipCache<T>>,
}

impl HeadersClient<HttpTransport> {
    pub fn from_config(config: &ClientConfig) -> Result<Self, TransportError> {
        let transport = Arc::new(HttpTransport::from_config(config)?);
        Ok(Self::with_config(transport, config))
    }
}

impl<T: HeaderTransport + ?Sized> HeadersClient<T> {
    /// Creates a client with the default freshness window, queue size and fork policy.
    pub fn new(transport: Arc<T>) -> Self {
        Self {
            resolver: ChainResolver::new(Arc::clone(&transport), ForkPolicy::default()),
            tip: Arc::new(TipCache::new(transport)),
        }
    }

    /// Creates a client using the tuning values of `config`; its URL and key are ignored.
    pub fn with_config(transport: Arc<T>, config: &ClientConfig) -> Self {
        Self {
            resolver: ChainResolver::new(Arc::clone(&transport), config.fork_policy),
            tip: Arc::new(TipCache::with_settings(
                transport,
                config.tip_freshness,
                config.tip_queue_capacity,
            )),
        }
    }

    pub fn resolver(&self) -> &ChainResolver<T> {
        &self.resolver
    }

    pub fn tip_cache(&self) -> &Arc<TipCache<T>> {
        &self.tip
    }

    pub async fn is_valid_root_for_height(
        &self,
        root: &BlockHash,
        height: u32,
    ) -> ClientResult<bool> {
        self.resolver.is_valid_root_for_height(root, height).await
    }

    /// See [`ChainResolver::header_at_height`] for the fallback taken on unlabelled forks.
    pub async fn header_at_height(&self, height: u32) -> ClientResult<Header> {
        self.resolver.header_at_height(height).await
    }

    pub async fn header_by_hash(&self, hash: &BlockHash) -> ClientResult<Header> {
        self.resolver.header_by_hash(hash).await
    }

    pub async fn headers_in_range(
        &self,
        from_height: u32,
        count: u32,
    ) -> ClientResult<RangeHeaders> {
        self.resolver.headers_in_range(from_height, count).await
    }

    pub async fn refresh_tip(&self) -> ClientResult<Header> {
        self.tip.refresh_tip().await
    }

    pub async fn current_height(&self) -> ClientResult<u32> {
        self.tip.current_height().await
    }

    pub async fn subscribe(&self) -> Option<TipSubscriber> {
        self.tip.subscribe().await
    }
}

impl<T: HeaderTransport + ?Sized + 'static> HeadersClient<T> {
    pub async fn start_tip_subscription(&self, cancel: CancellationToken) -> TipSubscription {
        self.tip.start_tip_subscription(cancel).await
    }
}

#[async_trait]
impl<T: HeaderTransport + ?Sized> ChainTracker for HeadersClient<T> {
    async fn is_valid_root_for_height(&self, root: &BlockHash, height: u32) -> ClientResult<bool> {
        self.resolver.is_valid_root_for_height(root, height).await
    }

    async fn current_height(&self) -> ClientResult<u32> {
        self.tip.current_height().await
    }
}
