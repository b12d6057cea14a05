//! Cached chain tip with change notification.
//!
//! [`TipCache`] owns the last known longest-chain tip and the time it was fetched. The
//! whole check, fetch and update sequence of [`TipCache::refresh_tip`] runs under one
//! async mutex, so foreground callers and the background poller never race or issue
//! duplicate fetches.
use std::sync::Arc;
use std::time::Duration;

use header_primitives::Header;
use tokio::select;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::{DEFAULT_TIP_FRESHNESS, TIP_QUEUE_CAPACITY};
use crate::error::{ClientError, ClientResult};
use crate::net::HeaderTransport;

#[derive(Default)]
struct TipEntry {
    tip: Option<Header>,
    last_refreshed: Option<Instant>,
    notifier: Option<mpsc::Sender<Header>>,
    /// Receiving half, held until a subscriber claims it.
    pending: Option<mpsc::Receiver<Header>>,
}

pub struct TipCache<T: ?Sized> {
    transport: Arc<T>,
    freshness: Duration,
    queue_capacity: usize,
    entry: Mutex<TipEntry>,
}

impl<T: HeaderTransport + ?Sized> TipCache<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self::with_settings(transport, DEFAULT_TIP_FRESHNESS, TIP_QUEUE_CAPACITY)
    }

    pub fn with_settings(transport: Arc<T>, freshness: Duration, queue_capacity: usize) -> Self {
        Self {
            transport,
            freshness,
            queue_capacity,
            entry: Mutex::new(TipEntry::default()),
        }
    }

    pub fn freshness(&self) -> Duration {
        self.freshness
    }

    /// Returns the current tip, fetching it only when the cached one is older than the
    /// freshness window.
    ///
    /// When the fetched tip differs from the cached one and notifications are enabled, it
    /// is queued before the cache is updated. A full queue fails the refresh with
    /// [`ClientError::QueueFull`] and leaves the cache as it was. Transport failures also
    /// leave the cache untouched and are not retried.
    pub async fn refresh_tip(&self) -> ClientResult<Header> {
        let mut entry = self.entry.lock().await;

        if let (Some(tip), Some(at)) = (&entry.tip, entry.last_refreshed)
            && at.elapsed() < self.freshness
        {
            return Ok(tip.clone());
        }

        let header = self.transport.tip().await?.into_header();

        let changed = entry
            .tip
            .as_ref()
            .is_none_or(|prev| prev.hash != header.hash);
        if changed {
            info!(height = header.height, hash = %header.hash, "chain tip changed");
            let sent = entry
                .notifier
                .as_ref()
                .map(|notifier| notifier.try_send(header.clone()));
            match sent {
                None | Some(Ok(())) => {}
                Some(Err(mpsc::error::TrySendError::Full(_))) => {
                    return Err(ClientError::QueueFull {
                        capacity: self.queue_capacity,
                    });
                }
                Some(Err(mpsc::error::TrySendError::Closed(_))) => {
                    warn!("tip subscriber dropped, disabling notifications");
                    entry.notifier = None;
                }
            }
        } else {
            debug!(height = header.height, "chain tip unchanged");
        }

        entry.tip = Some(header.clone());
        entry.last_refreshed = Some(Instant::now());
        Ok(header)
    }

    /// The last fetched tip, without touching the network.
    pub async fn cached_tip(&self) -> Option<Header> {
        self.entry.lock().await.tip.clone()
    }

    /// Height of the current tip, refreshing it if stale.
    pub async fn current_height(&self) -> ClientResult<u32> {
        Ok(self.refresh_tip().await?.height)
    }

    /// Allocates the tip-change queue if it does not exist yet.
    pub async fn enable_notifications(&self) {
        let mut entry = self.entry.lock().await;
        if entry.notifier.is_none() && entry.pending.is_none() {
            let (tx, rx) = mpsc::channel(self.queue_capacity);
            entry.notifier = Some(tx);
            entry.pending = Some(rx);
        }
    }

    /// Claims the tip-change queue, allocating it if needed.
    ///
    /// The queue has a single consumer: only the first call returns a subscriber.
    pub async fn subscribe(&self) -> Option<TipSubscriber> {
        self.enable_notifications().await;
        self.entry
            .lock()
            .await
            .pending
            .take()
            .map(|rx| TipSubscriber { rx })
    }

    async fn next_refresh_at(&self) -> Instant {
        let entry = self.entry.lock().await;
        entry.last_refreshed.map_or_else(Instant::now, |at| at + self.freshness)
    }

    async fn poll_tip(&self, cancel: CancellationToken) -> ClientResult<()> {
        loop {
            let refreshed = select! {
                biased;

                _ = cancel.cancelled() => {
                    info!("tip subscription cancelled");
                    return Ok(());
                }
                refreshed = self.refresh_tip() => refreshed,
            };

            if let Err(e) = refreshed {
                error!(error = %e, "tip refresh failed, stopping tip subscription");
                return Err(e);
            }

            let next = self.next_refresh_at().await;
            select! {
                biased;

                _ = cancel.cancelled() => {
                    info!("tip subscription cancelled");
                    return Ok(());
                }
                _ = sleep_until(next) => {}
            }
        }
    }
}

impl<T: HeaderTransport + ?Sized + 'static> TipCache<T> {
    /// Spawns the background task that keeps the tip fresh.
    ///
    /// The notification queue is allocated before the task starts. The task stops when
    /// `cancel` fires or on the first refresh error; the error is handed to whoever awaits
    /// [`TipSubscription::join`], which decides whether to abort, retry or carry on.
    pub async fn start_tip_subscription(
        self: &Arc<Self>,
        cancel: CancellationToken,
    ) -> TipSubscription {
        self.enable_notifications().await;

        let cache = Arc::clone(self);
        let token = cancel.clone();
        let handle = tokio::spawn(async move { cache.poll_tip(token).await });

        TipSubscription { handle, cancel }
    }
}

/// Receiving end of the tip-change queue.
#[derive(Debug)]
pub struct TipSubscriber {
    rx: mpsc::Receiver<Header>,
}

impl TipSubscriber {
    /// Waits for the next tip change. Returns `None` once the cache is gone.
    pub async fn recv(&mut self) -> Option<Header> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<Header> {
        self.rx.try_recv().ok()
    }
}

/// Handle to the background tip poller.
#[derive(Debug)]
pub struct TipSubscription {
    handle: JoinHandle<ClientResult<()>>,
    cancel: CancellationToken,
}

impl TipSubscription {
    /// Asks the poller to stop before its next iteration.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the poller to stop and returns the error that stopped it, if any.
    pub async fn join(self) -> ClientResult<()> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) => Err(ClientError::Subscription(e.to_string())),
        }
    }
}
