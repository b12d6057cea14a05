//! Client for a block header service.
//!
//! - [`net`]: the [`net::HeaderTransport`] seam and its HTTP implementation
//! - [`resolver`]: longest-chain lookups by height, hash and height range
//! - [`tip`]: cached chain tip, background refresh and tip-change notifications
//! - [`client`]: [`client::HeadersClient`], composing the above behind one handle
pub mod client;
pub mod config;
pub mod error;
pub mod net;
pub mod resolver;
pub mod segment;
pub mod tip;

pub use client::{ChainTracker, HeadersClient};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult, ConfigError, TransportError};
pub use header_primitives::{BlockHash, ChainState, Header, HeaderState};
pub use net::{HeaderTransport, HttpTransport};
pub use resolver::{ChainResolver, ForkPolicy};
pub use segment::{ChainSegment, RangeHeaders};
pub use tip::{TipCache, TipSubscriber, TipSubscription};
