use reqwest::StatusCode;
use thiserror::Error;

/// Errors raised by a [`crate::net::HeaderTransport`].
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("only http:// and https:// URLs are supported")]
    NonHttpUrl,
    #[error("client error: {0}")]
    Client(String),
    #[error("unexpected HTTP status: {0}")]
    Status(StatusCode),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors surfaced by the resolver, the tip cache and the composed client.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    /// No candidate at the queried height is labelled longest chain.
    #[error("no longest-chain header found at height {height}")]
    UnresolvedFork { height: u32 },
    #[error("no headers returned for height {height}")]
    NoHeaders { height: u32 },
    /// The tip-change queue is at capacity; the subscriber is not keeping up.
    #[error("tip notification queue is full (capacity {capacity})")]
    QueueFull { capacity: usize },
    #[error("tip subscription task failed: {0}")]
    Subscription(String),
}

/// Errors found while assembling a [`crate::config::ClientConfig`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

pub type ClientResult<T> = Result<T, ClientError>;
