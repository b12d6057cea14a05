use std::time::Duration;

use async_trait::async_trait;
use header_primitives::{BlockHash, Header, HeaderState};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::HeaderTransport;
use crate::config::{ClientConfig, DEFAULT_REQUEST_TIMEOUT};
use crate::error::TransportError;

const TIP_PATH: &str = "api/v1/chain/tip/longest";
const BY_HEIGHT_PATH: &str = "api/v1/chain/header/byHeight";
const STATE_PATH: &str = "api/v1/chain/header/state";

/// Header service client over HTTP(S).
///
/// Every request carries the configured bearer credential. Non-success statuses are
/// reported as [`TransportError::Status`] without further interpretation.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: Client,
    base: String,
    api_key: String,
}

impl HttpTransport {
    /// Creates a transport for the service rooted at `url`.
    ///
    /// `url` should look like `http://127.0.0.1:8080` or `https://headers.example.com/prefix`.
    pub fn new(url: &str, api_key: impl Into<String>) -> Result<Self, TransportError> {
        Self::with_timeout(url, api_key, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(
        url: &str,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let parsed = Url::parse(url).map_err(|e| TransportError::Client(e.to_string()))?;
        match parsed.scheme() {
            "http" | "https" => {}
            _ => {
                return Err(TransportError::NonHttpUrl);
            }
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;

        Ok(HttpTransport {
            client,
            base: url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, TransportError> {
        Self::with_timeout(&config.url, config.api_key.clone(), config.request_timeout)
    }

    async fn get<T>(&self, path: &str, query: &[(&str, u32)]) -> Result<T, TransportError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}/{path}", self.base);
        debug!(%url, ?query, "header service request");

        let res = self
            .client
            .get(&url)
            .query(query)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| TransportError::Client(e.to_string()))?;

        if !res.status().is_success() {
            return Err(TransportError::Status(res.status()));
        }

        let bytes = res
            .bytes()
            .await
            .map_err(|e| TransportError::Client(e.to_string()))?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl HeaderTransport for HttpTransport {
    async fn tip(&self) -> Result<HeaderState, TransportError> {
        self.get(TIP_PATH, &[]).await
    }

    async fn headers_at_height(
        &self,
        height: u32,
        count: Option<u32>,
    ) -> Result<Vec<Header>, TransportError> {
        match count {
            Some(count) => {
                self.get(BY_HEIGHT_PATH, &[("height", height), ("count", count)])
                    .await
            }
            None => self.get(BY_HEIGHT_PATH, &[("height", height)]).await,
        }
    }

    async fn header_state(&self, hash: &BlockHash) -> Result<HeaderState, TransportError> {
        self.get(&format!("{STATE_PATH}/{}", hash.to_hex()), &[]).await
    }
}
