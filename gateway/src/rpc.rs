//! JSON-RPC transport: an ethers [`Provider`] over a configured HTTP client.

use ethers_providers::{Http, Provider};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use std::time::Duration;
use tracing::trace;

use crate::error::RpcError;

/// Default timeout for a single JSON-RPC request.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default connection timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for an Ethereum JSON-RPC endpoint.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct RpcClient {
    provider: Provider<Http>,
    url: String,
}

impl RpcClient {
    /// Create a client targeting `url` (e.g. `http://127.0.0.1:8545`).
    pub fn new(url: impl Into<String>) -> Result<Self, RpcError> {
        Self::with_timeout(url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self, RpcError> {
        let url = url.into();
        let endpoint = reqwest::Url::parse(&url)
            .map_err(|e| RpcError::Transport(format!("invalid endpoint {url}: {e}")))?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .map_err(|e| RpcError::Transport(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            provider: Provider::new(Http::new_with_client(endpoint, http)),
            url,
        })
    }

    /// The configured endpoint URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Typed access for `eth_call`, receipts and the other standard methods.
    pub fn provider(&self) -> &Provider<Http> {
        &self.provider
    }

    /// Send a raw request and deserialize its `result`.
    ///
    /// Used for the wallet methods ethers has no typed wrapper for.
    pub async fn call<T, P>(&self, method: &str, params: P) -> Result<T, RpcError>
    where
        T: Serialize + DeserializeOwned + Debug + Send,
        P: Serialize + Debug + Send + Sync,
    {
        trace!(method, "json-rpc request");
        Ok(self.provider.request(method, params).await?)
    }
}
