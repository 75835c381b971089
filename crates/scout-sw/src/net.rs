//! Network abstraction and the HTTP-backed implementation.

use std::time::Duration;

use async_trait::async_trait;
use hashbrown::HashMap;
use tracing::{debug, trace};

use scout_common::{Result, ScoutError};

use crate::fetch::{FetchRequest, FetchResponse};

/// The network side of a fetch. Injected so the caching policy can be tested
/// with a scripted fake.
#[async_trait]
pub trait Network: Send + Sync {
    /// Issue the request against the network.
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse>;
}

/// Configuration for the HTTP network backend.
#[derive(Debug, Clone)]
pub struct HttpNetworkConfig {
    /// User agent string.
    pub user_agent: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for HttpNetworkConfig {
    fn default() -> Self {
        Self {
            user_agent: "ScoutTools/1.0".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Network implementation over an HTTP client.
pub struct HttpNetwork {
    client: reqwest::Client,
}

impl HttpNetwork {
    /// Create a backend with default configuration.
    pub fn new() -> Result<Self> {
        Self::with_config(HttpNetworkConfig::default())
    }

    /// Create a backend with custom configuration.
    pub fn with_config(config: HttpNetworkConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent)
            .timeout(config.timeout)
            .build()
            .map_err(|e| ScoutError::network_with_source("failed to build HTTP client", e))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse> {
        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|e| ScoutError::network_with_source("invalid request method", e))?;

        debug!(method = %request.method, url = %request.url, "network fetch");

        let mut builder = self.client.request(method, request.url.clone());
        for (name, value) in request.headers.iter() {
            builder = builder.header(name, value);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ScoutError::network_with_source(format!("fetch {}", request.url), e))?;

        let status = response.status().as_u16();
        let status_text = response
            .status()
            .canonical_reason()
            .unwrap_or("")
            .to_string();

        let mut headers = HashMap::new();
        for (name, value) in response.headers().iter() {
            if let Ok(v) = value.to_str() {
                headers.insert(name.as_str().to_string(), v.to_string());
            }
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ScoutError::network_with_source("failed to read response body", e))?
            .to_vec();

        trace!(status, body_len = body.len(), "response received");

        Ok(FetchResponse {
            status,
            status_text,
            headers,
            body,
            from_cache: false,
        })
    }
}
