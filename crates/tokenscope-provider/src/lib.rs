//! # Tokenscope Provider
//!
//! JSON-RPC over HTTP for the token data API and the local wallet bridge.
//!
//! ## Features
//!
//! - HTTP client with connection reuse and request timeouts
//! - Optional client-side rate limiting
//! - Endpoint presets for the Alchemy network slugs
//! - Endpoint URLs are redacted from logs and errors, since Alchemy keys
//!   travel in the URL path
//!
//! ## Example
//!
//! ```ignore
//! use tokenscope_provider::{presets, HttpProvider, ProviderConfig};
//!
//! let url = presets::alchemy_endpoint("eth-mainnet", &api_key);
//! let provider = HttpProvider::new(ProviderConfig::new(url).with_timeout(30))?;
//! let block: String = provider.rpc_call("eth_blockNumber", ()).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokenscope_error::TokenscopeError;
use url::Url;

/// Provider-related errors
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Invalid URL format
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Invalid client configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Connection failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Request timeout
    #[error("Request timeout after {0}s")]
    Timeout(u64),

    /// Non-success HTTP status
    #[error("HTTP status {status} from {method}")]
    HttpStatus {
        /// RPC method name
        method: String,
        /// HTTP status code
        status: u16,
    },

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// RPC error response
    #[error("RPC error from {method}: code={code}, message={message}")]
    RpcError {
        /// RPC method name
        method: String,
        /// Error code
        code: i64,
        /// Error message
        message: String,
    },
}

/// Result type for provider operations
pub type Result<T> = std::result::Result<T, ProviderError>;

impl From<ProviderError> for TokenscopeError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::InvalidUrl(reason) | ProviderError::InvalidConfig(reason) => {
                TokenscopeError::ConfigError(reason)
            }
            ProviderError::ConnectionFailed(reason) => {
                TokenscopeError::RpcConnectionError { reason }
            }
            ProviderError::Timeout(seconds) => TokenscopeError::NetworkTimeout { seconds },
            ProviderError::HttpStatus { method, status } => TokenscopeError::RpcRequestError {
                method,
                reason: format!("HTTP status {status}"),
            },
            ProviderError::Http(e) => TokenscopeError::RpcConnectionError {
                reason: e.without_url().to_string(),
            },
            ProviderError::Json(e) => TokenscopeError::JsonError(e.to_string()),
            ProviderError::RpcError {
                method,
                code,
                message,
            } => TokenscopeError::RpcRequestError {
                method,
                reason: format!("code={code}, message={message}"),
            },
        }
    }
}

/// Returns `scheme://host[:port]` of an endpoint, dropping path and query
/// where API keys live.
pub fn redact_endpoint(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => match (parsed.host_str(), parsed.port()) {
            (Some(host), Some(port)) => format!("{}://{}:{}", parsed.scheme(), host, port),
            (Some(host), None) => format!("{}://{}", parsed.scheme(), host),
            _ => "<redacted>".to_string(),
        },
        Err(_) => "<invalid url>".to_string(),
    }
}

/// Configuration for a provider endpoint
#[derive(Clone)]
pub struct ProviderConfig {
    /// RPC URL
    pub url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Client-side rate limit
    pub rate_limit: Option<RateLimitConfig>,
}

impl ProviderConfig {
    /// Creates a new provider configuration with the given URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout_secs: 30,
            rate_limit: Some(RateLimitConfig::default()),
        }
    }

    /// Sets the request timeout
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Sets or removes the rate limit
    pub fn with_rate_limit(mut self, rate_limit: Option<RateLimitConfig>) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        let parsed = Url::parse(&self.url)
            .map_err(|e| ProviderError::InvalidUrl(format!("{}: {e}", redact_endpoint(&self.url))))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ProviderError::InvalidUrl(format!(
                "unsupported scheme '{}'",
                parsed.scheme()
            )));
        }
        if self.timeout_secs == 0 {
            return Err(ProviderError::InvalidConfig("timeout must be non-zero".into()));
        }
        if let Some(rate_limit) = &self.rate_limit {
            rate_limit.quota()?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("url", &redact_endpoint(&self.url))
            .field("timeout_secs", &self.timeout_secs)
            .field("rate_limit", &self.rate_limit)
            .finish()
    }
}

// ============================================================================
// HTTP Client with Connection Pooling
// ============================================================================

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Maximum idle connections per host
    pub pool_max_idle_per_host: usize,
    /// Idle connection timeout
    pub pool_idle_timeout_secs: u64,
    /// Connection timeout
    pub connect_timeout_secs: u64,
    /// Request timeout
    pub request_timeout_secs: u64,
    /// User agent string
    pub user_agent: String,
    /// Enable gzip compression
    pub gzip: bool,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            pool_max_idle_per_host: 10,
            pool_idle_timeout_secs: 90,
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
            user_agent: format!("Tokenscope/{}", env!("CARGO_PKG_VERSION")),
            gzip: true,
        }
    }
}

/// Rate limiter configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests per second
    pub requests_per_second: u32,
    /// Burst size (max requests in a burst)
    pub burst_size: u32,
}

impl RateLimitConfig {
    fn quota(&self) -> Result<Quota> {
        let per_second = NonZeroU32::new(self.requests_per_second).ok_or_else(|| {
            ProviderError::InvalidConfig("requests_per_second must be non-zero".into())
        })?;
        let burst = NonZeroU32::new(self.burst_size)
            .ok_or_else(|| ProviderError::InvalidConfig("burst_size must be non-zero".into()))?;
        Ok(Quota::per_second(per_second).allow_burst(burst))
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 10,
            burst_size: 20,
        }
    }
}

/// RPC request payload
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest<T: Serialize> {
    /// JSON-RPC version
    pub jsonrpc: &'static str,
    /// Method name
    pub method: String,
    /// Parameters
    pub params: T,
    /// Request ID
    pub id: u64,
}

impl<T: Serialize> JsonRpcRequest<T> {
    /// Creates a new JSON-RPC request
    pub fn new(method: impl Into<String>, params: T, id: u64) -> Self {
        Self {
            jsonrpc: "2.0",
            method: method.into(),
            params,
            id,
        }
    }
}

/// RPC response payload
#[derive(Debug, Clone, serde::Deserialize)]
pub struct JsonRpcResponse<T> {
    /// JSON-RPC version
    pub jsonrpc: String,
    /// Response ID
    pub id: serde_json::Value,
    /// Result (if successful)
    pub result: Option<T>,
    /// Error (if failed)
    pub error: Option<JsonRpcError>,
}

/// RPC error
#[derive(Debug, Clone, serde::Deserialize)]
pub struct JsonRpcError {
    /// Error code
    pub code: i64,
    /// Error message
    pub message: String,
    /// Additional data
    pub data: Option<serde_json::Value>,
}

/// HTTP client with connection pooling and rate limiting
pub struct RpcClient {
    client: Client,
    rate_limiter: Option<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
    request_id: AtomicU64,
    timeout_secs: u64,
}

impl RpcClient {
    /// Creates a new RPC client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(HttpClientConfig::default(), None)
    }

    /// Creates a new RPC client with custom configuration
    pub fn with_config(
        http_config: HttpClientConfig,
        rate_limit: Option<RateLimitConfig>,
    ) -> Result<Self> {
        let client = Client::builder()
            .pool_max_idle_per_host(http_config.pool_max_idle_per_host)
            .pool_idle_timeout(Duration::from_secs(http_config.pool_idle_timeout_secs))
            .connect_timeout(Duration::from_secs(http_config.connect_timeout_secs))
            .timeout(Duration::from_secs(http_config.request_timeout_secs))
            .user_agent(&http_config.user_agent)
            .gzip(http_config.gzip)
            .build()
            .map_err(|e: reqwest::Error| ProviderError::ConnectionFailed(e.to_string()))?;

        let rate_limiter = match rate_limit {
            Some(config) => Some(RateLimiter::direct(config.quota()?)),
            None => None,
        };

        Ok(Self {
            client,
            rate_limiter,
            request_id: AtomicU64::new(1),
            timeout_secs: http_config.request_timeout_secs,
        })
    }

    fn transport_error(&self, err: reqwest::Error) -> ProviderError {
        if err.is_timeout() {
            ProviderError::Timeout(self.timeout_secs)
        } else if err.is_connect() {
            ProviderError::ConnectionFailed(err.without_url().to_string())
        } else {
            ProviderError::Http(err.without_url())
        }
    }

    /// Makes a JSON-RPC request
    pub async fn rpc_call<P, R>(&self, url: &str, method: &str, params: P) -> Result<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        if let Some(limiter) = &self.rate_limiter {
            limiter.until_ready().await;
        }

        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let request = JsonRpcRequest::new(method, params, id);
        tracing::debug!(method, id, endpoint = %redact_endpoint(url), "rpc call");

        let response = self
            .client
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::HttpStatus {
                method: method.to_string(),
                status: status.as_u16(),
            });
        }

        let rpc_response: JsonRpcResponse<R> = response
            .json()
            .await
            .map_err(|e| self.transport_error(e))?;

        if let Some(error) = rpc_response.error {
            return Err(ProviderError::RpcError {
                method: method.to_string(),
                code: error.code,
                message: error.message,
            });
        }

        rpc_response.result.ok_or_else(|| ProviderError::RpcError {
            method: method.to_string(),
            code: -1,
            message: "No result in response".to_string(),
        })
    }

    /// Returns the number of requests made
    pub fn request_count(&self) -> u64 {
        self.request_id.load(Ordering::SeqCst) - 1
    }
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient")
            .field("request_count", &self.request_count())
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .finish()
    }
}

// ============================================================================
// Provider bound to one endpoint
// ============================================================================

/// An RPC client bound to one endpoint
pub struct HttpProvider {
    client: RpcClient,
    endpoint: String,
}

impl HttpProvider {
    /// Creates a new HTTP provider
    pub fn new(config: ProviderConfig) -> Result<Self> {
        config.validate()?;

        let http_config = HttpClientConfig {
            request_timeout_secs: config.timeout_secs,
            ..Default::default()
        };
        let client = RpcClient::with_config(http_config, config.rate_limit.clone())?;

        Ok(Self {
            client,
            endpoint: config.url,
        })
    }

    /// Makes an RPC call against the bound endpoint
    pub async fn rpc_call<P, R>(&self, method: &str, params: P) -> Result<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        self.client.rpc_call(&self.endpoint, method, params).await
    }

    /// The endpoint with credentials stripped, safe to log
    pub fn redacted_endpoint(&self) -> String {
        redact_endpoint(&self.endpoint)
    }

    /// Returns the underlying RPC client
    pub fn client(&self) -> &RpcClient {
        &self.client
    }
}

impl std::fmt::Debug for HttpProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpProvider")
            .field("endpoint", &self.redacted_endpoint())
            .field("client", &self.client)
            .finish()
    }
}

/// Endpoint presets
pub mod presets {
    /// Local EIP-1193 wallet bridge (Frame's default port)
    pub const LOCAL_WALLET_BRIDGE: &str = "http://127.0.0.1:1248";

    /// Alchemy JSON-RPC endpoint for a network slug such as `eth-mainnet`
    pub fn alchemy_endpoint(network_slug: &str, api_key: &str) -> String {
        format!("https://{network_slug}.g.alchemy.com/v2/{api_key}")
    }
}
