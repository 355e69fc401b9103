//! Configuration

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tokenscope::erc20::EvmChain;
use tokenscope_provider::{presets, ProviderConfig, RateLimitConfig};

/// Environment variable holding the Alchemy API key
pub const API_KEY_VAR: &str = "ALCHEMY_API_KEY";

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenscopeConfig {
    /// Never written back out
    #[serde(skip_serializing)]
    pub alchemy_api_key: Option<String>,
    pub network: EvmChain,
    pub wallet_rpc_url: String,
    pub locale: Option<String>,
    pub poll_interval_ms: u64,
    pub request_timeout_secs: u64,
    pub requests_per_second: u32,
}

/// Values given on the command line
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub network: Option<EvmChain>,
    pub wallet_rpc_url: Option<String>,
    pub locale: Option<String>,
}

impl Default for TokenscopeConfig {
    fn default() -> Self {
        Self {
            alchemy_api_key: None,
            network: EvmChain::Ethereum,
            wallet_rpc_url: presets::LOCAL_WALLET_BRIDGE.to_string(),
            locale: None,
            poll_interval_ms: 1000,
            request_timeout_secs: 30,
            requests_per_second: 10,
        }
    }
}

impl TokenscopeConfig {
    /// Defaults, then `path` if given, then the process environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_vars(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing config file {}", path.display()))
    }

    /// Applies environment variables found through `lookup`
    pub fn apply_vars(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(key) = lookup(API_KEY_VAR).filter(|k| !k.trim().is_empty()) {
            self.alchemy_api_key = Some(key.trim().to_string());
        }
        if let Some(network) = lookup("TOKENSCOPE_NETWORK") {
            self.network = network
                .parse()
                .map_err(|e: String| anyhow::anyhow!("TOKENSCOPE_NETWORK: {e}"))?;
        }
        if let Some(url) = lookup("TOKENSCOPE_WALLET_RPC") {
            self.wallet_rpc_url = url;
        }
        if let Some(locale) = lookup("TOKENSCOPE_LOCALE") {
            self.locale = Some(locale);
        }
        if let Some(ms) = lookup("TOKENSCOPE_POLL_MS") {
            self.poll_interval_ms = ms.parse().context("TOKENSCOPE_POLL_MS")?;
        }
        if let Some(secs) = lookup("TOKENSCOPE_TIMEOUT_SECS") {
            self.request_timeout_secs = secs.parse().context("TOKENSCOPE_TIMEOUT_SECS")?;
        }
        Ok(())
    }

    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(network) = overrides.network {
            self.network = network;
        }
        if let Some(url) = overrides.wallet_rpc_url {
            self.wallet_rpc_url = url;
        }
        if overrides.locale.is_some() {
            self.locale = overrides.locale;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.api_key()?;
        if self.poll_interval_ms == 0 {
            bail!("poll_interval_ms must be non-zero");
        }
        if self.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be non-zero");
        }
        if self.requests_per_second == 0 {
            bail!("requests_per_second must be non-zero");
        }
        ProviderConfig::new(self.wallet_rpc_url.as_str())
            .validate()
            .context("wallet_rpc_url")?;
        Ok(())
    }

    pub fn api_key(&self) -> Result<&str> {
        match self.alchemy_api_key.as_deref() {
            Some(key) if !key.is_empty() => Ok(key),
            _ => bail!("no Alchemy API key configured, set {API_KEY_VAR}"),
        }
    }

    /// Endpoint settings for the token data service
    pub fn provider_config(&self) -> Result<ProviderConfig> {
        let url = presets::alchemy_endpoint(self.network.alchemy_slug(), self.api_key()?);
        Ok(ProviderConfig::new(url)
            .with_timeout(self.request_timeout_secs)
            .with_rate_limit(Some(RateLimitConfig {
                requests_per_second: self.requests_per_second,
                burst_size: self.requests_per_second.saturating_mul(2),
            })))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl fmt::Debug for TokenscopeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenscopeConfig")
            .field(
                "alchemy_api_key",
                &self.alchemy_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("network", &self.network)
            .field("wallet_rpc_url", &self.wallet_rpc_url)
            .field("locale", &self.locale)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("requests_per_second", &self.requests_per_second)
            .finish()
    }
}
