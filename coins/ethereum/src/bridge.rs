use alloy::primitives::Address;
use std::sync::Arc;
use tokenscope_error::{Result, TokenscopeError};
use tokenscope_provider::{presets, HttpProvider, ProviderConfig, ProviderError};

/// Serializes as `"params":[]`. Strict bridges reject a null params field.
const NO_PARAMS: [(); 0] = [];

/// JSON-RPC access to an EIP-1193 wallet exposed over HTTP, such as Frame.
#[derive(Debug, Clone)]
pub struct WalletBridge {
    provider: Arc<HttpProvider>,
}

impl WalletBridge {
    /// Connects to a wallet bridge at `url`
    pub fn new(url: &str, timeout_secs: u64) -> Result<Self> {
        // Local bridge, no client-side rate limit
        let config = ProviderConfig::new(url)
            .with_timeout(timeout_secs)
            .with_rate_limit(None);
        Ok(Self {
            provider: Arc::new(HttpProvider::new(config)?),
        })
    }

    /// Connects to the default local bridge
    pub fn local() -> Result<Self> {
        Self::new(presets::LOCAL_WALLET_BRIDGE, 30)
    }

    /// The bridge endpoint, safe to log
    pub fn endpoint(&self) -> String {
        self.provider.redacted_endpoint()
    }

    /// Asks the wallet to expose its accounts, which may prompt the user
    pub async fn request_accounts(&self) -> Result<Vec<Address>> {
        self.provider
            .rpc_call("eth_requestAccounts", NO_PARAMS)
            .await
            .map_err(|e| self.unavailable(e))
    }

    /// Accounts currently exposed, without prompting
    pub async fn accounts(&self) -> Result<Vec<Address>> {
        Ok(self.provider.rpc_call("eth_accounts", NO_PARAMS).await?)
    }

    /// Chain id the wallet is pointed at
    pub async fn chain_id(&self) -> Result<u64> {
        let hex: String = self.provider.rpc_call("eth_chainId", NO_PARAMS).await?;
        parse_chain_id(&hex)
    }

    fn unavailable(&self, err: ProviderError) -> TokenscopeError {
        match err {
            ProviderError::RpcError { message, .. } => TokenscopeError::WalletUnavailable(message),
            ProviderError::ConnectionFailed(_) | ProviderError::Timeout(_) => {
                TokenscopeError::WalletUnavailable(format!("no wallet reachable at {}", self.endpoint()))
            }
            other => TokenscopeError::WalletUnavailable(TokenscopeError::from(other).to_string()),
        }
    }
}

pub(crate) fn parse_chain_id(hex: &str) -> Result<u64> {
    let digits = hex.strip_prefix("0x").unwrap_or(hex);
    u64::from_str_radix(digits, 16)
        .map_err(|e| TokenscopeError::FormatError(format!("bad chain id '{hex}': {e}")))
}
