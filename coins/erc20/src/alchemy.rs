//! Token data from the Alchemy Token API

use crate::ens::EnsResolver;
use crate::registry::EvmChain;
use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tokenscope_error::{Result, TokenscopeError};
use tokenscope_provider::{presets, HttpProvider, ProviderConfig};
use tokenscope_traits::{parse_hex_address, TokenBalance, TokenDataService, TokenMetadata};

/// Decimals assumed when a contract does not report any
pub const DEFAULT_DECIMALS: u8 = 18;

const MAX_BALANCE_PAGES: usize = 100;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenBalancesResponse {
    token_balances: Vec<RawTokenBalance>,
    #[serde(default)]
    page_key: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTokenBalance {
    contract_address: Address,
    token_balance: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawTokenMetadata {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    symbol: Option<String>,
    #[serde(default)]
    decimals: Option<u64>,
    #[serde(default)]
    logo: Option<String>,
}

impl From<RawTokenMetadata> for TokenMetadata {
    fn from(raw: RawTokenMetadata) -> Self {
        let decimals = raw
            .decimals
            .and_then(|d| u8::try_from(d).ok())
            .unwrap_or(DEFAULT_DECIMALS);
        TokenMetadata {
            symbol: raw.symbol.unwrap_or_default(),
            decimals,
            logo_uri: raw.logo.filter(|l| !l.is_empty()),
            name: raw.name.filter(|n| !n.is_empty()),
        }
    }
}

/// Parses a hex quantity as returned by the API; `0x` alone is zero
fn parse_quantity(value: &str) -> Result<U256> {
    let hex = value.strip_prefix("0x").unwrap_or(value);
    if hex.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(hex, 16)
        .map_err(|e| TokenscopeError::FormatError(format!("bad token balance '{value}': {e}")))
}

/// [`TokenDataService`] backed by an Alchemy endpoint
#[derive(Debug, Clone)]
pub struct AlchemyTokenService {
    provider: Arc<HttpProvider>,
    ens: EnsResolver,
    chain: EvmChain,
}

impl AlchemyTokenService {
    /// Connects to the Alchemy endpoint of `chain` with default settings
    pub fn new(chain: EvmChain, api_key: &str) -> Result<Self> {
        let config = ProviderConfig::new(presets::alchemy_endpoint(chain.alchemy_slug(), api_key));
        Self::with_config(chain, config)
    }

    /// Connects with a custom endpoint configuration
    pub fn with_config(chain: EvmChain, config: ProviderConfig) -> Result<Self> {
        let provider = Arc::new(HttpProvider::new(config)?);
        tracing::info!(
            network = %chain,
            endpoint = %provider.redacted_endpoint(),
            "token data service ready"
        );
        Ok(Self {
            ens: EnsResolver::new(provider.clone()),
            provider,
            chain,
        })
    }

    /// The chain this service queries
    pub fn chain(&self) -> EvmChain {
        self.chain
    }

    async fn balances_page(
        &self,
        owner: Address,
        page_key: Option<&str>,
    ) -> Result<TokenBalancesResponse> {
        let params = match page_key {
            Some(key) => json!([owner, "erc20", { "pageKey": key }]),
            None => json!([owner, "erc20"]),
        };
        Ok(self
            .provider
            .rpc_call("alchemy_getTokenBalances", params)
            .await?)
    }
}

#[async_trait]
impl TokenDataService for AlchemyTokenService {
    async fn resolve_name(&self, input: &str) -> Result<Option<Address>> {
        let input = input.trim();
        if let Some(address) = parse_hex_address(input) {
            return Ok(Some(address));
        }
        if !input.contains('.') || input.starts_with("0x") {
            return Ok(None);
        }
        if !self.chain.supports_ens() {
            tracing::warn!(network = %self.chain, name = input, "ENS is not available on this network");
            return Ok(None);
        }
        self.ens.resolve(input).await
    }

    async fn token_balances(&self, owner: Address) -> Result<Vec<TokenBalance>> {
        let mut balances = Vec::new();
        let mut page_key: Option<String> = None;

        for _ in 0..MAX_BALANCE_PAGES {
            let page = self.balances_page(owner, page_key.as_deref()).await?;

            for entry in page.token_balances {
                let raw_balance = match (&entry.token_balance, &entry.error) {
                    (Some(value), _) => parse_quantity(value)?,
                    (None, error) => {
                        tracing::warn!(
                            contract = %entry.contract_address,
                            error = error.as_deref().unwrap_or("missing balance"),
                            "treating token balance as zero"
                        );
                        U256::ZERO
                    }
                };
                balances.push(TokenBalance::new(entry.contract_address, raw_balance));
            }

            match page.page_key {
                Some(key) if !key.is_empty() => page_key = Some(key),
                _ => {
                    tracing::debug!(%owner, count = balances.len(), "fetched token balances");
                    return Ok(balances);
                }
            }
        }

        tracing::warn!(%owner, pages = MAX_BALANCE_PAGES, "stopped following balance pages");
        Ok(balances)
    }

    async fn token_metadata(&self, contract: Address) -> Result<TokenMetadata> {
        let raw: RawTokenMetadata = self
            .provider
            .rpc_call("alchemy_getTokenMetadata", [contract])
            .await?;
        if raw.decimals.is_none() {
            tracing::debug!(%contract, "token reports no decimals, assuming {DEFAULT_DECIMALS}");
        }
        Ok(raw.into())
    }
}
