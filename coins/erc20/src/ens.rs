//! ENS forward resolution over plain `eth_call`

use alloy::primitives::{address, Address, Bytes, B256};
use alloy::sol;
use alloy::sol_types::SolCall;
use serde_json::json;
use std::sync::Arc;
use tokenscope_error::{Result, TokenscopeError};
use tokenscope_provider::HttpProvider;

/// ENS registry, same address on mainnet and Sepolia
pub const ENS_REGISTRY: Address = address!("00000000000C2E074eC69A0dFb2997BA6C7d2e1e");

sol! {
    interface IEnsRegistry {
        function resolver(bytes32 node) external view returns (address);
    }

    interface IEnsResolver {
        function addr(bytes32 node) external view returns (address);
    }
}

/// Computes the EIP-137 namehash of a dot-separated name.
///
/// Surrounding whitespace is dropped and labels are lowercased before
/// hashing with [`alloy_ens::namehash`].
pub fn namehash(name: &str) -> B256 {
    alloy_ens::namehash(&name.trim().to_lowercase())
}

/// Resolves ENS names through the registry and the name's resolver
#[derive(Debug, Clone)]
pub struct EnsResolver {
    provider: Arc<HttpProvider>,
    registry: Address,
}

impl EnsResolver {
    /// Creates a resolver against the canonical registry
    pub fn new(provider: Arc<HttpProvider>) -> Self {
        Self::with_registry(provider, ENS_REGISTRY)
    }

    /// Creates a resolver against a custom registry
    pub fn with_registry(provider: Arc<HttpProvider>, registry: Address) -> Self {
        Self { provider, registry }
    }

    async fn call_contract<C: SolCall>(&self, to: Address, call: C) -> Result<C::Return> {
        let data = Bytes::from(call.abi_encode());
        let result: Bytes = self
            .provider
            .rpc_call("eth_call", (json!({ "to": to, "data": data }), "latest"))
            .await?;

        C::abi_decode_returns(&result)
            .map_err(|e| TokenscopeError::AbiError(format!("Decode error: {e}")))
    }

    /// Returns the address a name points to, or `None` when the name has no
    /// resolver or no address record
    pub async fn resolve(&self, name: &str) -> Result<Option<Address>> {
        let node = namehash(name);

        let resolver = self
            .call_contract(self.registry, IEnsRegistry::resolverCall { node })
            .await?;
        if resolver.is_zero() {
            tracing::debug!(name, "no ENS resolver");
            return Ok(None);
        }

        let resolved = self
            .call_contract(resolver, IEnsResolver::addrCall { node })
            .await?;
        if resolved.is_zero() {
            tracing::debug!(name, %resolver, "ENS name has no address record");
            return Ok(None);
        }

        Ok(Some(resolved))
    }
}
