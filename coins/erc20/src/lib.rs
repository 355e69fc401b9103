//! Tokenscope ERC-20 data
//!
//! This crate implements [`TokenDataService`](tokenscope_traits::TokenDataService)
//! on top of the Alchemy Token API: ERC-20 balance listings, per-contract
//! metadata, and ENS name resolution through the registry contract.

#![forbid(unsafe_code)]
#![allow(missing_docs)]

pub mod alchemy;
pub mod ens;
pub mod registry;

pub use alchemy::{AlchemyTokenService, DEFAULT_DECIMALS};
pub use ens::{namehash, EnsResolver, ENS_REGISTRY};
pub use registry::{network_for_chain_id, EvmChain};

/// Exposes commonly used types when working with ERC-20 token data.
pub mod prelude {
    pub use super::alchemy::AlchemyTokenService;
    pub use super::ens::EnsResolver;
    pub use super::registry::EvmChain;
}
