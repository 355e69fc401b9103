//! EVM networks served by the token data API

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tokenscope_traits::Network;

/// EVM Chain identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvmChain {
    #[default]
    Ethereum = 1,
    Sepolia = 11155111,
    Polygon = 137,
    Avalanche = 43114,
    Base = 8453,
    Arbitrum = 42161,
    Optimism = 10,
}

impl EvmChain {
    /// All supported chains
    pub const ALL: [EvmChain; 7] = [
        Self::Ethereum,
        Self::Sepolia,
        Self::Polygon,
        Self::Avalanche,
        Self::Base,
        Self::Arbitrum,
        Self::Optimism,
    ];

    /// Get chain ID
    pub fn chain_id(&self) -> u64 {
        *self as u64
    }

    /// Looks a chain up by its EIP-155 id
    pub fn from_chain_id(chain_id: u64) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.chain_id() == chain_id)
    }

    /// Get chain name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ethereum => "Ethereum",
            Self::Sepolia => "Sepolia",
            Self::Polygon => "Polygon",
            Self::Avalanche => "Avalanche",
            Self::Base => "Base",
            Self::Arbitrum => "Arbitrum",
            Self::Optimism => "Optimism",
        }
    }

    /// Subdomain of the Alchemy endpoint for this chain
    pub fn alchemy_slug(&self) -> &'static str {
        match self {
            Self::Ethereum => "eth-mainnet",
            Self::Sepolia => "eth-sepolia",
            Self::Polygon => "polygon-mainnet",
            Self::Avalanche => "avax-mainnet",
            Self::Base => "base-mainnet",
            Self::Arbitrum => "arb-mainnet",
            Self::Optimism => "opt-mainnet",
        }
    }

    /// True where the canonical ENS registry is deployed
    pub fn supports_ens(&self) -> bool {
        matches!(self, Self::Ethereum | Self::Sepolia)
    }

    /// The wallet-facing network description
    pub fn network(&self) -> Network {
        Network::new(self.chain_id(), self.name())
    }
}

/// Describes any chain id, naming the ones we know
pub fn network_for_chain_id(chain_id: u64) -> Network {
    match EvmChain::from_chain_id(chain_id) {
        Some(chain) => chain.network(),
        None => Network::new(chain_id, format!("Chain {chain_id}")),
    }
}

impl fmt::Display for EvmChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EvmChain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        if let Ok(id) = lower.parse::<u64>() {
            return Self::from_chain_id(id).ok_or_else(|| format!("unsupported chain id {id}"));
        }
        Self::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(&lower) || c.alchemy_slug() == lower)
            .or(match lower.as_str() {
                "mainnet" | "eth" => Some(Self::Ethereum),
                "matic" => Some(Self::Polygon),
                "avax" => Some(Self::Avalanche),
                "arb" => Some(Self::Arbitrum),
                "op" => Some(Self::Optimism),
                _ => None,
            })
            .ok_or_else(|| format!("unknown network '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evm_chain_ids() {
        assert_eq!(EvmChain::Ethereum.chain_id(), 1);
        assert_eq!(EvmChain::Sepolia.chain_id(), 11155111);
        assert_eq!(EvmChain::Polygon.chain_id(), 137);
        assert_eq!(EvmChain::Avalanche.chain_id(), 43114);
        assert_eq!(EvmChain::Base.chain_id(), 8453);
        assert_eq!(EvmChain::Arbitrum.chain_id(), 42161);
    }

    #[test]
    fn test_from_chain_id() {
        for chain in EvmChain::ALL {
            assert_eq!(EvmChain::from_chain_id(chain.chain_id()), Some(chain));
        }
        assert_eq!(EvmChain::from_chain_id(999_999), None);
    }

    #[test]
    fn test_evm_chain_names() {
        assert_eq!(EvmChain::Ethereum.name(), "Ethereum");
        assert_eq!(EvmChain::Polygon.to_string(), "Polygon");
    }

    #[test]
    fn test_alchemy_slugs() {
        assert_eq!(EvmChain::Ethereum.alchemy_slug(), "eth-mainnet");
        assert_eq!(EvmChain::Arbitrum.alchemy_slug(), "arb-mainnet");
    }

    #[test]
    fn test_parse_chain() {
        assert_eq!("ethereum".parse::<EvmChain>(), Ok(EvmChain::Ethereum));
        assert_eq!("Polygon".parse::<EvmChain>(), Ok(EvmChain::Polygon));
        assert_eq!("base-mainnet".parse::<EvmChain>(), Ok(EvmChain::Base));
        assert_eq!("mainnet".parse::<EvmChain>(), Ok(EvmChain::Ethereum));
        assert_eq!("10".parse::<EvmChain>(), Ok(EvmChain::Optimism));
        assert!("dogechain".parse::<EvmChain>().is_err());
        assert!("12345".parse::<EvmChain>().is_err());
    }

    #[test]
    fn test_network_for_chain_id() {
        assert_eq!(network_for_chain_id(1), Network::new(1, "Ethereum"));
        assert_eq!(network_for_chain_id(31337).name, "Chain 31337");
    }

    #[test]
    fn test_ens_support() {
        assert!(EvmChain::Ethereum.supports_ens());
        assert!(!EvmChain::Polygon.supports_ens());
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&EvmChain::Arbitrum).unwrap();
        assert_eq!(json, "\"arbitrum\"");
        let back: EvmChain = serde_json::from_str("\"sepolia\"").unwrap();
        assert_eq!(back, EvmChain::Sepolia);
    }
}
