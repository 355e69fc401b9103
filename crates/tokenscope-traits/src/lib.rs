//! # Tokenscope Traits
//!
//! Domain types shared by every Tokenscope crate, and the three seams the
//! balance controller talks through.
//!
//! ## Core Traits
//!
//! - [`WalletConnector`] - Account requests and wallet event subscriptions
//! - [`TokenDataService`] - Name resolution, token balances and token metadata
//! - [`Renderer`] - Presents controller state and user alerts
//!
//! ## Example
//!
//! ```ignore
//! use tokenscope_traits::prelude::*;
//!
//! async fn count_tokens<T: TokenDataService>(service: &T, owner: Address) -> Result<usize> {
//!     Ok(service.token_balances(owner).await?.len())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub use alloy::primitives::{Address, U256};
pub use tokenscope_error::{Result, TokenscopeError};

mod render;
mod subscription;
pub mod units;

pub use render::{Renderer, View};
pub use subscription::Subscription;
pub use units::format_units;

/// One `(contract, raw balance)` entry of a balance query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenBalance {
    /// The ERC-20 contract address
    pub contract_address: Address,
    /// Balance in the token's smallest unit
    pub raw_balance: U256,
}

impl TokenBalance {
    /// Creates a new balance entry
    pub fn new(contract_address: Address, raw_balance: U256) -> Self {
        Self {
            contract_address,
            raw_balance,
        }
    }
}

/// Display metadata of an ERC-20 contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    /// Ticker symbol, empty when the contract reports none
    pub symbol: String,
    /// Number of decimal places of the smallest unit
    pub decimals: u8,
    /// Logo image URI
    pub logo_uri: Option<String>,
    /// Full token name
    pub name: Option<String>,
}

impl TokenMetadata {
    /// Creates metadata without logo or name
    pub fn new(symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            symbol: symbol.into(),
            decimals,
            logo_uri: None,
            name: None,
        }
    }

    /// Sets the logo URI
    pub fn with_logo(mut self, uri: impl Into<String>) -> Self {
        self.logo_uri = Some(uri.into());
        self
    }

    /// Sets the token name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// A balance entry paired with the metadata of its own contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenHolding {
    /// The balance entry
    pub balance: TokenBalance,
    /// Metadata fetched for `balance.contract_address`
    pub metadata: TokenMetadata,
    /// Locale-formatted balance
    pub display_balance: String,
}

impl TokenHolding {
    /// The contract this holding belongs to
    pub fn contract_address(&self) -> Address {
        self.balance.contract_address
    }
}

/// The outcome of exactly one balance query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceQueryResult {
    /// The address that was queried
    pub owner: Address,
    /// Holdings, in the order the balance list returned them
    pub holdings: Vec<TokenHolding>,
}

impl BalanceQueryResult {
    /// Number of holdings
    pub fn len(&self) -> usize {
        self.holdings.len()
    }

    /// True when the owner holds no tokens
    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }
}

/// The chain a wallet is currently pointed at.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Network {
    /// EIP-155 chain id
    pub chain_id: u64,
    /// Human readable name
    pub name: String,
}

impl Network {
    /// Creates a network description
    pub fn new(chain_id: u64, name: impl Into<String>) -> Self {
        Self {
            chain_id,
            name: name.into(),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.chain_id)
    }
}

/// Callback invoked with the new network
pub type NetworkListener = Arc<dyn Fn(Network) + Send + Sync>;

/// Callback invoked with the new account list; empty means the wallet disconnected
pub type AccountsListener = Arc<dyn Fn(Vec<Address>) + Send + Sync>;

/// Access to a user's wallet.
///
/// Subscriptions stay active until the returned [`Subscription`] is
/// unsubscribed or dropped.
#[async_trait]
pub trait WalletConnector: Send + Sync {
    /// Asks the wallet for its accounts, prompting the user when needed
    async fn request_accounts(&self) -> Result<Vec<Address>>;

    /// Registers a listener for network changes
    fn on_network_change(&self, listener: NetworkListener) -> Subscription;

    /// Registers a listener for account changes
    fn on_accounts_changed(&self, listener: AccountsListener) -> Subscription;
}

/// Third-party token data API.
#[async_trait]
pub trait TokenDataService: Send + Sync {
    /// Resolves user input to an address.
    ///
    /// Returns `Ok(None)` when the input is neither a valid address nor a
    /// name that resolves to one.
    async fn resolve_name(&self, input: &str) -> Result<Option<Address>>;

    /// Returns the ERC-20 balances held by `owner`
    async fn token_balances(&self, owner: Address) -> Result<Vec<TokenBalance>>;

    /// Returns the metadata of one token contract
    async fn token_metadata(&self, contract: Address) -> Result<TokenMetadata>;

    /// Converts a raw integer balance to a plain decimal string
    fn format_units(&self, raw: U256, decimals: u8) -> Result<String> {
        units::format_units(raw, decimals)
    }
}

/// Parses a hex account address.
///
/// Accepts all-lowercase and all-uppercase hex as is; mixed case must carry
/// a valid EIP-55 checksum.
pub fn parse_hex_address(input: &str) -> Option<Address> {
    let hex = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))?;
    if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    let has_lower = hex.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = hex.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper {
        Address::parse_checksummed(format!("0x{hex}"), None).ok()
    } else {
        Address::from_str(hex).ok()
    }
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        format_units, parse_hex_address, AccountsListener, Address, BalanceQueryResult, Network,
        NetworkListener, Renderer, Result, Subscription, TokenBalance,
        TokenDataService, TokenHolding, TokenMetadata, TokenscopeError, View, WalletConnector,
        U256,
    };
}
