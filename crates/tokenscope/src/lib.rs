//! # Tokenscope - ERC-20 Balance Viewer
//!
//! Tokenscope shows the ERC-20 token balances of an Ethereum address: the
//! address typed by the user, an ENS name, or the account of a connected
//! wallet.
//!
//! The [`BalanceQueryController`] owns the view state and talks to three
//! collaborators: a [`WalletConnector`](traits::WalletConnector), a
//! [`TokenDataService`](traits::TokenDataService) and a
//! [`Renderer`](traits::Renderer). Concrete implementations live behind
//! feature flags.
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `erc20` | Alchemy token data service with ENS resolution |
//! | `ethereum` | JSON-RPC wallet bridge connector |
//! | `full` | Both of the above (default) |
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tokenscope::prelude::*;
//! use tokenscope::erc20::{AlchemyTokenService, EvmChain};
//! use tokenscope::ethereum::{RpcWalletConnector, WalletBridge};
//!
//! let controller = BalanceQueryController::builder()
//!     .wallet(Arc::new(RpcWalletConnector::new(WalletBridge::local()?)))
//!     .data_service(Arc::new(AlchemyTokenService::new(EvmChain::Ethereum, &api_key)?))
//!     .renderer(renderer)
//!     .build()?;
//!
//! controller.submit_query("vitalik.eth").await?;
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod controller;
pub mod format;
mod session;

pub use controller::{BalanceQueryController, ControllerBuilder, QueryOutcome, SkipReason};
pub use format::{format_balance, round_decimal, BalanceFormatter, DisplayLocale, FractionPolicy};

// ============================================================================
// Re-exports
// ============================================================================

pub use tokenscope_error as error;
pub use tokenscope_traits as traits;

/// Alchemy token data and ENS resolution
#[cfg(feature = "erc20")]
#[cfg_attr(docsrs, doc(cfg(feature = "erc20")))]
pub mod erc20 {
    pub use tokenscope_erc20::*;
}

/// Wallet connector over a local JSON-RPC bridge
#[cfg(feature = "ethereum")]
#[cfg_attr(docsrs, doc(cfg(feature = "ethereum")))]
pub mod ethereum {
    pub use tokenscope_ethereum::*;
}

// ============================================================================
// Prelude - commonly used types
// ============================================================================

/// Prelude module for convenient imports
///
/// ```ignore
/// use tokenscope::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{BalanceFormatter, BalanceQueryController, DisplayLocale, QueryOutcome, SkipReason};
    pub use tokenscope_traits::prelude::*;
}

// ============================================================================
// Version information
// ============================================================================

/// Returns the Tokenscope version
pub const fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
