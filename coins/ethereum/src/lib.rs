//! # Tokenscope Ethereum Wallet
//!
//! Connects Tokenscope to a user's Ethereum wallet.
//!
//! Browser extensions expose the wallet through an injected EIP-1193
//! provider. Desktop wallets such as Frame expose the same JSON-RPC methods
//! over HTTP on a local port; [`RpcWalletConnector`] talks to that bridge.
//!
//! ## Quickstart Guide
//!
//! ```no_run
//! use tokenscope_ethereum::prelude::*;
//!
//! # async fn connect() -> tokenscope_error::Result<()> {
//! let connector = RpcWalletConnector::new(WalletBridge::local()?);
//! let accounts = connector.request_accounts().await?;
//! println!("connected: {:?}", accounts.first());
//!
//! let _network = connector.on_network_change(std::sync::Arc::new(|network: Network| {
//!     println!("network: {network}");
//! }));
//! # Ok(())
//! # }
//! ```
//!
//! The wallet bridge has no push channel, so subscriptions poll
//! `eth_chainId` and `eth_accounts`. Dropping a [`Subscription`](tokenscope_traits::Subscription)
//! stops its poller.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod bridge;
pub use bridge::WalletBridge;
mod connector;
pub use connector::{RpcWalletConnector, DEFAULT_POLL_INTERVAL};
pub mod prelude;
