//! This prelude module simplifies importing many useful items from the tokenscope_ethereum crate using a glob import.
//!
//! To use this prelude, add the following to your code:
//! ```
//! use tokenscope_ethereum::prelude::*;
//! ```

pub use crate::{RpcWalletConnector, WalletBridge};

pub use tokenscope_traits::{Address, Network, Subscription, WalletConnector};
