//! # Tokenscope Error
//!
//! Unified error types for Tokenscope. Every crate in the workspace reports
//! failures through [`TokenscopeError`] so the controller can decide, in one
//! place, what the user gets to see.
//!
//! ## Error Categories
//!
//! - Input errors: the typed address did not validate or resolve
//! - Query errors: the balance or metadata chain failed
//! - Wallet errors: the wallet refused or could not be reached
//! - Transport errors: RPC connection, request and timeout failures
//!
//! ## Example
//!
//! ```
//! use tokenscope_error::{TokenscopeError, Result};
//!
//! fn require_hex(input: &str) -> Result<()> {
//!     if !input.starts_with("0x") {
//!         return Err(TokenscopeError::InvalidAddress {
//!             input: input.to_string(),
//!             reason: "missing 0x prefix".to_string(),
//!         });
//!     }
//!     Ok(())
//! }
//!
//! assert!(require_hex("vitalik").is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use thiserror::Error;

/// The main error type for Tokenscope operations.
#[derive(Error, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TokenscopeError {
    // ============ Input Errors ============
    /// Typed input failed validation or name resolution
    #[error("Invalid address '{input}': {reason}")]
    InvalidAddress {
        /// The raw user input
        input: String,
        /// Reason for rejection
        reason: String,
    },

    // ============ Query Errors ============
    /// Any failure in the balance/metadata fetch chain
    #[error("Query for {target} failed: {reason}")]
    QueryFailed {
        /// Address being queried
        target: String,
        /// Underlying failure
        reason: String,
    },

    // ============ Wallet Errors ============
    /// Wallet could not be reached or refused the account request
    #[error("Wallet unavailable: {0}")]
    WalletUnavailable(String),

    /// Operation requires a connected wallet
    #[error("No wallet connected")]
    NotConnected,

    /// Unsubscribing from a wallet event failed
    #[error("Subscription error on '{topic}': {reason}")]
    Subscription {
        /// Event topic ("network", "accountsChanged")
        topic: String,
        /// Error reason
        reason: String,
    },

    // ============ Network Errors ============
    /// RPC connection failed
    #[error("RPC connection failed: {reason}")]
    RpcConnectionError {
        /// Error reason
        reason: String,
    },

    /// RPC request failed
    #[error("RPC request failed: {method} - {reason}")]
    RpcRequestError {
        /// RPC method name
        method: String,
        /// Error reason
        reason: String,
    },

    /// Network timeout
    #[error("Network timeout after {seconds}s")]
    NetworkTimeout {
        /// Timeout duration
        seconds: u64,
    },

    // ============ Contract Errors ============
    /// Contract call failed
    #[error("Contract call failed: {0}")]
    ContractError(String),

    /// ABI encoding/decoding error
    #[error("ABI error: {0}")]
    AbiError(String),

    // ============ Parsing Errors ============
    /// JSON parse error
    #[error("JSON error: {0}")]
    JsonError(String),

    /// Invalid format
    #[error("Invalid format: {0}")]
    FormatError(String),

    // ============ Configuration Errors ============
    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // ============ Generic ============
    /// Unknown/other error
    #[error("{0}")]
    Other(String),
}

/// Convenient Result type using TokenscopeError
pub type Result<T> = std::result::Result<T, TokenscopeError>;

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ErrorCode {
    /// Unknown error
    Unknown = 0,
    /// Invalid address
    InvalidAddress = 1001,
    /// Query failed
    QueryFailed = 2001,
    /// Wallet unavailable
    WalletUnavailable = 3001,
    /// No wallet connected
    NotConnected = 3002,
    /// Subscription error
    Subscription = 3003,
    /// RPC connection error
    RpcConnectionError = 4001,
    /// RPC request error
    RpcRequestError = 4002,
    /// Network timeout
    NetworkTimeout = 4003,
    /// Contract error
    ContractError = 5001,
    /// Configuration error
    ConfigError = 6001,
}

impl TokenscopeError {
    /// Returns the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            TokenscopeError::InvalidAddress { .. } => ErrorCode::InvalidAddress,
            TokenscopeError::QueryFailed { .. } => ErrorCode::QueryFailed,
            TokenscopeError::WalletUnavailable(_) => ErrorCode::WalletUnavailable,
            TokenscopeError::NotConnected => ErrorCode::NotConnected,
            TokenscopeError::Subscription { .. } => ErrorCode::Subscription,
            TokenscopeError::RpcConnectionError { .. } => ErrorCode::RpcConnectionError,
            TokenscopeError::RpcRequestError { .. } => ErrorCode::RpcRequestError,
            TokenscopeError::NetworkTimeout { .. } => ErrorCode::NetworkTimeout,
            TokenscopeError::ContractError(_) | TokenscopeError::AbiError(_) => {
                ErrorCode::ContractError
            }
            TokenscopeError::ConfigError(_) => ErrorCode::ConfigError,
            _ => ErrorCode::Unknown,
        }
    }

    /// Wraps any failure from the fetch chain as a query failure for `target`.
    ///
    /// Errors that already are query or input failures pass through unchanged.
    pub fn into_query_failure(self, target: impl std::fmt::Display) -> Self {
        match self {
            err @ (TokenscopeError::QueryFailed { .. } | TokenscopeError::InvalidAddress { .. }) => {
                err
            }
            other => TokenscopeError::QueryFailed {
                target: target.to_string(),
                reason: other.to_string(),
            },
        }
    }

    /// Returns true if this error is shown to the user.
    ///
    /// Subscription teardown failures are best-effort and only logged.
    pub fn is_user_visible(&self) -> bool {
        !matches!(self, TokenscopeError::Subscription { .. })
    }

    /// The short message presented in a user alert
    pub fn alert_message(&self) -> &'static str {
        match self {
            TokenscopeError::InvalidAddress { .. } => "Invalid address",
            TokenscopeError::WalletUnavailable(_) | TokenscopeError::NotConnected => {
                "Wallet connection failed"
            }
            TokenscopeError::ConfigError(_) => "Configuration error",
            _ => "Query failed",
        }
    }
}
