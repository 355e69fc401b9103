//! # Tokenscope Testing Infrastructure
//!
//! Testing utilities for the Tokenscope workspace:
//! - Controllable mocks for the three controller seams
//! - Edge case addresses and amounts
//! - Property-based testing strategies
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tokenscope_testing::*;
//!
//! let wallet = Arc::new(MockWalletConnector::with_accounts(vec![alice()]));
//! let service = Arc::new(MockTokenService::new());
//! service.add_token(alice(), usdc(), U256::from(1_000_000u64), TokenMetadata::new("USDC", 6));
//!
//! proptest! {
//!     #[test]
//!     fn test_formatting(raw in raw_balance(), decimals in token_decimals()) {
//!         // ...
//!     }
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use proptest::prelude::*;
use tokenscope_traits::{parse_hex_address, Address, U256};

mod mocks;

pub use mocks::{MockTokenService, MockWalletConnector, RecordingRenderer};

// ============================================================================
// Edge Case Addresses
// ============================================================================

/// Edge case address inputs for validation tests
pub struct EdgeCaseAddresses;

impl EdgeCaseAddresses {
    /// Valid checksummed Ethereum address
    pub const ETH_CHECKSUMMED: &'static str = "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045";

    /// Same address, all lowercase
    pub const ETH_LOWERCASE: &'static str = "0xd8da6bf26964af9d7eed9e03e53415d37aa96045";

    /// Second valid address
    pub const ETH_SECOND: &'static str = "0xAb5801a7D398351b8bE11C439e05C5B3259aeC9B";

    /// Ethereum zero address
    pub const ETH_ZERO: &'static str = "0x0000000000000000000000000000000000000000";

    /// Ethereum max address
    pub const ETH_MAX: &'static str = "0xFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF";

    /// Mixed case with a broken checksum
    pub const ETH_BAD_CHECKSUM: &'static str = "0xd8DA6BF26964aF9D7eEd9e03E53415D37aA96045";

    /// A registered-looking ENS name
    pub const ENS_NAME: &'static str = "vitalik.eth";

    /// Valid hex inputs
    pub fn valid_ethereum() -> Vec<&'static str> {
        vec![
            Self::ETH_CHECKSUMMED,
            Self::ETH_LOWERCASE,
            Self::ETH_SECOND,
            Self::ETH_ZERO,
            Self::ETH_MAX,
        ]
    }

    /// Invalid Ethereum addresses
    pub fn invalid_ethereum() -> Vec<&'static str> {
        vec![
            "",
            "0x",
            "0xGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGG", // Invalid hex
            "0x742d35Cc6634C0532925a3b844Bc9e7595f5",      // Too short
            "742d35Cc6634C0532925a3b844Bc9e7595f5fFb9",    // Missing 0x
            Self::ETH_BAD_CHECKSUM,
            "not an address",
        ]
    }
}

/// First test account
pub fn alice() -> Address {
    address(EdgeCaseAddresses::ETH_CHECKSUMMED)
}

/// Second test account
pub fn bob() -> Address {
    address(EdgeCaseAddresses::ETH_SECOND)
}

/// USDC on Ethereum mainnet
pub fn usdc() -> Address {
    address("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48")
}

/// DAI on Ethereum mainnet
pub fn dai() -> Address {
    address("0x6B175474E89094C44Da98b954EedeAC495271d0F")
}

/// WBTC on Ethereum mainnet
pub fn wbtc() -> Address {
    address("0x2260FAC5E5542a773Aa44fBCfeDf7C193bc2C599")
}

fn address(hex: &str) -> Address {
    parse_hex_address(hex).unwrap_or_else(|| panic!("fixture address {hex} is invalid"))
}

// ============================================================================
// Edge Case Amounts
// ============================================================================

/// Edge case raw balances for formatting tests
pub struct EdgeCaseAmounts;

impl EdgeCaseAmounts {
    /// 1.2345 of an 18-decimal token
    pub const ONE_POINT_2345: u128 = 1_234_500_000_000_000_000;

    /// One smallest unit
    pub const MIN: u64 = 1;

    /// 1 million tokens with 18 decimals
    pub const LARGE_18: u128 = 1_000_000_000_000_000_000_000_000;

    /// `(raw, decimals)` pairs that stress rounding and digit grouping
    pub fn rounding_cases() -> Vec<(U256, u8)> {
        vec![
            (U256::ZERO, 18),
            (U256::from(1u64), 18),
            (U256::from(5u64), 11),
            (U256::from(Self::ONE_POINT_2345), 18),
            (U256::from(999_999_999_995u64), 12),
            (U256::from(Self::LARGE_18), 18),
            (U256::from(123_456_789u64), 0),
            (U256::MAX, 18),
            (U256::MAX, 0),
        ]
    }
}

// ============================================================================
// Property-Based Testing Strategies
// ============================================================================

/// Generates arbitrary 20-byte addresses
pub fn any_address() -> impl Strategy<Value = Address> {
    prop::array::uniform20(any::<u8>()).prop_map(Address::from)
}

/// Generates raw balances across the full `U256` range
pub fn raw_balance() -> impl Strategy<Value = U256> {
    prop_oneof![
        any::<u64>().prop_map(U256::from),
        any::<u128>().prop_map(U256::from),
        prop::array::uniform32(any::<u8>()).prop_map(U256::from_be_bytes),
    ]
}

/// Generates realistic token decimals
pub fn token_decimals() -> impl Strategy<Value = u8> {
    prop_oneof![Just(0u8), Just(6u8), Just(8u8), Just(18u8), 0u8..=36u8]
}

/// Generates distinct contract addresses
pub fn distinct_contracts(max: usize) -> impl Strategy<Value = Vec<Address>> {
    prop::collection::hash_set(any_address(), 0..=max).prop_map(|set| set.into_iter().collect())
}

// ============================================================================
// Tests
// ============================================================================
