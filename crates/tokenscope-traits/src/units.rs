//! Raw integer amounts and their decimal representation.

use crate::U256;
use alloy::primitives::utils::format_units as alloy_format_units;
use tokenscope_error::{Result, TokenscopeError};

/// Largest decimal count alloy's unit type accepts (`10^77` is the largest
/// power of ten that fits in a `U256`).
pub const MAX_DECIMALS: u8 = 77;

/// Divides `raw` by `10^decimals` exactly and renders it in plain decimal,
/// with every fractional digit kept: `format_units(1_500_000, 6) == "1.500000"`.
///
/// Tokens reporting more than [`MAX_DECIMALS`] decimals cannot be
/// represented and yield [`TokenscopeError::FormatError`].
pub fn format_units(raw: U256, decimals: u8) -> Result<String> {
    alloy_format_units(raw, decimals).map_err(|e| {
        TokenscopeError::FormatError(format!("cannot scale by {decimals} decimals: {e}"))
    })
}
