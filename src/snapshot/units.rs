//! Conversion between smallest-unit integers and display decimals.
//! Only the report layer converts; all arithmetic stays in integers.

use alloy::primitives::utils::{format_units, parse_units, UnitsError};
use alloy::primitives::{I256, U256};

pub fn to_display(amount: U256, decimals: u8) -> Result<String, UnitsError> {
    format_units(amount, decimals)
}

pub fn to_display_signed(amount: I256, decimals: u8) -> Result<String, UnitsError> {
    format_units(amount, decimals)
}

/// Parses a non-negative display amount back into smallest units.
pub fn from_display(amount: &str, decimals: u8) -> Result<U256, UnitsError> {
    parse_units(amount, decimals).map(|parsed| parsed.get_absolute())
}
