//! Exchange-rate based share accounting
//!
//! `exchangeRate = (cash + totalBorrows - totalReserves) / totalShares`,
//! falling back to the market's initial rate while no shares exist.
//!
//! ## Rounding Rules (Always favor protocol)
//!
//! | Operation         | Convert             | Rounding | Reason                  |
//! |-------------------|---------------------|----------|-------------------------|
//! | Mint              | underlying → shares | DOWN     | User gets fewer shares  |
//! | Redeem (shares)   | shares → underlying | DOWN     | User gets fewer assets  |
//! | Redeem (amount)   | underlying → shares | UP       | User burns more shares  |
//! | Collateral value  | shares → underlying | DOWN     | Borrowing power shrinks |

use anchor_lang::prelude::*;
use crate::errors::RiskError;
use super::safe_math::{checked_add, checked_sub};
use super::wad::{wad_div_down, wad_div_up, wad_mul_down};

/// Underlying value backing every share: cash + borrows - reserves
pub fn total_underlying(cash: u128, total_borrows: u128, total_reserves: u128) -> Result<u128> {
    checked_sub(checked_add(cash, total_borrows)?, total_reserves)
}

/// Current exchange rate (WAD-scaled underlying per share)
pub fn exchange_rate(
    cash: u128,
    total_borrows: u128,
    total_reserves: u128,
    total_shares: u128,
    initial_rate: u128,
) -> Result<u128> {
    if total_shares == 0 {
        return Ok(initial_rate);
    }

    wad_div_down(
        total_underlying(cash, total_borrows, total_reserves)?,
        total_shares,
    )
}

/// Convert underlying to shares for MINT operations
///
/// Rounding: DOWN (user receives fewer shares)
pub fn to_shares_down(amount: u128, exchange_rate: u128) -> Result<u128> {
    require!(exchange_rate > 0, RiskError::DivisionByZero);
    wad_div_down(amount, exchange_rate)
}

/// Convert underlying to shares for REDEEM-BY-AMOUNT operations
///
/// Rounding: UP (user burns more shares)
pub fn to_shares_up(amount: u128, exchange_rate: u128) -> Result<u128> {
    require!(exchange_rate > 0, RiskError::DivisionByZero);
    wad_div_up(amount, exchange_rate)
}

/// Convert shares to underlying for REDEEM operations and valuations
///
/// Rounding: DOWN (user receives fewer assets)
pub fn to_underlying_down(shares: u128, exchange_rate: u128) -> Result<u128> {
    wad_mul_down(shares, exchange_rate)
}
