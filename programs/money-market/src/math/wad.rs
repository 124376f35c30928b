//! Fixed-point WAD (1e18) arithmetic operations
//!
//! All calculations use u128 with WAD scaling. Every helper names its
//! rounding direction; callers pick the one that favors the protocol.
//!
//! `mul_div_*` keep the full 256-bit product of `a * b` in a `U256`, so they
//! only fail when the final quotient does not fit in a u128. Price * amount
//! products routinely exceed 2^128 before the division brings them back down.

use alloy_primitives::U256;
use anchor_lang::prelude::*;
use crate::errors::RiskError;
use crate::constants::WAD;

/// Multiply then divide, rounding DOWN
/// Order: (a * b) / c
pub fn mul_div_down(a: u128, b: u128, c: u128) -> Result<u128> {
    if c == 0 {
        return Err(RiskError::DivisionByZero.into());
    }

    if a == 0 || b == 0 {
        return Ok(0);
    }

    narrow(U256::from(a) * U256::from(b) / U256::from(c))
}

/// Multiply then divide, rounding UP
/// Formula: ceil((a * b) / c)
pub fn mul_div_up(a: u128, b: u128, c: u128) -> Result<u128> {
    if c == 0 {
        return Err(RiskError::DivisionByZero.into());
    }

    if a == 0 || b == 0 {
        return Ok(0);
    }

    let product = U256::from(a) * U256::from(b);
    let divisor = U256::from(c);
    let quotient = product / divisor;
    if (product % divisor).is_zero() {
        return narrow(quotient);
    }
    narrow(quotient + U256::from(1u8))
}

/// `a / (b * c)` in WAD, rounded DOWN, with no rounding of `b * c`
///
/// Formula: (a * WAD * WAD) / (b * c)
pub fn wad_div_product_down(a: u128, b: u128, c: u128) -> Result<u128> {
    if b == 0 || c == 0 {
        return Err(RiskError::DivisionByZero.into());
    }

    let wad = U256::from(WAD);
    narrow(U256::from(a) * wad * wad / (U256::from(b) * U256::from(c)))
}

/// Bring a 256-bit result back to u128
fn narrow(value: U256) -> Result<u128> {
    u128::try_from(value).map_err(|_| RiskError::MathOverflow.into())
}

/// WAD multiplication (a * b / WAD), rounded down
#[inline]
pub fn wad_mul_down(a: u128, b: u128) -> Result<u128> {
    mul_div_down(a, b, WAD)
}

/// WAD multiplication (a * b / WAD), rounded up
#[inline]
pub fn wad_mul_up(a: u128, b: u128) -> Result<u128> {
    mul_div_up(a, b, WAD)
}

/// WAD division (a * WAD / b), rounded down
#[inline]
pub fn wad_div_down(a: u128, b: u128) -> Result<u128> {
    mul_div_down(a, WAD, b)
}

/// WAD division (a * WAD / b), rounded up
#[inline]
pub fn wad_div_up(a: u128, b: u128) -> Result<u128> {
    mul_div_up(a, WAD, b)
}
