//! Safe math utilities to prevent overflow/underflow
//!
//! Every ledger update goes through these helpers so arithmetic failures
//! surface as `RiskError` instead of panicking or wrapping.

use anchor_lang::prelude::*;
use crate::errors::RiskError;

/// Checked addition with custom error
#[inline]
pub fn checked_add(a: u128, b: u128) -> Result<u128> {
    a.checked_add(b).ok_or_else(|| RiskError::MathOverflow.into())
}

/// Checked subtraction with custom error
#[inline]
pub fn checked_sub(a: u128, b: u128) -> Result<u128> {
    a.checked_sub(b).ok_or_else(|| RiskError::MathUnderflow.into())
}

/// Checked multiplication with custom error
#[inline]
pub fn checked_mul(a: u128, b: u128) -> Result<u128> {
    a.checked_mul(b).ok_or_else(|| RiskError::MathOverflow.into())
}

/// Checked division with custom error
#[inline]
pub fn checked_div(a: u128, b: u128) -> Result<u128> {
    if b == 0 {
        return Err(RiskError::DivisionByZero.into());
    }
    Ok(a / b)
}

/// Get the minimum of two values
#[inline]
pub fn min(a: u128, b: u128) -> u128 {
    if a < b { a } else { b }
}
