//! Interest Rate Model interface
//!
//! Rate models return a borrow rate per block (scaled 1e18 = WAD).
//!
//! Example: 5% APY ≈ 2.38e-8 per block = 23_782_343_987 when scaled by WAD

use anchor_lang::prelude::*;
use crate::constants::{BLOCKS_PER_YEAR, WAD};
use crate::math::{checked_add, checked_sub, mul_div_down, wad_mul_down};

/// Pluggable per-block interest rate source
pub trait RateModel: std::fmt::Debug {
    /// Borrow rate per block for the given market aggregates
    fn borrow_rate(&self, cash: u128, borrows: u128, reserves: u128) -> Result<u128>;

    /// Supply rate per block: the part of borrow interest that reaches suppliers
    fn supply_rate(
        &self,
        cash: u128,
        borrows: u128,
        reserves: u128,
        reserve_factor: u128,
    ) -> Result<u128> {
        let one_minus_reserve_factor = checked_sub(WAD, reserve_factor)?;
        let rate_to_pool = wad_mul_down(
            self.borrow_rate(cash, borrows, reserves)?,
            one_minus_reserve_factor,
        )?;
        wad_mul_down(utilization(cash, borrows, reserves)?, rate_to_pool)
    }
}

/// Utilization = borrows / (cash + borrows - reserves), WAD-scaled
pub fn utilization(cash: u128, borrows: u128, reserves: u128) -> Result<u128> {
    if borrows == 0 {
        return Ok(0);
    }

    let supplied = checked_sub(checked_add(cash, borrows)?, reserves)?;
    if supplied == 0 {
        return Ok(0);
    }
    mul_div_down(borrows, WAD, supplied)
}

/// Constant borrow rate, independent of utilization
#[derive(AnchorSerialize, AnchorDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedRateModel {
    pub borrow_rate_per_block: u128,
}

impl FixedRateModel {
    pub fn new(borrow_rate_per_block: u128) -> Self {
        Self { borrow_rate_per_block }
    }
}

impl RateModel for FixedRateModel {
    fn borrow_rate(&self, _cash: u128, _borrows: u128, _reserves: u128) -> Result<u128> {
        Ok(self.borrow_rate_per_block)
    }
}

/// Kinked (jump) rate model
#[derive(AnchorSerialize, AnchorDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct JumpRateModel {
    /// Base rate at 0% utilization (per block, WAD-scaled)
    pub base_rate: u128,

    /// Slope below kink (per block, WAD-scaled)
    pub slope1: u128,

    /// Slope above kink (per block, WAD-scaled)
    pub slope2: u128,

    /// Utilization kink point (WAD-scaled, e.g., 0.8e18 = 80%)
    pub kink: u128,
}

impl JumpRateModel {
    /// Build a model from yearly parameters
    pub fn from_yearly(base_rate: u128, slope1: u128, slope2: u128, kink: u128) -> Self {
        Self {
            base_rate: base_rate / BLOCKS_PER_YEAR,
            slope1: slope1 / BLOCKS_PER_YEAR,
            slope2: slope2 / BLOCKS_PER_YEAR,
            kink,
        }
    }
}

impl RateModel for JumpRateModel {
    fn borrow_rate(&self, cash: u128, borrows: u128, reserves: u128) -> Result<u128> {
        let utilization = utilization(cash, borrows, reserves)?;

        if utilization <= self.kink {
            // Below kink: base + slope1 * utilization
            return checked_add(self.base_rate, wad_mul_down(utilization, self.slope1)?);
        }

        // Above kink: rate_at_kink + slope2 * (utilization - kink)
        let rate_at_kink = checked_add(self.base_rate, wad_mul_down(self.kink, self.slope1)?)?;
        let excess = checked_sub(utilization, self.kink)?;
        checked_add(rate_at_kink, wad_mul_down(excess, self.slope2)?)
    }
}

// Example configurations (yearly, WAD-scaled):
//
// STABLE (USDC lending):
//   base_rate: 0.00e18, slope1: 0.04e18, slope2: 1.09e18, kink: 0.80e18
//
// VOLATILE (ETH lending):
//   base_rate: 0.02e18, slope1: 0.10e18, slope2: 3.00e18, kink: 0.65e18
