//! Interest accrual logic for lending markets
//!
//! Interest compounds per block through the market's borrow index:
//! simple interest over the elapsed blocks, folded into the index.
//! Reserves take `reserveFactor` of each accrual.
//!
//! Interest on the aggregate rounds UP and the index grows rounded DOWN.
//! Account debts (`principal * index / snapshotIndex`, rounded down) can
//! then never add up to more than `totalBorrows`, so the last full repay
//! always fits.

use anchor_lang::prelude::*;
use crate::constants::MAX_BORROW_RATE_PER_BLOCK;
use crate::errors::RiskError;
use crate::interfaces::RateModel;
use crate::state::MarketAccrualState;
use super::safe_math::{checked_add, checked_mul};
use super::wad::{wad_mul_down, wad_mul_up};

/// Result of interest accrual
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccrualResult {
    /// State before accrual
    pub prior: MarketAccrualState,
    /// Borrow rate applied (WAD-scaled, per block)
    pub borrow_rate: u128,
    /// Blocks elapsed since the previous accrual
    pub block_delta: u64,
    /// Interest added to total borrows
    pub interest_accumulated: u128,
}

/// Accrue interest on a market
///
/// MUST be called before any operation that reads or writes market totals.
/// Idempotent per block: a second call in the same block returns `None`
/// and leaves the state untouched.
///
/// # Arguments
/// * `state` - Market aggregates to accrue
/// * `cash` - Underlying held by the market
/// * `reserve_factor` - Fraction of interest set aside as reserves (WAD)
/// * `rate_model` - Source of the per-block borrow rate
/// * `current_block` - Block the accrual happens in
pub fn accrue_interest_on_market(
    state: &mut MarketAccrualState,
    cash: u128,
    reserve_factor: u128,
    rate_model: &dyn RateModel,
    current_block: u64,
) -> Result<Option<AccrualResult>> {
    if current_block <= state.last_accrual_block {
        return Ok(None);
    }

    let prior = *state;
    let block_delta = current_block - state.last_accrual_block;

    let borrow_rate = rate_model.borrow_rate(cash, state.total_borrows, state.total_reserves)?;
    require!(borrow_rate <= MAX_BORROW_RATE_PER_BLOCK, RiskError::RateTooHigh);

    // interestFactor = rate * blocks
    let interest_factor = checked_mul(borrow_rate, block_delta as u128)?;
    let interest_accumulated = wad_mul_up(interest_factor, state.total_borrows)?;

    let total_borrows = checked_add(state.total_borrows, interest_accumulated)?;
    let total_reserves = checked_add(
        state.total_reserves,
        wad_mul_down(reserve_factor, interest_accumulated)?,
    )?;
    let borrow_index = checked_add(
        state.borrow_index,
        wad_mul_down(interest_factor, state.borrow_index)?,
    )?;

    state.total_borrows = total_borrows;
    state.total_reserves = total_reserves;
    state.borrow_index = borrow_index;
    state.last_accrual_block = current_block;

    Ok(Some(AccrualResult {
        prior,
        borrow_rate,
        block_delta,
        interest_accumulated,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{INITIAL_BORROW_INDEX, WAD};
    use crate::errors::assert_risk_err;
    use crate::interfaces::FixedRateModel;
    use crate::math::mul_div_down;

    fn create_test_state() -> MarketAccrualState {
        MarketAccrualState {
            total_shares: 50_000 * WAD,
            total_borrows: 1_000 * WAD,
            total_reserves: 0,
            borrow_index: INITIAL_BORROW_INDEX,
            last_accrual_block: 100,
        }
    }

    #[test]
    fn test_no_interest_no_borrow() {
        let mut state = create_test_state();
        state.total_borrows = 0;
        let model = FixedRateModel::new(WAD / 10_000);

        let result = accrue_interest_on_market(&mut state, 1_000 * WAD, 0, &model, 110)
            .unwrap()
            .unwrap();

        assert_eq!(result.interest_accumulated, 0);
        assert_eq!(state.total_borrows, 0);
        assert_eq!(state.last_accrual_block, 110);
        // index still compounds so future borrowers are priced correctly
        assert!(state.borrow_index > INITIAL_BORROW_INDEX);
    }

    #[test]
    fn test_one_block_fixed_rate() {
        let mut state = create_test_state();
        let reserve_factor = WAD / 10;
        let model = FixedRateModel::new(WAD / 10_000); // 0.01% per block

        let result = accrue_interest_on_market(&mut state, 500 * WAD, reserve_factor, &model, 101)
            .unwrap()
            .unwrap();

        // 1000 * 0.0001 = 0.1
        assert_eq!(result.interest_accumulated, WAD / 10);
        assert_eq!(state.total_borrows, 1_000 * WAD + WAD / 10);
        assert_eq!(state.total_reserves, WAD / 100);
        assert_eq!(state.borrow_index, WAD + WAD / 10_000);
    }

    #[test]
    fn test_aggregate_interest_rounds_up() {
        let mut state = create_test_state();
        state.total_borrows = 3;
        let model = FixedRateModel::new(WAD / 10_000);

        let result = accrue_interest_on_market(&mut state, 0, 0, &model, 101)
            .unwrap()
            .unwrap();

        // 3 * 0.0001 = 0.0003 → 1
        assert_eq!(result.interest_accumulated, 1);
        assert_eq!(state.total_borrows, 4);
        // a single borrower of 3 still owes 3 * 1.0001 → 3
        assert_eq!(mul_div_down(3, state.borrow_index, INITIAL_BORROW_INDEX).unwrap(), 3);
    }

    #[test]
    fn test_same_block_is_noop() {
        let mut state = create_test_state();
        let model = FixedRateModel::new(WAD / 10_000);

        accrue_interest_on_market(&mut state, 0, 0, &model, 105).unwrap();
        let first = state;
        let second = accrue_interest_on_market(&mut state, 0, 0, &model, 105).unwrap();

        assert!(second.is_none());
        assert_eq!(first, state);
    }

    #[test]
    fn test_rate_ceiling() {
        let mut state = create_test_state();
        let model = FixedRateModel::new(MAX_BORROW_RATE_PER_BLOCK + 1);
        let before = state;

        assert_risk_err(
            accrue_interest_on_market(&mut state, 0, 0, &model, 101),
            RiskError::RateTooHigh,
        );
        assert_eq!(before, state);
    }
}
