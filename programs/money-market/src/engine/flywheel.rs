//! Reward flywheel
//!
//! Distributes the reward asset to suppliers and borrowers of eligible
//! markets in proportion to their participation over time, plus direct
//! per-block grants to contributors.
//!
//! Each market carries two cumulative indices:
//!
//! ```text
//! index += speed * blocks * REWARD_INDEX_SCALE / participation
//! ```
//!
//! where participation is `totalShares` (supply side) or
//! `totalBorrows / borrowIndex` (borrow side). An account settles with
//!
//! ```text
//! accrued += accountParticipation * (index - lastSeenIndex) / REWARD_INDEX_SCALE
//! ```
//!
//! All divisions round down, so the flywheel never owes more than it
//! distributed.

use std::collections::BTreeMap;

use anchor_lang::prelude::*;
use crate::constants::{REWARD_INDEX_SCALE, REWARD_INITIAL_INDEX, WAD};
use crate::errors::RiskError;
use crate::events::{RewardDistributed, RewardsFunded};
use crate::math::{checked_add, checked_mul, checked_sub, min, mul_div_down};
use crate::state::{
    ContributorState, Market, RewardIndexState, RewardMarketState, RewardSide, UserRewardIndex,
};

/// Reward accounting for every market governed by one risk engine
#[derive(Debug, Default, Clone)]
pub struct RewardFlywheel {
    markets: BTreeMap<Pubkey, RewardMarketState>,
    /// (market, account) -> last settled indices
    user_indices: BTreeMap<(Pubkey, Pubkey), UserRewardIndex>,
    accrued: BTreeMap<Pubkey, u128>,
    contributors: BTreeMap<Pubkey, ContributorState>,
    /// Reward asset held for claims
    reward_balance: u128,
}

impl RewardFlywheel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a freshly listed market
    pub fn init_market(&mut self, market: Pubkey, current_block: u64) {
        self.markets
            .entry(market)
            .or_insert_with(|| RewardMarketState::new(current_block));
    }

    // === Views ===

    pub fn market_state(&self, market: &Pubkey) -> Option<&RewardMarketState> {
        self.markets.get(market)
    }

    pub fn user_index(&self, market: &Pubkey, account: &Pubkey) -> UserRewardIndex {
        self.user_indices
            .get(&(*market, *account))
            .copied()
            .unwrap_or_default()
    }

    /// Accrued but unclaimed rewards of `account`
    pub fn accrued(&self, account: &Pubkey) -> u128 {
        self.accrued.get(account).copied().unwrap_or(0)
    }

    pub fn reward_balance(&self) -> u128 {
        self.reward_balance
    }

    pub fn contributor(&self, contributor: &Pubkey) -> Option<&ContributorState> {
        self.contributors.get(contributor)
    }

    // === Index Updates ===

    /// Bring the supply index of `market` up to `current_block`
    pub fn update_supply_index(&mut self, market: &Market, current_block: u64) -> Result<()> {
        let state = self.state_of(&market.id)?;
        let supply = advance_index(
            state.supply,
            state.supply_speed,
            market.state.total_shares,
            current_block,
        )?;
        self.state_of_mut(&market.id)?.supply = supply;
        Ok(())
    }

    /// Bring the borrow index of `market` up to `current_block`
    pub fn update_borrow_index(&mut self, market: &Market, current_block: u64) -> Result<()> {
        let state = self.state_of(&market.id)?;
        let participation =
            mul_div_down(market.state.total_borrows, WAD, market.state.borrow_index)?;
        let borrow = advance_index(state.borrow, state.borrow_speed, participation, current_block)?;
        self.state_of_mut(&market.id)?.borrow = borrow;
        Ok(())
    }

    // === Settlement ===

    /// Credit `account` with supply rewards earned since it was last settled
    pub fn distribute_supplier(&mut self, market: &Market, account: &Pubkey) -> Result<u128> {
        let market_index = self.state_of(&market.id)?.supply.index;
        let participation = market.share_balance(account);
        self.settle(market, account, RewardSide::Supply, market_index, participation)
    }

    /// Credit `account` with borrow rewards earned since it was last settled
    pub fn distribute_borrower(&mut self, market: &Market, account: &Pubkey) -> Result<u128> {
        let market_index = self.state_of(&market.id)?.borrow.index;
        let debt = market.borrow_balance_stored(account)?;
        let participation = mul_div_down(debt, WAD, market.state.borrow_index)?;
        self.settle(market, account, RewardSide::Borrow, market_index, participation)
    }

    /// Update the supply index, then settle each of `accounts`
    pub fn refresh_supply(
        &mut self,
        market: &Market,
        accounts: &[&Pubkey],
        current_block: u64,
    ) -> Result<()> {
        self.update_supply_index(market, current_block)?;
        for account in accounts {
            self.distribute_supplier(market, account)?;
        }
        Ok(())
    }

    /// Update the borrow index, then settle each of `accounts`
    pub fn refresh_borrow(
        &mut self,
        market: &Market,
        accounts: &[&Pubkey],
        current_block: u64,
    ) -> Result<()> {
        self.update_borrow_index(market, current_block)?;
        for account in accounts {
            self.distribute_borrower(market, account)?;
        }
        Ok(())
    }

    fn settle(
        &mut self,
        market: &Market,
        account: &Pubkey,
        side: RewardSide,
        market_index: u128,
        participation: u128,
    ) -> Result<u128> {
        let key = (market.id, *account);
        let mut user = self.user_indices.get(&key).copied().unwrap_or_default();
        let last_seen = match side {
            RewardSide::Supply => user.supply,
            RewardSide::Borrow => user.borrow,
        };

        // Never settled: the account has been participating since the initial index
        let last_seen = if last_seen == 0 { REWARD_INITIAL_INDEX } else { last_seen };
        let delta = checked_sub(market_index, last_seen)?;
        let amount = mul_div_down(participation, delta, REWARD_INDEX_SCALE)?;
        let accrued = checked_add(self.accrued(account), amount)?;

        match side {
            RewardSide::Supply => user.supply = market_index,
            RewardSide::Borrow => user.borrow = market_index,
        }
        self.user_indices.insert(key, user);
        self.accrued.insert(*account, accrued);

        if amount > 0 {
            emit!(RewardDistributed {
                market: market.id,
                account: *account,
                side,
                amount,
                index: market_index,
                accrued,
            });
        }

        Ok(amount)
    }

    // === Speeds ===

    /// Change both speeds of `market`; indices are brought current at the old speeds first
    ///
    /// Returns the previous (supply, borrow) speeds.
    pub fn set_speeds(
        &mut self,
        market: &Market,
        supply_speed: u128,
        borrow_speed: u128,
        current_block: u64,
    ) -> Result<(u128, u128)> {
        self.update_supply_index(market, current_block)?;
        self.update_borrow_index(market, current_block)?;

        let state = self.state_of_mut(&market.id)?;
        let previous = (state.supply_speed, state.borrow_speed);
        state.supply_speed = supply_speed;
        state.borrow_speed = borrow_speed;
        Ok(previous)
    }

    /// Credit `contributor` with `speed * blocks` since its last update
    pub fn update_contributor(&mut self, contributor: &Pubkey, current_block: u64) -> Result<u128> {
        let Some(state) = self.contributors.get(contributor).copied() else {
            return Ok(0);
        };
        if current_block <= state.last_block {
            return Ok(0);
        }

        let blocks = (current_block - state.last_block) as u128;
        let amount = checked_mul(state.speed, blocks)?;
        let accrued = checked_add(self.accrued(contributor), amount)?;

        self.accrued.insert(*contributor, accrued);
        self.contributors.insert(
            *contributor,
            ContributorState {
                speed: state.speed,
                last_block: current_block,
            },
        );
        Ok(amount)
    }

    /// Change a contributor's speed after crediting what the old speed earned
    ///
    /// Returns the previous speed.
    pub fn set_contributor_speed(
        &mut self,
        contributor: &Pubkey,
        speed: u128,
        current_block: u64,
    ) -> Result<u128> {
        self.update_contributor(contributor, current_block)?;

        let previous = self.contributors.get(contributor).map_or(0, |state| state.speed);
        if speed == 0 {
            self.contributors.remove(contributor);
        } else {
            self.contributors.insert(
                *contributor,
                ContributorState {
                    speed,
                    last_block: current_block,
                },
            );
        }
        Ok(previous)
    }

    // === Funding & Claims ===

    /// Record `amount` of reward asset received from `funder`
    pub fn fund(&mut self, funder: &Pubkey, amount: u128) -> Result<u128> {
        self.reward_balance = checked_add(self.reward_balance, amount)?;

        emit!(RewardsFunded {
            funder: *funder,
            amount,
            reward_balance: self.reward_balance,
        });
        Ok(self.reward_balance)
    }

    /// Take as much of `account`'s accrued rewards as the balance covers
    ///
    /// Returns (granted, still accrued).
    pub fn grant(&mut self, account: &Pubkey) -> Result<(u128, u128)> {
        let accrued = self.accrued(account);
        let granted = min(accrued, self.reward_balance);
        let remaining = checked_sub(accrued, granted)?;

        self.reward_balance = checked_sub(self.reward_balance, granted)?;
        if remaining == 0 {
            self.accrued.remove(account);
        } else {
            self.accrued.insert(*account, remaining);
        }
        Ok((granted, remaining))
    }

    fn state_of(&self, market: &Pubkey) -> Result<RewardMarketState> {
        self.markets
            .get(market)
            .copied()
            .ok_or_else(|| RiskError::MarketNotListed.into())
    }

    fn state_of_mut(&mut self, market: &Pubkey) -> Result<&mut RewardMarketState> {
        self.markets
            .get_mut(market)
            .ok_or_else(|| RiskError::MarketNotListed.into())
    }
}

/// Advance one index to `current_block`; only the block moves when nothing participates
fn advance_index(
    state: RewardIndexState,
    speed: u128,
    participation: u128,
    current_block: u64,
) -> Result<RewardIndexState> {
    if current_block <= state.block {
        return Ok(state);
    }
    if speed == 0 || participation == 0 {
        return Ok(RewardIndexState {
            index: state.index,
            block: current_block,
        });
    }

    let blocks = (current_block - state.block) as u128;
    let distributed = checked_mul(speed, blocks)?;
    let ratio = mul_div_down(distributed, REWARD_INDEX_SCALE, participation)?;

    Ok(RewardIndexState {
        index: checked_add(state.index, ratio)?,
        block: current_block,
    })
}
