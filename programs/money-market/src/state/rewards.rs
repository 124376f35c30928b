//! Reward flywheel records
//!
//! Reward indices live on their own scale (`REWARD_INDEX_SCALE`) and start at
//! `REWARD_INITIAL_INDEX`, so an account's "last seen" index of zero can only
//! mean it has never been settled.

use anchor_lang::prelude::*;
use crate::constants::REWARD_INITIAL_INDEX;

/// One cumulative reward index and the block it was last advanced in
#[derive(AnchorSerialize, AnchorDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewardIndexState {
    pub index: u128,
    pub block: u64,
}

impl RewardIndexState {
    pub fn new(current_block: u64) -> Self {
        Self {
            index: REWARD_INITIAL_INDEX,
            block: current_block,
        }
    }
}

/// Supply-side and borrow-side reward state of one market
#[derive(AnchorSerialize, AnchorDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewardMarketState {
    /// Reward per block to suppliers
    pub supply_speed: u128,

    /// Reward per block to borrowers
    pub borrow_speed: u128,

    pub supply: RewardIndexState,
    pub borrow: RewardIndexState,
}

impl RewardMarketState {
    pub fn new(current_block: u64) -> Self {
        Self {
            supply_speed: 0,
            borrow_speed: 0,
            supply: RewardIndexState::new(current_block),
            borrow: RewardIndexState::new(current_block),
        }
    }
}

/// Last index an account was settled at, per side
#[derive(AnchorSerialize, AnchorDeserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UserRewardIndex {
    pub supply: u128,
    pub borrow: u128,
}

/// Direct per-block grant to a contributor
#[derive(AnchorSerialize, AnchorDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContributorState {
    pub speed: u128,
    pub last_block: u64,
}

/// Which side of a market a reward index tracks
#[derive(AnchorSerialize, AnchorDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewardSide {
    Supply,
    Borrow,
}
