use anchor_lang::prelude::*;
use crate::state::{Action, RewardSide};

// === Listing & Parameter Events ===

#[event]
pub struct MarketListed {
    pub market: Pubkey,
    pub underlying: Pubkey,
    pub risk_engine: Pubkey,
    pub reserve_factor: u128,
    pub initial_exchange_rate: u128,
}

#[event]
pub struct CollateralFactorSet {
    pub market: Pubkey,
    pub old_collateral_factor: u128,
    pub new_collateral_factor: u128,
}

#[event]
pub struct BorrowCapSet {
    pub market: Pubkey,
    pub old_borrow_cap: u128,
    pub new_borrow_cap: u128,
}

#[event]
pub struct SupplyCapSet {
    pub market: Pubkey,
    pub old_supply_cap: u128,
    pub new_supply_cap: u128,
}

#[event]
pub struct RewardEligibilitySet {
    pub market: Pubkey,
    pub was_eligible: bool,
    pub eligible: bool,
}

#[event]
pub struct CloseFactorSet {
    pub old_close_factor: u128,
    pub new_close_factor: u128,
}

#[event]
pub struct LiquidationIncentiveSet {
    pub old_liquidation_incentive: u128,
    pub new_liquidation_incentive: u128,
}

#[event]
pub struct ProtocolSeizeShareSet {
    pub old_protocol_seize_share: u128,
    pub new_protocol_seize_share: u128,
}

#[event]
pub struct ReserveFactorSet {
    pub market: Pubkey,
    pub old_reserve_factor: u128,
    pub new_reserve_factor: u128,
}

#[event]
pub struct RateModelSet {
    pub market: Pubkey,
    pub old_borrow_rate: u128,
    pub new_borrow_rate: u128,
}

#[event]
pub struct ActionPausedSet {
    /// `None` for the global switch
    pub market: Option<Pubkey>,
    pub action: Action,
    pub was_paused: bool,
    pub paused: bool,
}

// === Membership Events ===

#[event]
pub struct MarketEntered {
    pub market: Pubkey,
    pub account: Pubkey,
}

#[event]
pub struct MarketExited {
    pub market: Pubkey,
    pub account: Pubkey,
}

// === Interest Events ===

#[event]
pub struct InterestAccrued {
    pub market: Pubkey,
    pub cash: u128,
    pub borrow_rate: u128,
    pub block_delta: u64,
    pub interest_accumulated: u128,
    pub total_borrows_before: u128,
    pub total_borrows: u128,
    pub total_reserves_before: u128,
    pub total_reserves: u128,
    pub borrow_index_before: u128,
    pub borrow_index: u128,
}

// === Supply Events ===

#[event]
pub struct Mint {
    pub market: Pubkey,
    pub minter: Pubkey,
    /// Underlying actually received
    pub amount: u128,
    pub shares: u128,
    /// Shares locked in the dead account on the first mint
    pub locked_shares: u128,
    pub total_shares: u128,
    pub cash: u128,
}

#[event]
pub struct Redeem {
    pub market: Pubkey,
    pub redeemer: Pubkey,
    pub amount: u128,
    pub shares: u128,
    pub total_shares: u128,
    pub cash: u128,
}

#[event]
pub struct Transfer {
    pub market: Pubkey,
    pub from: Pubkey,
    pub to: Pubkey,
    pub shares: u128,
}

// === Borrow Events ===

#[event]
pub struct Borrow {
    pub market: Pubkey,
    pub borrower: Pubkey,
    pub amount: u128,
    pub account_borrows: u128,
    pub total_borrows: u128,
    pub cash: u128,
}

#[event]
pub struct RepayBorrow {
    pub market: Pubkey,
    pub payer: Pubkey,
    pub borrower: Pubkey,
    pub amount: u128,
    pub account_borrows: u128,
    pub total_borrows: u128,
    pub cash: u128,
}

// === Liquidation Events ===

#[event]
pub struct LiquidateBorrow {
    pub liquidator: Pubkey,
    pub borrower: Pubkey,
    pub debt_market: Pubkey,
    pub collateral_market: Pubkey,
    pub repay_amount: u128,
    pub seize_shares: u128,
}

#[event]
pub struct Seize {
    pub market: Pubkey,
    pub liquidator: Pubkey,
    pub borrower: Pubkey,
    pub liquidator_shares: u128,
    pub protocol_shares: u128,
    pub reserve_account: Pubkey,
    pub borrower_shares: u128,
}

// === Reserve Events ===

#[event]
pub struct ReservesAdded {
    pub market: Pubkey,
    pub benefactor: Pubkey,
    pub amount: u128,
    pub total_reserves_before: u128,
    pub total_reserves: u128,
}

#[event]
pub struct ReservesReduced {
    pub market: Pubkey,
    pub recipient: Pubkey,
    pub amount: u128,
    pub total_reserves_before: u128,
    pub total_reserves: u128,
}

// === Reward Events ===

#[event]
pub struct RewardSpeedsSet {
    pub market: Pubkey,
    pub old_supply_speed: u128,
    pub new_supply_speed: u128,
    pub old_borrow_speed: u128,
    pub new_borrow_speed: u128,
}

#[event]
pub struct ContributorSpeedSet {
    pub contributor: Pubkey,
    pub old_speed: u128,
    pub new_speed: u128,
}

#[event]
pub struct RewardDistributed {
    pub market: Pubkey,
    pub account: Pubkey,
    pub side: RewardSide,
    pub amount: u128,
    pub index: u128,
    pub accrued: u128,
}

#[event]
pub struct RewardsFunded {
    pub funder: Pubkey,
    pub amount: u128,
    pub reward_balance: u128,
}

#[event]
pub struct RewardsClaimed {
    pub account: Pubkey,
    pub amount: u128,
    /// Still accrued after the claim (reward balance ran short)
    pub remaining: u128,
}
