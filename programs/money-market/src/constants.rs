//! Protocol constants and configuration bounds

// === Fixed-Point Constants ===

/// WAD = 1e18 (standard DeFi fixed-point)
pub const WAD: u128 = 1_000_000_000_000_000_000;

/// Reward index scale (1e18)
///
/// Reward indices accumulate `rewards * REWARD_INDEX_SCALE / participation`.
pub const REWARD_INDEX_SCALE: u128 = WAD;

/// Starting value of every reward index, distinct from "never seen" (zero)
pub const REWARD_INITIAL_INDEX: u128 = REWARD_INDEX_SCALE;

/// Starting value of every market's interest borrow index (1.0)
pub const INITIAL_BORROW_INDEX: u128 = WAD;

// === Interest Rate Constants ===

/// Blocks per year used for yearly -> per-block rate conversions
pub const BLOCKS_PER_YEAR: u128 = 2_102_400;

/// Maximum borrow rate per block (0.05% per block)
pub const MAX_BORROW_RATE_PER_BLOCK: u128 = WAD / 2_000;

/// Maximum reserve factor (100%)
pub const MAX_RESERVE_FACTOR: u128 = WAD;

// === Risk Parameter Bounds ===

/// Maximum collateral factor (90%)
pub const MAX_COLLATERAL_FACTOR: u128 = WAD * 9 / 10;

/// Minimum close factor (5%)
pub const MIN_CLOSE_FACTOR: u128 = WAD / 20;

/// Maximum close factor (90%)
pub const MAX_CLOSE_FACTOR: u128 = WAD * 9 / 10;

/// Minimum liquidation incentive (100%, no bonus)
pub const MIN_LIQUIDATION_INCENTIVE: u128 = WAD;

/// Maximum liquidation incentive (150%)
pub const MAX_LIQUIDATION_INCENTIVE: u128 = WAD * 3 / 2;

/// Maximum fraction of seized collateral kept by the protocol (50%)
pub const MAX_PROTOCOL_SEIZE_SHARE: u128 = WAD / 2;

// === Default Parameters ===

/// Default close factor (50%)
pub const DEFAULT_CLOSE_FACTOR: u128 = WAD / 2;

/// Default liquidation incentive (108%)
pub const DEFAULT_LIQUIDATION_INCENTIVE: u128 = WAD * 108 / 100;

/// Default protocol seize share (2.8%)
pub const DEFAULT_PROTOCOL_SEIZE_SHARE: u128 = WAD * 28 / 1_000;

// === Share Ledger Constants ===

/// Shares locked forever on a market's first mint
///
/// Keeps total shares from ever returning to zero, which would otherwise let
/// the first depositor of a fresh market be front-run through a donation.
pub const DEAD_SHARES: u128 = 1_000;

// === Account Limits ===

/// Maximum number of markets one account may enter
pub const MAX_ASSETS_PER_ACCOUNT: usize = 20;
