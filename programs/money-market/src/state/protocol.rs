//! Protocol-level configuration
//!
//! Risk parameters shared by every market, per-market listing config,
//! pause flags and the engine configuration a host starts from.

use std::collections::BTreeSet;

use anchor_lang::prelude::*;
use rust_decimal::Decimal;
use crate::constants::*;
use crate::errors::RiskError;
use crate::math::to_wad;

/// Holder of the protocol's share of seized collateral, unless configured otherwise
pub const DEFAULT_RESERVE_ACCOUNT: Pubkey = Pubkey::new_from_array([0xff; 32]);

/// Reward token paid by the flywheel, unless configured otherwise
pub const DEFAULT_REWARD_ASSET: Pubkey = Pubkey::new_from_array([0xfe; 32]);

// === Risk Parameters ===

/// Protocol-wide liquidation parameters (all WAD fractions)
#[derive(AnchorSerialize, AnchorDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiskParams {
    /// Maximum fraction of a borrow repayable in one liquidation
    pub close_factor: u128,

    /// Collateral paid to the liquidator per unit of debt value repaid
    pub liquidation_incentive: u128,

    /// Fraction of seized collateral kept by the protocol
    pub protocol_seize_share: u128,
}

impl Default for RiskParams {
    fn default() -> Self {
        Self {
            close_factor: DEFAULT_CLOSE_FACTOR,
            liquidation_incentive: DEFAULT_LIQUIDATION_INCENTIVE,
            protocol_seize_share: DEFAULT_PROTOCOL_SEIZE_SHARE,
        }
    }
}

impl RiskParams {
    /// Build validated parameters from human-readable fractions (e.g. `0.5`, `1.08`)
    pub fn from_decimals(
        close_factor: Decimal,
        liquidation_incentive: Decimal,
        protocol_seize_share: Decimal,
    ) -> Result<Self> {
        let params = Self {
            close_factor: to_wad(close_factor)?,
            liquidation_incentive: to_wad(liquidation_incentive)?,
            protocol_seize_share: to_wad(protocol_seize_share)?,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        validate_close_factor(self.close_factor)?;
        validate_liquidation_incentive(self.liquidation_incentive)?;
        validate_protocol_seize_share(self.protocol_seize_share)
    }
}

pub fn validate_close_factor(close_factor: u128) -> Result<()> {
    require!(
        (MIN_CLOSE_FACTOR..=MAX_CLOSE_FACTOR).contains(&close_factor),
        RiskError::InvalidCloseFactor
    );
    Ok(())
}

pub fn validate_liquidation_incentive(incentive: u128) -> Result<()> {
    require!(
        (MIN_LIQUIDATION_INCENTIVE..=MAX_LIQUIDATION_INCENTIVE).contains(&incentive),
        RiskError::InvalidLiquidationIncentive
    );
    Ok(())
}

pub fn validate_protocol_seize_share(share: u128) -> Result<()> {
    require!(share <= MAX_PROTOCOL_SEIZE_SHARE, RiskError::InvalidProtocolSeizeShare);
    Ok(())
}

// === Market Listing ===

/// Risk-engine view of a listed market
#[derive(AnchorSerialize, AnchorDeserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MarketConfig {
    pub listed: bool,

    /// Fraction of supplied value usable as borrowing power (WAD)
    pub collateral_factor: u128,

    /// Total borrows must stay strictly below this; 0 = uncapped
    pub borrow_cap: u128,

    /// Total underlying must stay strictly below this; 0 = uncapped
    pub supply_cap: u128,

    /// Whether the flywheel may distribute rewards in this market
    pub is_reward_eligible: bool,
}

// === Pause Flags ===

/// Actions gated by the policy hooks
#[derive(
    AnchorSerialize, AnchorDeserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub enum Action {
    Mint,
    Redeem,
    Borrow,
    Repay,
    Transfer,
    Seize,
    Liquidate,
}

/// Global and per-market pause switches
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PauseFlags {
    global: BTreeSet<Action>,
    per_market: BTreeSet<(Pubkey, Action)>,
}

impl PauseFlags {
    /// True if `action` is paused globally or in `market`
    pub fn is_paused(&self, market: &Pubkey, action: Action) -> bool {
        self.global.contains(&action) || self.per_market.contains(&(*market, action))
    }

    /// Set a flag; `market = None` targets the global switch.
    /// Returns the previous value.
    pub fn set(&mut self, market: Option<Pubkey>, action: Action, paused: bool) -> bool {
        match market {
            None => toggle(&mut self.global, action, paused),
            Some(market) => toggle(&mut self.per_market, (market, action), paused),
        }
    }

    pub fn get(&self, market: Option<&Pubkey>, action: Action) -> bool {
        match market {
            None => self.global.contains(&action),
            Some(market) => self.per_market.contains(&(*market, action)),
        }
    }
}

fn toggle<T: Ord>(set: &mut BTreeSet<T>, key: T, on: bool) -> bool {
    if on {
        !set.insert(key)
    } else {
        set.remove(&key)
    }
}

// === Engine Configuration ===

/// Settings a `RiskEngine` is created with
#[derive(AnchorSerialize, AnchorDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub risk: RiskParams,

    /// Cap on markets per account
    pub max_assets_per_account: u32,

    /// Receives the protocol share of seized collateral
    pub reserve_account: Pubkey,

    /// Token distributed by the reward flywheel
    pub reward_asset: Pubkey,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            risk: RiskParams::default(),
            max_assets_per_account: MAX_ASSETS_PER_ACCOUNT as u32,
            reserve_account: DEFAULT_RESERVE_ACCOUNT,
            reward_asset: DEFAULT_REWARD_ASSET,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        self.risk.validate()
    }
}
