//! Admin instructions for risk management
//!
//! - Collateral factors, borrow and supply caps
//! - Close factor, liquidation incentive, protocol seize share
//! - Pause controls (guardian may pause, only admin unpauses)
//! - Reserve factor and rate model (accrue first)

use std::sync::Arc;

use anchor_lang::prelude::*;
use crate::constants::{MAX_BORROW_RATE_PER_BLOCK, MAX_RESERVE_FACTOR};
use crate::errors::RiskError;
use crate::events::{RateModelSet, ReserveFactorSet, RewardSpeedsSet};
use crate::interfaces::{require_admin_or_guardian, RateModel};
use crate::state::Action;
use super::context::MoneyMarket;

impl MoneyMarket {
    // ============================================================================
    // Market Risk Parameters
    // ============================================================================

    pub fn set_collateral_factor(
        &mut self,
        caller: &Pubkey,
        market: &Pubkey,
        collateral_factor: u128,
    ) -> Result<()> {
        self.require_admin(caller)?;

        self.transact(&[], |mm| {
            let ledger = mm.ledger.markets.get(market).ok_or(RiskError::MarketNotListed)?;
            mm.ledger
                .engine
                .set_collateral_factor(ledger, mm.oracle.as_ref(), collateral_factor)
        })
    }

    /// Zero disables the cap
    pub fn set_borrow_cap(&mut self, caller: &Pubkey, market: &Pubkey, borrow_cap: u128) -> Result<()> {
        self.require_admin(caller)?;
        self.transact(&[], |mm| mm.ledger.engine.set_borrow_cap(market, borrow_cap))
    }

    /// Zero disables the cap
    pub fn set_supply_cap(&mut self, caller: &Pubkey, market: &Pubkey, supply_cap: u128) -> Result<()> {
        self.require_admin(caller)?;
        self.transact(&[], |mm| mm.ledger.engine.set_supply_cap(market, supply_cap))
    }

    /// Making a market ineligible stops both of its reward streams
    pub fn set_reward_eligible(&mut self, caller: &Pubkey, market: &Pubkey, eligible: bool) -> Result<()> {
        self.require_admin(caller)?;

        self.transact(&[*market], |mm| {
            mm.accrue_market(market)?;
            let current_block = mm.current_block();
            mm.ledger.engine.set_reward_eligible(market, eligible)?;
            if eligible {
                return Ok(());
            }

            let ledger = mm.ledger.markets.get(market).ok_or(RiskError::MarketNotListed)?;
            let (old_supply_speed, old_borrow_speed) =
                mm.ledger.engine.flywheel.set_speeds(ledger, 0, 0, current_block)?;
            if old_supply_speed != 0 || old_borrow_speed != 0 {
                emit!(RewardSpeedsSet {
                    market: *market,
                    old_supply_speed,
                    new_supply_speed: 0,
                    old_borrow_speed,
                    new_borrow_speed: 0,
                });
            }
            Ok(())
        })
    }

    // ============================================================================
    // Protocol Risk Parameters
    // ============================================================================

    pub fn set_close_factor(&mut self, caller: &Pubkey, close_factor: u128) -> Result<()> {
        self.require_admin(caller)?;
        self.transact(&[], |mm| mm.ledger.engine.set_close_factor(close_factor))
    }

    pub fn set_liquidation_incentive(&mut self, caller: &Pubkey, incentive: u128) -> Result<()> {
        self.require_admin(caller)?;
        self.transact(&[], |mm| mm.ledger.engine.set_liquidation_incentive(incentive))
    }

    pub fn set_protocol_seize_share(&mut self, caller: &Pubkey, share: u128) -> Result<()> {
        self.require_admin(caller)?;
        self.transact(&[], |mm| mm.ledger.engine.set_protocol_seize_share(share))
    }

    // ============================================================================
    // Pause Controls
    // ============================================================================

    /// Pause or unpause `action` on `market`, or globally with `None`
    ///
    /// The guardian may only pause; unpausing needs the admin.
    pub fn set_action_paused(
        &mut self,
        caller: &Pubkey,
        market: Option<Pubkey>,
        action: Action,
        paused: bool,
    ) -> Result<()> {
        if paused {
            require_admin_or_guardian(self.authority.as_ref(), caller)?;
        } else {
            self.require_admin(caller)?;
        }

        self.transact(&[], |mm| mm.ledger.engine.set_paused(market, action, paused))
    }

    // ============================================================================
    // Interest Parameters
    // ============================================================================

    /// Interest up to now accrues at the old reserve factor
    pub fn set_reserve_factor(
        &mut self,
        caller: &Pubkey,
        market: &Pubkey,
        reserve_factor: u128,
    ) -> Result<()> {
        self.require_admin(caller)?;
        require!(reserve_factor <= MAX_RESERVE_FACTOR, RiskError::InvalidReserveFactor);

        self.transact(&[*market], |mm| {
            mm.accrue_market(market)?;
            let current_block = mm.current_block();
            let ledger = mm.market_mut(market)?;
            ledger.require_fresh(current_block)?;

            let old_reserve_factor = ledger.reserve_factor;
            ledger.reserve_factor = reserve_factor;

            emit!(ReserveFactorSet {
                market: *market,
                old_reserve_factor,
                new_reserve_factor: reserve_factor,
            });
            Ok(())
        })
    }

    /// Interest up to now accrues at the old model's rate
    pub fn set_rate_model(
        &mut self,
        caller: &Pubkey,
        market: &Pubkey,
        rate_model: Arc<dyn RateModel>,
    ) -> Result<()> {
        self.require_admin(caller)?;

        self.transact(&[*market], |mm| {
            mm.accrue_market(market)?;
            let current_block = mm.current_block();
            let ledger = mm.market_mut(market)?;
            ledger.require_fresh(current_block)?;

            let old_borrow_rate = ledger.borrow_rate_per_block()?;
            ledger.rate_model = rate_model;
            let new_borrow_rate = ledger.borrow_rate_per_block()?;
            require!(
                new_borrow_rate <= MAX_BORROW_RATE_PER_BLOCK,
                RiskError::RateTooHigh
            );

            emit!(RateModelSet {
                market: *market,
                old_borrow_rate,
                new_borrow_rate,
            });
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::WAD;
    use crate::errors::assert_risk_err;
    use crate::instructions::context::test_support::*;
    use crate::interfaces::{FixedRateModel, RoleAuthority};

    #[test]
    fn test_collateral_factor_bounds_and_price() {
        let mut f = fixture();
        let (market, underlying) = f.listed_market(WAD, 0);

        assert_risk_err(
            f.mm.set_collateral_factor(&f.admin, &market, WAD * 95 / 100),
            RiskError::InvalidCollateralFactor,
        );

        f.oracle.set_price(underlying, 0);
        assert_risk_err(
            f.mm.set_collateral_factor(&f.admin, &market, WAD / 2),
            RiskError::PriceUnavailable,
        );
        // zero never needs a price
        f.mm.set_collateral_factor(&f.admin, &market, 0).unwrap();

        f.oracle.set_price(underlying, WAD);
        f.mm.set_collateral_factor(&f.admin, &market, WAD / 2).unwrap();
        assert_eq!(
            f.mm.engine().market_config(&market).unwrap().collateral_factor,
            WAD / 2
        );
    }

    #[test]
    fn test_admin_only_setters() {
        let mut f = fixture();
        let (market, _) = f.listed_market(WAD, 0);
        let stranger = Pubkey::new_unique();

        assert_risk_err(f.mm.set_borrow_cap(&stranger, &market, 1), RiskError::Unauthorized);
        assert_risk_err(f.mm.set_close_factor(&stranger, WAD / 2), RiskError::Unauthorized);
        assert_risk_err(
            f.mm.set_reserve_factor(&stranger, &market, WAD / 10),
            RiskError::Unauthorized,
        );
        assert_risk_err(
            f.mm.set_borrow_cap(&f.admin, &Pubkey::new_unique(), 1),
            RiskError::MarketNotListed,
        );
    }

    #[test]
    fn test_protocol_parameter_bounds() {
        let mut f = fixture();

        assert_risk_err(f.mm.set_close_factor(&f.admin, WAD), RiskError::InvalidCloseFactor);
        assert_risk_err(
            f.mm.set_liquidation_incentive(&f.admin, WAD * 2),
            RiskError::InvalidLiquidationIncentive,
        );
        assert_risk_err(
            f.mm.set_protocol_seize_share(&f.admin, WAD),
            RiskError::InvalidProtocolSeizeShare,
        );

        f.mm.set_close_factor(&f.admin, WAD * 3 / 10).unwrap();
        f.mm.set_liquidation_incentive(&f.admin, WAD * 11 / 10).unwrap();
        f.mm.set_protocol_seize_share(&f.admin, 0).unwrap();

        let risk = f.mm.engine().config().risk;
        assert_eq!(risk.close_factor, WAD * 3 / 10);
        assert_eq!(risk.liquidation_incentive, WAD * 11 / 10);
        assert_eq!(risk.protocol_seize_share, 0);
    }

    #[test]
    fn test_guardian_pauses_but_cannot_unpause() {
        let admin = Pubkey::new_unique();
        let guardian = Pubkey::new_unique();
        let mut f = fixture();
        f.mm.authority = Arc::new(RoleAuthority::new(admin).with_guardian(guardian));
        f.admin = admin;
        let (market, _) = f.listed_market(WAD, 0);

        f.mm.set_action_paused(&guardian, Some(market), Action::Borrow, true).unwrap();
        f.mm.set_action_paused(&guardian, None, Action::Transfer, true).unwrap();
        assert!(f.mm.engine().pause_flags().is_paused(&market, Action::Borrow));
        assert!(f.mm.engine().pause_flags().is_paused(&market, Action::Transfer));

        assert_risk_err(
            f.mm.set_action_paused(&guardian, Some(market), Action::Borrow, false),
            RiskError::Unauthorized,
        );
        assert_risk_err(
            f.mm.set_action_paused(&Pubkey::new_unique(), None, Action::Mint, true),
            RiskError::Unauthorized,
        );

        f.mm.set_action_paused(&admin, Some(market), Action::Borrow, false).unwrap();
        assert!(!f.mm.engine().pause_flags().is_paused(&market, Action::Borrow));
    }

    #[test]
    fn test_reserve_factor_accrues_at_old_value() {
        let mut f = fixture();
        let (collateral, collateral_asset) = f.listed_market(WAD, WAD / 2);
        let (debt, debt_asset) = f.listed_market(WAD, 0);
        let supplier = Pubkey::new_unique();
        let borrower = Pubkey::new_unique();
        f.fund(debt_asset, supplier, 1_000_000);
        f.mm.mint(&supplier, &debt, 1_000_000).unwrap();
        f.fund(collateral_asset, borrower, 1_000_000);
        f.mm.mint(&borrower, &collateral, 1_000_000).unwrap();
        f.mm.enter_markets(&borrower, &[collateral]).unwrap();

        f.mm
            .set_rate_model(&f.admin, &debt, Arc::new(FixedRateModel::new(WAD / 10_000)))
            .unwrap();
        f.mm.borrow(&borrower, &debt, 100_000).unwrap();
        f.mm.advance_blocks(10).unwrap();

        // 10 blocks at 0.01% on 100_000 = 100 of interest, none reserved yet
        f.mm.set_reserve_factor(&f.admin, &debt, WAD / 2).unwrap();
        let ledger = f.mm.market(&debt).unwrap();
        assert_eq!(ledger.state.total_borrows, 100_100);
        assert_eq!(ledger.state.total_reserves, 0);
        assert_eq!(ledger.reserve_factor, WAD / 2);

        assert_risk_err(
            f.mm.set_reserve_factor(&f.admin, &debt, WAD + 1),
            RiskError::InvalidReserveFactor,
        );
    }

    #[test]
    fn test_rate_model_ceiling() {
        let mut f = fixture();
        let (market, _) = f.listed_market(WAD, 0);

        assert_risk_err(
            f.mm.set_rate_model(
                &f.admin,
                &market,
                Arc::new(FixedRateModel::new(MAX_BORROW_RATE_PER_BLOCK + 1)),
            ),
            RiskError::RateTooHigh,
        );
        f.mm
            .set_rate_model(&f.admin, &market, Arc::new(FixedRateModel::new(MAX_BORROW_RATE_PER_BLOCK)))
            .unwrap();
        assert_eq!(
            f.mm.market(&market).unwrap().borrow_rate_per_block().unwrap(),
            MAX_BORROW_RATE_PER_BLOCK
        );
    }
}
