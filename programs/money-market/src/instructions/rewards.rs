//! Reward flywheel instructions
//!
//! Speeds and contributor grants are admin-controlled. Claims settle every
//! listed market the caller names, then pay out as much of the accrued
//! balance as the funded reward balance covers.

use anchor_lang::prelude::*;
use crate::errors::RiskError;
use crate::events::{ContributorSpeedSet, RewardSpeedsSet, RewardsClaimed};
use super::context::MoneyMarket;

impl MoneyMarket {
    // ============================================================================
    // Speeds (Admin)
    // ============================================================================

    /// Set per-block reward speeds for suppliers and borrowers of `market`
    pub fn set_reward_speeds(
        &mut self,
        caller: &Pubkey,
        market: &Pubkey,
        supply_speed: u128,
        borrow_speed: u128,
    ) -> Result<()> {
        self.require_admin(caller)?;

        self.transact(&[*market], |mm| {
            let config = mm.ledger.engine.market_config(market)?;
            if supply_speed != 0 || borrow_speed != 0 {
                require!(config.is_reward_eligible, RiskError::MarketNotRewardEligible);
            }

            mm.accrue_market(market)?;
            let current_block = mm.current_block();
            let ledger = mm.ledger.markets.get(market).ok_or(RiskError::MarketNotListed)?;
            let (old_supply_speed, old_borrow_speed) = mm.ledger.engine.flywheel.set_speeds(
                ledger,
                supply_speed,
                borrow_speed,
                current_block,
            )?;

            emit!(RewardSpeedsSet {
                market: *market,
                old_supply_speed,
                new_supply_speed: supply_speed,
                old_borrow_speed,
                new_borrow_speed: borrow_speed,
            });
            Ok(())
        })
    }

    /// Stream `speed` reward units per block to `contributor`; zero stops it
    pub fn set_contributor_speed(
        &mut self,
        caller: &Pubkey,
        contributor: &Pubkey,
        speed: u128,
    ) -> Result<()> {
        self.require_admin(caller)?;

        self.transact(&[], |mm| {
            let current_block = mm.current_block();
            let old_speed = mm
                .ledger
                .engine
                .flywheel
                .set_contributor_speed(contributor, speed, current_block)?;

            emit!(ContributorSpeedSet {
                contributor: *contributor,
                old_speed,
                new_speed: speed,
            });
            Ok(())
        })
    }

    /// Credit `contributor` with what its speed earned so far
    pub fn update_contributor_rewards(&mut self, contributor: &Pubkey) -> Result<u128> {
        self.transact(&[], |mm| {
            let current_block = mm.current_block();
            mm.ledger.engine.flywheel.update_contributor(contributor, current_block)
        })
    }

    // ============================================================================
    // Funding & Claims
    // ============================================================================

    /// Pull reward asset from `funder` into the payable balance
    pub fn fund_rewards(&mut self, funder: &Pubkey, amount: u128) -> Result<u128> {
        require!(amount > 0, RiskError::ZeroAmount);

        self.transact(&[], |mm| {
            let reward_asset = mm.ledger.engine.config().reward_asset;
            mm.settle_in(&reward_asset, funder, amount, |mm, received| {
                mm.ledger.engine.flywheel.fund(funder, received)
            })
        })
    }

    /// Settle `account` in `markets` and pay out what the balance covers
    ///
    /// Returns the amount paid; anything the balance could not cover stays
    /// accrued for a later claim.
    pub fn claim_rewards(&mut self, account: &Pubkey, markets: &[Pubkey]) -> Result<u128> {
        self.transact(markets, |mm| {
            let current_block = mm.current_block();

            for market in markets {
                mm.ledger.engine.market_config(market)?;
                let ledger = mm.ledger.markets.get(market).ok_or(RiskError::MarketNotListed)?;
                let flywheel = &mut mm.ledger.engine.flywheel;

                flywheel.refresh_supply(ledger, &[account], current_block)?;
                flywheel.refresh_borrow(ledger, &[account], current_block)?;
            }
            mm.ledger.engine.flywheel.update_contributor(account, current_block)?;

            let (granted, remaining) = mm.ledger.engine.flywheel.grant(account)?;
            if granted > 0 {
                let reward_asset = mm.ledger.engine.config().reward_asset;
                mm.tokens.transfer_out(&reward_asset, account, granted)?;
            }

            emit!(RewardsClaimed {
                account: *account,
                amount: granted,
                remaining,
            });
            Ok(granted)
        })
    }

    /// Rewards accrued to `account` and not yet paid out
    pub fn reward_accrued(&self, account: &Pubkey) -> u128 {
        self.ledger.engine.flywheel().accrued(account)
    }

    /// Reward asset held for payouts
    pub fn reward_balance(&self) -> u128 {
        self.ledger.engine.flywheel().reward_balance()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::WAD;
    use crate::errors::assert_risk_err;
    use crate::instructions::context::test_support::*;

    #[test]
    fn test_speeds_need_eligible_market() {
        let mut f = fixture();
        let (market, _) = f.listed_market(WAD, 0);

        assert_risk_err(
            f.mm.set_reward_speeds(&f.admin, &market, 10, 0),
            RiskError::MarketNotRewardEligible,
        );
        // zero speeds are always accepted
        f.mm.set_reward_speeds(&f.admin, &market, 0, 0).unwrap();

        f.mm.set_reward_eligible(&f.admin, &market, true).unwrap();
        f.mm.set_reward_speeds(&f.admin, &market, 10, 5).unwrap();
        let state = f.mm.engine().flywheel().market_state(&market).unwrap();
        assert_eq!((state.supply_speed, state.borrow_speed), (10, 5));

        f.mm.set_reward_eligible(&f.admin, &market, false).unwrap();
        let state = f.mm.engine().flywheel().market_state(&market).unwrap();
        assert_eq!((state.supply_speed, state.borrow_speed), (0, 0));
    }

    #[test]
    fn test_claim_with_short_balance_is_partial() {
        let mut f = fixture();
        let (market, underlying) = f.listed_market(WAD, 0);
        let alice = Pubkey::new_unique();
        let funder = Pubkey::new_unique();
        let reward_asset = f.mm.engine().config().reward_asset;

        // 10_000 shares in total, 9_000 of them alice's
        f.fund(underlying, alice, 10_000);
        f.mm.mint(&alice, &market, 10_000).unwrap();
        f.mm.set_reward_eligible(&f.admin, &market, true).unwrap();
        f.mm.set_reward_speeds(&f.admin, &market, 100, 0).unwrap();
        f.mm.advance_blocks(10).unwrap();

        f.fund(reward_asset, funder, 1_500);
        assert_eq!(f.mm.fund_rewards(&funder, 500).unwrap(), 500);

        // 100 * 10 blocks * 9_000 / 10_000
        assert_eq!(f.mm.claim_rewards(&alice, &[market]).unwrap(), 500);
        assert_eq!(f.mm.reward_accrued(&alice), 400);
        assert_eq!(f.mm.reward_balance(), 0);

        f.mm.fund_rewards(&funder, 1_000).unwrap();
        assert_eq!(f.mm.claim_rewards(&alice, &[market]).unwrap(), 400);
        assert_eq!(f.mm.reward_accrued(&alice), 0);
        assert_eq!(f.tokens.balance_of(&reward_asset, &alice), 900);
    }

    #[test]
    fn test_contributor_rewards() {
        let mut f = fixture();
        let contributor = Pubkey::new_unique();
        let stranger = Pubkey::new_unique();

        assert_risk_err(
            f.mm.set_contributor_speed(&stranger, &contributor, 7),
            RiskError::Unauthorized,
        );
        f.mm.set_contributor_speed(&f.admin, &contributor, 7).unwrap();
        f.mm.advance_blocks(4).unwrap();
        assert_eq!(f.mm.update_contributor_rewards(&contributor).unwrap(), 28);

        f.mm.set_contributor_speed(&f.admin, &contributor, 0).unwrap();
        f.mm.advance_blocks(4).unwrap();
        assert_eq!(f.mm.update_contributor_rewards(&contributor).unwrap(), 0);
        assert_eq!(f.mm.reward_accrued(&contributor), 28);
    }
}
