//! Borrow and repay instructions
//!
//! CEI Pattern: Checks → Effects → Interactions. Repay pulls the
//! underlying in before touching the debt, so only what actually arrived
//! is credited; a failure after the pull refunds the payer.

use anchor_lang::prelude::*;
use crate::errors::RiskError;
use crate::events::{Borrow, RepayBorrow};
use crate::math::{checked_add, checked_sub};
use super::context::MoneyMarket;

impl MoneyMarket {
    // ============================================================================
    // Borrow
    // ============================================================================

    /// Borrow `amount` of underlying from `market`
    ///
    /// Enters the market for `borrower` if needed.
    pub fn borrow(&mut self, borrower: &Pubkey, market: &Pubkey, amount: u128) -> Result<()> {
        require!(amount > 0, RiskError::ZeroAmount);

        self.transact(&[*market], |mm| {
            // ===== CHECKS =====
            mm.accrue_market(market)?;
            let current_block = mm.current_block();
            mm.ledger.engine.can_borrow(
                &mm.ledger.markets,
                mm.oracle.as_ref(),
                market,
                borrower,
                amount,
                current_block,
            )?;

            let ledger = mm.market(market)?;
            ledger.require_fresh(current_block)?;
            require!(ledger.cash >= amount, RiskError::InsufficientCash);
            let underlying = ledger.underlying;
            let account_borrows = checked_add(ledger.borrow_balance_stored(borrower)?, amount)?;
            let total_borrows = checked_add(ledger.state.total_borrows, amount)?;

            // ===== EFFECTS =====
            let ledger = mm.market_mut(market)?;
            ledger.set_borrow(borrower, account_borrows);
            ledger.state.total_borrows = total_borrows;
            ledger.cash = checked_sub(ledger.cash, amount)?;
            let cash = ledger.cash;

            // ===== INTERACTIONS =====
            mm.tokens.transfer_out(&underlying, borrower, amount)?;

            emit!(Borrow {
                market: *market,
                borrower: *borrower,
                amount,
                account_borrows,
                total_borrows,
                cash,
            });
            Ok(())
        })
    }

    // ============================================================================
    // Repay
    // ============================================================================

    /// Repay own debt; `u128::MAX` repays all of it. Returns the amount repaid.
    pub fn repay_borrow(&mut self, payer: &Pubkey, market: &Pubkey, amount: u128) -> Result<u128> {
        self.repay_borrow_behalf(payer, payer, market, amount)
    }

    /// Repay `borrower`'s debt from `payer`; `u128::MAX` repays all of it
    pub fn repay_borrow_behalf(
        &mut self,
        payer: &Pubkey,
        borrower: &Pubkey,
        market: &Pubkey,
        amount: u128,
    ) -> Result<u128> {
        self.transact(&[*market], |mm| {
            mm.repay_fresh(payer, borrower, market, amount, |_, repaid| Ok(repaid))
        })
    }

    /// Repay, then hand the amount actually repaid to `then`
    ///
    /// `then` runs before the payer's transfer is final: if it fails, the
    /// transfer is refunded along with the repay itself.
    pub(crate) fn repay_fresh<T>(
        &mut self,
        payer: &Pubkey,
        borrower: &Pubkey,
        market: &Pubkey,
        amount: u128,
        then: impl FnOnce(&mut Self, u128) -> Result<T>,
    ) -> Result<T> {
        // ===== CHECKS =====
        self.accrue_market(market)?;
        let current_block = self.current_block();
        self.ledger
            .engine
            .can_repay(&self.ledger.markets, market, borrower, current_block)?;

        let ledger = self.market(market)?;
        ledger.require_fresh(current_block)?;
        let debt = ledger.borrow_balance_stored(borrower)?;
        let repay_amount = if amount == u128::MAX { debt } else { amount };
        require!(repay_amount > 0, RiskError::ZeroAmount);
        require!(repay_amount <= debt, RiskError::RepayExceedsDebt);
        let underlying = ledger.underlying;

        // ===== INTERACTIONS =====
        self.settle_in(&underlying, payer, repay_amount, |mm, received| {
            // ===== EFFECTS =====
            let ledger = mm.market_mut(market)?;
            let account_borrows = checked_sub(debt, received)?;
            let total_borrows = checked_sub(ledger.state.total_borrows, received)?;
            ledger.set_borrow(borrower, account_borrows);
            ledger.state.total_borrows = total_borrows;
            ledger.cash = checked_add(ledger.cash, received)?;

            emit!(RepayBorrow {
                market: *market,
                payer: *payer,
                borrower: *borrower,
                amount: received,
                account_borrows,
                total_borrows,
                cash: ledger.cash,
            });

            then(mm, received)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use anchor_lang::prelude::Pubkey;
    use crate::constants::WAD;
    use crate::errors::{assert_risk_err, RiskError};
    use crate::instructions::context::test_support::*;
    use crate::interfaces::FixedRateModel;

    /// Supplier funds the debt market; borrower posts 10_000 units of collateral at cf 0.5
    fn setup() -> (Fixture, Pubkey, Pubkey, Pubkey, Pubkey) {
        let mut f = fixture();
        let (collateral, collateral_asset) = f.listed_market(WAD, WAD / 2);
        let (debt, debt_asset) = f.listed_market(WAD, 0);
        let supplier = Pubkey::new_unique();
        let borrower = Pubkey::new_unique();

        f.fund(debt_asset, supplier, 100_000);
        f.mm.mint(&supplier, &debt, 100_000).unwrap();

        f.fund(collateral_asset, borrower, 11_000);
        f.mm.mint(&borrower, &collateral, 11_000).unwrap();
        f.mm.enter_markets(&borrower, &[collateral]).unwrap();

        (f, collateral, debt, debt_asset, borrower)
    }

    #[test]
    fn test_borrow_enters_market() {
        let (mut f, collateral, debt, debt_asset, borrower) = setup();

        f.mm.borrow(&borrower, &debt, 4_000).unwrap();
        assert_eq!(f.mm.engine().markets_of(&borrower), &[collateral, debt]);
        assert_eq!(f.mm.market(&debt).unwrap().borrow_balance_stored(&borrower).unwrap(), 4_000);
        assert_eq!(f.mm.market(&debt).unwrap().state.total_borrows, 4_000);
        assert_eq!(f.tokens.balance_of(&debt_asset, &borrower), 4_000);
    }

    #[test]
    fn test_borrow_beyond_collateral_fails() {
        let (mut f, _, debt, _, borrower) = setup();

        // 10_000 shares * 0.5 = 5_000 of borrowing power
        assert_risk_err(f.mm.borrow(&borrower, &debt, 5_001), RiskError::InsufficientCollateral);
        // the auto-entry rolled back with the failed borrow
        assert_eq!(f.mm.engine().markets_of(&borrower).len(), 1);

        f.mm.borrow(&borrower, &debt, 5_000).unwrap();
    }

    #[test]
    fn test_borrow_cap_is_strict() {
        let (mut f, _, debt, _, borrower) = setup();
        f.mm.set_borrow_cap(&f.admin, &debt, 3_000).unwrap();

        assert_risk_err(f.mm.borrow(&borrower, &debt, 3_000), RiskError::BorrowCapReached);
        f.mm.borrow(&borrower, &debt, 2_999).unwrap();
    }

    #[test]
    fn test_repay_full_with_max() {
        let (mut f, _, debt, debt_asset, borrower) = setup();
        f.mm.borrow(&borrower, &debt, 4_000).unwrap();

        assert_risk_err(f.mm.repay_borrow(&borrower, &debt, 4_001), RiskError::RepayExceedsDebt);
        assert_eq!(f.tokens.balance_of(&debt_asset, &borrower), 4_000);
        assert_eq!(f.mm.repay_borrow(&borrower, &debt, 1_000).unwrap(), 1_000);
        assert_eq!(f.mm.repay_borrow(&borrower, &debt, u128::MAX).unwrap(), 3_000);

        let ledger = f.mm.market(&debt).unwrap();
        assert_eq!(ledger.borrow_balance_stored(&borrower).unwrap(), 0);
        assert_eq!(ledger.state.total_borrows, 0);
        assert_eq!(f.tokens.balance_of(&debt_asset, &borrower), 0);
    }

    #[test]
    fn test_repay_behalf_and_interest() {
        let (mut f, _, debt, debt_asset, borrower) = setup();
        // 0.01% per block
        f.mm
            .set_rate_model(&f.admin, &debt, Arc::new(FixedRateModel::new(WAD / 10_000)))
            .unwrap();
        f.mm.borrow(&borrower, &debt, 4_000).unwrap();
        f.mm.advance_blocks(10).unwrap();

        // 0.01% * 10 blocks on 4_000
        assert_eq!(f.mm.borrow_balance_current(&debt, &borrower).unwrap(), 4_004);

        let helper = Pubkey::new_unique();
        f.fund(debt_asset, helper, 10_000);
        assert_eq!(
            f.mm.repay_borrow_behalf(&helper, &borrower, &debt, u128::MAX).unwrap(),
            4_004
        );
        assert_eq!(f.tokens.balance_of(&debt_asset, &helper), 10_000 - 4_004);
    }

    #[test]
    fn test_total_borrows_cover_every_debt() {
        let (mut f, collateral, debt, debt_asset, first) = setup();
        f.mm
            .set_rate_model(&f.admin, &debt, Arc::new(FixedRateModel::new(WAD / 2_001)))
            .unwrap();
        let collateral_asset = f.mm.market(&collateral).unwrap().underlying;

        let mut borrowers = vec![first];
        for _ in 0..3 {
            let borrower = Pubkey::new_unique();
            f.fund(collateral_asset, borrower, 10_000);
            f.mm.mint(&borrower, &collateral, 10_000).unwrap();
            f.mm.enter_markets(&borrower, &[collateral]).unwrap();
            borrowers.push(borrower);
        }

        for step in 0..40u128 {
            let borrower = borrowers[(step % 4) as usize];
            f.mm.advance_blocks(1 + (step % 3) as u64).unwrap();
            f.mm.borrow(&borrower, &debt, 7 + step).unwrap();
            f.mm.accrue_interest(&debt).unwrap();

            let ledger = f.mm.market(&debt).unwrap();
            let owed: u128 = borrowers
                .iter()
                .map(|b| ledger.borrow_balance_stored(b).unwrap())
                .sum();
            assert!(owed <= ledger.state.total_borrows, "step {step}: {owed} owed");
        }

        for borrower in &borrowers {
            f.fund(debt_asset, *borrower, 10_000);
            f.mm.repay_borrow(borrower, &debt, u128::MAX).unwrap();
            assert_eq!(f.mm.borrow_balance_stored(&debt, borrower).unwrap(), 0);
        }
    }
}
