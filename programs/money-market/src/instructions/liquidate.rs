//! Liquidation instruction
//!
//! `liquidate_borrow` repays part of a shortfall account's debt in one
//! market and pays the liquidator in collateral shares of another (or the
//! same) market. The seize amount is recomputed from what was actually
//! repaid, so fee-on-transfer debt assets never overpay the liquidator.

use anchor_lang::prelude::*;
use crate::engine::LiquidationQuote;
use crate::errors::RiskError;
use crate::events::{LiquidateBorrow, Seize};
use crate::math::display_wad;
use super::context::MoneyMarket;

impl MoneyMarket {
    /// Repay up to `repay_amount` of `borrower`'s debt in `debt_market` and
    /// seize collateral shares in `collateral_market`
    ///
    /// With `exact`, a repay above the close-factor limit fails instead of
    /// being capped. Returns the amounts actually moved.
    pub fn liquidate_borrow(
        &mut self,
        liquidator: &Pubkey,
        borrower: &Pubkey,
        debt_market: &Pubkey,
        collateral_market: &Pubkey,
        repay_amount: u128,
        exact: bool,
    ) -> Result<LiquidationQuote> {
        self.transact(&[*debt_market, *collateral_market], |mm| {
            mm.liquidate_borrow_fresh(
                liquidator,
                borrower,
                debt_market,
                collateral_market,
                repay_amount,
                exact,
            )
        })
    }

    fn liquidate_borrow_fresh(
        &mut self,
        liquidator: &Pubkey,
        borrower: &Pubkey,
        debt_market: &Pubkey,
        collateral_market: &Pubkey,
        repay_amount: u128,
        exact: bool,
    ) -> Result<LiquidationQuote> {
        // ===== CHECKS =====
        self.accrue_market(debt_market)?;
        self.accrue_market(collateral_market)?;
        let current_block = self.current_block();
        self.market(debt_market)?.require_fresh(current_block)?;
        self.market(collateral_market)?.require_fresh(current_block)?;

        let quote = self
            .ledger
            .engine
            .liquidation(&self.ledger.markets, self.oracle.as_ref())
            .can_liquidate(
                debt_market,
                collateral_market,
                liquidator,
                borrower,
                repay_amount,
                exact,
            )?;

        self.ledger.engine.can_seize(
            &self.ledger.markets,
            collateral_market,
            debt_market,
            liquidator,
            borrower,
            current_block,
        )?;

        // ===== REPAY & SEIZE =====
        let quote = self.repay_fresh(
            liquidator,
            borrower,
            debt_market,
            quote.repay_amount,
            |mm, repaid| {
                let liquidation = mm
                    .ledger
                    .engine
                    .liquidation(&mm.ledger.markets, mm.oracle.as_ref());
                let seize_shares =
                    liquidation.calculate_seize_shares(debt_market, collateral_market, repaid)?;
                let (liquidator_shares, protocol_shares) =
                    liquidation.split_seize_shares(seize_shares)?;

                mm.seize_fresh(
                    collateral_market,
                    liquidator,
                    borrower,
                    liquidator_shares,
                    protocol_shares,
                )?;

                Ok(LiquidationQuote {
                    repay_amount: repaid,
                    seize_shares,
                    liquidator_shares,
                    protocol_shares,
                })
            },
        )?;

        msg!(
            "Liquidated {}: repaid {} in {}, seized {} shares of {} (exchange rate {})",
            borrower,
            quote.repay_amount,
            debt_market,
            quote.seize_shares,
            collateral_market,
            display_wad(self.market(collateral_market)?.exchange_rate_stored()?)
        );

        emit!(LiquidateBorrow {
            liquidator: *liquidator,
            borrower: *borrower,
            debt_market: *debt_market,
            collateral_market: *collateral_market,
            repay_amount: quote.repay_amount,
            seize_shares: quote.seize_shares,
        });

        Ok(quote)
    }

    /// Move seized collateral shares out of `borrower`'s balance; the
    /// collateral market must have been accrued in the current block
    fn seize_fresh(
        &mut self,
        collateral_market: &Pubkey,
        liquidator: &Pubkey,
        borrower: &Pubkey,
        liquidator_shares: u128,
        protocol_shares: u128,
    ) -> Result<()> {
        let current_block = self.current_block();
        let reserve_account = self.ledger.engine.config().reserve_account;

        // ===== CHECKS =====
        let ledger = self.market(collateral_market)?;
        ledger.require_fresh(current_block)?;
        let seize_shares = liquidator_shares
            .checked_add(protocol_shares)
            .ok_or(RiskError::MathOverflow)?;
        require!(
            seize_shares <= ledger.share_balance(borrower),
            RiskError::ExcessiveSeize
        );

        // ===== EFFECTS =====
        let ledger = self.market_mut(collateral_market)?;
        ledger.move_shares(borrower, liquidator, liquidator_shares)?;
        ledger.move_shares(borrower, &reserve_account, protocol_shares)?;

        emit!(Seize {
            market: *collateral_market,
            liquidator: *liquidator,
            borrower: *borrower,
            liquidator_shares,
            protocol_shares,
            reserve_account,
            borrower_shares: ledger.share_balance(borrower),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use anchor_lang::prelude::Pubkey;
    use crate::constants::WAD;
    use crate::errors::{assert_risk_err, RiskError};
    use crate::instructions::context::test_support::*;

    struct Position {
        f: Fixture,
        collateral: Pubkey,
        debt: Pubkey,
        debt_asset: Pubkey,
        borrower: Pubkey,
        liquidator: Pubkey,
    }

    /// 10_000 collateral shares at cf 0.5 backing a 5_000 borrow, then the
    /// collateral price halves: shortfall 2_500
    fn underwater() -> Position {
        let mut f = fixture();
        let (collateral, collateral_asset) = f.listed_market(WAD, WAD / 2);
        let (debt, debt_asset) = f.listed_market(WAD, 0);
        let supplier = Pubkey::new_unique();
        let borrower = Pubkey::new_unique();
        let liquidator = Pubkey::new_unique();

        f.fund(debt_asset, supplier, 100_000);
        f.mm.mint(&supplier, &debt, 100_000).unwrap();
        f.fund(collateral_asset, borrower, 11_000);
        f.mm.mint(&borrower, &collateral, 11_000).unwrap();
        f.mm.enter_markets(&borrower, &[collateral]).unwrap();
        f.mm.borrow(&borrower, &debt, 5_000).unwrap();

        f.oracle.set_price(collateral_asset, WAD / 2);
        f.fund(debt_asset, liquidator, 10_000);

        Position { f, collateral, debt, debt_asset, borrower, liquidator }
    }

    #[test]
    fn test_liquidation_accrues_and_moves_shares() {
        let mut p = underwater();
        p.f.mm.advance_blocks(3).unwrap();

        // 1_000 * 1.08 / 0.5 = 2_160 shares, 2.8% of them to the protocol
        let quote = p
            .f
            .mm
            .liquidate_borrow(&p.liquidator, &p.borrower, &p.debt, &p.collateral, 1_000, true)
            .unwrap();
        assert_eq!(quote.seize_shares, 2_160);
        assert_eq!(quote.protocol_shares, 60);
        assert_eq!(quote.liquidator_shares, 2_100);

        let market = p.f.mm.market(&p.collateral).unwrap();
        assert_eq!(market.share_balance(&p.liquidator), 2_100);
        assert_eq!(market.share_balance(&p.borrower), 10_000 - 2_160);
        assert_eq!(market.state.last_accrual_block, 3);
        assert_eq!(p.f.mm.market(&p.debt).unwrap().state.last_accrual_block, 3);
    }

    #[test]
    fn test_excessive_seize_leaves_balances_untouched() {
        let mut p = underwater();
        // 2_500 * 1.08 / 0.1 = 27_000 shares against a balance of 10_000
        let collateral_asset = p.f.mm.market(&p.collateral).unwrap().underlying;
        p.f.oracle.set_price(collateral_asset, WAD / 10);

        assert_risk_err(
            p.f.mm.liquidate_borrow(&p.liquidator, &p.borrower, &p.debt, &p.collateral, 2_500, true),
            RiskError::ExcessiveSeize,
        );
        assert_risk_err(
            p.f.mm.liquidate_borrow(&p.borrower, &p.borrower, &p.debt, &p.collateral, 1, false),
            RiskError::SelfLiquidationNotAllowed,
        );

        assert_eq!(p.f.tokens.balance_of(&p.debt_asset, &p.liquidator), 10_000);
        let market = p.f.mm.market(&p.collateral).unwrap();
        assert_eq!(market.share_balance(&p.borrower), 10_000);
        assert_eq!(market.share_balance(&p.liquidator), 0);
    }
}
