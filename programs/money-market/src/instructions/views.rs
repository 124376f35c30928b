//! Read-only views over stored state
//!
//! Nothing here accrues; callers wanting live values use
//! `exchange_rate_current` / `borrow_balance_current` first.

use anchor_lang::prelude::*;
use crate::engine::{LiquidationQuote, Liquidity};
use crate::state::AccountSnapshot;
use super::context::MoneyMarket;

impl MoneyMarket {
    // ============================================================================
    // Market Views
    // ============================================================================

    pub fn exchange_rate_stored(&self, market: &Pubkey) -> Result<u128> {
        self.market(market)?.exchange_rate_stored()
    }

    /// cash + borrows - reserves
    pub fn total_underlying(&self, market: &Pubkey) -> Result<u128> {
        self.market(market)?.total_underlying()
    }

    pub fn borrow_rate_per_block(&self, market: &Pubkey) -> Result<u128> {
        self.market(market)?.borrow_rate_per_block()
    }

    pub fn supply_rate_per_block(&self, market: &Pubkey) -> Result<u128> {
        self.market(market)?.supply_rate_per_block()
    }

    // ============================================================================
    // Account Views
    // ============================================================================

    /// (shares, debt, exchange rate) of `account` in `market`
    pub fn account_snapshot(&self, market: &Pubkey, account: &Pubkey) -> Result<AccountSnapshot> {
        self.market(market)?.account_snapshot(account)
    }

    pub fn borrow_balance_stored(&self, market: &Pubkey, account: &Pubkey) -> Result<u128> {
        self.market(market)?.borrow_balance_stored(account)
    }

    pub fn all_markets(&self) -> &[Pubkey] {
        self.ledger.engine.all_markets()
    }

    pub fn markets_of(&self, account: &Pubkey) -> &[Pubkey] {
        self.ledger.engine.markets_of(account)
    }

    pub fn account_liquidity(&self, account: &Pubkey) -> Result<Liquidity> {
        self.ledger
            .engine
            .account_liquidity(&self.ledger.markets, self.oracle.as_ref(), account)
    }

    /// Liquidity after redeeming `redeem_shares` and borrowing `borrow_amount` in `market`
    pub fn hypothetical_liquidity(
        &self,
        account: &Pubkey,
        market: &Pubkey,
        redeem_shares: u128,
        borrow_amount: u128,
    ) -> Result<Liquidity> {
        self.ledger.engine.hypothetical_liquidity(
            &self.ledger.markets,
            self.oracle.as_ref(),
            account,
            Some(market),
            redeem_shares,
            borrow_amount,
        )
    }

    // ============================================================================
    // Liquidation Views
    // ============================================================================

    /// Quote a liquidation against stored state without executing it
    pub fn can_liquidate(
        &self,
        liquidator: &Pubkey,
        borrower: &Pubkey,
        debt_market: &Pubkey,
        collateral_market: &Pubkey,
        repay_amount: u128,
        exact: bool,
    ) -> Result<LiquidationQuote> {
        self.ledger
            .engine
            .liquidation(&self.ledger.markets, self.oracle.as_ref())
            .can_liquidate(
                debt_market,
                collateral_market,
                liquidator,
                borrower,
                repay_amount,
                exact,
            )
    }

    pub fn calculate_seize_shares(
        &self,
        debt_market: &Pubkey,
        collateral_market: &Pubkey,
        repay_amount: u128,
    ) -> Result<u128> {
        self.ledger
            .engine
            .liquidation(&self.ledger.markets, self.oracle.as_ref())
            .calculate_seize_shares(debt_market, collateral_market, repay_amount)
    }
}
