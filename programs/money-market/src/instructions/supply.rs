//! Mint, redeem and share transfer instructions
//!
//! CEI Pattern: Checks → Effects → Interactions. Mint is the exception:
//! the underlying is pulled in before shares are computed, because the
//! amount actually received (fee-on-transfer assets) decides the shares.
//! Mint checks the quoted amount before the pull and the received amount
//! after it; a failure after the pull refunds the minter.

use anchor_lang::prelude::*;
use crate::errors::RiskError;
use crate::events;
use crate::constants::DEAD_SHARES;
use crate::math::{checked_add, checked_sub, to_shares_down, to_shares_up, to_underlying_down};
use crate::state::Market;
use super::context::MoneyMarket;

impl MoneyMarket {
    // ============================================================================
    // Mint
    // ============================================================================

    /// Supply `amount` of underlying to `market`
    ///
    /// Returns the shares credited to `minter`. The first mint of a market
    /// also locks `DEAD_SHARES` forever.
    pub fn mint(&mut self, minter: &Pubkey, market: &Pubkey, amount: u128) -> Result<u128> {
        require!(amount > 0, RiskError::ZeroAmount);
        self.transact(&[*market], |mm| mm.mint_fresh(minter, market, amount))
    }

    fn mint_fresh(&mut self, minter: &Pubkey, market: &Pubkey, amount: u128) -> Result<u128> {
        // ===== CHECKS =====
        self.accrue_market(market)?;
        let current_block = self.current_block();
        self.ledger
            .engine
            .can_mint(&self.ledger.markets, market, minter, amount, current_block)?;

        let ledger = self.market(market)?;
        ledger.require_fresh(current_block)?;
        let underlying = ledger.underlying;
        let exchange_rate = ledger.exchange_rate_stored()?;
        require_mintable(ledger, to_shares_down(amount, exchange_rate)?)?;

        // ===== INTERACTIONS =====
        self.settle_in(&underlying, minter, amount, |mm, received| {
            let shares = to_shares_down(received, exchange_rate)?;

            // ===== EFFECTS =====
            let ledger = mm.market_mut(market)?;
            require_mintable(ledger, shares)?;
            ledger.cash = checked_add(ledger.cash, received)?;
            let minted = ledger.mint_shares(minter, shares)?;

            emit!(events::Mint {
                market: *market,
                minter: *minter,
                amount: received,
                shares: minted.to_minter,
                locked_shares: minted.locked,
                total_shares: ledger.state.total_shares,
                cash: ledger.cash,
            });

            Ok(minted.to_minter)
        })
    }

    // ============================================================================
    // Redeem
    // ============================================================================

    /// Burn `shares` of `market` for underlying; returns the underlying paid
    pub fn redeem(&mut self, redeemer: &Pubkey, market: &Pubkey, shares: u128) -> Result<u128> {
        require!(shares > 0, RiskError::ZeroAmount);
        self.transact(&[*market], |mm| {
            let (_, amount) = mm.redeem_fresh(redeemer, market, shares, 0)?;
            Ok(amount)
        })
    }

    /// Withdraw exactly `amount` of underlying; returns the shares burned
    pub fn redeem_underlying(
        &mut self,
        redeemer: &Pubkey,
        market: &Pubkey,
        amount: u128,
    ) -> Result<u128> {
        require!(amount > 0, RiskError::ZeroAmount);
        self.transact(&[*market], |mm| {
            let (shares, _) = mm.redeem_fresh(redeemer, market, 0, amount)?;
            Ok(shares)
        })
    }

    /// Exactly one of `shares_in` / `amount_in` is nonzero
    fn redeem_fresh(
        &mut self,
        redeemer: &Pubkey,
        market: &Pubkey,
        shares_in: u128,
        amount_in: u128,
    ) -> Result<(u128, u128)> {
        // ===== CHECKS =====
        self.accrue_market(market)?;
        let current_block = self.current_block();

        let exchange_rate = self.market(market)?.exchange_rate_stored()?;
        let (shares, amount) = if shares_in > 0 {
            (shares_in, to_underlying_down(shares_in, exchange_rate)?)
        } else {
            (to_shares_up(amount_in, exchange_rate)?, amount_in)
        };
        require!(amount > 0, RiskError::ZeroAmount);

        self.ledger.engine.can_redeem(
            &self.ledger.markets,
            self.oracle.as_ref(),
            market,
            redeemer,
            shares,
            current_block,
        )?;

        let ledger = self.market(market)?;
        ledger.require_fresh(current_block)?;
        require!(ledger.share_balance(redeemer) >= shares, RiskError::InsufficientShares);
        require!(ledger.cash >= amount, RiskError::InsufficientCash);
        let underlying = ledger.underlying;

        // ===== EFFECTS =====
        let ledger = self.market_mut(market)?;
        ledger.burn_shares(redeemer, shares)?;
        ledger.cash = checked_sub(ledger.cash, amount)?;
        let total_shares = ledger.state.total_shares;
        let cash = ledger.cash;

        // ===== INTERACTIONS =====
        self.tokens.transfer_out(&underlying, redeemer, amount)?;

        emit!(events::Redeem {
            market: *market,
            redeemer: *redeemer,
            amount,
            shares,
            total_shares,
            cash,
        });

        Ok((shares, amount))
    }

    // ============================================================================
    // Transfer
    // ============================================================================

    /// Move `shares` of `market` from `source` to `destination`
    pub fn transfer(
        &mut self,
        source: &Pubkey,
        destination: &Pubkey,
        market: &Pubkey,
        shares: u128,
    ) -> Result<()> {
        require_keys_neq!(*source, *destination, RiskError::SelfTransferNotAllowed);
        require!(shares > 0, RiskError::ZeroAmount);

        self.transact(&[*market], |mm| {
            // ===== CHECKS =====
            mm.accrue_market(market)?;
            let current_block = mm.current_block();
            mm.ledger.engine.can_transfer(
                &mm.ledger.markets,
                mm.oracle.as_ref(),
                market,
                source,
                destination,
                shares,
                current_block,
            )?;
            require!(
                mm.market(market)?.share_balance(source) >= shares,
                RiskError::InsufficientShares
            );

            // ===== EFFECTS =====
            mm.market_mut(market)?.move_shares(source, destination, shares)?;

            emit!(events::Transfer {
                market: *market,
                from: *source,
                to: *destination,
                shares,
            });
            Ok(())
        })
    }
}

/// Minting `shares` must credit something, and a market's first mint must
/// cover the locked `DEAD_SHARES`
fn require_mintable(ledger: &Market, shares: u128) -> Result<()> {
    require!(shares > 0, RiskError::ZeroAmount);
    if ledger.state.total_shares == 0 {
        require!(shares > DEAD_SHARES, RiskError::InsufficientInitialDeposit);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::constants::{DEAD_SHARES, WAD};
    use crate::errors::{assert_risk_err, RiskError};
    use crate::instructions::context::test_support::*;
    use crate::state::{Action, DEAD_ACCOUNT};
    use anchor_lang::prelude::Pubkey;

    #[test]
    fn test_mint_and_redeem() {
        let mut f = fixture();
        let (market, underlying) = f.listed_market(WAD, 0);
        let alice = Pubkey::new_unique();
        f.fund(underlying, alice, 10_000);

        let shares = f.mm.mint(&alice, &market, 10_000).unwrap();
        assert_eq!(shares, 10_000 - DEAD_SHARES);
        assert_eq!(f.mm.market(&market).unwrap().share_balance(&DEAD_ACCOUNT), DEAD_SHARES);

        assert_eq!(f.mm.redeem(&alice, &market, 4_000).unwrap(), 4_000);
        assert_eq!(f.mm.redeem_underlying(&alice, &market, 1_000).unwrap(), 1_000);

        let ledger = f.mm.market(&market).unwrap();
        assert_eq!(ledger.share_balance(&alice), 4_000);
        assert_eq!(ledger.cash, 5_000);
        assert_eq!(f.tokens.balance_of(&underlying, &alice), 5_000);
    }

    #[test]
    fn test_mint_with_fee_on_transfer_credits_received_amount() {
        let mut f = fixture();
        let (market, underlying) = f.listed_market(WAD, 0);
        let alice = Pubkey::new_unique();
        f.fund(underlying, alice, 100_000);
        f.tokens.set_transfer_fee(underlying, WAD / 100);

        let shares = f.mm.mint(&alice, &market, 100_000).unwrap();
        assert_eq!(shares, 99_000 - DEAD_SHARES);
        assert_eq!(f.mm.market(&market).unwrap().cash, 99_000);
    }

    #[test]
    fn test_first_mint_below_dead_shares() {
        let mut f = fixture();
        let (market, underlying) = f.listed_market(WAD, 0);
        let alice = Pubkey::new_unique();
        f.fund(underlying, alice, 10_000);

        assert_risk_err(
            f.mm.mint(&alice, &market, DEAD_SHARES),
            RiskError::InsufficientInitialDeposit,
        );
        assert_eq!(f.mm.market(&market).unwrap().state.total_shares, 0);
        assert_eq!(f.tokens.balance_of(&underlying, &alice), 10_000);
        assert_eq!(f.tokens.custody_of(&underlying), 0);
    }

    #[test]
    fn test_mint_refunds_when_received_amount_falls_short() {
        let mut f = fixture();
        let (market, underlying) = f.listed_market(WAD, 0);
        let alice = Pubkey::new_unique();
        f.fund(underlying, alice, 1_010);
        f.tokens.set_transfer_fee(underlying, WAD / 100);

        // 1_010 quotes past the dead shares; the 1_000 that arrives does not
        assert_risk_err(
            f.mm.mint(&alice, &market, 1_010),
            RiskError::InsufficientInitialDeposit,
        );

        // only the transfer fee is gone
        assert_eq!(f.tokens.balance_of(&underlying, &alice), 1_000);
        assert_eq!(f.tokens.custody_of(&underlying), 0);
        assert_eq!(f.mm.market(&market).unwrap().cash, 0);
    }

    #[test]
    fn test_supply_cap() {
        let mut f = fixture();
        let (market, underlying) = f.listed_market(WAD, 0);
        let alice = Pubkey::new_unique();
        f.fund(underlying, alice, 100_000);
        f.mm.set_supply_cap(&f.admin, &market, 10_000).unwrap();

        f.mm.mint(&alice, &market, 9_999).unwrap();
        assert_risk_err(f.mm.mint(&alice, &market, 1), RiskError::SupplyCapReached);
    }

    #[test]
    fn test_mint_paused() {
        let mut f = fixture();
        let (market, underlying) = f.listed_market(WAD, 0);
        let alice = Pubkey::new_unique();
        f.fund(underlying, alice, 10_000);
        f.mm.set_action_paused(&f.admin, Some(market), Action::Mint, true).unwrap();

        assert_risk_err(f.mm.mint(&alice, &market, 10_000), RiskError::ActionPaused);
        assert_eq!(f.tokens.balance_of(&underlying, &alice), 10_000);
    }

    #[test]
    fn test_transfer() {
        let mut f = fixture();
        let (market, underlying) = f.listed_market(WAD, 0);
        let alice = Pubkey::new_unique();
        let bob = Pubkey::new_unique();
        f.fund(underlying, alice, 10_000);
        f.mm.mint(&alice, &market, 10_000).unwrap();

        f.mm.transfer(&alice, &bob, &market, 3_000).unwrap();
        assert_eq!(f.mm.market(&market).unwrap().share_balance(&bob), 3_000);

        assert_risk_err(
            f.mm.transfer(&alice, &alice, &market, 1),
            RiskError::SelfTransferNotAllowed,
        );
        assert_risk_err(
            f.mm.transfer(&bob, &alice, &market, 3_001),
            RiskError::InsufficientShares,
        );
    }
}
