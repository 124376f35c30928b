//! Market listing, accrual and reserve instructions

use std::sync::Arc;

use anchor_lang::prelude::*;
use crate::constants::MAX_RESERVE_FACTOR;
use crate::errors::RiskError;
use crate::events::{MarketListed, ReservesAdded, ReservesReduced};
use crate::interfaces::RateModel;
use crate::math::{checked_add, checked_sub};
use crate::state::Market;
use super::context::MoneyMarket;

/// Parameters of a market to list
#[derive(Debug, Clone)]
pub struct MarketParams {
    pub id: Pubkey,
    pub underlying: Pubkey,
    /// Fraction of interest routed to reserves (WAD)
    pub reserve_factor: u128,
    /// Underlying per share before the first mint (WAD)
    pub initial_exchange_rate: u128,
    pub rate_model: Arc<dyn RateModel>,
}

impl MoneyMarket {
    // ============================================================================
    // List Market (Admin)
    // ============================================================================

    /// Create a market ledger governed by this engine and register it
    ///
    /// Markets start with a zero collateral factor and no caps; they are
    /// never delisted.
    pub fn list_market(&mut self, caller: &Pubkey, params: MarketParams) -> Result<()> {
        self.require_admin(caller)?;
        require!(params.initial_exchange_rate > 0, RiskError::InvalidExchangeRate);
        require!(
            params.reserve_factor <= MAX_RESERVE_FACTOR,
            RiskError::InvalidReserveFactor
        );
        require!(
            !self.ledger.markets.contains_key(&params.id),
            RiskError::MarketAlreadyListed
        );

        self.transact(&[], |mm| {
            let current_block = mm.current_block();
            let market = Market::new(
                params.id,
                params.underlying,
                mm.ledger.engine.id,
                params.reserve_factor,
                params.initial_exchange_rate,
                params.rate_model,
                current_block,
            );

            mm.ledger.engine.list_market(&market, current_block)?;
            mm.ledger.markets.insert(market.id, market);

            emit!(MarketListed {
                market: params.id,
                underlying: params.underlying,
                risk_engine: mm.ledger.engine.id,
                reserve_factor: params.reserve_factor,
                initial_exchange_rate: params.initial_exchange_rate,
            });
            Ok(())
        })
    }

    // ============================================================================
    // Accrue Interest (Public)
    // ============================================================================

    /// Accrue interest on `market` up to the current block
    pub fn accrue_interest(&mut self, market: &Pubkey) -> Result<()> {
        self.transact(&[*market], |mm| mm.accrue_market(market))
    }

    /// Accrue, then return the exchange rate
    pub fn exchange_rate_current(&mut self, market: &Pubkey) -> Result<u128> {
        self.transact(&[*market], |mm| {
            mm.accrue_market(market)?;
            mm.market(market)?.exchange_rate_stored()
        })
    }

    /// Accrue, then return the debt of `account`
    pub fn borrow_balance_current(&mut self, market: &Pubkey, account: &Pubkey) -> Result<u128> {
        self.transact(&[*market], |mm| {
            mm.accrue_market(market)?;
            mm.market(market)?.borrow_balance_stored(account)
        })
    }

    // ============================================================================
    // Reserves
    // ============================================================================

    /// Donate underlying straight into `market`'s reserves
    pub fn add_reserves(&mut self, benefactor: &Pubkey, market: &Pubkey, amount: u128) -> Result<u128> {
        require!(amount > 0, RiskError::ZeroAmount);

        self.transact(&[*market], |mm| {
            // ===== CHECKS =====
            mm.accrue_market(market)?;
            let current_block = mm.current_block();
            let ledger = mm.market(market)?;
            ledger.require_fresh(current_block)?;
            let underlying = ledger.underlying;

            // ===== INTERACTIONS =====
            mm.settle_in(&underlying, benefactor, amount, |mm, received| {
                // ===== EFFECTS =====
                let ledger = mm.market_mut(market)?;
                let total_reserves_before = ledger.state.total_reserves;
                ledger.cash = checked_add(ledger.cash, received)?;
                ledger.state.total_reserves = checked_add(total_reserves_before, received)?;

                emit!(ReservesAdded {
                    market: *market,
                    benefactor: *benefactor,
                    amount: received,
                    total_reserves_before,
                    total_reserves: ledger.state.total_reserves,
                });
                Ok(received)
            })
        })
    }

    /// Withdraw reserves to `recipient` (admin)
    pub fn reduce_reserves(
        &mut self,
        caller: &Pubkey,
        market: &Pubkey,
        amount: u128,
        recipient: &Pubkey,
    ) -> Result<()> {
        self.require_admin(caller)?;
        require!(amount > 0, RiskError::ZeroAmount);

        self.transact(&[*market], |mm| {
            // ===== CHECKS =====
            mm.accrue_market(market)?;
            let current_block = mm.current_block();
            let ledger = mm.market(market)?;
            ledger.require_fresh(current_block)?;
            require!(amount <= ledger.state.total_reserves, RiskError::InsufficientReserves);
            require!(amount <= ledger.cash, RiskError::InsufficientCash);
            let underlying = ledger.underlying;

            // ===== EFFECTS =====
            let ledger = mm.market_mut(market)?;
            let total_reserves_before = ledger.state.total_reserves;
            ledger.state.total_reserves = checked_sub(total_reserves_before, amount)?;
            ledger.cash = checked_sub(ledger.cash, amount)?;
            let total_reserves = ledger.state.total_reserves;

            // ===== INTERACTIONS =====
            mm.tokens.transfer_out(&underlying, recipient, amount)?;

            emit!(ReservesReduced {
                market: *market,
                recipient: *recipient,
                amount,
                total_reserves_before,
                total_reserves,
            });
            Ok(())
        })
    }
}
