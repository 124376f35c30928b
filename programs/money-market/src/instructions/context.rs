//! Money market context
//!
//! Owns the ledger (risk engine plus every market ledger), the external
//! collaborators and the block clock. Every mutating operation runs through
//! `transact`:
//!
//! - the touched markets are locked for the duration of the call (re-entry
//!   fails with `ReentrantCall`)
//! - the ledger is checkpointed and restored if the call fails, so a failed
//!   operation leaves no partial effects
//! - locks are released on success; on failure the restored checkpoint
//!   carries the pre-call lock state
//!
//! Tokens pulled in through `settle_in` are paid back when a later step of
//! the same operation fails.

use std::sync::Arc;

use anchor_lang::prelude::*;
use crate::engine::{Markets, RiskEngine};
use crate::errors::RiskError;
use crate::events::InterestAccrued;
use crate::interfaces::{AssetTransfer, Authority, PriceOracle};
use crate::state::{EngineConfig, Market};

/// Engine-owned state; cloned as the rollback checkpoint
#[derive(Debug, Clone)]
pub(crate) struct Ledger {
    pub engine: RiskEngine,
    pub markets: Markets,
}

/// A risk engine, its markets and the collaborators they depend on
pub struct MoneyMarket {
    pub(crate) ledger: Ledger,
    pub(crate) oracle: Arc<dyn PriceOracle>,
    pub(crate) tokens: Arc<dyn AssetTransfer>,
    pub(crate) authority: Arc<dyn Authority>,
    current_block: u64,
}

impl MoneyMarket {
    pub fn new(
        engine_id: Pubkey,
        config: EngineConfig,
        oracle: Arc<dyn PriceOracle>,
        tokens: Arc<dyn AssetTransfer>,
        authority: Arc<dyn Authority>,
    ) -> Result<Self> {
        Ok(Self {
            ledger: Ledger {
                engine: RiskEngine::new(engine_id, config)?,
                markets: Markets::new(),
            },
            oracle,
            tokens,
            authority,
            current_block: 0,
        })
    }

    // =========================================================================
    // Block Clock
    // =========================================================================

    pub fn current_block(&self) -> u64 {
        self.current_block
    }

    /// Move time forward by `blocks`
    pub fn advance_blocks(&mut self, blocks: u64) -> Result<u64> {
        self.current_block = self
            .current_block
            .checked_add(blocks)
            .ok_or(RiskError::MathOverflow)?;
        Ok(self.current_block)
    }

    /// Jump to `block`; time never moves backwards
    pub fn set_block(&mut self, block: u64) -> Result<()> {
        require!(block >= self.current_block, RiskError::StaleAccrual);
        self.current_block = block;
        Ok(())
    }

    // =========================================================================
    // Ledger Access
    // =========================================================================

    pub fn engine(&self) -> &RiskEngine {
        &self.ledger.engine
    }

    pub fn market(&self, market: &Pubkey) -> Result<&Market> {
        self.ledger
            .markets
            .get(market)
            .ok_or_else(|| RiskError::MarketNotListed.into())
    }

    pub(crate) fn market_mut(&mut self, market: &Pubkey) -> Result<&mut Market> {
        self.ledger
            .markets
            .get_mut(market)
            .ok_or_else(|| RiskError::MarketNotListed.into())
    }

    pub(crate) fn require_admin(&self, caller: &Pubkey) -> Result<()> {
        crate::interfaces::require_admin(self.authority.as_ref(), caller)
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    /// Run `op` atomically with `markets` locked against re-entry
    pub(crate) fn transact<T>(
        &mut self,
        markets: &[Pubkey],
        op: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        let checkpoint = self.ledger.clone();

        match self.lock(markets).and_then(|()| op(self)) {
            Ok(value) => {
                self.unlock(markets);
                Ok(value)
            }
            Err(err) => {
                self.ledger = checkpoint;
                Err(err)
            }
        }
    }

    /// Pull `amount` of `asset` from `payer` and apply `effects` to what arrived
    ///
    /// The ledger checkpoint in `transact` cannot undo a token movement, so
    /// when `effects` fails the received amount is paid back to `payer`
    /// before the error propagates.
    pub(crate) fn settle_in<T>(
        &mut self,
        asset: &Pubkey,
        payer: &Pubkey,
        amount: u128,
        effects: impl FnOnce(&mut Self, u128) -> Result<T>,
    ) -> Result<T> {
        let received = self.tokens.transfer_in(asset, payer, amount)?;

        match effects(self, received) {
            Ok(value) => Ok(value),
            Err(err) => {
                if let Err(refund_err) = self.tokens.transfer_out(asset, payer, received) {
                    msg!("Refund of {} to {} failed: {}", received, payer, refund_err);
                }
                Err(err)
            }
        }
    }

    fn lock(&mut self, markets: &[Pubkey]) -> Result<()> {
        for (position, market) in markets.iter().enumerate() {
            if markets[..position].contains(market) {
                continue;
            }
            let ledger = self.market_mut(market)?;
            require!(!ledger.locked, RiskError::ReentrantCall);
            ledger.locked = true;
        }
        Ok(())
    }

    fn unlock(&mut self, markets: &[Pubkey]) {
        for market in markets {
            if let Some(ledger) = self.ledger.markets.get_mut(market) {
                ledger.locked = false;
            }
        }
    }

    /// Accrue `market` to the current block, emitting the change
    pub(crate) fn accrue_market(&mut self, market: &Pubkey) -> Result<()> {
        let current_block = self.current_block;
        let ledger = self.market_mut(market)?;

        if let Some(result) = ledger.accrue(current_block)? {
            emit!(InterestAccrued {
                market: *market,
                cash: ledger.cash,
                borrow_rate: result.borrow_rate,
                block_delta: result.block_delta,
                interest_accumulated: result.interest_accumulated,
                total_borrows_before: result.prior.total_borrows,
                total_borrows: ledger.state.total_borrows,
                total_reserves_before: result.prior.total_reserves,
                total_reserves: ledger.state.total_reserves,
                borrow_index_before: result.prior.borrow_index,
                borrow_index: ledger.state.borrow_index,
            });
        }
        Ok(())
    }
}
