//! Market ledger
//!
//! One ledger per listed market: accrual aggregates, cash, per-account share
//! balances and borrow snapshots. The risk engine reads these through
//! `account_snapshot` and never mutates them.

use std::collections::BTreeMap;
use std::sync::Arc;

use anchor_lang::prelude::*;
use crate::constants::{DEAD_SHARES, INITIAL_BORROW_INDEX};
use crate::errors::RiskError;
use crate::interfaces::RateModel;
use crate::math::{
    accrue_interest_on_market, checked_add, checked_sub, exchange_rate, mul_div_down,
    total_underlying, AccrualResult,
};

/// Holder of the shares locked on a market's first mint
pub const DEAD_ACCOUNT: Pubkey = Pubkey::new_from_array([0u8; 32]);

/// Per-market interest aggregates
#[derive(AnchorSerialize, AnchorDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketAccrualState {
    /// Shares outstanding
    pub total_shares: u128,

    /// Debt owed to the market, interest included
    pub total_borrows: u128,

    /// Underlying set aside for the protocol
    pub total_reserves: u128,

    /// Cumulative interest multiplier (starts at 1.0 WAD)
    pub borrow_index: u128,

    /// Block of the last accrual
    pub last_accrual_block: u64,
}

impl MarketAccrualState {
    pub fn new(current_block: u64) -> Self {
        Self {
            total_shares: 0,
            total_borrows: 0,
            total_reserves: 0,
            borrow_index: INITIAL_BORROW_INDEX,
            last_accrual_block: current_block,
        }
    }
}

/// Debt of one account in one market at the time it last changed
#[derive(AnchorSerialize, AnchorDeserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BorrowSnapshot {
    /// Debt right after the last borrow/repay/liquidation
    pub principal: u128,

    /// Market borrow index at that moment
    pub interest_index: u128,
}

impl BorrowSnapshot {
    /// `principal * borrowIndex / interestIndex`, rounded down
    pub fn current_debt(&self, borrow_index: u128) -> Result<u128> {
        if self.principal == 0 {
            return Ok(0);
        }
        mul_div_down(self.principal, borrow_index, self.interest_index)
    }
}

/// What the risk engine needs to know about one account in one market
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountSnapshot {
    pub shares: u128,
    pub debt: u128,
    pub exchange_rate: u128,
}

/// Result of crediting a mint to the share ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MintedShares {
    /// Shares credited to the minter
    pub to_minter: u128,
    /// Shares locked in `DEAD_ACCOUNT` (first mint only)
    pub locked: u128,
}

/// Individual lending market ledger
#[derive(Debug, Clone)]
pub struct Market {
    /// Market identifier
    pub id: Pubkey,

    /// Underlying asset lent and borrowed in this market
    pub underlying: Pubkey,

    /// Risk engine this market answers to
    pub risk_engine: Pubkey,

    /// Interest aggregates
    pub state: MarketAccrualState,

    /// Underlying held by the market
    pub cash: u128,

    /// Fraction of interest routed to reserves (WAD)
    pub reserve_factor: u128,

    /// Exchange rate used while no shares exist (WAD)
    pub initial_exchange_rate: u128,

    /// Borrow rate source
    pub rate_model: Arc<dyn RateModel>,

    balances: BTreeMap<Pubkey, u128>,
    borrows: BTreeMap<Pubkey, BorrowSnapshot>,

    /// Set while a mutating operation is executing on this market
    pub(crate) locked: bool,
}

impl Market {
    pub fn new(
        id: Pubkey,
        underlying: Pubkey,
        risk_engine: Pubkey,
        reserve_factor: u128,
        initial_exchange_rate: u128,
        rate_model: Arc<dyn RateModel>,
        current_block: u64,
    ) -> Self {
        Self {
            id,
            underlying,
            risk_engine,
            state: MarketAccrualState::new(current_block),
            cash: 0,
            reserve_factor,
            initial_exchange_rate,
            rate_model,
            balances: BTreeMap::new(),
            borrows: BTreeMap::new(),
            locked: false,
        }
    }

    // === Accrual ===

    /// Bring interest current; no-op when already accrued this block
    pub fn accrue(&mut self, current_block: u64) -> Result<Option<AccrualResult>> {
        accrue_interest_on_market(
            &mut self.state,
            self.cash,
            self.reserve_factor,
            self.rate_model.as_ref(),
            current_block,
        )
    }

    pub fn is_fresh(&self, current_block: u64) -> bool {
        self.state.last_accrual_block == current_block
    }

    /// Fail with `StaleAccrual` unless interest was accrued in `current_block`
    pub fn require_fresh(&self, current_block: u64) -> Result<()> {
        require!(self.is_fresh(current_block), RiskError::StaleAccrual);
        Ok(())
    }

    // === Views ===

    /// Exchange rate from stored aggregates (no accrual)
    pub fn exchange_rate_stored(&self) -> Result<u128> {
        exchange_rate(
            self.cash,
            self.state.total_borrows,
            self.state.total_reserves,
            self.state.total_shares,
            self.initial_exchange_rate,
        )
    }

    /// cash + borrows - reserves
    pub fn total_underlying(&self) -> Result<u128> {
        total_underlying(self.cash, self.state.total_borrows, self.state.total_reserves)
    }

    pub fn share_balance(&self, account: &Pubkey) -> u128 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    pub fn borrow_snapshot(&self, account: &Pubkey) -> BorrowSnapshot {
        self.borrows.get(account).copied().unwrap_or_default()
    }

    /// Debt of `account` at the stored borrow index
    pub fn borrow_balance_stored(&self, account: &Pubkey) -> Result<u128> {
        self.borrow_snapshot(account).current_debt(self.state.borrow_index)
    }

    pub fn account_snapshot(&self, account: &Pubkey) -> Result<AccountSnapshot> {
        Ok(AccountSnapshot {
            shares: self.share_balance(account),
            debt: self.borrow_balance_stored(account)?,
            exchange_rate: self.exchange_rate_stored()?,
        })
    }

    /// Share holders and their balances, in key order
    pub fn holders(&self) -> impl Iterator<Item = (&Pubkey, &u128)> {
        self.balances.iter()
    }

    /// Accounts with an open borrow snapshot, in key order
    pub fn borrowers(&self) -> impl Iterator<Item = (&Pubkey, &BorrowSnapshot)> {
        self.borrows.iter()
    }

    pub fn borrow_rate_per_block(&self) -> Result<u128> {
        self.rate_model
            .borrow_rate(self.cash, self.state.total_borrows, self.state.total_reserves)
    }

    pub fn supply_rate_per_block(&self) -> Result<u128> {
        self.rate_model.supply_rate(
            self.cash,
            self.state.total_borrows,
            self.state.total_reserves,
            self.reserve_factor,
        )
    }

    // === Ledger Mutations ===

    /// Credit freshly minted shares, locking `DEAD_SHARES` on the first mint
    pub(crate) fn mint_shares(&mut self, minter: &Pubkey, shares: u128) -> Result<MintedShares> {
        let locked = if self.state.total_shares == 0 {
            require!(shares > DEAD_SHARES, RiskError::InsufficientInitialDeposit);
            DEAD_SHARES
        } else {
            0
        };
        let to_minter = checked_sub(shares, locked)?;

        self.state.total_shares = checked_add(self.state.total_shares, shares)?;
        if locked > 0 {
            self.credit_shares(&DEAD_ACCOUNT, locked)?;
        }
        self.credit_shares(minter, to_minter)?;

        Ok(MintedShares { to_minter, locked })
    }

    /// Burn redeemed shares
    pub(crate) fn burn_shares(&mut self, holder: &Pubkey, shares: u128) -> Result<()> {
        self.debit_shares(holder, shares)?;
        self.state.total_shares = checked_sub(self.state.total_shares, shares)?;
        Ok(())
    }

    /// Move shares between accounts (transfer and seize)
    pub(crate) fn move_shares(&mut self, from: &Pubkey, to: &Pubkey, shares: u128) -> Result<()> {
        self.debit_shares(from, shares)?;
        self.credit_shares(to, shares)
    }

    /// Reset the borrow snapshot of `account` to `principal` at the current index
    pub(crate) fn set_borrow(&mut self, account: &Pubkey, principal: u128) {
        if principal == 0 {
            self.borrows.remove(account);
            return;
        }
        self.borrows.insert(
            *account,
            BorrowSnapshot {
                principal,
                interest_index: self.state.borrow_index,
            },
        );
    }

    fn credit_shares(&mut self, account: &Pubkey, shares: u128) -> Result<()> {
        if shares == 0 {
            return Ok(());
        }
        let balance = self.balances.entry(*account).or_default();
        *balance = checked_add(*balance, shares)?;
        Ok(())
    }

    fn debit_shares(&mut self, account: &Pubkey, shares: u128) -> Result<()> {
        let balance = self.share_balance(account);
        require!(balance >= shares, RiskError::InsufficientShares);

        let remaining = balance - shares;
        if remaining == 0 {
            self.balances.remove(account);
        } else {
            self.balances.insert(*account, remaining);
        }
        Ok(())
    }
}
