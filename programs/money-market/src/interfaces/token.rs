//! Asset movement interface
//!
//! The engine never touches token balances directly: it pulls underlying in
//! through `transfer_in` (which reports what actually arrived, so
//! fee-on-transfer assets are accounted correctly) and pays out through
//! `transfer_out`. Checks run before either call; a step that can only be
//! checked against the received amount refunds it when it fails.

use std::collections::BTreeMap;
use std::sync::RwLock;

use anchor_lang::prelude::*;
use crate::errors::RiskError;
use crate::math::{checked_add, checked_sub, wad_mul_down};

/// Transfer-in / transfer-out primitives for underlying and reward assets
pub trait AssetTransfer {
    /// Pull `amount` of `asset` from `payer` into protocol custody
    ///
    /// Returns the amount actually received.
    fn transfer_in(&self, asset: &Pubkey, payer: &Pubkey, amount: u128) -> Result<u128>;

    /// Pay `amount` of `asset` from protocol custody to `recipient`
    fn transfer_out(&self, asset: &Pubkey, recipient: &Pubkey, amount: u128) -> Result<()>;
}

#[derive(Debug, Default)]
struct Balances {
    holders: BTreeMap<(Pubkey, Pubkey), u128>,
    custody: BTreeMap<Pubkey, u128>,
    transfer_fees: BTreeMap<Pubkey, u128>,
}

/// In-process token ledger implementing `AssetTransfer`
///
/// Tracks holder balances and protocol custody per asset. An optional
/// per-asset transfer fee (WAD fraction) models fee-on-transfer tokens.
#[derive(Debug, Default)]
pub struct InMemoryTokens {
    balances: RwLock<Balances>,
}

impl InMemoryTokens {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `amount` of `asset` to `holder` out of thin air
    pub fn mint_to(&self, asset: Pubkey, holder: Pubkey, amount: u128) -> Result<()> {
        let mut balances = self.write();
        let balance = balances.holders.entry((asset, holder)).or_default();
        *balance = checked_add(*balance, amount)?;
        Ok(())
    }

    /// Charge `fee` (WAD fraction) on every transfer of `asset` into custody
    pub fn set_transfer_fee(&self, asset: Pubkey, fee: u128) {
        self.write().transfer_fees.insert(asset, fee);
    }

    pub fn balance_of(&self, asset: &Pubkey, holder: &Pubkey) -> u128 {
        self.read().holders.get(&(*asset, *holder)).copied().unwrap_or(0)
    }

    pub fn custody_of(&self, asset: &Pubkey) -> u128 {
        self.read().custody.get(asset).copied().unwrap_or(0)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Balances> {
        self.balances.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Balances> {
        self.balances.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl AssetTransfer for InMemoryTokens {
    fn transfer_in(&self, asset: &Pubkey, payer: &Pubkey, amount: u128) -> Result<u128> {
        let mut balances = self.write();

        let payer_balance = balances.holders.get(&(*asset, *payer)).copied().unwrap_or(0);
        require!(payer_balance >= amount, RiskError::TransferFailed);

        let fee_rate = balances.transfer_fees.get(asset).copied().unwrap_or(0);
        let received = checked_sub(amount, wad_mul_down(amount, fee_rate)?)?;
        let custody = balances.custody.get(asset).copied().unwrap_or(0);

        balances.holders.insert((*asset, *payer), payer_balance - amount);
        balances.custody.insert(*asset, checked_add(custody, received)?);
        Ok(received)
    }

    fn transfer_out(&self, asset: &Pubkey, recipient: &Pubkey, amount: u128) -> Result<()> {
        let mut balances = self.write();

        let custody = balances.custody.get(asset).copied().unwrap_or(0);
        require!(custody >= amount, RiskError::TransferFailed);

        let recipient_balance = balances.holders.get(&(*asset, *recipient)).copied().unwrap_or(0);
        balances.custody.insert(*asset, custody - amount);
        balances
            .holders
            .insert((*asset, *recipient), checked_add(recipient_balance, amount)?);
        Ok(())
    }
}
