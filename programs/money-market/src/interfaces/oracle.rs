//! Price oracle interface
//!
//! Prices are WAD-scaled values of ONE base unit of an asset, so that
//! `value = amount * price / WAD` is directly comparable across assets.
//! A price of zero means "unavailable" (missing, stale, or rejected by the
//! oracle's own policy).

use std::collections::BTreeMap;
use std::sync::RwLock;

use anchor_lang::prelude::*;
use crate::errors::RiskError;

/// Source of asset prices
pub trait PriceOracle {
    /// Price of one base unit of `asset`; 0 signals unavailable
    fn price_of(&self, asset: &Pubkey) -> u128;
}

/// Fetch a price, failing with `PriceUnavailable` on zero
pub fn get_price_validated(oracle: &dyn PriceOracle, asset: &Pubkey) -> Result<u128> {
    let price = oracle.price_of(asset);
    require!(price > 0, RiskError::PriceUnavailable);
    Ok(price)
}

/// Oracle serving administrator-set prices
///
/// Useful as a fixed-price feed and for simulations; prices can be changed
/// through a shared reference while an engine holds the oracle.
#[derive(Debug, Default)]
pub struct StaticOracle {
    prices: RwLock<BTreeMap<Pubkey, u128>>,
}

impl StaticOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_price(self, asset: Pubkey, price: u128) -> Self {
        self.set_price(asset, price);
        self
    }

    /// Set (or clear, with 0) the price of `asset`
    pub fn set_price(&self, asset: Pubkey, price: u128) {
        let mut prices = self.prices.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        prices.insert(asset, price);
    }
}

impl PriceOracle for StaticOracle {
    fn price_of(&self, asset: &Pubkey) -> u128 {
        let prices = self.prices.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        prices.get(asset).copied().unwrap_or(0)
    }
}
