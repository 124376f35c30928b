//! Liquidation engine
//!
//! Pure computation of how much of a shortfall account's debt may be repaid
//! and how many collateral shares that buys. The caller performs the repay
//! and the share movements.
//!
//! ## Seize formula
//!
//! ```text
//! seizeShares = repay * incentive * priceDebt / (priceCollateral * exchangeRate)
//! ```
//!
//! evaluated as a WAD ratio first, each step rounding DOWN so the borrower
//! never loses more collateral than the incentive allows:
//!
//! | Step | Formula | Rounding |
//! |------|---------|----------|
//! | numerator | incentive * priceDebt | Down |
//! | ratio | numerator / (priceCollateral * exchangeRate) | Down, product kept whole |
//! | seize | ratio * repay | Down |
//! | protocol share | seize * protocolSeizeShare | Down |

use anchor_lang::prelude::*;
use crate::errors::RiskError;
use crate::interfaces::{get_price_validated, PriceOracle};
use crate::math::{checked_sub, display_wad, min, wad_div_product_down, wad_mul_down};
use crate::state::Action;
use super::risk::{Markets, RiskEngine};

/// Amounts a liquidation will move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiquidationQuote {
    /// Debt the liquidator repays (after the close-factor cap)
    pub repay_amount: u128,
    /// Collateral shares taken from the borrower
    pub seize_shares: u128,
    /// Part of `seize_shares` paid to the liquidator
    pub liquidator_shares: u128,
    /// Part of `seize_shares` kept by the protocol
    pub protocol_shares: u128,
}

/// Liquidation policy over one engine's markets
pub struct LiquidationEngine<'a> {
    engine: &'a RiskEngine,
    markets: &'a Markets,
    oracle: &'a dyn PriceOracle,
}

impl RiskEngine {
    pub fn liquidation<'a>(
        &'a self,
        markets: &'a Markets,
        oracle: &'a dyn PriceOracle,
    ) -> LiquidationEngine<'a> {
        LiquidationEngine {
            engine: self,
            markets,
            oracle,
        }
    }
}

impl<'a> LiquidationEngine<'a> {
    /// Check a liquidation and quote its amounts
    ///
    /// With `exact`, a repay above `closeFactor * debt` fails `RepayTooLarge`;
    /// otherwise it is silently capped.
    pub fn can_liquidate(
        &self,
        debt_market: &Pubkey,
        collateral_market: &Pubkey,
        liquidator: &Pubkey,
        borrower: &Pubkey,
        repay_amount: u128,
        exact: bool,
    ) -> Result<LiquidationQuote> {
        // ===== CHECKS =====
        require_keys_neq!(*borrower, *liquidator, RiskError::SelfLiquidationNotAllowed);
        require!(repay_amount > 0, RiskError::ZeroAmount);
        require!(
            !self.engine.pause_flags().is_paused(debt_market, Action::Liquidate),
            RiskError::ActionPaused
        );

        self.engine.market_config(debt_market)?;
        self.engine.market_config(collateral_market)?;
        let debt = self.markets.get(debt_market).ok_or(RiskError::MarketNotListed)?;
        let collateral = self
            .markets
            .get(collateral_market)
            .ok_or(RiskError::MarketNotListed)?;
        require_keys_eq!(debt.risk_engine, self.engine.id, RiskError::MarketMismatch);
        require_keys_eq!(collateral.risk_engine, self.engine.id, RiskError::MarketMismatch);

        let liquidity = self
            .engine
            .account_liquidity(self.markets, self.oracle, borrower)?;
        require!(liquidity.shortfall > 0, RiskError::NoLiquidationAvailable);

        let borrow_balance = debt.borrow_balance_stored(borrower)?;
        require!(borrow_balance > 0, RiskError::InsufficientShortfall);

        // ===== CLOSE FACTOR =====
        let max_repay = wad_mul_down(self.engine.config().risk.close_factor, borrow_balance)?;
        let repay_amount = if exact {
            require!(repay_amount <= max_repay, RiskError::RepayTooLarge);
            repay_amount
        } else {
            min(repay_amount, max_repay)
        };
        require!(repay_amount > 0, RiskError::RepayTooLarge);

        // ===== SEIZE =====
        let seize_shares = self.calculate_seize_shares(debt_market, collateral_market, repay_amount)?;
        require!(
            seize_shares <= collateral.share_balance(borrower),
            RiskError::ExcessiveSeize
        );
        let (liquidator_shares, protocol_shares) = self.split_seize_shares(seize_shares)?;

        msg!(
            "Liquidation quote: repay {} seize {} ({} to liquidator, {} to protocol) at incentive {}",
            repay_amount,
            seize_shares,
            liquidator_shares,
            protocol_shares,
            display_wad(self.engine.config().risk.liquidation_incentive)
        );

        Ok(LiquidationQuote {
            repay_amount,
            seize_shares,
            liquidator_shares,
            protocol_shares,
        })
    }

    /// Collateral shares bought by repaying `repay_amount` of debt
    pub fn calculate_seize_shares(
        &self,
        debt_market: &Pubkey,
        collateral_market: &Pubkey,
        repay_amount: u128,
    ) -> Result<u128> {
        let debt = self.markets.get(debt_market).ok_or(RiskError::MarketNotListed)?;
        let collateral = self
            .markets
            .get(collateral_market)
            .ok_or(RiskError::MarketNotListed)?;

        let price_debt = get_price_validated(self.oracle, &debt.underlying)?;
        let price_collateral = get_price_validated(self.oracle, &collateral.underlying)?;
        let exchange_rate = collateral.exchange_rate_stored()?;

        let incentive = self.engine.config().risk.liquidation_incentive;
        let numerator = wad_mul_down(incentive, price_debt)?;
        let ratio = wad_div_product_down(numerator, price_collateral, exchange_rate)?;

        wad_mul_down(ratio, repay_amount)
    }

    /// Split seized shares into (liquidator, protocol) parts
    pub fn split_seize_shares(&self, seize_shares: u128) -> Result<(u128, u128)> {
        let protocol_shares =
            wad_mul_down(seize_shares, self.engine.config().risk.protocol_seize_share)?;
        Ok((checked_sub(seize_shares, protocol_shares)?, protocol_shares))
    }
}
