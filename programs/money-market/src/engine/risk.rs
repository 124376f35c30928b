//! Risk engine
//!
//! Registry of listed markets, account memberships and pause flags, plus the
//! cross-market liquidity computation every policy hook is built on.
//!
//! Liquidity is always computed from STORED values (exchange rate, debt at
//! the stored borrow index, current oracle price) so it never mutates market
//! state. Callers that act on the answer accrue the touched markets first.

use std::collections::BTreeMap;

use anchor_lang::prelude::*;
use crate::constants::MAX_COLLATERAL_FACTOR;
use crate::errors::RiskError;
use crate::events::{
    ActionPausedSet, BorrowCapSet, CloseFactorSet, CollateralFactorSet, LiquidationIncentiveSet,
    MarketEntered, MarketExited, ProtocolSeizeShareSet, RewardEligibilitySet, SupplyCapSet,
};
use crate::interfaces::{get_price_validated, PriceOracle};
use crate::math::{checked_add, wad_mul_down};
use crate::state::{
    validate_close_factor, validate_liquidation_incentive, validate_protocol_seize_share,
    AccountMembership, Action, EngineConfig, Market, MarketConfig, PauseFlags,
};
use super::flywheel::RewardFlywheel;

/// Market ledgers keyed by market id
pub type Markets = BTreeMap<Pubkey, Market>;

/// Result of a liquidity check; at most one side is nonzero
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Liquidity {
    /// Collateral value in excess of debt value
    pub surplus: u128,
    /// Debt value in excess of collateral value
    pub shortfall: u128,
}

impl Liquidity {
    fn from_values(collateral: u128, debt: u128) -> Self {
        if collateral > debt {
            Self { surplus: collateral - debt, shortfall: 0 }
        } else {
            Self { surplus: 0, shortfall: debt - collateral }
        }
    }
}

/// Policy engine shared by every market it lists
#[derive(Debug, Clone)]
pub struct RiskEngine {
    /// Markets must name this id to be governed here
    pub id: Pubkey,
    config: EngineConfig,
    markets: BTreeMap<Pubkey, MarketConfig>,
    listing_order: Vec<Pubkey>,
    memberships: BTreeMap<Pubkey, AccountMembership>,
    pause: PauseFlags,
    pub(crate) flywheel: RewardFlywheel,
}

impl RiskEngine {
    pub fn new(id: Pubkey, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            id,
            config,
            markets: BTreeMap::new(),
            listing_order: Vec::new(),
            memberships: BTreeMap::new(),
            pause: PauseFlags::default(),
            flywheel: RewardFlywheel::new(),
        })
    }

    // =========================================================================
    // Registry Views
    // =========================================================================

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn flywheel(&self) -> &RewardFlywheel {
        &self.flywheel
    }

    pub fn pause_flags(&self) -> &PauseFlags {
        &self.pause
    }

    pub fn is_listed(&self, market: &Pubkey) -> bool {
        self.markets.get(market).is_some_and(|config| config.listed)
    }

    /// Listing config of `market`, failing with `MarketNotListed`
    pub fn market_config(&self, market: &Pubkey) -> Result<&MarketConfig> {
        self.markets
            .get(market)
            .filter(|config| config.listed)
            .ok_or_else(|| RiskError::MarketNotListed.into())
    }

    /// Every listed market, in listing order
    pub fn all_markets(&self) -> &[Pubkey] {
        &self.listing_order
    }

    /// Markets entered by `account`, in entry order
    pub fn markets_of(&self, account: &Pubkey) -> &[Pubkey] {
        self.memberships
            .get(account)
            .map(|membership| membership.markets())
            .unwrap_or(&[])
    }

    pub fn is_member(&self, account: &Pubkey, market: &Pubkey) -> bool {
        self.memberships
            .get(account)
            .is_some_and(|membership| membership.contains(market))
    }

    // =========================================================================
    // Listing & Parameters
    // =========================================================================

    /// Register `market`; its ledger must already name this engine
    pub fn list_market(&mut self, market: &Market, current_block: u64) -> Result<()> {
        require!(!self.markets.contains_key(&market.id), RiskError::MarketAlreadyListed);
        require_keys_eq!(market.risk_engine, self.id, RiskError::MarketMismatch);

        self.markets.insert(
            market.id,
            MarketConfig {
                listed: true,
                ..MarketConfig::default()
            },
        );
        self.listing_order.push(market.id);
        self.flywheel.init_market(market.id, current_block);
        Ok(())
    }

    /// Set the collateral factor; a nonzero factor needs a live price
    pub fn set_collateral_factor(
        &mut self,
        market: &Market,
        oracle: &dyn PriceOracle,
        collateral_factor: u128,
    ) -> Result<()> {
        self.market_config(&market.id)?;
        require!(
            collateral_factor <= MAX_COLLATERAL_FACTOR,
            RiskError::InvalidCollateralFactor
        );
        if collateral_factor != 0 {
            get_price_validated(oracle, &market.underlying)?;
        }

        let config = self.config_mut(&market.id)?;
        let old_collateral_factor = config.collateral_factor;
        config.collateral_factor = collateral_factor;

        emit!(CollateralFactorSet {
            market: market.id,
            old_collateral_factor,
            new_collateral_factor: collateral_factor,
        });
        Ok(())
    }

    pub fn set_borrow_cap(&mut self, market: &Pubkey, borrow_cap: u128) -> Result<()> {
        let config = self.config_mut(market)?;
        let old_borrow_cap = config.borrow_cap;
        config.borrow_cap = borrow_cap;

        emit!(BorrowCapSet {
            market: *market,
            old_borrow_cap,
            new_borrow_cap: borrow_cap,
        });
        Ok(())
    }

    pub fn set_supply_cap(&mut self, market: &Pubkey, supply_cap: u128) -> Result<()> {
        let config = self.config_mut(market)?;
        let old_supply_cap = config.supply_cap;
        config.supply_cap = supply_cap;

        emit!(SupplyCapSet {
            market: *market,
            old_supply_cap,
            new_supply_cap: supply_cap,
        });
        Ok(())
    }

    /// Returns the previous eligibility
    pub fn set_reward_eligible(&mut self, market: &Pubkey, eligible: bool) -> Result<bool> {
        let config = self.config_mut(market)?;
        let was_eligible = config.is_reward_eligible;
        config.is_reward_eligible = eligible;

        emit!(RewardEligibilitySet {
            market: *market,
            was_eligible,
            eligible,
        });
        Ok(was_eligible)
    }

    pub fn set_close_factor(&mut self, close_factor: u128) -> Result<()> {
        validate_close_factor(close_factor)?;
        let old_close_factor = self.config.risk.close_factor;
        self.config.risk.close_factor = close_factor;

        emit!(CloseFactorSet {
            old_close_factor,
            new_close_factor: close_factor,
        });
        Ok(())
    }

    pub fn set_liquidation_incentive(&mut self, incentive: u128) -> Result<()> {
        validate_liquidation_incentive(incentive)?;
        let old_liquidation_incentive = self.config.risk.liquidation_incentive;
        self.config.risk.liquidation_incentive = incentive;

        emit!(LiquidationIncentiveSet {
            old_liquidation_incentive,
            new_liquidation_incentive: incentive,
        });
        Ok(())
    }

    pub fn set_protocol_seize_share(&mut self, share: u128) -> Result<()> {
        validate_protocol_seize_share(share)?;
        let old_protocol_seize_share = self.config.risk.protocol_seize_share;
        self.config.risk.protocol_seize_share = share;

        emit!(ProtocolSeizeShareSet {
            old_protocol_seize_share,
            new_protocol_seize_share: share,
        });
        Ok(())
    }

    /// Flip a pause flag; `market = None` targets the global switch
    pub fn set_paused(&mut self, market: Option<Pubkey>, action: Action, paused: bool) -> Result<()> {
        if let Some(market) = market.as_ref() {
            self.market_config(market)?;
        }
        let was_paused = self.pause.set(market, action, paused);

        emit!(ActionPausedSet {
            market,
            action,
            was_paused,
            paused,
        });
        Ok(())
    }

    fn config_mut(&mut self, market: &Pubkey) -> Result<&mut MarketConfig> {
        self.markets
            .get_mut(market)
            .filter(|config| config.listed)
            .ok_or_else(|| RiskError::MarketNotListed.into())
    }

    // =========================================================================
    // Membership
    // =========================================================================

    /// Add `market` to the markets counted for `account`'s liquidity
    pub fn enter_market(&mut self, account: &Pubkey, market: &Pubkey) -> Result<()> {
        self.market_config(market)?;

        let max_markets = self.config.max_assets_per_account as usize;
        let membership = self.memberships.entry(*account).or_default();
        if membership.enter(*market, max_markets)? {
            emit!(MarketEntered {
                market: *market,
                account: *account,
            });
        }
        Ok(())
    }

    /// Leave `market`; only possible with no debt there and enough
    /// collateral elsewhere to cover the rest
    pub fn exit_market(
        &mut self,
        markets: &Markets,
        oracle: &dyn PriceOracle,
        account: &Pubkey,
        market: &Pubkey,
    ) -> Result<()> {
        let ledger = markets.get(market).ok_or(RiskError::MarketNotListed)?;
        let snapshot = ledger.account_snapshot(account)?;
        require!(snapshot.debt == 0, RiskError::NonzeroBorrowBalance);

        if !self.is_member(account, market) {
            return Ok(());
        }

        let liquidity =
            self.hypothetical_liquidity(markets, oracle, account, Some(market), snapshot.shares, 0)?;
        require!(liquidity.shortfall == 0, RiskError::InsufficientCollateral);

        if let Some(membership) = self.memberships.get_mut(account) {
            membership.exit(market);
            if membership.is_empty() {
                self.memberships.remove(account);
            }
        }

        emit!(MarketExited {
            market: *market,
            account: *account,
        });
        Ok(())
    }

    // =========================================================================
    // Liquidity
    // =========================================================================

    /// Current liquidity of `account`
    pub fn account_liquidity(
        &self,
        markets: &Markets,
        oracle: &dyn PriceOracle,
        account: &Pubkey,
    ) -> Result<Liquidity> {
        self.hypothetical_liquidity(markets, oracle, account, None, 0, 0)
    }

    /// Liquidity of `account` as if it redeemed `redeem_shares` and borrowed
    /// `borrow_amount` more in `modify`
    ///
    /// Only entered markets count, in entry order. Per market:
    ///
    /// ```text
    /// tokensToDenom = collateralFactor * exchangeRate * price
    /// collateral   += shares * tokensToDenom
    /// debt         += debt * price
    /// debt         += redeemShares * tokensToDenom + borrowAmount * price   (modified market)
    /// ```
    pub fn hypothetical_liquidity(
        &self,
        markets: &Markets,
        oracle: &dyn PriceOracle,
        account: &Pubkey,
        modify: Option<&Pubkey>,
        redeem_shares: u128,
        borrow_amount: u128,
    ) -> Result<Liquidity> {
        let mut collateral_value: u128 = 0;
        let mut debt_value: u128 = 0;

        for market_id in self.markets_of(account) {
            let config = self.market_config(market_id)?;
            let market = markets.get(market_id).ok_or(RiskError::MarketNotListed)?;
            let snapshot = market.account_snapshot(account)?;
            let price = get_price_validated(oracle, &market.underlying)?;

            let tokens_to_denom = wad_mul_down(
                wad_mul_down(config.collateral_factor, snapshot.exchange_rate)?,
                price,
            )?;

            collateral_value =
                checked_add(collateral_value, wad_mul_down(snapshot.shares, tokens_to_denom)?)?;
            debt_value = checked_add(debt_value, wad_mul_down(snapshot.debt, price)?)?;

            if modify == Some(market_id) {
                debt_value = checked_add(debt_value, wad_mul_down(redeem_shares, tokens_to_denom)?)?;
                debt_value = checked_add(debt_value, wad_mul_down(borrow_amount, price)?)?;
            }
        }

        Ok(Liquidity::from_values(collateral_value, debt_value))
    }

    // =========================================================================
    // Policy Hooks
    // =========================================================================

    fn require_active(&self, market: &Pubkey, action: Action) -> Result<&MarketConfig> {
        require!(!self.pause.is_paused(market, action), RiskError::ActionPaused);
        self.market_config(market)
    }

    fn require_no_shortfall(
        &self,
        markets: &Markets,
        oracle: &dyn PriceOracle,
        account: &Pubkey,
        market: &Pubkey,
        redeem_shares: u128,
        borrow_amount: u128,
    ) -> Result<()> {
        let liquidity = self.hypothetical_liquidity(
            markets,
            oracle,
            account,
            Some(market),
            redeem_shares,
            borrow_amount,
        )?;
        require!(liquidity.shortfall == 0, RiskError::InsufficientCollateral);
        Ok(())
    }

    /// May `minter` supply `amount` to `market`?
    pub fn can_mint(
        &mut self,
        markets: &Markets,
        market: &Pubkey,
        minter: &Pubkey,
        amount: u128,
        current_block: u64,
    ) -> Result<()> {
        let config = *self.require_active(market, Action::Mint)?;
        let ledger = markets.get(market).ok_or(RiskError::MarketNotListed)?;

        if config.supply_cap != 0 {
            let next_total = checked_add(ledger.total_underlying()?, amount)?;
            require!(next_total < config.supply_cap, RiskError::SupplyCapReached);
        }

        self.refresh_supply_rewards(ledger, &[minter], current_block);
        Ok(())
    }

    /// May `redeemer` burn `redeem_shares` of `market`?
    pub fn can_redeem(
        &mut self,
        markets: &Markets,
        oracle: &dyn PriceOracle,
        market: &Pubkey,
        redeemer: &Pubkey,
        redeem_shares: u128,
        current_block: u64,
    ) -> Result<()> {
        self.require_active(market, Action::Redeem)?;
        let ledger = markets.get(market).ok_or(RiskError::MarketNotListed)?;

        // Shares outside the membership back nothing
        if self.is_member(redeemer, market) {
            self.require_no_shortfall(markets, oracle, redeemer, market, redeem_shares, 0)?;
        }

        self.refresh_supply_rewards(ledger, &[redeemer], current_block);
        Ok(())
    }

    /// May `borrower` borrow `amount` from `market`? Enters the market if needed.
    pub fn can_borrow(
        &mut self,
        markets: &Markets,
        oracle: &dyn PriceOracle,
        market: &Pubkey,
        borrower: &Pubkey,
        amount: u128,
        current_block: u64,
    ) -> Result<()> {
        let config = *self.require_active(market, Action::Borrow)?;
        let ledger = markets.get(market).ok_or(RiskError::MarketNotListed)?;

        if !self.is_member(borrower, market) {
            self.enter_market(borrower, market)?;
        }

        get_price_validated(oracle, &ledger.underlying)?;

        if config.borrow_cap != 0 {
            let next_total = checked_add(ledger.state.total_borrows, amount)?;
            require!(next_total < config.borrow_cap, RiskError::BorrowCapReached);
        }

        self.require_no_shortfall(markets, oracle, borrower, market, 0, amount)?;

        self.refresh_borrow_rewards(ledger, &[borrower], current_block);
        Ok(())
    }

    /// May `payer` repay `borrower`'s debt in `market`?
    pub fn can_repay(
        &mut self,
        markets: &Markets,
        market: &Pubkey,
        borrower: &Pubkey,
        current_block: u64,
    ) -> Result<()> {
        self.require_active(market, Action::Repay)?;
        let ledger = markets.get(market).ok_or(RiskError::MarketNotListed)?;

        self.refresh_borrow_rewards(ledger, &[borrower], current_block);
        Ok(())
    }

    /// May `source` move `shares` of `market` to `destination`?
    pub fn can_transfer(
        &mut self,
        markets: &Markets,
        oracle: &dyn PriceOracle,
        market: &Pubkey,
        source: &Pubkey,
        destination: &Pubkey,
        shares: u128,
        current_block: u64,
    ) -> Result<()> {
        self.require_active(market, Action::Transfer)?;
        let ledger = markets.get(market).ok_or(RiskError::MarketNotListed)?;

        if self.is_member(source, market) {
            self.require_no_shortfall(markets, oracle, source, market, shares, 0)?;
        }

        self.refresh_supply_rewards(ledger, &[source, destination], current_block);
        Ok(())
    }

    /// May collateral in `collateral_market` move from `borrower` to `liquidator`?
    pub fn can_seize(
        &mut self,
        markets: &Markets,
        collateral_market: &Pubkey,
        debt_market: &Pubkey,
        liquidator: &Pubkey,
        borrower: &Pubkey,
        current_block: u64,
    ) -> Result<()> {
        self.require_active(collateral_market, Action::Seize)?;
        self.market_config(debt_market)?;

        let collateral = markets.get(collateral_market).ok_or(RiskError::MarketNotListed)?;
        let debt = markets.get(debt_market).ok_or(RiskError::MarketNotListed)?;
        require_keys_eq!(collateral.risk_engine, self.id, RiskError::MarketMismatch);
        require_keys_eq!(debt.risk_engine, self.id, RiskError::MarketMismatch);

        let reserve_account = self.config.reserve_account;
        self.refresh_supply_rewards(
            collateral,
            &[borrower, liquidator, &reserve_account],
            current_block,
        );
        Ok(())
    }

    // === Flywheel side effects (never fail the hook) ===

    fn refresh_supply_rewards(&mut self, market: &Market, accounts: &[&Pubkey], current_block: u64) {
        if let Err(err) = self.flywheel.refresh_supply(market, accounts, current_block) {
            msg!("Supply reward update skipped for market {}: {}", market.id, err);
        }
    }

    fn refresh_borrow_rewards(&mut self, market: &Market, accounts: &[&Pubkey], current_block: u64) {
        if let Err(err) = self.flywheel.refresh_borrow(market, accounts, current_block) {
            msg!("Borrow reward update skipped for market {}: {}", market.id, err);
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::constants::WAD;
    use crate::errors::assert_risk_err;

    #[test]
    fn test_list_market_checks_engine_and_duplicates() {
        let mut setup = Setup::new();
        let id = setup.list(WAD, 0);
        assert_eq!(setup.engine.all_markets(), &[id]);
        assert_risk_err(
            setup.engine.list_market(&setup.markets[&id], 0),
            RiskError::MarketAlreadyListed,
        );

        let mut foreign = setup.markets[&id].clone();
        foreign.id = Pubkey::new_unique();
        foreign.risk_engine = Pubkey::new_unique();
        assert_risk_err(setup.engine.list_market(&foreign, 0), RiskError::MarketMismatch);
    }

    #[test]
    fn test_liquidity_counts_entered_markets_only() {
        let mut setup = Setup::new();
        let collateral = setup.list(WAD, WAD / 2);
        let debt = setup.list(WAD, 0);
        let account = Pubkey::new_unique();

        setup.supply(&collateral, &account, 1_000);
        setup.owe(&debt, &account, 300);

        // collateral not entered: only the debt counts
        let liquidity = setup
            .engine
            .account_liquidity(&setup.markets, &setup.oracle, &account)
            .unwrap();
        assert_eq!(liquidity, Liquidity { surplus: 0, shortfall: 300 });

        setup.engine.enter_market(&account, &collateral).unwrap();
        assert_eq!(setup.engine.markets_of(&account), &[debt, collateral]);

        // 1_000 * 0.5 - 300
        let liquidity = setup
            .engine
            .account_liquidity(&setup.markets, &setup.oracle, &account)
            .unwrap();
        assert_eq!(liquidity, Liquidity { surplus: 200, shortfall: 0 });
    }

    #[test]
    fn test_hypothetical_liquidity() {
        let mut setup = Setup::new();
        let collateral = setup.list(WAD, WAD / 2);
        let debt = setup.list(WAD, 0);
        let account = Pubkey::new_unique();
        setup.supply(&collateral, &account, 1_000);
        setup.engine.enter_market(&account, &collateral).unwrap();
        setup.owe(&debt, &account, 300);

        let hypothetical = |modify: &Pubkey, redeem: u128, borrow: u128| {
            setup
                .engine
                .hypothetical_liquidity(
                    &setup.markets,
                    &setup.oracle,
                    &account,
                    Some(modify),
                    redeem,
                    borrow,
                )
                .unwrap()
        };

        assert_eq!(hypothetical(&debt, 0, 250), Liquidity { surplus: 0, shortfall: 50 });
        // 400 shares carry 200 of borrowing power
        assert_eq!(hypothetical(&collateral, 400, 0), Liquidity { surplus: 0, shortfall: 0 });
        assert_eq!(hypothetical(&collateral, 0, 100), Liquidity { surplus: 100, shortfall: 0 });
    }

    #[test]
    fn test_liquidity_needs_prices() {
        let mut setup = Setup::new();
        let collateral = setup.list(WAD, WAD / 2);
        let account = Pubkey::new_unique();
        setup.supply(&collateral, &account, 1_000);
        setup.engine.enter_market(&account, &collateral).unwrap();

        setup.set_price(&collateral, 0);
        assert_risk_err(
            setup.engine.account_liquidity(&setup.markets, &setup.oracle, &account),
            RiskError::PriceUnavailable,
        );
        assert_risk_err(
            setup
                .engine
                .set_collateral_factor(&setup.markets[&collateral], &setup.oracle, WAD / 4),
            RiskError::PriceUnavailable,
        );
    }

    #[test]
    fn test_membership_cap() {
        let mut setup = Setup::with_config(EngineConfig {
            max_assets_per_account: 1,
            ..EngineConfig::default()
        });
        let first = setup.list(WAD, 0);
        let second = setup.list(WAD, 0);
        let account = Pubkey::new_unique();

        setup.engine.enter_market(&account, &first).unwrap();
        setup.engine.enter_market(&account, &first).unwrap();
        assert_risk_err(
            setup.engine.enter_market(&account, &second),
            RiskError::TooManyMarkets,
        );
        assert_risk_err(
            setup.engine.enter_market(&account, &Pubkey::new_unique()),
            RiskError::MarketNotListed,
        );
    }

    #[test]
    fn test_exit_market_with_debt() {
        let mut setup = Setup::new();
        let debt = setup.list(WAD, 0);
        let account = Pubkey::new_unique();
        setup.owe(&debt, &account, 10);

        assert_risk_err(
            setup.engine.exit_market(&setup.markets, &setup.oracle, &account, &debt),
            RiskError::NonzeroBorrowBalance,
        );
        assert!(setup.engine.is_member(&account, &debt));
    }

    #[test]
    fn test_can_mint_cap_and_pause() {
        let mut setup = Setup::new();
        let market = setup.list(WAD, 0);
        let minter = Pubkey::new_unique();

        setup.engine.set_supply_cap(&market, SEED_SHARES + 500).unwrap();
        setup.engine.can_mint(&setup.markets, &market, &minter, 499, 0).unwrap();
        assert_risk_err(
            setup.engine.can_mint(&setup.markets, &market, &minter, 500, 0),
            RiskError::SupplyCapReached,
        );

        setup.engine.set_paused(Some(market), Action::Mint, true).unwrap();
        assert_risk_err(
            setup.engine.can_mint(&setup.markets, &market, &minter, 1, 0),
            RiskError::ActionPaused,
        );
        setup.engine.set_paused(Some(market), Action::Mint, false).unwrap();
        setup.engine.set_paused(None, Action::Mint, true).unwrap();
        assert_risk_err(
            setup.engine.can_mint(&setup.markets, &market, &minter, 1, 0),
            RiskError::ActionPaused,
        );
    }

    #[test]
    fn test_can_borrow() {
        let mut setup = Setup::new();
        let collateral = setup.list(WAD, WAD / 2);
        let debt = setup.list(WAD, 0);
        let borrower = Pubkey::new_unique();
        setup.supply(&collateral, &borrower, 1_000);
        setup.engine.enter_market(&borrower, &collateral).unwrap();

        assert_risk_err(
            setup.engine.can_borrow(&setup.markets, &setup.oracle, &debt, &borrower, 501, 0),
            RiskError::InsufficientCollateral,
        );
        setup
            .engine
            .can_borrow(&setup.markets, &setup.oracle, &debt, &borrower, 500, 0)
            .unwrap();
        assert!(setup.engine.is_member(&borrower, &debt));

        setup.engine.set_borrow_cap(&debt, 300).unwrap();
        assert_risk_err(
            setup.engine.can_borrow(&setup.markets, &setup.oracle, &debt, &borrower, 300, 0),
            RiskError::BorrowCapReached,
        );

        setup.set_price(&debt, 0);
        assert_risk_err(
            setup.engine.can_borrow(&setup.markets, &setup.oracle, &debt, &borrower, 1, 0),
            RiskError::PriceUnavailable,
        );
    }

    #[test]
    fn test_can_redeem_checks_members_only() {
        let mut setup = Setup::new();
        let collateral = setup.list(WAD, WAD / 2);
        let debt = setup.list(WAD, 0);
        let account = Pubkey::new_unique();
        setup.supply(&collateral, &account, 1_000);
        setup.owe(&debt, &account, 300);

        setup
            .engine
            .can_redeem(&setup.markets, &setup.oracle, &collateral, &account, 1_000, 0)
            .unwrap();

        setup.engine.enter_market(&account, &collateral).unwrap();
        setup
            .engine
            .can_redeem(&setup.markets, &setup.oracle, &collateral, &account, 400, 0)
            .unwrap();
        assert_risk_err(
            setup.engine.can_redeem(&setup.markets, &setup.oracle, &collateral, &account, 402, 0),
            RiskError::InsufficientCollateral,
        );
    }

    #[test]
    fn test_can_seize_requires_same_engine() {
        let mut setup = Setup::new();
        let collateral = setup.list(WAD, WAD / 2);
        let debt = setup.list(WAD, 0);
        let (liquidator, borrower) = (Pubkey::new_unique(), Pubkey::new_unique());

        setup
            .engine
            .can_seize(&setup.markets, &collateral, &debt, &liquidator, &borrower, 0)
            .unwrap();

        setup.markets.get_mut(&debt).unwrap().risk_engine = Pubkey::new_unique();
        assert_risk_err(
            setup.engine.can_seize(&setup.markets, &collateral, &debt, &liquidator, &borrower, 0),
            RiskError::MarketMismatch,
        );

        setup.engine.set_paused(Some(collateral), Action::Seize, true).unwrap();
        assert_risk_err(
            setup.engine.can_seize(&setup.markets, &collateral, &debt, &liquidator, &borrower, 0),
            RiskError::ActionPaused,
        );
    }

    #[test]
    fn test_reward_eligibility_reports_previous_value() {
        let mut setup = Setup::new();
        let market = setup.list(WAD, 0);

        assert!(!setup.engine.set_reward_eligible(&market, true).unwrap());
        assert!(setup.engine.market_config(&market).unwrap().is_reward_eligible);
        assert!(setup.engine.set_reward_eligible(&market, false).unwrap());
        assert!(!setup.engine.market_config(&market).unwrap().is_reward_eligible);
        assert_risk_err(
            setup.engine.set_reward_eligible(&Pubkey::new_unique(), true),
            RiskError::MarketNotListed,
        );
    }

    #[test]
    fn test_parameter_setters_validate() {
        let mut setup = Setup::new();
        let market = setup.list(WAD, 0);

        assert_risk_err(
            setup.engine.set_collateral_factor(
                &setup.markets[&market],
                &setup.oracle,
                MAX_COLLATERAL_FACTOR + 1,
            ),
            RiskError::InvalidCollateralFactor,
        );
        assert_risk_err(setup.engine.set_close_factor(WAD / 100), RiskError::InvalidCloseFactor);
        assert_risk_err(
            setup.engine.set_liquidation_incentive(WAD - 1),
            RiskError::InvalidLiquidationIncentive,
        );
        assert_risk_err(
            setup.engine.set_paused(Some(Pubkey::new_unique()), Action::Borrow, true),
            RiskError::MarketNotListed,
        );
    }
}
