//! Market membership instructions
//!
//! Only entered markets count toward an account's collateral.

use anchor_lang::prelude::*;
use super::context::MoneyMarket;

impl MoneyMarket {
    /// Enter every market in `markets`; all or nothing
    pub fn enter_markets(&mut self, account: &Pubkey, markets: &[Pubkey]) -> Result<()> {
        self.transact(&[], |mm| {
            for market in markets {
                mm.ledger.engine.enter_market(account, market)?;
            }
            Ok(())
        })
    }

    /// Leave `market`; fails while it holds debt or backs other borrows
    pub fn exit_market(&mut self, account: &Pubkey, market: &Pubkey) -> Result<()> {
        self.transact(&[], |mm| {
            mm.ledger
                .engine
                .exit_market(&mm.ledger.markets, mm.oracle.as_ref(), account, market)
        })
    }
}
