//! Account membership
//!
//! The ordered set of markets an account has entered. Only these markets
//! count toward the account's liquidity, and the cap on its size bounds the
//! cost of every liquidity check.

use anchor_lang::prelude::*;
use crate::errors::RiskError;

/// Markets entered by one account, in insertion order
#[derive(AnchorSerialize, AnchorDeserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct AccountMembership {
    markets: Vec<Pubkey>,
}

impl AccountMembership {
    pub fn contains(&self, market: &Pubkey) -> bool {
        self.markets.contains(market)
    }

    pub fn markets(&self) -> &[Pubkey] {
        &self.markets
    }

    pub fn len(&self) -> usize {
        self.markets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markets.is_empty()
    }

    /// Enter `market`; returns false if already a member
    pub fn enter(&mut self, market: Pubkey, max_markets: usize) -> Result<bool> {
        if self.contains(&market) {
            return Ok(false);
        }
        require!(self.markets.len() < max_markets, RiskError::TooManyMarkets);

        self.markets.push(market);
        Ok(true)
    }

    /// Leave `market`, keeping the order of the rest; returns false if not a member
    pub fn exit(&mut self, market: &Pubkey) -> bool {
        match self.markets.iter().position(|m| m == market) {
            Some(index) => {
                self.markets.remove(index);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::assert_risk_err;

    #[test]
    fn test_enter_keeps_insertion_order() {
        let mut membership = AccountMembership::default();
        let a = Pubkey::new_unique();
        let b = Pubkey::new_unique();
        let c = Pubkey::new_unique();

        assert!(membership.enter(c, 10).unwrap());
        assert!(membership.enter(a, 10).unwrap());
        assert!(membership.enter(b, 10).unwrap());
        assert!(!membership.enter(a, 10).unwrap());
        assert_eq!(membership.markets(), &[c, a, b]);

        assert!(membership.exit(&a));
        assert!(!membership.exit(&a));
        assert_eq!(membership.markets(), &[c, b]);
    }

    #[test]
    fn test_membership_cap() {
        let mut membership = AccountMembership::default();
        membership.enter(Pubkey::new_unique(), 2).unwrap();
        membership.enter(Pubkey::new_unique(), 2).unwrap();

        assert_risk_err(
            membership.enter(Pubkey::new_unique(), 2),
            RiskError::TooManyMarkets,
        );
        assert_eq!(membership.len(), 2);
    }
}
