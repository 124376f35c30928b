//! Authorization interface
//!
//! Admins configure markets and risk parameters; guardians may only pause.

use std::collections::BTreeSet;

use anchor_lang::prelude::*;
use crate::errors::RiskError;

/// Role lookup for privileged operations
pub trait Authority {
    fn is_admin(&self, caller: &Pubkey) -> bool;
    fn is_guardian(&self, caller: &Pubkey) -> bool;
}

/// Fail with `Unauthorized` unless `caller` is an admin
pub fn require_admin(authority: &dyn Authority, caller: &Pubkey) -> Result<()> {
    require!(authority.is_admin(caller), RiskError::Unauthorized);
    Ok(())
}

/// Fail with `Unauthorized` unless `caller` is an admin or a guardian
pub fn require_admin_or_guardian(authority: &dyn Authority, caller: &Pubkey) -> Result<()> {
    require!(
        authority.is_admin(caller) || authority.is_guardian(caller),
        RiskError::Unauthorized
    );
    Ok(())
}

/// Fixed admin plus a set of guardians
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleAuthority {
    pub admin: Pubkey,
    pub guardians: BTreeSet<Pubkey>,
}

impl RoleAuthority {
    pub fn new(admin: Pubkey) -> Self {
        Self {
            admin,
            guardians: BTreeSet::new(),
        }
    }

    pub fn with_guardian(mut self, guardian: Pubkey) -> Self {
        self.guardians.insert(guardian);
        self
    }
}

impl Authority for RoleAuthority {
    fn is_admin(&self, caller: &Pubkey) -> bool {
        self.admin == *caller
    }

    fn is_guardian(&self, caller: &Pubkey) -> bool {
        self.guardians.contains(caller)
    }
}
