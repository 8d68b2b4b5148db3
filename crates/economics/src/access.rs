//! Owner and designated-caller authorization
//!
//! The caller is always passed in explicitly. A failed check has no side
//! effects beyond a warning in the log.

use crate::errors::EconomicsError;
use p2e_types::Principal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessGate {
    owner: Principal,
    /// The single collaborator allowed to request reward grants.
    treasury: Option<Principal>,
}

impl AccessGate {
    pub fn new(owner: Principal) -> Result<Self, EconomicsError> {
        if owner.is_zero() {
            return Err(EconomicsError::config("owner must be a non-zero principal"));
        }
        Ok(Self {
            owner,
            treasury: None,
        })
    }

    pub fn owner(&self) -> Principal {
        self.owner
    }

    pub fn treasury(&self) -> Option<Principal> {
        self.treasury
    }

    pub fn is_owner(&self, caller: &Principal) -> bool {
        *caller == self.owner
    }

    pub fn is_treasury(&self, caller: &Principal) -> bool {
        self.treasury.as_ref() == Some(caller)
    }

    pub fn ensure_owner(&self, caller: &Principal) -> Result<(), EconomicsError> {
        if self.is_owner(caller) {
            return Ok(());
        }
        warn!(target: "economics", caller = %caller, "Rejected owner-only call");
        Err(EconomicsError::Unauthorized(*caller))
    }

    pub fn ensure_treasury(&self, caller: &Principal) -> Result<(), EconomicsError> {
        if self.is_treasury(caller) {
            return Ok(());
        }
        warn!(target: "economics", caller = %caller, "Rejected treasury-only call");
        Err(EconomicsError::Unauthorized(*caller))
    }

    pub fn transfer_ownership(
        &mut self,
        caller: &Principal,
        new_owner: Principal,
    ) -> Result<(), EconomicsError> {
        self.ensure_owner(caller)?;
        if new_owner.is_zero() {
            return Err(EconomicsError::config("new owner must be a non-zero principal"));
        }

        info!(target: "economics", from = %self.owner, to = %new_owner, "Ownership transferred");
        self.owner = new_owner;
        Ok(())
    }

    /// Designate (or with `None` / the zero principal, clear) the treasury caller.
    pub fn set_treasury(
        &mut self,
        caller: &Principal,
        treasury: Option<Principal>,
    ) -> Result<(), EconomicsError> {
        self.ensure_owner(caller)?;
        let treasury = treasury.filter(|principal| !principal.is_zero());

        info!(
            target: "economics",
            treasury = ?treasury.map(|principal| principal.encode()),
            "Treasury caller updated"
        );
        self.treasury = treasury;
        Ok(())
    }
}
