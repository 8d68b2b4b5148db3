//! Token ledger interface for reward minting
//!
//! The base fungible-token bookkeeping (balances, supply) lives outside the
//! allocation core. This module defines the narrow interface the core calls
//! into, plus an in-memory implementation for the CLI and a mock for tests.

use anyhow::{anyhow, Result};
use p2e_types::{amount_string, Amount, Principal};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Interface for the external token collaborator.
pub trait TokenLedger: Send + Sync {
    /// Increase circulating supply and the recipient's balance.
    fn mint(&mut self, to: &Principal, amount: Amount) -> Result<()>;

    /// Destroy tokens held by `holder`, lowering circulating supply.
    ///
    /// Also used to reverse a mint when a reward grant cannot complete.
    fn burn(&mut self, holder: &Principal, amount: Amount) -> Result<()>;

    /// Retrieve an account balance.
    fn balance_of(&self, who: &Principal) -> Result<Amount>;

    /// Return total circulating supply across all accounts.
    fn total_supply(&self) -> Result<Amount>;

    /// Retrieve all balances (snapshot).
    fn balances(&self) -> Result<HashMap<Principal, Amount>>;
}

// -----------------------------------------------------------------------------
// In-memory implementation (for the CLI deployment or testing)
// -----------------------------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InMemoryTokenLedger {
    balances: HashMap<Principal, Amount>,
    #[serde(with = "amount_string")]
    total_supply: Amount,
}

impl InMemoryTokenLedger {
    pub fn new() -> Self {
        Self {
            balances: HashMap::new(),
            total_supply: 0,
        }
    }

    /// Move `amount` between two holders. Supply is unchanged.
    pub fn transfer(&mut self, from: &Principal, to: &Principal, amount: Amount) -> Result<()> {
        if to.is_zero() {
            return Err(anyhow!("Cannot transfer to the zero principal"));
        }
        let from_balance = self.balances.get(from).copied().unwrap_or(0);
        if from_balance < amount {
            return Err(anyhow!(
                "Insufficient balance: {} holds {}, transfer requested {}",
                from,
                from_balance,
                amount
            ));
        }
        self.balances.insert(*from, from_balance - amount);
        let balance = self.balances.entry(*to).or_insert(0);
        *balance = balance.saturating_add(amount);
        Ok(())
    }
}

impl TokenLedger for InMemoryTokenLedger {
    fn mint(&mut self, to: &Principal, amount: Amount) -> Result<()> {
        if to.is_zero() {
            return Err(anyhow!("Cannot mint to the zero principal"));
        }
        let new_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or_else(|| anyhow!("Total supply overflow"))?;
        let balance = self.balances.entry(*to).or_insert(0);
        *balance = balance.saturating_add(amount);
        self.total_supply = new_supply;
        Ok(())
    }

    /// Burns shrink circulating supply only; bucket `distributed` counters
    /// are cumulative and are not reduced.
    fn burn(&mut self, holder: &Principal, amount: Amount) -> Result<()> {
        let current_balance = self.balances.get(holder).copied().unwrap_or(0);
        if current_balance < amount {
            return Err(anyhow!(
                "Insufficient balance: {} holds {}, burn requested {}",
                holder,
                current_balance,
                amount
            ));
        }
        self.balances.insert(*holder, current_balance - amount);
        self.total_supply = self.total_supply.saturating_sub(amount);
        Ok(())
    }

    fn balance_of(&self, who: &Principal) -> Result<Amount> {
        Ok(self.balances.get(who).copied().unwrap_or(0))
    }

    fn total_supply(&self) -> Result<Amount> {
        Ok(self.total_supply)
    }

    fn balances(&self) -> Result<HashMap<Principal, Amount>> {
        Ok(self.balances.clone())
    }
}

// -----------------------------------------------------------------------------
// Mock ledger (for deterministic testing and failure injection)
// -----------------------------------------------------------------------------
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MockTokenLedger {
    balances: HashMap<Principal, Amount>,
    total_supply: Amount,
    mint_calls: Vec<(Principal, Amount)>,
    burn_calls: Vec<(Principal, Amount)>,
    mint_attempts: usize,
    fail_mints: bool,
    fail_mint_at: Option<usize>,
}

impl MockTokenLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_mint_calls(&self) -> &[(Principal, Amount)] {
        &self.mint_calls
    }

    pub fn get_burn_calls(&self) -> &[(Principal, Amount)] {
        &self.burn_calls
    }

    pub fn clear_calls(&mut self) {
        self.mint_calls.clear();
        self.burn_calls.clear();
    }

    /// Make every subsequent `mint` fail without side effects.
    pub fn set_fail_mints(&mut self, fail: bool) {
        self.fail_mints = fail;
    }

    /// Fail only the mint attempt with this zero-based index, counted from
    /// the mock's creation.
    pub fn set_fail_mint_at(&mut self, attempt: Option<usize>) {
        self.fail_mint_at = attempt;
    }
}

impl TokenLedger for MockTokenLedger {
    fn mint(&mut self, to: &Principal, amount: Amount) -> Result<()> {
        let attempt = self.mint_attempts;
        self.mint_attempts += 1;
        if self.fail_mints || self.fail_mint_at == Some(attempt) {
            return Err(anyhow!("Mock mint failure"));
        }
        self.mint_calls.push((*to, amount));
        let balance = self.balances.entry(*to).or_insert(0);
        *balance = balance.saturating_add(amount);
        self.total_supply = self.total_supply.saturating_add(amount);
        Ok(())
    }

    fn burn(&mut self, holder: &Principal, amount: Amount) -> Result<()> {
        let balance = self.balances.get(holder).copied().unwrap_or(0);
        if balance < amount {
            return Err(anyhow!("Mock burn exceeds balance"));
        }
        self.balances.insert(*holder, balance - amount);
        self.total_supply = self.total_supply.saturating_sub(amount);
        self.burn_calls.push((*holder, amount));
        Ok(())
    }

    fn balance_of(&self, who: &Principal) -> Result<Amount> {
        Ok(self.balances.get(who).copied().unwrap_or(0))
    }

    fn total_supply(&self) -> Result<Amount> {
        Ok(self.total_supply)
    }

    fn balances(&self) -> Result<HashMap<Principal, Amount>> {
        Ok(self.balances.clone())
    }
}
