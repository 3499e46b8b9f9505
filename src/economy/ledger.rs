//! The external balance ledger: the economy plugin (or test double) that
//! actually holds account balances. The transfer protocol never touches
//! balances except through this trait.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::economy::error::EconomyError;

/// Balance operations the transfer protocol needs. Every call may fail;
/// failures surface as recoverable [`EconomyError::Ledger`] values.
pub trait Ledger: Send + Sync {
    fn has_enough(&self, account: &str, amount: f64, world: &str) -> Result<bool, EconomyError>;
    fn subtract(&self, account: &str, amount: f64, world: &str) -> Result<bool, EconomyError>;
    fn add(&self, account: &str, amount: f64, world: &str) -> Result<bool, EconomyError>;
    fn balance(&self, account: &str, world: &str) -> Result<f64, EconomyError>;
    fn format_balance(&self, amount: f64) -> Result<String, EconomyError>;
    fn remove_account(&self, account: &str) -> Result<(), EconomyError>;
}

/// Process-local ledger keeping balances in a map. Used by tests and by
/// servers that run without an external economy plugin. Accounts spring into
/// existence at zero on first touch; worlds share one balance pool.
#[derive(Default)]
pub struct MemoryLedger {
    accounts: Mutex<HashMap<String, f64>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an account balance, replacing any existing one.
    pub fn set_balance(&self, account: &str, amount: f64) {
        self.accounts
            .lock()
            .expect("ledger lock poisoned")
            .insert(account.to_string(), amount);
    }

    /// Sum of all balances, for conservation checks.
    pub fn total(&self) -> f64 {
        self.accounts
            .lock()
            .expect("ledger lock poisoned")
            .values()
            .sum()
    }
}

impl Ledger for MemoryLedger {
    fn has_enough(&self, account: &str, amount: f64, _world: &str) -> Result<bool, EconomyError> {
        let accounts = self.accounts.lock().expect("ledger lock poisoned");
        Ok(accounts.get(account).copied().unwrap_or(0.0) >= amount)
    }

    fn subtract(&self, account: &str, amount: f64, _world: &str) -> Result<bool, EconomyError> {
        let mut accounts = self.accounts.lock().expect("ledger lock poisoned");
        let balance = accounts.entry(account.to_string()).or_insert(0.0);
        if *balance < amount {
            return Ok(false);
        }
        *balance -= amount;
        Ok(true)
    }

    fn add(&self, account: &str, amount: f64, _world: &str) -> Result<bool, EconomyError> {
        let mut accounts = self.accounts.lock().expect("ledger lock poisoned");
        *accounts.entry(account.to_string()).or_insert(0.0) += amount;
        Ok(true)
    }

    fn balance(&self, account: &str, _world: &str) -> Result<f64, EconomyError> {
        let accounts = self.accounts.lock().expect("ledger lock poisoned");
        Ok(accounts.get(account).copied().unwrap_or(0.0))
    }

    fn format_balance(&self, amount: f64) -> Result<String, EconomyError> {
        Ok(format!("{:.2}", amount))
    }

    fn remove_account(&self, account: &str) -> Result<(), EconomyError> {
        self.accounts
            .lock()
            .expect("ledger lock poisoned")
            .remove(account);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balances_spring_into_existence_at_zero() {
        let ledger = MemoryLedger::new();
        assert_eq!(ledger.balance("alice", "overworld").unwrap(), 0.0);
        assert!(!ledger.has_enough("alice", 1.0, "overworld").unwrap());
    }

    #[test]
    fn subtract_refuses_overdraft() {
        let ledger = MemoryLedger::new();
        ledger.set_balance("alice", 10.0);
        assert!(!ledger.subtract("alice", 20.0, "overworld").unwrap());
        assert_eq!(ledger.balance("alice", "overworld").unwrap(), 10.0);
        assert!(ledger.subtract("alice", 10.0, "overworld").unwrap());
        assert_eq!(ledger.balance("alice", "overworld").unwrap(), 0.0);
    }

    #[test]
    fn formatted_balance_uses_two_decimals() {
        let ledger = MemoryLedger::new();
        assert_eq!(ledger.format_balance(12.5).unwrap(), "12.50");
    }
}
