//! Economy transfer protocol.
//!
//! The [`Bank`] orchestrates debit/credit pairs between account-capable
//! entities on top of an external balance [`Ledger`]. The core contract:
//! every successful transfer's debit is matched by exactly one credit, and a
//! credit failure rolls the debit back with a compensating refund. With the
//! closed-economy mode enabled, plain `pay`/`collect` calls are rerouted as
//! transfers to and from a single server-held account so no currency enters
//! or leaves the system.
//!
//! An ordinary declined payment (insufficient funds) is an `Ok(false)`
//! result. `Err` values are ledger faults and the one unrecoverable case,
//! [`EconomyError::RefundFailed`].

pub mod error;
pub mod ledger;
pub mod log;

use std::sync::Arc;

use ::log::{debug, error};

pub use error::EconomyError;
pub use ledger::{Ledger, MemoryLedger};
pub use log::{FileTransactionLog, MemoryTransactionLog, TransactionLog, TransferEntry};

/// Shown to players when a formatted-balance query cannot reach the ledger.
const BALANCE_ERROR_SENTINEL: &str = "Error accessing bank account";

/// An entity that can hold money.
pub trait Account {
    /// The ledger-side account name. Must be stable for the entity's life.
    fn account_name(&self) -> String;

    /// World the account's balance lives in, when the ledger is
    /// world-scoped. `None` falls back to the server's default world.
    fn account_world(&self) -> Option<String> {
        None
    }
}

/// The well-known singleton account used for closed-economy routing.
#[derive(Debug, Clone)]
pub struct ServerAccount {
    pub name: String,
    pub world: String,
}

impl ServerAccount {
    pub fn new(name: impl Into<String>, world: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            world: world.into(),
        }
    }
}

impl Account for ServerAccount {
    fn account_name(&self) -> String {
        self.name.clone()
    }

    fn account_world(&self) -> Option<String> {
        Some(self.world.clone())
    }
}

/// Orchestrates transfers against the installed ledger.
///
/// Running without a ledger is supported: money movements report `Ok(false)`
/// and balance queries fail with [`EconomyError::NoLedger`].
pub struct Bank {
    ledger: Option<Arc<dyn Ledger>>,
    tx_log: Arc<dyn TransactionLog>,
    closed_economy: bool,
    server: ServerAccount,
}

impl Bank {
    pub fn new(
        ledger: Option<Arc<dyn Ledger>>,
        tx_log: Arc<dyn TransactionLog>,
        closed_economy: bool,
        server: ServerAccount,
    ) -> Self {
        Self {
            ledger,
            tx_log,
            closed_economy,
            server,
        }
    }

    pub fn server_account(&self) -> &ServerAccount {
        &self.server
    }

    fn ledger(&self) -> Result<&Arc<dyn Ledger>, EconomyError> {
        self.ledger.as_ref().ok_or(EconomyError::NoLedger)
    }

    fn world_of(&self, account: &dyn Account) -> String {
        account
            .account_world()
            .unwrap_or_else(|| self.server.world.clone())
    }

    /// Debit without logging. A negative amount is treated as a credit of
    /// its absolute value.
    fn debit(&self, account: &dyn Account, amount: f64) -> Result<bool, EconomyError> {
        if amount < 0.0 {
            return self.credit(account, -amount);
        }
        let Some(ledger) = self.ledger.as_ref() else {
            return Ok(false);
        };
        let name = account.account_name();
        let world = self.world_of(account);
        if !ledger.has_enough(&name, amount, &world)? {
            return Ok(false);
        }
        ledger.subtract(&name, amount, &world)
    }

    /// Credit without logging.
    fn credit(&self, account: &dyn Account, amount: f64) -> Result<bool, EconomyError> {
        if amount < 0.0 {
            return self.debit(account, -amount);
        }
        let Some(ledger) = self.ledger.as_ref() else {
            return Ok(false);
        };
        let name = account.account_name();
        let world = self.world_of(account);
        ledger.add(&name, amount, &world)
    }

    /// Take `amount` out of `account`. With the closed economy enabled this
    /// becomes a transfer to the server account instead of a pure sink.
    pub fn pay(
        &self,
        account: &dyn Account,
        amount: f64,
        reason: &str,
    ) -> Result<bool, EconomyError> {
        if self.closed_economy {
            let server = self.server.clone();
            return self.pay_to(account, amount, &server, reason);
        }
        if self.debit(account, amount)? {
            self.tx_log
                .log_transfer(Some(&account.account_name()), amount, None, reason);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Put `amount` into `account`. With the closed economy enabled the
    /// money comes out of the server account rather than thin air.
    pub fn collect(
        &self,
        account: &dyn Account,
        amount: f64,
        reason: &str,
    ) -> Result<bool, EconomyError> {
        if self.closed_economy {
            let server = self.server.clone();
            return self.pay_to(&server, amount, account, reason);
        }
        if self.credit(account, amount)? {
            self.tx_log
                .log_transfer(None, amount, Some(&account.account_name()), reason);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Transfer `amount` from `payer` to `collector`. The debit runs first;
    /// only a successful debit attempts the credit. A failed credit triggers
    /// exactly one compensating refund of the payer. If that refund itself
    /// fails, currency has been destroyed and the error is unrecoverable.
    pub fn pay_to(
        &self,
        payer: &dyn Account,
        amount: f64,
        collector: &dyn Account,
        reason: &str,
    ) -> Result<bool, EconomyError> {
        if !self.debit(payer, amount)? {
            debug!(
                "transfer of {} from {} declined: insufficient funds",
                amount,
                payer.account_name()
            );
            return Ok(false);
        }

        let credited = match self.credit(collector, amount) {
            Ok(true) => true,
            Ok(false) => false,
            Err(e) => {
                self.refund(payer, amount)?;
                return Err(e);
            }
        };
        if !credited {
            self.refund(payer, amount)?;
            return Ok(false);
        }

        self.tx_log.log_transfer(
            Some(&payer.account_name()),
            amount,
            Some(&collector.account_name()),
            reason,
        );
        Ok(true)
    }

    fn refund(&self, payer: &dyn Account, amount: f64) -> Result<(), EconomyError> {
        match self.credit(payer, amount) {
            Ok(true) => Ok(()),
            Ok(false) | Err(_) => {
                let account = payer.account_name();
                error!(
                    "refund of {} to {} failed after a broken transfer; currency destroyed",
                    amount, account
                );
                Err(EconomyError::RefundFailed { account, amount })
            }
        }
    }

    /// Force the account's balance to exactly `amount` by routing the signed
    /// difference through `collect` or `pay`. A zero difference succeeds
    /// without touching the ledger or the log.
    pub fn set_balance(
        &self,
        account: &dyn Account,
        amount: f64,
        reason: &str,
    ) -> Result<bool, EconomyError> {
        let current = self.holding_balance(account)?;
        let diff = amount - current;
        if diff > 0.0 {
            self.collect(account, diff, reason)
        } else if diff < 0.0 {
            self.pay(account, -diff, reason)
        } else {
            Ok(true)
        }
    }

    pub fn can_pay_from_holdings(
        &self,
        account: &dyn Account,
        amount: f64,
    ) -> Result<bool, EconomyError> {
        let ledger = self.ledger()?;
        ledger.has_enough(&account.account_name(), amount, &self.world_of(account))
    }

    pub fn holding_balance(&self, account: &dyn Account) -> Result<f64, EconomyError> {
        let ledger = self.ledger()?;
        ledger.balance(&account.account_name(), &self.world_of(account))
    }

    /// Balance as a display string. Degrades to a sentinel message instead
    /// of failing; the callers of this are UI paths.
    pub fn holding_formatted_balance(&self, account: &dyn Account) -> String {
        let result = self
            .holding_balance(account)
            .and_then(|balance| self.ledger()?.format_balance(balance));
        match result {
            Ok(formatted) => formatted,
            Err(e) => {
                error!(
                    "could not read balance of {}: {}",
                    account.account_name(),
                    e
                );
                BALANCE_ERROR_SENTINEL.to_string()
            }
        }
    }

    pub fn remove_account(&self, account: &dyn Account) -> Result<(), EconomyError> {
        let ledger = self.ledger()?;
        ledger.remove_account(&account.account_name())
    }
}
