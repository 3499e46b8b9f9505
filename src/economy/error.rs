use thiserror::Error;

/// Errors surfaced by the economy transfer protocol. Everything here is
/// caller-visible; an ordinary declined payment (insufficient balance) is a
/// `false` result, not an error.
#[derive(Debug, Error)]
pub enum EconomyError {
    /// The external ledger reported a failure (unavailable, rejected call).
    /// Recoverable; the caller decides what to tell the player.
    #[error("ledger error: {0}")]
    Ledger(String),

    /// No ledger implementation is installed. Fatal to balance queries.
    #[error("no balance ledger is installed")]
    NoLedger,

    /// A compensating refund after a failed transfer itself failed. The
    /// debited amount is gone; this must reach the operator.
    #[error("refund of {amount} to {account} failed after a broken transfer; currency destroyed")]
    RefundFailed { account: String, amount: f64 },
}
