//! Service-level error model.

use thiserror::Error;

use fundforge_core::DomainError;
use fundforge_escrow::TransferError;

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Errors surfaced by the campaign ledger.
///
/// Domain preconditions are deterministic and pass straight through. Transfer
/// and publish failures happen after state commitment and are never retried by
/// the ledger itself; the caller (or an operator) decides what to do next.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The value transfer failed. Settlement flags committed before the
    /// transfer stay committed; remediation is administrative.
    #[error("transfer failed: {0}")]
    Transfer(#[from] TransferError),

    /// Event publication failed after the state change was committed
    /// (at-least-once; subscribers must be idempotent).
    #[error("event publication failed: {0}")]
    Publish(String),

    /// The ledger state lock was poisoned by a panicking thread.
    #[error("ledger state lock poisoned")]
    Poisoned,
}
