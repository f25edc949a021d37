use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::money::Currency;

#[derive(Error, Debug, Serialize)]
pub enum LedgerError {
    /// Split specification is malformed or does not sum to the expense amount.
    /// Rejected before any write; the caller can fix the input and resubmit.
    #[error("Invalid split specification: {0}")]
    InvalidSplitSpec(String),

    /// User is not a member of the group in scope
    #[error("User {0} is not a group member")]
    NotGroupMember(Uuid),

    /// User is not an owner of the group in scope
    #[error("User {0} is not a group owner")]
    NotGroupOwner(Uuid),

    /// Optimistic-concurrency conflict on a split edit; the caller must
    /// re-read the expense and retry against the current version
    #[error("Stale split version: expected {expected}, current is {actual}")]
    StaleVersion { expected: u64, actual: u64 },

    /// Group balances did not net to zero. This is an internal invariant
    /// violation (corrupted history or a bug), never bad caller input.
    #[error("Group balances do not net to zero (residual {0} minor units)")]
    BalanceInconsistency(i64),

    /// Expense with given ID not found (or tombstoned)
    #[error("Expense {0} not found")]
    ExpenseNotFound(Uuid),

    /// Group with given ID not found
    #[error("Group {0} not found")]
    GroupNotFound(Uuid),

    /// Settlement with given ID not found
    #[error("Settlement {0} not found")]
    SettlementNotFound(Uuid),

    /// Cannot record a settlement from a user to themselves
    #[error("Cannot record settlement to self")]
    SelfSettlement,

    /// Amount must be strictly positive
    #[error("Amount must be positive")]
    InvalidAmount,

    /// Currency code is not a three-letter alphabetic code
    #[error("Invalid currency code: {0}")]
    InvalidCurrency(String),

    /// Two amounts with different currency codes were combined
    #[error("Currency mismatch: expected {expected}, found {found}")]
    CurrencyMismatch { expected: Currency, found: Currency },

    /// Integer overflow while combining amounts
    #[error("Amount overflow")]
    AmountOverflow,

    /// Generic input validation error
    #[error("Invalid input for field `{field}`: {reason}")]
    InvalidInput { field: String, reason: String },

    /// Storage collaborator failure (timeouts, connectivity); passes through
    /// with no change to engine state
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
}
