pub mod in_memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::LedgerError;
use crate::models::{Expense, Settlement, Split};

/// Durable, transactional storage for expenses, splits and settlements.
///
/// The engine relies on three guarantees: `write_expense_with_splits` is
/// atomic, `compare_and_set_splits` is an all-or-nothing swap conditioned on
/// the split version, and `read_group_history` observes a single consistent
/// snapshot (never a mix of pre- and post-edit state for one expense).
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn read_expense(&self, expense_id: Uuid) -> Result<Option<Expense>, LedgerError>;
    async fn read_expenses(&self, group_id: Uuid) -> Result<Vec<Expense>, LedgerError>;
    async fn read_splits(&self, expense_id: Uuid) -> Result<Vec<Split>, LedgerError>;
    async fn read_settlement(&self, settlement_id: Uuid)
        -> Result<Option<Settlement>, LedgerError>;
    async fn read_settlements(&self, group_id: Uuid) -> Result<Vec<Settlement>, LedgerError>;

    /// Atomic snapshot of everything needed to fold a group's balances.
    async fn read_group_history(
        &self,
        group_id: Uuid,
    ) -> Result<(Vec<Expense>, Vec<Split>, Vec<Settlement>), LedgerError>;

    /// Writes an expense and its split set as one atomic unit.
    async fn write_expense_with_splits(
        &self,
        expense: Expense,
        splits: Vec<Split>,
    ) -> Result<(), LedgerError>;

    /// Replaces an expense's splits if and only if its current split version
    /// equals `expected_version`; bumps the version and returns the expense
    /// row as committed (so callers never have to re-read a row a concurrent
    /// writer may already have touched), or fails with
    /// [`LedgerError::StaleVersion`].
    async fn compare_and_set_splits(
        &self,
        expense_id: Uuid,
        expected_version: u64,
        new_splits: Vec<Split>,
    ) -> Result<Expense, LedgerError>;

    async fn update_expense_metadata(
        &self,
        expense_id: Uuid,
        description: Option<String>,
        category: Option<String>,
    ) -> Result<Expense, LedgerError>;

    async fn tombstone_expense(
        &self,
        expense_id: Uuid,
        deleted_at: DateTime<Utc>,
    ) -> Result<(), LedgerError>;

    async fn append_settlement(&self, settlement: Settlement) -> Result<(), LedgerError>;

    /// Groups in which the user appears anywhere in the history.
    async fn read_user_group_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>, LedgerError>;
}
