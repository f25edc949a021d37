use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::LedgerError;
use crate::models::{Expense, Settlement, Split};
use crate::storage::LedgerStore;

/// Reference store backed by mutexed maps.
///
/// Lock order is always expenses, then splits, then settlements; multi-map
/// operations (atomic writes, CAS, history snapshots) hold every lock they
/// need for their whole critical section.
#[derive(Clone, Default)]
pub struct InMemoryLedgerStore {
    inner: std::sync::Arc<Maps>,
}

#[derive(Default)]
struct Maps {
    expenses: Mutex<HashMap<Uuid, Expense>>,
    splits: Mutex<HashMap<Uuid, Vec<Split>>>, // keyed by expense id
    settlements: Mutex<HashMap<Uuid, Settlement>>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn read_expense(&self, expense_id: Uuid) -> Result<Option<Expense>, LedgerError> {
        Ok(self.inner.expenses.lock().await.get(&expense_id).cloned())
    }

    async fn read_expenses(&self, group_id: Uuid) -> Result<Vec<Expense>, LedgerError> {
        // For production: database query with an index on group_id
        let expenses = self.inner.expenses.lock().await;
        let mut result: Vec<Expense> = expenses
            .values()
            .filter(|e| e.group_id == group_id)
            .cloned()
            .collect();
        result.sort_by_key(|e| (e.created_at, e.id));
        Ok(result)
    }

    async fn read_splits(&self, expense_id: Uuid) -> Result<Vec<Split>, LedgerError> {
        Ok(self
            .inner
            .splits
            .lock()
            .await
            .get(&expense_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn read_settlement(
        &self,
        settlement_id: Uuid,
    ) -> Result<Option<Settlement>, LedgerError> {
        Ok(self
            .inner
            .settlements
            .lock()
            .await
            .get(&settlement_id)
            .cloned())
    }

    async fn read_settlements(&self, group_id: Uuid) -> Result<Vec<Settlement>, LedgerError> {
        let settlements = self.inner.settlements.lock().await;
        let mut result: Vec<Settlement> = settlements
            .values()
            .filter(|s| s.group_id == group_id)
            .cloned()
            .collect();
        result.sort_by_key(|s| (s.created_at, s.id));
        Ok(result)
    }

    async fn read_group_history(
        &self,
        group_id: Uuid,
    ) -> Result<(Vec<Expense>, Vec<Split>, Vec<Settlement>), LedgerError> {
        let expenses = self.inner.expenses.lock().await;
        let splits = self.inner.splits.lock().await;
        let settlements = self.inner.settlements.lock().await;

        let mut group_expenses: Vec<Expense> = expenses
            .values()
            .filter(|e| e.group_id == group_id)
            .cloned()
            .collect();
        group_expenses.sort_by_key(|e| (e.created_at, e.id));

        let group_splits: Vec<Split> = group_expenses
            .iter()
            .flat_map(|e| splits.get(&e.id).cloned().unwrap_or_default())
            .collect();

        let mut group_settlements: Vec<Settlement> = settlements
            .values()
            .filter(|s| s.group_id == group_id)
            .cloned()
            .collect();
        group_settlements.sort_by_key(|s| (s.created_at, s.id));

        Ok((group_expenses, group_splits, group_settlements))
    }

    async fn write_expense_with_splits(
        &self,
        expense: Expense,
        splits: Vec<Split>,
    ) -> Result<(), LedgerError> {
        let mut expenses = self.inner.expenses.lock().await;
        let mut split_map = self.inner.splits.lock().await;
        split_map.insert(expense.id, splits);
        expenses.insert(expense.id, expense);
        Ok(())
    }

    async fn compare_and_set_splits(
        &self,
        expense_id: Uuid,
        expected_version: u64,
        new_splits: Vec<Split>,
    ) -> Result<Expense, LedgerError> {
        let mut expenses = self.inner.expenses.lock().await;
        let mut split_map = self.inner.splits.lock().await;

        let expense = expenses
            .get_mut(&expense_id)
            .ok_or(LedgerError::ExpenseNotFound(expense_id))?;
        if expense.split_version != expected_version {
            return Err(LedgerError::StaleVersion {
                expected: expected_version,
                actual: expense.split_version,
            });
        }

        expense.split_version += 1;
        expense.updated_at = Utc::now();
        split_map.insert(expense_id, new_splits);
        Ok(expense.clone())
    }

    async fn update_expense_metadata(
        &self,
        expense_id: Uuid,
        description: Option<String>,
        category: Option<String>,
    ) -> Result<Expense, LedgerError> {
        let mut expenses = self.inner.expenses.lock().await;
        let expense = expenses
            .get_mut(&expense_id)
            .ok_or(LedgerError::ExpenseNotFound(expense_id))?;
        if let Some(description) = description {
            expense.description = description;
        }
        if let Some(category) = category {
            expense.category = Some(category);
        }
        expense.updated_at = Utc::now();
        Ok(expense.clone())
    }

    async fn tombstone_expense(
        &self,
        expense_id: Uuid,
        deleted_at: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        let mut expenses = self.inner.expenses.lock().await;
        let expense = expenses
            .get_mut(&expense_id)
            .ok_or(LedgerError::ExpenseNotFound(expense_id))?;
        if expense.is_deleted() {
            return Err(LedgerError::ExpenseNotFound(expense_id));
        }
        expense.deleted_at = Some(deleted_at);
        expense.updated_at = deleted_at;
        Ok(())
    }

    async fn append_settlement(&self, settlement: Settlement) -> Result<(), LedgerError> {
        self.inner
            .settlements
            .lock()
            .await
            .insert(settlement.id, settlement);
        Ok(())
    }

    async fn read_user_group_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>, LedgerError> {
        let expenses = self.inner.expenses.lock().await;
        let splits = self.inner.splits.lock().await;
        let settlements = self.inner.settlements.lock().await;

        let mut groups = BTreeSet::new();
        for expense in expenses.values().filter(|e| !e.is_deleted()) {
            if expense.payer_id == user_id {
                groups.insert(expense.group_id);
            } else if splits
                .get(&expense.id)
                .is_some_and(|s| s.iter().any(|split| split.user_id == user_id))
            {
                groups.insert(expense.group_id);
            }
        }
        for settlement in settlements.values() {
            if settlement.payer_id == user_id || settlement.payee_id == user_id {
                groups.insert(settlement.group_id);
            }
        }
        Ok(groups.into_iter().collect())
    }
}
