use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::money::Money;

use super::split::Split;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Expense {
    pub id: Uuid,
    pub group_id: Uuid,
    pub payer_id: Uuid,
    pub amount: Money,
    pub description: String,
    pub category: Option<String>,
    /// Incremented by the store on every split edit; carried by callers for
    /// optimistic concurrency on updates.
    pub split_version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Expense {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// An expense together with its current split set, as returned by read and
/// write paths of the service.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExpenseWithSplits {
    pub expense: Expense,
    pub splits: Vec<Split>,
}
