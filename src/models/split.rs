use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::money::Money;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitKind {
    Equal,
    Exact,
    Percentage,
    Weighted,
}

/// One participant's owed share of an expense. Amounts are strictly positive;
/// participants owed nothing simply have no split row.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Split {
    pub expense_id: Uuid,
    pub user_id: Uuid,
    pub amount: Money,
    pub kind: SplitKind,
}
