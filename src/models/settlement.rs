use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::money::Money;

/// A recorded real-world payment from `payer_id` to `payee_id` that reduces
/// the payer's outstanding debt. Append-only: rows are never edited, only
/// superseded by a compensating settlement.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Settlement {
    pub id: Uuid,
    pub group_id: Uuid,
    pub payer_id: Uuid,
    pub payee_id: Uuid,
    pub amount: Money,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}
