pub mod in_memory;

use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::LedgerError;
use crate::models::GroupBalances;

/// Transient cache for derived group balances.
///
/// The zero-sum invariant must hold for every read, so the service
/// invalidates a group's entry synchronously on any write that touches the
/// group. TTL expiry is only a backstop.
#[async_trait]
pub trait BalanceCache: Send + Sync {
    async fn get_group_balances(
        &self,
        group_id: Uuid,
    ) -> Result<Option<GroupBalances>, LedgerError>;
    async fn save_group_balances(
        &self,
        group_id: Uuid,
        balances: &GroupBalances,
        ttl: Duration,
    ) -> Result<(), LedgerError>;
    async fn invalidate_group(&self, group_id: Uuid) -> Result<(), LedgerError>;
}
