use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::cache::BalanceCache;
use crate::error::LedgerError;
use crate::models::GroupBalances;

#[derive(Clone, Default)]
pub struct InMemoryBalanceCache {
    entries: Arc<RwLock<HashMap<Uuid, (GroupBalances, DateTime<Utc>)>>>,
}

impl InMemoryBalanceCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BalanceCache for InMemoryBalanceCache {
    async fn get_group_balances(
        &self,
        group_id: Uuid,
    ) -> Result<Option<GroupBalances>, LedgerError> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(&group_id)
            .filter(|(_, expiry)| *expiry > Utc::now())
            .map(|(balances, _)| balances.clone()))
    }

    async fn save_group_balances(
        &self,
        group_id: Uuid,
        balances: &GroupBalances,
        ttl: Duration,
    ) -> Result<(), LedgerError> {
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| LedgerError::StorageUnavailable(format!("invalid cache TTL: {e}")))?;
        let mut entries = self.entries.write().await;
        entries.insert(group_id, (balances.clone(), Utc::now() + ttl));
        Ok(())
    }

    async fn invalidate_group(&self, group_id: Uuid) -> Result<(), LedgerError> {
        let mut entries = self.entries.write().await;
        entries.remove(&group_id);
        Ok(())
    }
}
