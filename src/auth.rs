//! Authorization collaborator boundary.
//!
//! Group membership lives outside the engine; the engine consults this trait
//! before every mutating operation and trusts the answers rather than
//! re-deriving membership from history.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::LedgerError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Owner,
    Member,
}

#[async_trait]
pub trait GroupDirectory: Send + Sync {
    async fn is_group_member(&self, group_id: Uuid, user_id: Uuid) -> Result<bool, LedgerError>;
    async fn is_group_owner(&self, group_id: Uuid, user_id: Uuid) -> Result<bool, LedgerError>;
}

/// In-memory directory for tests and reference wiring.
#[derive(Clone, Default)]
pub struct InMemoryGroupDirectory {
    groups: Arc<RwLock<HashMap<Uuid, HashMap<Uuid, Role>>>>,
}

impl InMemoryGroupDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_group(&self, group_id: Uuid, owner_id: Uuid) {
        let mut groups = self.groups.write().await;
        groups
            .entry(group_id)
            .or_default()
            .insert(owner_id, Role::Owner);
    }

    pub async fn add_member(&self, group_id: Uuid, user_id: Uuid) {
        let mut groups = self.groups.write().await;
        groups
            .entry(group_id)
            .or_default()
            .insert(user_id, Role::Member);
    }
}

#[async_trait]
impl GroupDirectory for InMemoryGroupDirectory {
    async fn is_group_member(&self, group_id: Uuid, user_id: Uuid) -> Result<bool, LedgerError> {
        let groups = self.groups.read().await;
        let members = groups
            .get(&group_id)
            .ok_or(LedgerError::GroupNotFound(group_id))?;
        Ok(members.contains_key(&user_id))
    }

    async fn is_group_owner(&self, group_id: Uuid, user_id: Uuid) -> Result<bool, LedgerError> {
        let groups = self.groups.read().await;
        let members = groups
            .get(&group_id)
            .ok_or(LedgerError::GroupNotFound(group_id))?;
        Ok(members.get(&user_id) == Some(&Role::Owner))
    }
}
