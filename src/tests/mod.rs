
use uuid::Uuid;

use crate::auth::InMemoryGroupDirectory;
use crate::cache::in_memory::InMemoryBalanceCache;
use crate::money::{Currency, Money};
use crate::service::ExpenseService;
use crate::storage::in_memory::InMemoryLedgerStore;

pub type TestService =
    ExpenseService<InMemoryLedgerStore, InMemoryGroupDirectory, InMemoryBalanceCache>;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_test_writer()
        .try_init();
}

pub fn test_service() -> (TestService, InMemoryGroupDirectory) {
    init_tracing();
    let directory = InMemoryGroupDirectory::new();
    let service = ExpenseService::new(
        InMemoryLedgerStore::new(),
        directory.clone(),
        InMemoryBalanceCache::new(),
    );
    (service, directory)
}

/// Registers a group whose owner is user(1) and whose members are users
/// 2..=n, all with deterministic ids so ordering-sensitive assertions hold.
pub async fn group_of(directory: &InMemoryGroupDirectory, n: u128) -> (Uuid, Vec<Uuid>) {
    let group_id = Uuid::from_u128(1000);
    let users: Vec<Uuid> = (1..=n).map(Uuid::from_u128).collect();
    directory.add_group(group_id, users[0]).await;
    for &user in &users[1..] {
        directory.add_member(group_id, user).await;
    }
    (group_id, users)
}

pub fn usd(minor: i64) -> Money {
    Money::new(minor, Currency::USD)
}
