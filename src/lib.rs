pub mod auth;
pub mod balance;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod money;
pub mod report;
pub mod service;
pub mod settle;
pub mod split;
pub mod storage;

pub use auth::{GroupDirectory, InMemoryGroupDirectory};
pub use cache::in_memory::InMemoryBalanceCache;
pub use error::LedgerError;
pub use money::{Currency, Money};
pub use service::{ExpenseService, Page};
pub use split::SplitSpec;
pub use storage::in_memory::InMemoryLedgerStore;
pub use storage::LedgerStore;

#[cfg(test)]
mod tests;
