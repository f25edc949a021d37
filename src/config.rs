use dotenv::dotenv;
use once_cell::sync::Lazy;
use std::env;

#[derive(Debug)]
pub struct EngineConfig {
    /// Upper bound on participants in a single split
    pub max_participants: usize,
    /// Upper bound on expense description length
    pub max_description_len: usize,
    /// Allowed deviation of percentage splits from 100.0
    pub percent_tolerance: f64,
    /// TTL for cached group balances, in seconds
    pub balance_cache_ttl_secs: u64,
}

impl EngineConfig {
    fn from_env() -> Self {
        dotenv().ok();

        Self {
            max_participants: env::var("SPLIT_MAX_PARTICIPANTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(100),
            max_description_len: env::var("EXPENSE_MAX_DESCRIPTION_LEN")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(255),
            percent_tolerance: env::var("SPLIT_PERCENT_TOLERANCE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0.01),
            balance_cache_ttl_secs: env::var("BALANCE_CACHE_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
        }
    }
}

// Global static accessible everywhere
pub static CONFIG: Lazy<EngineConfig> = Lazy::new(EngineConfig::from_env);
