use anyhow::Context;
use serde::Deserialize;

use crate::users::password::{DEFAULT_HASH_COST, MAX_HASH_COST, MIN_HASH_COST};

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub password_hash_cost: u32,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = get("DATABASE_URL").context("DATABASE_URL is not set")?;
        let max_connections = get("DB_MAX_CONNECTIONS")
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);
        let password_hash_cost = get("PASSWORD_HASH_COST")
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(DEFAULT_HASH_COST);
        if !(MIN_HASH_COST..=MAX_HASH_COST).contains(&password_hash_cost) {
            anyhow::bail!(
                "PASSWORD_HASH_COST must be between {} and {}",
                MIN_HASH_COST,
                MAX_HASH_COST
            );
        }
        Ok(Self {
            database_url,
            max_connections,
            password_hash_cost,
        })
    }
}
