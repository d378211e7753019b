use anyhow::{Context, Result};
use std::{env, fmt::Display, str::FromStr};
use tracing::info;

pub const DEFAULT_DB_NAME: &str = "mash-fun-jersey-number-free-play";
pub const DEFAULT_ADMIN_ID: &str = "1441046";
pub const DEFAULT_MATCHUP_ID: &str = "week-1-phi-lac";
pub const DEFAULT_PORT: &str = "3000";

#[derive(Debug, Clone)]
pub struct Config {
    /// Without a connection string the server falls back to the in-memory store
    pub mongodb_uri: Option<String>,
    pub mongodb_db: String,
    pub admin_id: u64,
    pub current_matchup_id: String,
    pub port: u16,
}

impl Config {
    /// Read configuration from the environment (after `.env` is loaded)
    pub fn from_env() -> Result<Self> {
        let admin_id: u64 = try_load("ADMIN_ID", DEFAULT_ADMIN_ID)?;
        anyhow::ensure!(admin_id > 0, "ADMIN_ID must be a positive integer");

        Ok(Self {
            mongodb_uri: env::var("MONGODB_URI").ok().filter(|uri| !uri.is_empty()),
            mongodb_db: try_load("MONGODB_DB", DEFAULT_DB_NAME)?,
            admin_id,
            current_matchup_id: try_load("CURRENT_MATCHUP_ID", DEFAULT_MATCHUP_ID)?,
            port: try_load("PORT", DEFAULT_PORT)?,
        })
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.parse::<T>()
        .map_err(|e| anyhow::anyhow!("{e}"))
        .with_context(|| format!("Invalid {key} value: {raw:?}"))
}
