pub mod config;
pub mod error;
pub mod game;
pub mod models;
pub mod store;
pub mod web;

pub use config::Config;
pub use error::{GameError, ValidationErrors};
pub use models::*;
pub use store::{GameStore, MemoryStore, MongoStore, StoreError};

use anyhow::Result;
use std::sync::Arc;
use tracing::warn;

/// Open the store named by the configuration: MongoDB when a connection
/// string is set, otherwise a fresh in-memory store.
pub async fn open_store(config: &Config) -> Result<Arc<dyn GameStore>> {
    match &config.mongodb_uri {
        Some(uri) => {
            let store = MongoStore::connect(uri, &config.mongodb_db).await?;
            Ok(Arc::new(store))
        }
        None => {
            warn!("MONGODB_URI is not set, guesses will only be kept in memory");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
