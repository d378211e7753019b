//! Persistence for matchups and guesses.
//!
//! Two collections back the game:
//!
//! - `matchups`, one document per matchup id. Configuration and the lock
//!   flag are written by separate field-level upserts so neither clobbers
//!   the other.
//! - `guesses`, one document per (matchup, participant). The pair is unique
//!   at the storage layer; a second insert for the same pair fails with
//!   [`StoreError::DuplicateGuess`] instead of racing a read-before-write.
//!
//! [`MongoStore`] is the production backend. [`MemoryStore`] keeps the same
//! guarantees in process and is what the tests and local runs use.

pub mod memory;
pub mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{Guess, Matchup, MatchupConfig, NewGuess};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("a guess already exists for this participant and matchup")]
    DuplicateGuess,

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

#[async_trait]
pub trait GameStore: Send + Sync {
    async fn matchup(&self, matchup_id: &str) -> Result<Option<Matchup>, StoreError>;

    /// Upsert the configuration fields, leaving `locked` untouched
    async fn set_matchup_config(
        &self,
        matchup_id: &str,
        config: &MatchupConfig,
    ) -> Result<(), StoreError>;

    /// Upsert the lock flag, leaving the configuration untouched
    async fn set_lock(&self, matchup_id: &str, locked: bool) -> Result<(), StoreError>;

    async fn insert_guess(
        &self,
        guess: &NewGuess,
        created_at: DateTime<Utc>,
    ) -> Result<Guess, StoreError>;

    /// Every guess for a matchup, oldest first. Equal timestamps keep
    /// insertion order.
    async fn guesses_for_matchup(&self, matchup_id: &str) -> Result<Vec<Guess>, StoreError>;

    /// A participant's guesses across matchups, newest first
    async fn guesses_for_participant(
        &self,
        participant_id: u64,
        limit: usize,
    ) -> Result<Vec<Guess>, StoreError>;
}
