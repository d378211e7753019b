use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{GameStore, StoreError};
use crate::models::{Guess, Matchup, MatchupConfig, NewGuess};

#[derive(Default)]
struct Collections {
    matchups: HashMap<String, Matchup>,
    guesses: Vec<Guess>, // insertion order
    next_guess_id: u64,
}

/// In-process store. The write lock makes the duplicate check and the insert
/// one atomic step.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GameStore for MemoryStore {
    async fn matchup(&self, matchup_id: &str) -> Result<Option<Matchup>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.matchups.get(matchup_id).cloned())
    }

    async fn set_matchup_config(
        &self,
        matchup_id: &str,
        config: &MatchupConfig,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner
            .matchups
            .entry(matchup_id.to_string())
            .or_insert_with(|| Matchup::new(matchup_id))
            .config = Some(config.clone());
        Ok(())
    }

    async fn set_lock(&self, matchup_id: &str, locked: bool) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner
            .matchups
            .entry(matchup_id.to_string())
            .or_insert_with(|| Matchup::new(matchup_id))
            .locked = locked;
        Ok(())
    }

    async fn insert_guess(
        &self,
        guess: &NewGuess,
        created_at: DateTime<Utc>,
    ) -> Result<Guess, StoreError> {
        let mut inner = self.inner.write().await;

        let taken = inner.guesses.iter().any(|g| {
            g.matchup_id == guess.matchup_id && g.participant_id == guess.participant_id
        });
        if taken {
            return Err(StoreError::DuplicateGuess);
        }

        inner.next_guess_id += 1;
        let stored = Guess {
            id: inner.next_guess_id.to_string(),
            matchup_id: guess.matchup_id.clone(),
            participant_id: guess.participant_id,
            jersey_sum_guess: guess.jersey_sum_guess,
            winner_pick: guess.winner_pick,
            created_at,
        };
        inner.guesses.push(stored.clone());

        Ok(stored)
    }

    async fn guesses_for_matchup(&self, matchup_id: &str) -> Result<Vec<Guess>, StoreError> {
        let inner = self.inner.read().await;
        let mut guesses: Vec<Guess> = inner
            .guesses
            .iter()
            .filter(|g| g.matchup_id == matchup_id)
            .cloned()
            .collect();

        // Stable, so equal timestamps stay in insertion order
        guesses.sort_by_key(|g| g.created_at);
        Ok(guesses)
    }

    async fn guesses_for_participant(
        &self,
        participant_id: u64,
        limit: usize,
    ) -> Result<Vec<Guess>, StoreError> {
        let inner = self.inner.read().await;
        let mut guesses: Vec<Guess> = inner
            .guesses
            .iter()
            .filter(|g| g.participant_id == participant_id)
            .cloned()
            .collect();

        guesses.sort_by_key(|g| g.created_at);
        guesses.reverse();
        guesses.truncate(limit);
        Ok(guesses)
    }
}
