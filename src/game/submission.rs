use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use super::{jersey_total, non_empty, positive_id, side};
use crate::error::{GameError, ValidationErrors};
use crate::models::{Guess, NewGuess};
use crate::store::GameStore;

/// Body of `POST /guesses` before validation
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuessRequest {
    pub matchup_id: Option<Value>,
    #[serde(alias = "fid")]
    pub participant_id: Option<Value>,
    pub jersey_sum_guess: Option<Value>,
    pub winner_pick: Option<Value>,
}

impl GuessRequest {
    pub fn validate(self) -> Result<NewGuess, GameError> {
        let mut errors = ValidationErrors::new();

        let matchup_id = non_empty(&mut errors, "matchupId", self.matchup_id);
        let participant_id = positive_id(&mut errors, "participantId", self.participant_id);
        let jersey_sum_guess = jersey_total(&mut errors, "jerseySumGuess", self.jersey_sum_guess);
        let winner_pick = side(&mut errors, "winnerPick", self.winner_pick);

        errors.finish(|| NewGuess {
            matchup_id,
            participant_id,
            jersey_sum_guess,
            winner_pick,
        })
    }
}

/// Record a guess unless the matchup is locked or the participant already
/// guessed on it. The lock is checked first, so a locked matchup reports
/// `Locked` even for a repeat submission.
pub async fn submit_guess(store: &dyn GameStore, guess: NewGuess) -> Result<Guess, GameError> {
    if let Some(matchup) = store.matchup(&guess.matchup_id).await? {
        if matchup.locked {
            info!(
                "Rejected guess from {} on locked matchup {}",
                guess.participant_id, guess.matchup_id
            );
            return Err(GameError::Locked);
        }
    }

    let stored = store.insert_guess(&guess, Utc::now()).await?;

    info!(
        "Participant {} guessed {} ({}) on {}",
        stored.participant_id, stored.jersey_sum_guess, stored.winner_pick, stored.matchup_id
    );

    Ok(stored)
}
