use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use super::admin::AdminGate;
use super::{jersey_total, non_empty, positive_id, side};
use crate::error::{GameError, ValidationErrors};
use crate::models::{Guess, Settlement, Side, Winner};
use crate::store::GameStore;

/// Body of `POST /admin/settle` before validation
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettleRequest {
    #[serde(alias = "adminFid")]
    pub admin_id: Option<Value>,
    pub matchup_id: Option<Value>,
    pub correct_winner: Option<Value>,
    pub correct_jersey_total: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettleMatchup {
    pub admin_id: u64,
    pub matchup_id: String,
    pub correct_winner: Side,
    pub correct_jersey_total: u32,
}

impl SettleRequest {
    pub fn validate(self) -> Result<SettleMatchup, GameError> {
        let mut errors = ValidationErrors::new();

        let admin_id = positive_id(&mut errors, "adminId", self.admin_id);
        let matchup_id = non_empty(&mut errors, "matchupId", self.matchup_id);
        let correct_winner = side(&mut errors, "correctWinner", self.correct_winner);
        let correct_jersey_total =
            jersey_total(&mut errors, "correctJerseyTotal", self.correct_jersey_total);

        errors.finish(|| SettleMatchup {
            admin_id,
            matchup_id,
            correct_winner,
            correct_jersey_total,
        })
    }
}

/// Pick the winning guess.
///
/// `guesses` must be every guess for the matchup, oldest first. Only guesses
/// on `correct_winner` are eligible; among those the smallest distance to
/// `correct_total` wins and an equal distance never displaces an earlier
/// submission.
pub fn pick_winner(
    matchup_id: &str,
    guesses: &[Guess],
    correct_winner: Side,
    correct_total: u32,
) -> Result<Settlement, GameError> {
    if guesses.is_empty() {
        return Err(GameError::NoGuesses);
    }

    let eligible: Vec<&Guess> = guesses
        .iter()
        .filter(|g| g.winner_pick == correct_winner)
        .collect();

    // min_by_key keeps the first of equal keys
    let best = eligible
        .iter()
        .copied()
        .min_by_key(|g| g.jersey_sum_guess.abs_diff(correct_total))
        .ok_or(GameError::NoEligibleGuesses)?;

    Ok(Settlement {
        matchup_id: matchup_id.to_string(),
        correct_winner,
        correct_jersey_total: correct_total,
        total_guesses: guesses.len(),
        eligible_guesses: eligible.len(),
        winner: Winner {
            participant_id: best.participant_id,
            jersey_sum_guess: best.jersey_sum_guess,
            winner_pick: best.winner_pick,
            created_at: best.created_at,
            diff: best.jersey_sum_guess.abs_diff(correct_total),
        },
    })
}

/// Settle a matchup against its real outcome. Read-only; the result is
/// returned, not stored.
pub async fn settle(
    store: &dyn GameStore,
    gate: &AdminGate,
    cmd: SettleMatchup,
) -> Result<Settlement, GameError> {
    if let Err(e) = gate.authorize(cmd.admin_id) {
        warn!("Rejected settlement request for {}", cmd.matchup_id);
        return Err(e);
    }

    let guesses = store.guesses_for_matchup(&cmd.matchup_id).await?;
    let settlement = pick_winner(
        &cmd.matchup_id,
        &guesses,
        cmd.correct_winner,
        cmd.correct_jersey_total,
    )?;

    info!(
        "Settled {}: participant {} wins with {} (diff {}, {} of {} eligible)",
        settlement.matchup_id,
        settlement.winner.participant_id,
        settlement.winner.jersey_sum_guess,
        settlement.winner.diff,
        settlement.eligible_guesses,
        settlement.total_guesses
    );

    Ok(settlement)
}
