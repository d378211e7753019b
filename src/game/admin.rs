use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use super::{finite_number, flag, line, non_empty, optional_text, positive_id};
use crate::error::{GameError, ValidationErrors};
use crate::models::{Matchup, MatchupConfig};
use crate::store::GameStore;

/// The single identity allowed to run admin operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminGate {
    admin_id: u64,
}

impl AdminGate {
    pub fn new(admin_id: u64) -> Self {
        Self { admin_id }
    }

    pub fn authorize(&self, caller: u64) -> Result<(), GameError> {
        if caller == self.admin_id {
            Ok(())
        } else {
            Err(GameError::Unauthorized)
        }
    }
}

/// Body of `POST /admin/matchup` before validation
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchupRequest {
    #[serde(alias = "adminFid")]
    pub admin_id: Option<Value>,
    pub matchup_id: Option<Value>,
    pub home_team: Option<Value>,
    pub away_team: Option<Value>,
    pub spread: Option<Value>,
    pub jersey_sum_line: Option<Value>,
    pub kickoff: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SetMatchup {
    pub admin_id: u64,
    pub matchup_id: String,
    pub config: MatchupConfig,
}

impl MatchupRequest {
    pub fn validate(self) -> Result<SetMatchup, GameError> {
        let mut errors = ValidationErrors::new();

        let admin_id = positive_id(&mut errors, "adminId", self.admin_id);
        let matchup_id = non_empty(&mut errors, "matchupId", self.matchup_id);
        let home_team = non_empty(&mut errors, "homeTeam", self.home_team);
        let away_team = non_empty(&mut errors, "awayTeam", self.away_team);

        let spread = finite_number(&mut errors, "spread", self.spread);
        let jersey_sum_line = line(&mut errors, "jerseySumLine", self.jersey_sum_line);
        let kickoff = optional_text(&mut errors, "kickoff", self.kickoff);

        errors.finish(|| SetMatchup {
            admin_id,
            matchup_id,
            config: MatchupConfig {
                home_team,
                away_team,
                spread,
                jersey_sum_line,
                kickoff,
            },
        })
    }
}

/// Body of `POST /admin/lock` before validation
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockRequest {
    #[serde(alias = "adminFid")]
    pub admin_id: Option<Value>,
    pub matchup_id: Option<Value>,
    pub locked: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetLock {
    pub admin_id: u64,
    pub matchup_id: String,
    pub locked: bool,
}

impl LockRequest {
    pub fn validate(self) -> Result<SetLock, GameError> {
        let mut errors = ValidationErrors::new();

        let admin_id = positive_id(&mut errors, "adminId", self.admin_id);
        let matchup_id = non_empty(&mut errors, "matchupId", self.matchup_id);
        let locked = flag(&mut errors, "locked", self.locked);

        errors.finish(|| SetLock {
            admin_id,
            matchup_id,
            locked,
        })
    }
}

/// Echo of a saved matchup configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedMatchup {
    pub matchup_id: String,
    #[serde(flatten)]
    pub config: MatchupConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LockState {
    pub matchup_id: String,
    pub locked: bool,
}

pub async fn set_matchup(
    store: &dyn GameStore,
    gate: &AdminGate,
    cmd: SetMatchup,
) -> Result<SavedMatchup, GameError> {
    if let Err(e) = gate.authorize(cmd.admin_id) {
        warn!("Rejected matchup update for {}", cmd.matchup_id);
        return Err(e);
    }

    store.set_matchup_config(&cmd.matchup_id, &cmd.config).await?;
    info!(
        "Saved matchup {}: {} (line {})",
        cmd.matchup_id,
        cmd.config.label(),
        cmd.config.jersey_sum_line
    );

    Ok(SavedMatchup {
        matchup_id: cmd.matchup_id,
        config: cmd.config,
    })
}

pub async fn set_lock(
    store: &dyn GameStore,
    gate: &AdminGate,
    cmd: SetLock,
) -> Result<LockState, GameError> {
    if let Err(e) = gate.authorize(cmd.admin_id) {
        warn!("Rejected lock update for {}", cmd.matchup_id);
        return Err(e);
    }

    store.set_lock(&cmd.matchup_id, cmd.locked).await?;
    info!("Matchup {} locked = {}", cmd.matchup_id, cmd.locked);

    Ok(LockState {
        matchup_id: cmd.matchup_id,
        locked: cmd.locked,
    })
}

/// Lock flag of a matchup. Unknown matchups read as unlocked.
pub async fn lock_state(store: &dyn GameStore, matchup_id: &str) -> Result<LockState, GameError> {
    if matchup_id.trim().is_empty() {
        return Err(GameError::invalid("matchupId", "query param is required"));
    }

    let locked = store
        .matchup(matchup_id)
        .await?
        .map(|m| m.locked)
        .unwrap_or(false);

    Ok(LockState {
        matchup_id: matchup_id.to_string(),
        locked,
    })
}

pub async fn get_matchup(store: &dyn GameStore, matchup_id: &str) -> Result<Matchup, GameError> {
    if matchup_id.trim().is_empty() {
        return Err(GameError::invalid("matchupId", "query param is required"));
    }

    store
        .matchup(matchup_id)
        .await?
        .ok_or_else(|| GameError::MatchupNotFound(matchup_id.to_string()))
}
