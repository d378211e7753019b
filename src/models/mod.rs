use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Highest jersey-number total a guess or a settlement may carry
pub const MAX_JERSEY_TOTAL: u32 = 9999;

/// Which team a participant expects to win
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Home,
    Away,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Home => "home",
            Side::Away => "away",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("expected \"home\" or \"away\", got {0:?}")]
pub struct ParseSideError(pub String);

impl FromStr for Side {
    type Err = ParseSideError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "home" => Ok(Side::Home),
            "away" => Ok(Side::Away),
            other => Err(ParseSideError(other.to_string())),
        }
    }
}

/// Admin-editable parameters of a matchup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchupConfig {
    pub home_team: String,
    pub away_team: String,
    pub spread: f64, // home relative to away, negative = home favored
    pub jersey_sum_line: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kickoff: Option<String>, // display only
}

impl MatchupConfig {
    /// "Away @ Home" label used when listing guesses
    pub fn label(&self) -> String {
        format!("{} @ {}", self.away_team, self.home_team)
    }

    /// Favorite and points, e.g. "Philadelphia Eagles -2.5", or "Pick'em"
    /// when neither side is favored
    pub fn spread_label(&self) -> String {
        if self.spread == 0.0 {
            return "Pick'em".to_string();
        }
        let favorite = if self.spread < 0.0 {
            &self.home_team
        } else {
            &self.away_team
        };
        format!("{} -{}", favorite, self.spread.abs())
    }

    pub fn team(&self, side: Side) -> &str {
        match side {
            Side::Home => &self.home_team,
            Side::Away => &self.away_team,
        }
    }
}

/// A matchup as stored. `config` stays empty when the matchup was only
/// ever touched by a lock update.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Matchup {
    #[serde(rename = "matchupId")]
    pub id: String,
    #[serde(flatten)]
    pub config: Option<MatchupConfig>,
    pub locked: bool,
}

impl Matchup {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            config: None,
            locked: false,
        }
    }
}

/// A validated guess that has not been stored yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGuess {
    pub matchup_id: String,
    pub participant_id: u64,
    pub jersey_sum_guess: u32,
    pub winner_pick: Side,
}

/// A stored guess
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Guess {
    pub id: String,
    pub matchup_id: String,
    pub participant_id: u64,
    pub jersey_sum_guess: u32,
    pub winner_pick: Side,
    pub created_at: DateTime<Utc>,
}

/// The guess that won a settlement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Winner {
    pub participant_id: u64,
    pub jersey_sum_guess: u32,
    pub winner_pick: Side,
    pub created_at: DateTime<Utc>,
    pub diff: u32,
}

/// Outcome of settling a matchup. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settlement {
    pub matchup_id: String,
    pub correct_winner: Side,
    pub correct_jersey_total: u32,
    pub total_guesses: usize,
    pub eligible_guesses: usize,
    pub winner: Winner,
}

impl Settlement {
    pub fn format(&self) -> String {
        format!(
            "{} | Result: {} / {} | Winner: {} guessed {} ({}) at {} | Diff: {} | Eligible: {}/{}",
            self.matchup_id,
            self.correct_winner,
            self.correct_jersey_total,
            self.winner.participant_id,
            self.winner.jersey_sum_guess,
            self.winner.winner_pick,
            self.winner.created_at.to_rfc3339(),
            self.winner.diff,
            self.eligible_guesses,
            self.total_guesses
        )
    }
}
