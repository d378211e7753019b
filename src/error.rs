use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use tracing::error;

use crate::store::StoreError;

/// Per-field validation messages, serialized the way the front end reads them:
/// `{ "fieldErrors": { "jerseySumGuess": ["..."] } }`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationErrors {
    field_errors: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.field_errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.field_errors.is_empty()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.field_errors.contains_key(field)
    }

    /// Hand back `value` when nothing was recorded
    pub fn finish<T>(self, value: impl FnOnce() -> T) -> Result<T, GameError> {
        if self.is_empty() {
            Ok(value())
        } else {
            Err(GameError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.field_errors {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{}: {}", field, message)?;
                first = false;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum GameError {
    #[error("Invalid request body: {0}")]
    Validation(ValidationErrors),

    #[error("Invalid request body: {0}")]
    MalformedBody(String),

    #[error("Invalid query string: {0}")]
    MalformedQuery(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Guesses are locked for this matchup.")]
    Locked,

    #[error("You already submitted a guess for this matchup.")]
    Duplicate,

    #[error("No guesses found for this matchup.")]
    NoGuesses,

    #[error("No guesses on the correct side.")]
    NoEligibleGuesses,

    #[error("Matchup {0} not found.")]
    MatchupNotFound(String),

    #[error("Internal error: {0:#}")]
    Internal(anyhow::Error),
}

impl GameError {
    /// Shorthand for a single-field validation failure
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        let mut errors = ValidationErrors::new();
        errors.add(field, message);
        GameError::Validation(errors)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            GameError::Validation(_)
            | GameError::MalformedBody(_)
            | GameError::MalformedQuery(_) => StatusCode::BAD_REQUEST,
            GameError::Unauthorized | GameError::Locked => StatusCode::FORBIDDEN,
            GameError::Duplicate => StatusCode::CONFLICT,
            GameError::NoGuesses
            | GameError::NoEligibleGuesses
            | GameError::MatchupNotFound(_) => StatusCode::NOT_FOUND,
            GameError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for GameError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateGuess => GameError::Duplicate,
            StoreError::Backend(e) => GameError::Internal(e),
        }
    }
}

impl IntoResponse for GameError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match &self {
            GameError::Validation(details) => json!({
                "error": "Invalid request body",
                "details": details,
            }),
            GameError::Internal(e) => {
                error!("Storage failure: {:#}", e);
                json!({ "error": "Internal server error" })
            }
            other => json!({ "error": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}
