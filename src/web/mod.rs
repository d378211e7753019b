pub mod pages;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::error::GameError;
use crate::game::admin::{self, AdminGate, LockRequest, LockState, MatchupRequest, SavedMatchup};
use crate::game::history::{parse_participant_id, participant_history};
use crate::game::settlement::{settle, SettleRequest};
use crate::game::submission::{submit_guess, GuessRequest};
use crate::models::{Guess, Matchup, Settlement};
use crate::store::GameStore;

/// Everything a handler needs, shared across requests
pub struct AppState {
    pub store: Arc<dyn GameStore>,
    pub admin: AdminGate,
    pub current_matchup_id: String,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(
        store: Arc<dyn GameStore>,
        admin: AdminGate,
        current_matchup_id: impl Into<String>,
    ) -> SharedState {
        Arc::new(Self {
            store,
            admin,
            current_matchup_id: current_matchup_id.into(),
        })
    }
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .nest_service("/static", ServeDir::new("static"))
        .route("/", get(pages::home))
        .route("/past-guesses", get(pages::past_guesses))
        .route("/admin", get(pages::admin_panel))
        .route("/guesses", get(list_guesses).post(create_guess))
        .route("/matchup", get(read_matchup))
        .route("/admin/matchup", post(save_matchup))
        .route("/admin/lock", get(read_lock).post(save_lock))
        .route("/admin/settle", post(settle_matchup))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, GameError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| GameError::MalformedBody(rejection.body_text()))
}

fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, GameError> {
    query
        .map(|Query(value)| value)
        .map_err(|rejection| GameError::MalformedQuery(rejection.body_text()))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantQuery {
    #[serde(alias = "fid")]
    pub participant_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchupQuery {
    pub matchup_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GuessList {
    pub guesses: Vec<Guess>,
}

async fn list_guesses(
    State(state): State<SharedState>,
    query: Result<Query<ParticipantQuery>, QueryRejection>,
) -> Result<Json<GuessList>, GameError> {
    let query = query_params(query)?;
    let participant_id = parse_participant_id(query.participant_id.as_deref())?;
    let guesses = participant_history(state.store.as_ref(), participant_id).await?;
    Ok(Json(GuessList { guesses }))
}

async fn create_guess(
    State(state): State<SharedState>,
    payload: Result<Json<GuessRequest>, JsonRejection>,
) -> Result<impl IntoResponse, GameError> {
    let guess = json_body(payload)?.validate()?;
    submit_guess(state.store.as_ref(), guess).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "ok": true, "message": "Guess submitted!" })),
    ))
}

async fn read_matchup(
    State(state): State<SharedState>,
    query: Result<Query<MatchupQuery>, QueryRejection>,
) -> Result<Json<Matchup>, GameError> {
    let query = query_params(query)?;
    let matchup_id = query.matchup_id.unwrap_or_default();
    let matchup = admin::get_matchup(state.store.as_ref(), &matchup_id).await?;
    Ok(Json(matchup))
}

async fn save_matchup(
    State(state): State<SharedState>,
    payload: Result<Json<MatchupRequest>, JsonRejection>,
) -> Result<Json<SavedMatchup>, GameError> {
    let cmd = json_body(payload)?.validate()?;
    let saved = admin::set_matchup(state.store.as_ref(), &state.admin, cmd).await?;
    Ok(Json(saved))
}

async fn read_lock(
    State(state): State<SharedState>,
    query: Result<Query<MatchupQuery>, QueryRejection>,
) -> Result<Json<LockState>, GameError> {
    let query = query_params(query)?;
    let matchup_id = query.matchup_id.unwrap_or_default();
    let lock = admin::lock_state(state.store.as_ref(), &matchup_id).await?;
    Ok(Json(lock))
}

async fn save_lock(
    State(state): State<SharedState>,
    payload: Result<Json<LockRequest>, JsonRejection>,
) -> Result<Json<LockState>, GameError> {
    let cmd = json_body(payload)?.validate()?;
    let lock = admin::set_lock(state.store.as_ref(), &state.admin, cmd).await?;
    Ok(Json(lock))
}

async fn settle_matchup(
    State(state): State<SharedState>,
    payload: Result<Json<SettleRequest>, JsonRejection>,
) -> Result<Json<Settlement>, GameError> {
    let cmd = json_body(payload)?.validate()?;
    let settlement = settle(state.store.as_ref(), &state.admin, cmd).await?;
    Ok(Json(settlement))
}
