use askama::Template;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

use super::{query_params, ParticipantQuery, SharedState};
use crate::error::GameError;
use crate::game::history::{parse_participant_id, participant_history};
use crate::models::{MatchupConfig, Side, MAX_JERSEY_TOTAL};

// Custom filters for formatting
mod filters {
    use chrono::{DateTime, Utc};

    pub fn format_time(value: &DateTime<Utc>) -> ::askama::Result<String> {
        Ok(value.format("%b %-d, %-I:%M %p UTC").to_string())
    }
}

#[derive(Template)]
#[template(path = "home.html")]
struct HomeTemplate {
    active_page: String,
    matchup_id: String,
    configured: bool,
    home_team: String,
    away_team: String,
    spread_label: String,
    jersey_line: u32,
    kickoff: String,
    locked: bool,
    max_total: u32,
    participant_id: String,
    existing: Option<ExistingGuess>,
}

/// A participant's guess on the current matchup
struct ExistingGuess {
    pick: String,
    jersey_sum_guess: u32,
    created_at: DateTime<Utc>,
}

#[derive(Template)]
#[template(path = "admin.html")]
struct AdminTemplate {
    active_page: String,
    matchup_id: String,
    home_team: String,
    away_team: String,
    spread: String,
    jersey_line: String,
    kickoff: String,
    locked: bool,
}

struct PastGuessRow {
    label: String,
    pick: String,
    jersey_sum_guess: u32,
    created_at: DateTime<Utc>,
    live: bool,
}

#[derive(Template)]
#[template(path = "past_guesses.html")]
struct PastGuessesTemplate {
    active_page: String,
    participant_id: String,
    error: String,
    searched: bool,
    current_label: String,
    rows: Vec<PastGuessRow>,
}

struct HtmlTemplate<T>(T);

impl<T> IntoResponse for HtmlTemplate<T>
where
    T: Template,
{
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(html) => Html(html).into_response(),
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to render template: {}", err),
            )
                .into_response(),
        }
    }
}

pub async fn home(
    State(state): State<SharedState>,
    query: Result<Query<ParticipantQuery>, QueryRejection>,
) -> Result<Response, GameError> {
    let raw_id = query_params(query)?.participant_id.unwrap_or_default();

    let matchup = state.store.matchup(&state.current_matchup_id).await?;
    let locked = matchup.as_ref().map(|m| m.locked).unwrap_or(false);
    let config = matchup.and_then(|m| m.config);

    // An id that does not parse just shows the empty form
    let existing = match parse_participant_id(Some(&raw_id)) {
        Ok(participant_id) => participant_history(state.store.as_ref(), participant_id)
            .await?
            .into_iter()
            .find(|g| g.matchup_id == state.current_matchup_id)
            .map(|g| ExistingGuess {
                pick: pick_label(config.as_ref(), g.winner_pick),
                jersey_sum_guess: g.jersey_sum_guess,
                created_at: g.created_at,
            }),
        Err(_) => None,
    };

    let template = match config {
        Some(config) => HomeTemplate {
            active_page: "home".to_string(),
            matchup_id: state.current_matchup_id.clone(),
            configured: true,
            spread_label: config.spread_label(),
            jersey_line: config.jersey_sum_line,
            kickoff: config.kickoff.unwrap_or_default(),
            home_team: config.home_team,
            away_team: config.away_team,
            locked,
            max_total: MAX_JERSEY_TOTAL,
            participant_id: raw_id,
            existing,
        },
        None => HomeTemplate {
            active_page: "home".to_string(),
            matchup_id: state.current_matchup_id.clone(),
            configured: false,
            home_team: "Home team".to_string(),
            away_team: "Away team".to_string(),
            spread_label: String::new(),
            jersey_line: 0,
            kickoff: String::new(),
            locked,
            max_total: MAX_JERSEY_TOTAL,
            participant_id: raw_id,
            existing,
        },
    };

    Ok(HtmlTemplate(template).into_response())
}

/// Admin panel for the current matchup. Every action it offers goes through
/// the admin endpoints, which check the admin id themselves.
pub async fn admin_panel(State(state): State<SharedState>) -> Result<Response, GameError> {
    let matchup = state.store.matchup(&state.current_matchup_id).await?;
    let locked = matchup.as_ref().map(|m| m.locked).unwrap_or(false);

    let mut template = AdminTemplate {
        active_page: "admin".to_string(),
        matchup_id: state.current_matchup_id.clone(),
        home_team: String::new(),
        away_team: String::new(),
        spread: String::new(),
        jersey_line: String::new(),
        kickoff: String::new(),
        locked,
    };

    if let Some(config) = matchup.and_then(|m| m.config) {
        template.spread = config.spread.to_string();
        template.jersey_line = config.jersey_sum_line.to_string();
        template.kickoff = config.kickoff.unwrap_or_default();
        template.home_team = config.home_team;
        template.away_team = config.away_team;
    }

    Ok(HtmlTemplate(template).into_response())
}

fn pick_label(config: Option<&MatchupConfig>, side: Side) -> String {
    match (config, side) {
        (Some(config), side) => config.team(side).to_string(),
        (None, Side::Home) => "Home team".to_string(),
        (None, Side::Away) => "Away team".to_string(),
    }
}

pub async fn past_guesses(
    State(state): State<SharedState>,
    query: Result<Query<ParticipantQuery>, QueryRejection>,
) -> Result<Response, GameError> {
    let raw_id = query_params(query)?.participant_id.unwrap_or_default();

    let current_label = state
        .store
        .matchup(&state.current_matchup_id)
        .await?
        .and_then(|m| m.config)
        .map(|c| c.label())
        .unwrap_or_else(|| state.current_matchup_id.clone());

    let mut template = PastGuessesTemplate {
        active_page: "past_guesses".to_string(),
        participant_id: raw_id.clone(),
        error: String::new(),
        searched: !raw_id.is_empty(),
        current_label,
        rows: Vec::new(),
    };

    if raw_id.is_empty() {
        return Ok(HtmlTemplate(template).into_response());
    }

    let participant_id = match parse_participant_id(Some(&raw_id)) {
        Ok(id) => id,
        Err(_) => {
            template.error = "Enter a positive participant id.".to_string();
            return Ok(HtmlTemplate(template).into_response());
        }
    };

    let guesses = participant_history(state.store.as_ref(), participant_id).await?;

    // Label each past guess with the team names of its matchup
    let mut configs: HashMap<String, Option<MatchupConfig>> = HashMap::new();
    for guess in &guesses {
        if !configs.contains_key(&guess.matchup_id) {
            let config = state
                .store
                .matchup(&guess.matchup_id)
                .await?
                .and_then(|m| m.config);
            configs.insert(guess.matchup_id.clone(), config);
        }
    }

    template.rows = guesses
        .into_iter()
        .map(|guess| {
            let config = configs.get(&guess.matchup_id).and_then(|c| c.as_ref());
            PastGuessRow {
                label: config
                    .map(|c| c.label())
                    .unwrap_or_else(|| guess.matchup_id.clone()),
                pick: pick_label(config, guess.winner_pick),
                jersey_sum_guess: guess.jersey_sum_guess,
                created_at: guess.created_at,
                live: guess.matchup_id == state.current_matchup_id,
            }
        })
        .collect();

    Ok(HtmlTemplate(template).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::admin::AdminGate;
    use crate::models::NewGuess;
    use crate::store::{GameStore, MemoryStore};
    use crate::web::{router, AppState};
    use axum::{
        body::{to_bytes, Body},
        http::Request,
    };
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn page(store: Arc<MemoryStore>, uri: &str) -> (StatusCode, String) {
        let app = router(AppState::new(store, AdminGate::new(1), "week-1-phi-lac"));
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn eagles_chargers() -> MatchupConfig {
        MatchupConfig {
            home_team: "Los Angeles Chargers".to_string(),
            away_team: "Philadelphia Eagles".to_string(),
            spread: 2.5,
            jersey_sum_line: 178,
            kickoff: Some("Mon 8:15pm ET".to_string()),
        }
    }

    #[test]
    fn test_format_time() {
        let t = DateTime::parse_from_rfc3339("2025-09-09T00:15:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(filters::format_time(&t).unwrap(), "Sep 9, 12:15 AM UTC");
    }

    #[tokio::test]
    async fn test_home_shows_current_matchup() {
        let store = Arc::new(MemoryStore::new());
        store
            .set_matchup_config("week-1-phi-lac", &eagles_chargers())
            .await
            .unwrap();

        let (status, html) = page(store, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("Philadelphia Eagles -2.5"));
        assert!(html.contains("178"));
    }

    #[tokio::test]
    async fn test_home_without_matchup() {
        let (status, html) = page(Arc::new(MemoryStore::new()), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("not been set up"));
    }

    #[tokio::test]
    async fn test_past_guesses_are_labelled() {
        let store = Arc::new(MemoryStore::new());
        store
            .set_matchup_config("week-1-phi-lac", &eagles_chargers())
            .await
            .unwrap();
        let guess = NewGuess {
            matchup_id: "week-1-phi-lac".to_string(),
            participant_id: 31,
            jersey_sum_guess: 181,
            winner_pick: Side::Away,
        };
        store.insert_guess(&guess, Utc::now()).await.unwrap();
        let orphan = NewGuess {
            matchup_id: "week-0-old".to_string(),
            ..guess
        };
        store.insert_guess(&orphan, Utc::now()).await.unwrap();

        let (status, html) = page(store, "/past-guesses?participantId=31").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("Philadelphia Eagles @ Los Angeles Chargers"));
        assert!(html.contains("week-0-old"));
        assert!(html.contains("Away team"));
        assert!(html.contains("181"));
    }

    #[tokio::test]
    async fn test_home_shows_existing_guess() {
        let store = Arc::new(MemoryStore::new());
        store
            .set_matchup_config("week-1-phi-lac", &eagles_chargers())
            .await
            .unwrap();
        let guess = NewGuess {
            matchup_id: "week-1-phi-lac".to_string(),
            participant_id: 77,
            jersey_sum_guess: 183,
            winner_pick: Side::Home,
        };
        store.insert_guess(&guess, Utc::now()).await.unwrap();
        let elsewhere = NewGuess {
            matchup_id: "week-0-old".to_string(),
            participant_id: 78,
            ..guess
        };
        store.insert_guess(&elsewhere, Utc::now()).await.unwrap();

        let (status, html) = page(store.clone(), "/?participantId=77").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("Your guess is locked in"));
        assert!(html.contains("183"));
        assert!(!html.contains("id=\"guess-form\""));

        // A guess on another matchup leaves the form in place
        let (_, html) = page(store.clone(), "/?participantId=78").await;
        assert!(!html.contains("Your guess is locked in"));
        assert!(html.contains("id=\"guess-form\""));

        let (status, html) = page(store, "/?participantId=abc").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("id=\"guess-form\""));
    }

    #[tokio::test]
    async fn test_admin_panel_prefills_current_matchup() {
        let store = Arc::new(MemoryStore::new());
        store
            .set_matchup_config("week-1-phi-lac", &eagles_chargers())
            .await
            .unwrap();
        store.set_lock("week-1-phi-lac", true).await.unwrap();

        let (status, html) = page(store, "/admin").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("value=\"Los Angeles Chargers\""));
        assert!(html.contains("value=\"178\""));
        assert!(html.contains("value=\"2.5\""));
        assert!(html.contains("data-locked=\"true\""));
        assert!(html.contains("Unlock guesses"));
        assert!(html.contains("/static/admin.js"));
    }

    #[tokio::test]
    async fn test_admin_panel_without_matchup() {
        let (status, html) = page(Arc::new(MemoryStore::new()), "/admin").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("value=\"week-1-phi-lac\""));
        assert!(html.contains("data-locked=\"false\""));
        assert!(html.contains("Lock guesses"));
    }

    #[tokio::test]
    async fn test_past_guesses_bad_id() {
        let (status, html) = page(Arc::new(MemoryStore::new()), "/past-guesses?participantId=abc").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("Enter a positive participant id."));
    }
}
