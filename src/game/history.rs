use crate::error::GameError;
use crate::models::Guess;
use crate::store::GameStore;

/// Most guesses returned for one participant
pub const HISTORY_LIMIT: usize = 50;

/// Parse the `participantId` query parameter
pub fn parse_participant_id(raw: Option<&str>) -> Result<u64, GameError> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| GameError::invalid("participantId", "query param is required"))?;

    match raw.parse::<u64>() {
        Ok(id) if id > 0 && id <= i64::MAX as u64 => Ok(id),
        _ => Err(GameError::invalid(
            "participantId",
            "must be a positive integer",
        )),
    }
}

/// A participant's most recent guesses, newest first
pub async fn participant_history(
    store: &dyn GameStore,
    participant_id: u64,
) -> Result<Vec<Guess>, GameError> {
    if participant_id == 0 {
        return Err(GameError::invalid(
            "participantId",
            "must be a positive integer",
        ));
    }

    Ok(store
        .guesses_for_participant(participant_id, HISTORY_LIMIT)
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewGuess, Side};
    use crate::store::MemoryStore;
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn test_parse_participant_id() {
        assert_eq!(parse_participant_id(Some("1441046")).unwrap(), 1441046);
        assert!(parse_participant_id(None).is_err());
        assert!(parse_participant_id(Some("")).is_err());
        assert!(parse_participant_id(Some("0")).is_err());
        assert!(parse_participant_id(Some("-5")).is_err());
        assert!(parse_participant_id(Some("2.5")).is_err());
        assert!(parse_participant_id(Some("abc")).is_err());
    }

    #[tokio::test]
    async fn test_history_is_capped_and_newest_first() {
        let store = MemoryStore::new();
        let start = Utc.with_ymd_and_hms(2025, 9, 4, 0, 0, 0).unwrap();

        for week in 0..(HISTORY_LIMIT as i64 + 5) {
            let guess = NewGuess {
                matchup_id: format!("week-{}", week),
                participant_id: 77,
                jersey_sum_guess: 150,
                winner_pick: Side::Home,
            };
            store
                .insert_guess(&guess, start + Duration::days(7 * week))
                .await
                .unwrap();
        }

        let history = participant_history(&store, 77).await.unwrap();
        assert_eq!(history.len(), HISTORY_LIMIT);
        assert_eq!(history[0].matchup_id, format!("week-{}", HISTORY_LIMIT + 4));
        assert!(history
            .windows(2)
            .all(|pair| pair[0].created_at >= pair[1].created_at));
    }

    #[tokio::test]
    async fn test_history_for_unknown_participant_is_empty() {
        let store = MemoryStore::new();
        assert!(participant_history(&store, 5).await.unwrap().is_empty());
        assert!(matches!(
            participant_history(&store, 0).await,
            Err(GameError::Validation(_))
        ));
    }
}
