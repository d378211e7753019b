use anyhow::{anyhow, Context};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::{
    bson::{doc, oid::ObjectId, Document},
    error::{ErrorKind, WriteError, WriteFailure},
    options::IndexOptions,
    Client, Collection, Database, IndexModel,
};
use serde::{Deserialize, Serialize};
use tokio_stream::StreamExt;
use tracing::info;

use super::{GameStore, StoreError};
use crate::models::{Guess, Matchup, MatchupConfig, NewGuess, Side};

pub const MATCHUPS: &str = "matchups";
pub const GUESSES: &str = "guesses";

const DUPLICATE_KEY: i32 = 11000;

/// Matchup as laid out in MongoDB. Every configuration field is optional
/// because a lock update can create the document on its own.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MatchupDocument {
    matchup_id: String,
    home_team: Option<String>,
    away_team: Option<String>,
    spread: Option<f64>,
    jersey_sum_line: Option<i64>,
    kickoff: Option<String>,
    #[serde(default)]
    locked: bool,
}

impl TryFrom<MatchupDocument> for Matchup {
    type Error = anyhow::Error;

    fn try_from(doc: MatchupDocument) -> Result<Self, Self::Error> {
        let config = match (doc.home_team, doc.away_team, doc.spread, doc.jersey_sum_line) {
            (Some(home_team), Some(away_team), Some(spread), Some(line)) => Some(MatchupConfig {
                home_team,
                away_team,
                spread,
                jersey_sum_line: u32::try_from(line).with_context(|| {
                    format!(
                        "Stored jerseySumLine {} for {} is out of range",
                        line, doc.matchup_id
                    )
                })?,
                kickoff: doc.kickoff,
            }),
            _ => None,
        };

        Ok(Matchup {
            id: doc.matchup_id,
            config,
            locked: doc.locked,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GuessDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    matchup_id: String,
    participant_id: i64,
    jersey_sum_guess: i64,
    winner_pick: Side,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    created_at: DateTime<Utc>,
}

impl TryFrom<GuessDocument> for Guess {
    type Error = anyhow::Error;

    fn try_from(doc: GuessDocument) -> Result<Self, Self::Error> {
        Ok(Guess {
            id: doc.id.map(|oid| oid.to_hex()).unwrap_or_default(),
            participant_id: u64::try_from(doc.participant_id)
                .with_context(|| format!("Stored participantId {} is negative", doc.participant_id))?,
            jersey_sum_guess: u32::try_from(doc.jersey_sum_guess).with_context(|| {
                format!("Stored jerseySumGuess {} is out of range", doc.jersey_sum_guess)
            })?,
            matchup_id: doc.matchup_id,
            winner_pick: doc.winner_pick,
            created_at: doc.created_at,
        })
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(WriteError {
            code: DUPLICATE_KEY,
            ..
        }))
    )
}

pub struct MongoStore {
    matchups: Collection<MatchupDocument>,
    guesses: Collection<GuessDocument>,
}

impl MongoStore {
    /// Connect and make sure the unique indexes exist
    pub async fn connect(uri: &str, db_name: &str) -> anyhow::Result<Self> {
        let client = Client::with_uri_str(uri)
            .await
            .context("Failed to create MongoDB client")?;
        let store = Self::from_database(&client.database(db_name));
        store.ensure_indexes().await?;

        info!("Connected to MongoDB database {}", db_name);
        Ok(store)
    }

    pub fn from_database(db: &Database) -> Self {
        Self {
            matchups: db.collection(MATCHUPS),
            guesses: db.collection(GUESSES),
        }
    }

    async fn ensure_indexes(&self) -> anyhow::Result<()> {
        let unique = || IndexOptions::builder().unique(true).build();

        self.matchups
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "matchupId": 1 })
                    .options(unique())
                    .build(),
            )
            .await
            .context("Failed to create matchups index")?;

        self.guesses
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "matchupId": 1, "participantId": 1 })
                    .options(unique())
                    .build(),
            )
            .await
            .context("Failed to create guesses unique index")?;

        self.guesses
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "participantId": 1, "createdAt": -1 })
                    .build(),
            )
            .await
            .context("Failed to create guesses history index")?;

        Ok(())
    }

    async fn find_guesses(
        &self,
        filter: Document,
        sort: Document,
        limit: Option<i64>,
    ) -> Result<Vec<Guess>, StoreError> {
        let mut find = self.guesses.find(filter).sort(sort);
        if let Some(limit) = limit {
            find = find.limit(limit);
        }
        let mut cursor = find.await.context("Failed to query guesses")?;

        let mut guesses = Vec::new();
        while let Some(doc) = cursor.next().await {
            let doc = doc.context("Failed to read guess document")?;
            guesses.push(Guess::try_from(doc)?);
        }
        Ok(guesses)
    }
}

fn participant_key(participant_id: u64) -> Result<i64, StoreError> {
    i64::try_from(participant_id)
        .map_err(|_| StoreError::Backend(anyhow!("participantId {} too large", participant_id)))
}

#[async_trait]
impl GameStore for MongoStore {
    async fn matchup(&self, matchup_id: &str) -> Result<Option<Matchup>, StoreError> {
        let doc = self
            .matchups
            .find_one(doc! { "matchupId": matchup_id })
            .await
            .context("Failed to read matchup")?;
        Ok(doc.map(Matchup::try_from).transpose()?)
    }

    async fn set_matchup_config(
        &self,
        matchup_id: &str,
        config: &MatchupConfig,
    ) -> Result<(), StoreError> {
        self.matchups
            .update_one(
                doc! { "matchupId": matchup_id },
                doc! {
                    "$set": {
                        "matchupId": matchup_id,
                        "homeTeam": config.home_team.as_str(),
                        "awayTeam": config.away_team.as_str(),
                        "spread": config.spread,
                        "jerseySumLine": i64::from(config.jersey_sum_line),
                        "kickoff": config.kickoff.clone(),
                    }
                },
            )
            .upsert(true)
            .await
            .context("Failed to save matchup")?;
        Ok(())
    }

    async fn set_lock(&self, matchup_id: &str, locked: bool) -> Result<(), StoreError> {
        self.matchups
            .update_one(
                doc! { "matchupId": matchup_id },
                doc! { "$set": { "matchupId": matchup_id, "locked": locked } },
            )
            .upsert(true)
            .await
            .context("Failed to update lock state")?;
        Ok(())
    }

    async fn insert_guess(
        &self,
        guess: &NewGuess,
        created_at: DateTime<Utc>,
    ) -> Result<Guess, StoreError> {
        let doc = GuessDocument {
            id: None,
            matchup_id: guess.matchup_id.clone(),
            participant_id: participant_key(guess.participant_id)?,
            jersey_sum_guess: i64::from(guess.jersey_sum_guess),
            winner_pick: guess.winner_pick,
            created_at,
        };

        let result = match self.guesses.insert_one(&doc).await {
            Ok(result) => result,
            Err(e) if is_duplicate_key(&e) => return Err(StoreError::DuplicateGuess),
            Err(e) => return Err(anyhow::Error::new(e).context("Failed to insert guess").into()),
        };

        Ok(Guess {
            id: result
                .inserted_id
                .as_object_id()
                .map(|oid| oid.to_hex())
                .unwrap_or_default(),
            matchup_id: doc.matchup_id,
            participant_id: guess.participant_id,
            jersey_sum_guess: guess.jersey_sum_guess,
            winner_pick: doc.winner_pick,
            created_at: doc.created_at,
        })
    }

    async fn guesses_for_matchup(&self, matchup_id: &str) -> Result<Vec<Guess>, StoreError> {
        self.find_guesses(
            doc! { "matchupId": matchup_id },
            doc! { "createdAt": 1, "_id": 1 },
            None,
        )
        .await
    }

    async fn guesses_for_participant(
        &self,
        participant_id: u64,
        limit: usize,
    ) -> Result<Vec<Guess>, StoreError> {
        let participant_id = participant_key(participant_id)?;
        self.find_guesses(
            doc! { "participantId": participant_id },
            doc! { "createdAt": -1, "_id": -1 },
            Some(limit as i64),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_lock_only_document_has_no_config() {
        let doc = MatchupDocument {
            matchup_id: "week-1-phi-lac".to_string(),
            home_team: None,
            away_team: None,
            spread: None,
            jersey_sum_line: None,
            kickoff: None,
            locked: true,
        };
        let matchup = Matchup::try_from(doc).unwrap();
        assert!(matchup.locked);
        assert!(matchup.config.is_none());
    }

    #[test]
    fn test_out_of_range_line_is_an_error() {
        let doc = |line: i64| MatchupDocument {
            matchup_id: "week-1-phi-lac".to_string(),
            home_team: Some("Los Angeles Chargers".to_string()),
            away_team: Some("Philadelphia Eagles".to_string()),
            spread: Some(2.5),
            jersey_sum_line: Some(line),
            kickoff: None,
            locked: false,
        };

        let matchup = Matchup::try_from(doc(178)).unwrap();
        assert_eq!(matchup.config.map(|c| c.jersey_sum_line), Some(178));

        assert!(Matchup::try_from(doc(-1)).is_err());
        assert!(Matchup::try_from(doc(i64::from(u32::MAX) + 1)).is_err());
    }

    #[test]
    fn test_guess_document_conversion() {
        let oid = ObjectId::new();
        let created_at = Utc.with_ymd_and_hms(2025, 9, 5, 0, 30, 0).unwrap();
        let guess = Guess::try_from(GuessDocument {
            id: Some(oid),
            matchup_id: "week-1-phi-lac".to_string(),
            participant_id: 1441046,
            jersey_sum_guess: 178,
            winner_pick: Side::Away,
            created_at,
        })
        .unwrap();
        assert_eq!(guess.id, oid.to_hex());
        assert_eq!(guess.participant_id, 1441046);

        let bad = Guess::try_from(GuessDocument {
            id: None,
            matchup_id: "week-1-phi-lac".to_string(),
            participant_id: -3,
            jersey_sum_guess: 178,
            winner_pick: Side::Away,
            created_at,
        });
        assert!(bad.is_err());
    }

    #[tokio::test]
    #[ignore]
    async fn test_duplicate_guess_rejected_by_index() {
        dotenv::dotenv().ok();
        let uri = std::env::var("MONGODB_URI").expect("MONGODB_URI not set");
        let db_name = format!("jersey-pick-test-{}", ObjectId::new().to_hex());
        let store = MongoStore::connect(&uri, &db_name).await.unwrap();

        let guess = NewGuess {
            matchup_id: "week-1-phi-lac".to_string(),
            participant_id: 99,
            jersey_sum_guess: 180,
            winner_pick: Side::Home,
        };
        store.insert_guess(&guess, Utc::now()).await.unwrap();
        let second = store.insert_guess(&guess, Utc::now()).await;
        assert!(matches!(second, Err(StoreError::DuplicateGuess)));

        let client = Client::with_uri_str(&uri).await.unwrap();
        client.database(&db_name).drop().await.unwrap();
    }
}
