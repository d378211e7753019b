use anyhow::Result;
use clap::{Parser, Subcommand};
use jersey_pick::game::admin::{self, AdminGate, LockRequest, MatchupRequest};
use jersey_pick::game::history::participant_history;
use jersey_pick::game::settlement::{settle, SettleRequest};
use jersey_pick::{open_store, Config};
use serde_json::Value;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "jersey-cli", about = "Admin tools for the jersey number free play")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create or update a matchup's teams and lines
    Matchup {
        #[arg(long)]
        admin_id: i64,
        #[arg(long)]
        id: String,
        #[arg(long)]
        home: String,
        #[arg(long)]
        away: String,
        /// Home relative to away, negative when the home team is favored
        #[arg(long, allow_hyphen_values = true)]
        spread: f64,
        #[arg(long)]
        line: i64,
        #[arg(long)]
        kickoff: Option<String>,
    },
    /// Lock (or with --unlock, reopen) submissions for a matchup
    Lock {
        #[arg(long)]
        admin_id: i64,
        #[arg(long)]
        id: String,
        #[arg(long)]
        unlock: bool,
    },
    /// Show whether a matchup is locked
    LockState {
        #[arg(long)]
        id: String,
    },
    /// Pick the winner of a matchup
    Settle {
        #[arg(long)]
        admin_id: i64,
        #[arg(long)]
        id: String,
        /// "home" or "away"
        #[arg(long)]
        winner: String,
        #[arg(long)]
        total: i64,
    },
    /// List a participant's recent guesses
    History {
        #[arg(long)]
        participant: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize logging
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    anyhow::ensure!(
        config.mongodb_uri.is_some(),
        "MONGODB_URI not set in .env file"
    );
    let store = open_store(&config).await?;
    let gate = AdminGate::new(config.admin_id);

    match cli.command {
        Command::Matchup {
            admin_id,
            id,
            home,
            away,
            spread,
            line,
            kickoff,
        } => {
            let cmd = MatchupRequest {
                admin_id: Some(admin_id.into()),
                matchup_id: Some(id.into()),
                home_team: Some(home.into()),
                away_team: Some(away.into()),
                spread: Some(spread.into()),
                jersey_sum_line: Some(line.into()),
                kickoff: kickoff.map(Value::from),
            }
            .validate()?;
            let saved = admin::set_matchup(store.as_ref(), &gate, cmd).await?;
            println!(
                "Saved {}: {} | Spread: {} | Jersey line: {}",
                saved.matchup_id,
                saved.config.label(),
                saved.config.spread_label(),
                saved.config.jersey_sum_line
            );
        }
        Command::Lock {
            admin_id,
            id,
            unlock,
        } => {
            let cmd = LockRequest {
                admin_id: Some(admin_id.into()),
                matchup_id: Some(id.into()),
                locked: Some((!unlock).into()),
            }
            .validate()?;
            let state = admin::set_lock(store.as_ref(), &gate, cmd).await?;
            println!("{} locked: {}", state.matchup_id, state.locked);
        }
        Command::LockState { id } => {
            let state = admin::lock_state(store.as_ref(), &id).await?;
            println!("{} locked: {}", state.matchup_id, state.locked);
        }
        Command::Settle {
            admin_id,
            id,
            winner,
            total,
        } => {
            let cmd = SettleRequest {
                admin_id: Some(admin_id.into()),
                matchup_id: Some(id.into()),
                correct_winner: Some(winner.into()),
                correct_jersey_total: Some(total.into()),
            }
            .validate()?;
            let settlement = settle(store.as_ref(), &gate, cmd).await?;
            println!("{}", settlement.format());
        }
        Command::History { participant } => {
            let guesses = participant_history(store.as_ref(), participant).await?;
            if guesses.is_empty() {
                println!("No guesses found for participant {}.", participant);
            } else {
                for (i, guess) in guesses.iter().enumerate() {
                    println!(
                        "{}. {} | {} ({}) | {}",
                        i + 1,
                        guess.matchup_id,
                        guess.jersey_sum_guess,
                        guess.winner_pick,
                        guess.created_at.to_rfc3339()
                    );
                }
            }
        }
    }

    Ok(())
}
