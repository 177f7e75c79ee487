use chrono::Utc;
use clap::Subcommand;
use serenity_core::storage::Database;
use serenity_core::Config;

#[derive(Subcommand)]
pub enum HistoryAction {
    /// Recent sessions, newest first
    List {
        /// Fetch from the backend instead of the local log
        #[arg(long)]
        remote: bool,
        /// Maximum number of sessions
        #[arg(long, default_value = "20")]
        limit: usize,
    },
    /// Per-day totals for the last seven days
    Summary {
        /// Fetch from the backend instead of the local log
        #[arg(long)]
        remote: bool,
    },
    /// Session count, total minutes and current streak
    Stats,
}

pub async fn run(action: HistoryAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        HistoryAction::List { remote: true, limit } => {
            let client = super::api_client(&Config::load()?)?;
            let mut sessions = client.history().await?;
            sessions.truncate(limit);
            println!("{}", serde_json::to_string_pretty(&sessions)?);
        }
        HistoryAction::List {
            remote: false,
            limit,
        } => {
            let db = Database::open()?;
            let sessions = db.history(limit)?;
            println!("{}", serde_json::to_string_pretty(&sessions)?);
        }
        HistoryAction::Summary { remote: true } => {
            let client = super::api_client(&Config::load()?)?;
            let summary = client.weekly_summary().await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        HistoryAction::Summary { remote: false } => {
            let db = Database::open()?;
            let summary = db.weekly_summary(Utc::now().date_naive())?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        HistoryAction::Stats => {
            let db = Database::open()?;
            let stats = db.profile_stats(Utc::now().date_naive())?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }
    Ok(())
}
