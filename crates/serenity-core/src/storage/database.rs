//! SQLite-based session log and statistics.
//!
//! Provides persistent storage for:
//! - Completed meditation sessions
//! - History, weekly summary and profile statistics
//! - Key-value store for small bits of application state

use std::path::Path;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::{CoreError, DatabaseError};
use crate::timer::CompletedSession;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: i64,
    pub duration_secs: u64,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

/// Totals for one calendar day (UTC).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub total_duration_secs: u64,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProfileStats {
    pub total_sessions: u64,
    pub total_minutes: u64,
    /// Consecutive days with at least one session, ending today or yesterday.
    pub streak_days: u64,
}

/// SQLite database for the local session log.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/serenity/serenity.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("serenity.db");
        Ok(Self::open_at(&path)?)
    }

    /// Open (or create) a database file at `path`.
    pub fn open_at(path: &Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS sessions (
                id            INTEGER PRIMARY KEY AUTOINCREMENT,
                duration_secs INTEGER NOT NULL CHECK (duration_secs > 0),
                started_at    TEXT NOT NULL,
                completed_at  TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_sessions_completed_at ON sessions(completed_at);",
        )?;
        Ok(())
    }

    /// Record a completed session. Returns the new row id.
    pub fn record_session(&self, session: &CompletedSession) -> Result<i64, DatabaseError> {
        self.conn.execute(
            "INSERT INTO sessions (duration_secs, started_at, completed_at)
             VALUES (?1, ?2, ?3)",
            params![
                session.duration_secs,
                session.started_at.to_rfc3339(),
                session.completed_at.to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Most recent sessions first.
    pub fn history(&self, limit: usize) -> Result<Vec<SessionRecord>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, duration_secs, started_at, completed_at
             FROM sessions
             ORDER BY completed_at DESC, id DESC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, u64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, duration_secs, started_at, completed_at) = row?;
            records.push(SessionRecord {
                id,
                duration_secs,
                started_at: parse_timestamp(&started_at)?,
                completed_at: parse_timestamp(&completed_at)?,
            });
        }
        Ok(records)
    }

    /// Per-day totals for the seven days ending on `today`, oldest first.
    /// Days without sessions are omitted.
    pub fn weekly_summary(&self, today: NaiveDate) -> Result<Vec<DailySummary>, DatabaseError> {
        let since = today - Duration::days(6);
        let mut stmt = self.conn.prepare(
            "SELECT substr(completed_at, 1, 10) AS day,
                    COALESCE(SUM(duration_secs), 0),
                    COUNT(*)
             FROM sessions
             WHERE substr(completed_at, 1, 10) BETWEEN ?1 AND ?2
             GROUP BY day
             ORDER BY day",
        )?;
        let rows = stmt.query_map(
            params![since.to_string(), today.to_string()],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, u64>(1)?,
                    row.get::<_, u64>(2)?,
                ))
            },
        )?;

        let mut days = Vec::new();
        for row in rows {
            let (day, total_duration_secs, count) = row?;
            let date = day
                .parse::<NaiveDate>()
                .map_err(|e| DatabaseError::CorruptRow {
                    table: "sessions",
                    message: format!("bad date '{day}': {e}"),
                })?;
            days.push(DailySummary {
                date,
                total_duration_secs,
                count,
            });
        }
        Ok(days)
    }

    pub fn profile_stats(&self, today: NaiveDate) -> Result<ProfileStats, DatabaseError> {
        let (total_sessions, total_secs) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(duration_secs), 0) FROM sessions",
            [],
            |row| Ok((row.get::<_, u64>(0)?, row.get::<_, u64>(1)?)),
        )?;

        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT substr(completed_at, 1, 10) AS day
             FROM sessions
             ORDER BY day DESC",
        )?;
        let days = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .filter_map(|d| d.parse::<NaiveDate>().ok());

        Ok(ProfileStats {
            total_sessions,
            total_minutes: total_secs / 60,
            streak_days: streak_ending(today, days),
        })
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::CorruptRow {
            table: "sessions",
            message: format!("bad timestamp '{s}': {e}"),
        })
}

/// Length of the run of consecutive days in `days_desc` (newest first) that
/// ends on `today` or the day before.
fn streak_ending(today: NaiveDate, days_desc: impl IntoIterator<Item = NaiveDate>) -> u64 {
    let mut days = days_desc.into_iter().skip_while(|d| *d > today).peekable();
    let mut expected = match days.peek() {
        Some(&first) if first == today || first == today - Duration::days(1) => first,
        _ => return 0,
    };

    let mut streak = 0;
    for day in days {
        if day != expected {
            break;
        }
        streak += 1;
        expected = day - Duration::days(1);
    }
    streak
}
