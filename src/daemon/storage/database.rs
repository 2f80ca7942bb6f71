use std::path::Path;

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection};
use tracing::debug;

use crate::utils::time::day_key;

use super::{
    entities::{AppTotal, DayTotal, SessionInterval, UsageBatch},
    UsageStore,
};

/// SQLite-backed store for sessions and daily summaries. The daemon is the
/// only writer; the stats cli opens the same file read-only in practice.
pub struct UsageDatabase {
    conn: Connection,
}

impl UsageDatabase {
    /// Opens (or creates) the database at the given path and runs migrations.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let database = Self { conn };
        database.migrate()?;
        Ok(database)
    }

    /// In-memory database for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let database = Self { conn };
        database.migrate()?;
        Ok(database)
    }

    fn migrate(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS sessions (
                id         INTEGER PRIMARY KEY AUTOINCREMENT,
                app_name   TEXT NOT NULL,
                started_at TEXT NOT NULL,
                ended_at   TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS daily_usage (
                id               INTEGER PRIMARY KEY AUTOINCREMENT,
                date             TEXT NOT NULL,
                app_name         TEXT NOT NULL,
                duration_seconds INTEGER NOT NULL,
                last_updated     TEXT NOT NULL,
                UNIQUE(date, app_name)
            );
            CREATE INDEX IF NOT EXISTS idx_daily_usage_date ON daily_usage(date);
            CREATE INDEX IF NOT EXISTS idx_daily_usage_app ON daily_usage(app_name);",
        )?;
        Ok(())
    }

    /// Per-application totals for one day, largest first.
    pub fn day_totals(&self, date: NaiveDate) -> Result<Vec<AppTotal>> {
        let mut stmt = self.conn.prepare(
            "SELECT app_name, duration_seconds
             FROM daily_usage
             WHERE date = ?1
             ORDER BY duration_seconds DESC",
        )?;
        let rows = stmt
            .query_map(params![day_key(date)], |row| {
                Ok(AppTotal {
                    app_name: row.get(0)?,
                    seconds: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Total tracked seconds per day over an inclusive date range.
    pub fn totals_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<DayTotal>> {
        let mut stmt = self.conn.prepare(
            "SELECT date, SUM(duration_seconds)
             FROM daily_usage
             WHERE date >= ?1 AND date <= ?2
             GROUP BY date
             ORDER BY date ASC",
        )?;
        let rows = stmt
            .query_map(params![day_key(from), day_key(to)], |row| {
                let date: String = row.get(0)?;
                let seconds: i64 = row.get(1)?;
                Ok((date, seconds))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter()
            .map(|(date, seconds)| {
                Ok(DayTotal {
                    date: date.parse()?,
                    seconds,
                })
            })
            .collect()
    }

    /// Heaviest applications over an inclusive date range.
    pub fn top_apps_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        limit: u32,
    ) -> Result<Vec<AppTotal>> {
        let mut stmt = self.conn.prepare(
            "SELECT app_name, SUM(duration_seconds) AS total
             FROM daily_usage
             WHERE date >= ?1 AND date <= ?2
             GROUP BY app_name
             ORDER BY total DESC
             LIMIT ?3",
        )?;
        let rows = stmt
            .query_map(params![day_key(from), day_key(to), limit], |row| {
                Ok(AppTotal {
                    app_name: row.get(0)?,
                    seconds: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Daily history for one application since `from`, oldest first.
    pub fn app_history(&self, app_name: &str, from: NaiveDate) -> Result<Vec<DayTotal>> {
        let mut stmt = self.conn.prepare(
            "SELECT date, duration_seconds
             FROM daily_usage
             WHERE app_name = ?1 AND date >= ?2
             ORDER BY date ASC",
        )?;
        let rows = stmt
            .query_map(params![app_name, day_key(from)], |row| {
                let date: String = row.get(0)?;
                let seconds: i64 = row.get(1)?;
                Ok((date, seconds))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter()
            .map(|(date, seconds)| {
                Ok(DayTotal {
                    date: date.parse()?,
                    seconds,
                })
            })
            .collect()
    }

    /// Session rows whose start falls on the given day, oldest first.
    pub fn sessions_for_day(&self, date: NaiveDate) -> Result<Vec<SessionInterval>> {
        let mut stmt = self.conn.prepare(
            "SELECT app_name, started_at, ended_at
             FROM sessions
             WHERE started_at >= ?1 AND started_at < ?2
             ORDER BY started_at ASC",
        )?;
        let day_start = date.and_hms_opt(0, 0, 0).expect("midnight always exists");
        let next_day_start = day_start + chrono::Duration::days(1);
        let rows = stmt
            .query_map(
                params![
                    day_start.and_utc().to_rfc3339(),
                    next_day_start.and_utc().to_rfc3339()
                ],
                |row| {
                    let app_name: String = row.get(0)?;
                    let started_at: String = row.get(1)?;
                    let ended_at: String = row.get(2)?;
                    Ok((app_name, started_at, ended_at))
                },
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter()
            .map(|(app_name, started_at, ended_at)| {
                Ok(SessionInterval {
                    app_name: app_name.into(),
                    started_at: chrono::DateTime::parse_from_rfc3339(&started_at)?
                        .with_timezone(&Utc),
                    ended_at: chrono::DateTime::parse_from_rfc3339(&ended_at)?
                        .with_timezone(&Utc),
                })
            })
            .collect()
    }
}

impl UsageStore for UsageDatabase {
    /// Commits a batch atomically. On error nothing is applied, so the caller
    /// can retry the same batch on the next flush cycle.
    fn commit_batch(&mut self, batch: &UsageBatch) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        for session in &batch.sessions {
            tx.execute(
                "INSERT INTO sessions (app_name, started_at, ended_at)
                 VALUES (?1, ?2, ?3)",
                params![
                    session.app_name.as_ref(),
                    session.started_at.to_rfc3339(),
                    session.ended_at.to_rfc3339(),
                ],
            )?;
        }
        for ((date, app_name), seconds) in &batch.totals {
            tx.execute(
                "INSERT INTO daily_usage (date, app_name, duration_seconds, last_updated)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(date, app_name) DO UPDATE SET
                     duration_seconds = duration_seconds + excluded.duration_seconds,
                     last_updated = excluded.last_updated",
                params![day_key(*date), app_name.as_ref(), seconds, now],
            )?;
        }
        tx.commit()?;
        debug!(
            "Committed {} sessions and {} total rows",
            batch.sessions.len(),
            batch.totals.len()
        );
        Ok(())
    }
}
