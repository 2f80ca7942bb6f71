//! Durable representation of tracked usage.
//! The basic idea is:
//!  - `sessions` stores one row per continuous focus span of an application.
//!  - `daily_usage` stores one row per (UTC day, application) with the total
//!    tracked seconds, upserted incrementally as spans are attributed.
//!  - Writes happen in batches inside a single transaction so a failed flush
//!    can be retried without double counting.

pub mod database;
pub mod entities;

use anyhow::Result;

use entities::UsageBatch;

/// Seam between the aggregator and SQLite. Tests substitute failing stores to
/// exercise the retry path.
pub trait UsageStore {
    fn commit_batch(&mut self, batch: &UsageBatch) -> Result<()>;
}
