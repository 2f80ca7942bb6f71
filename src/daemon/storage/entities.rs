use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

/// One continuous span of foreground focus for an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionInterval {
    pub app_name: Arc<str>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub started_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub ended_at: DateTime<Utc>,
}

impl SessionInterval {
    pub fn duration_seconds(&self) -> i64 {
        (self.ended_at - self.started_at).num_seconds()
    }
}

/// Pending state between flushes: closed sessions plus per-(day, app) second
/// deltas not yet committed to the database.
#[derive(Debug, Default)]
pub struct UsageBatch {
    pub sessions: Vec<SessionInterval>,
    pub totals: HashMap<(NaiveDate, Arc<str>), i64>,
}

impl UsageBatch {
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty() && self.totals.is_empty()
    }

    pub fn add_seconds(&mut self, date: NaiveDate, app_name: Arc<str>, seconds: i64) {
        if seconds <= 0 {
            return;
        }
        *self.totals.entry((date, app_name)).or_insert(0) += seconds;
    }

    pub fn push_session(&mut self, session: SessionInterval) {
        self.sessions.push(session);
    }

    pub fn clear(&mut self) {
        self.sessions.clear();
        self.totals.clear();
    }
}

/// Aggregated seconds for one application, as read back for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppTotal {
    pub app_name: String,
    pub seconds: i64,
}

/// Aggregated seconds for one day across all applications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayTotal {
    pub date: NaiveDate,
    pub seconds: i64,
}
