//! Read side of the database: resolves date arguments and assembles the
//! summaries the terminal (or a chart consumer via `--json`) displays.

use std::fmt::Display;

use anyhow::{Context, Result};
use chrono::{Duration, Local, NaiveDate, Utc};
use chrono_english::parse_date_string;
use clap::ValueEnum;
use serde::Serialize;

use crate::daemon::storage::{
    database::UsageDatabase,
    entities::{AppTotal, DayTotal},
};

use super::output;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DateStyle {
    Uk,
    Us,
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}

/// Resolves a human date argument to the UTC day used as a storage key.
/// Without an argument this is the current UTC day.
pub fn parse_day_arg(input: Option<&str>, style: DateStyle) -> Result<NaiveDate> {
    match input {
        None => Ok(Utc::now().date_naive()),
        Some(s) => {
            let parsed = parse_date_string(s, Local::now(), style.into())
                .with_context(|| format!("Can't parse \"{s}\" as a date"))?;
            // The calendar date the user named is used as the day key
            // directly, matching how `day_key` stamps rows.
            Ok(parsed.date_naive())
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub total_seconds: i64,
    pub apps: Vec<AppTotal>,
}

#[derive(Debug, Serialize)]
pub struct WeekSummary {
    pub days: Vec<DayTotal>,
    pub top_apps: Vec<AppTotal>,
}

const WEEK_TOP_APPS: u32 = 10;

pub fn show_day(database: &UsageDatabase, date: NaiveDate, json: bool) -> Result<()> {
    let apps = database.day_totals(date)?;
    let summary = DaySummary {
        date,
        total_seconds: apps.iter().map(|app| app.seconds).sum(),
        apps,
    };
    if json {
        output::print_json(&summary)
    } else {
        output::print_day(&summary);
        Ok(())
    }
}

pub fn show_week(database: &UsageDatabase, end: NaiveDate, json: bool) -> Result<()> {
    let start = end - Duration::days(6);
    let summary = WeekSummary {
        days: database.totals_between(start, end)?,
        top_apps: database.top_apps_between(start, end, WEEK_TOP_APPS)?,
    };
    if json {
        output::print_json(&summary)
    } else {
        output::print_week(start, end, &summary);
        Ok(())
    }
}

pub fn show_history(database: &UsageDatabase, app: &str, days: u32, json: bool) -> Result<()> {
    let from = Utc::now().date_naive() - Duration::days(days.saturating_sub(1) as i64);
    let rows = database.app_history(app, from)?;
    if json {
        output::print_json(&rows)
    } else {
        output::print_history(app, &rows);
        Ok(())
    }
}
