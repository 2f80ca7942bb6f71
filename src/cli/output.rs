//! Terminal rendering of usage summaries: duration column, share bar,
//! percentage. `--json` bypasses all of this through [print_json].

use ansi_term::Colour;
use anyhow::Result;
use chrono::NaiveDate;
use serde::Serialize;

use crate::{
    daemon::storage::entities::{AppTotal, DayTotal},
    utils::{
        percentage::seconds_percentage,
        time::{day_key, format_seconds},
    },
};

use super::stats::{DaySummary, WeekSummary};

const BAR_WIDTH: usize = 24;
const NAME_WIDTH: usize = 28;

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_day(summary: &DaySummary) {
    println!(
        "Screen time for {} - {}",
        day_key(summary.date),
        format_seconds(summary.total_seconds)
    );
    if summary.apps.is_empty() {
        println!("No usage recorded");
        return;
    }
    let max = summary
        .apps
        .iter()
        .map(|app| app.seconds)
        .max()
        .unwrap_or(0);
    for app in &summary.apps {
        print_app_row(app, max, summary.total_seconds);
    }
}

pub fn print_week(start: NaiveDate, end: NaiveDate, summary: &WeekSummary) {
    let week_total: i64 = summary.days.iter().map(|day| day.seconds).sum();
    println!(
        "Screen time {} to {} - {}",
        day_key(start),
        day_key(end),
        format_seconds(week_total)
    );
    let max = summary.days.iter().map(|day| day.seconds).max().unwrap_or(0);
    for day in &summary.days {
        println!(
            "{}  {} {:>10}",
            day_key(day.date),
            Colour::Blue.paint(bar(day.seconds, max)),
            format_seconds(day.seconds),
        );
    }
    if !summary.top_apps.is_empty() {
        println!();
        println!("Top applications");
        let max = summary
            .top_apps
            .iter()
            .map(|app| app.seconds)
            .max()
            .unwrap_or(0);
        for app in &summary.top_apps {
            print_app_row(app, max, week_total);
        }
    }
}

pub fn print_history(app: &str, rows: &[DayTotal]) {
    println!("History for {app}");
    if rows.is_empty() {
        println!("No usage recorded");
        return;
    }
    let max = rows.iter().map(|day| day.seconds).max().unwrap_or(0);
    for day in rows {
        println!(
            "{}  {} {:>10}",
            day_key(day.date),
            Colour::Blue.paint(bar(day.seconds, max)),
            format_seconds(day.seconds),
        );
    }
}

fn print_app_row(app: &AppTotal, max: i64, whole: i64) {
    println!(
        "{:<NAME_WIDTH$} {} {:>10} {:>7}",
        truncated(&app.app_name),
        Colour::Blue.paint(bar(app.seconds, max)),
        format_seconds(app.seconds),
        seconds_percentage(app.seconds, whole).to_string(),
    );
}

fn truncated(name: &str) -> String {
    if name.chars().count() <= NAME_WIDTH {
        name.to_string()
    } else {
        let cut: String = name.chars().take(NAME_WIDTH - 1).collect();
        format!("{cut}…")
    }
}

/// Fixed-width bar scaled against the largest row so the biggest entry always
/// fills the column.
fn bar(seconds: i64, max: i64) -> String {
    if max <= 0 || seconds <= 0 {
        return " ".repeat(BAR_WIDTH);
    }
    let filled = ((seconds as f64 / max as f64) * BAR_WIDTH as f64).round() as usize;
    let filled = filled.clamp(1, BAR_WIDTH);
    format!("{}{}", "█".repeat(filled), " ".repeat(BAR_WIDTH - filled))
}
