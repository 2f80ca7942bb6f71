use chrono::NaiveDate;

/// Canonical key for a UTC day, used both as the `daily_usage.date` column
/// value and in cli output.
pub fn day_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Renders a second count as `3h 25m 11s`, dropping leading zero components.
pub fn format_seconds(total: i64) -> String {
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m {seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}

#[cfg(test)]
mod tests {
    use super::format_seconds;

    #[test]
    fn formats_all_magnitudes() {
        assert_eq!(format_seconds(0), "0s");
        assert_eq!(format_seconds(59), "59s");
        assert_eq!(format_seconds(60), "1m 0s");
        assert_eq!(format_seconds(3601), "1h 0m 1s");
        assert_eq!(format_seconds(7325), "2h 2m 5s");
    }
}
