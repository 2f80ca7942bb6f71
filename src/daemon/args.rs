use std::path::PathBuf;

use clap::Parser;
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
pub struct DaemonArgs {
    /// Skip the detach step and run in the current process.
    #[arg(long)]
    pub force: bool,
    #[arg(long)]
    pub dir: Option<PathBuf>,
    /// Seconds between foreground window polls.
    #[arg(long = "poll-interval", default_value_t = 2)]
    pub poll_interval: u64,
    /// Seconds between flushes of running totals to the database.
    #[arg(long = "flush-interval", default_value_t = 30)]
    pub flush_interval: u64,
    /// Seconds without input after which the user counts as idle.
    #[arg(long = "idle-threshold", default_value_t = 120)]
    pub idle_threshold: u32,
    /// This option is for debugging purposes only.
    #[arg(long = "log-console")]
    pub log_console: bool,
    #[arg(long = "log-filter")]
    pub log: Option<LevelFilter>,
}
