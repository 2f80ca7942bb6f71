//! Small cli/daemon pair for tracking how much screen time each application
//! gets throughout the day. The daemon polls the foreground window and rolls
//! usage up into daily per-application totals inside a local SQLite database.
//! The cli manages the daemon and prints the aggregated numbers.

pub mod cli;
pub mod daemon;
pub mod utils;
pub mod window_api;
