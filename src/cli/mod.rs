pub mod output;
pub mod process;
pub mod stats;

use std::{env, path::PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use process::{kill_running_daemons, restart_daemon};
use stats::DateStyle;
use tracing::level_filters::LevelFilter;

use crate::{
    daemon::{start_daemon, storage::database::UsageDatabase, DaemonConfig, DATABASE_FILE},
    utils::{
        dir::create_application_default_path,
        logging::{enable_logging, CLI_PREFIX},
    },
};

#[derive(Parser, Debug)]
#[command(name = "screentime", version)]
#[command(about = "Tracks per-application screen time", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, help = "Enable logging")]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Start the tracking daemon in the background")]
    Init {
        #[arg(
            long,
            help = "Application directory. By default %APPDATA%\\screentime on Windows"
        )]
        dir: Option<PathBuf>,
    },
    #[command(
        about = "Run the daemon directly in the current console. Used for creating a daemon internally and for debugging"
    )]
    Serve {
        #[arg(
            long,
            help = "Application directory. By default %APPDATA%\\screentime on Windows"
        )]
        dir: Option<PathBuf>,
    },
    #[command(about = "Stop the currently running daemon")]
    Stop {},
    #[command(about = "Show per-application totals for one day")]
    Day {
        #[arg(
            long,
            help = "Day to show. Examples are \"today\", \"yesterday\", \"15/03/2025\""
        )]
        date: Option<String>,
        #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
        date_style: DateStyle,
        #[arg(long, help = "Emit rows as JSON for chart consumers")]
        json: bool,
    },
    #[command(about = "Show daily totals and top applications for the last 7 days")]
    Week {
        #[arg(long, help = "Emit rows as JSON for chart consumers")]
        json: bool,
    },
    #[command(about = "Show the daily history of one application")]
    History {
        app: String,
        #[arg(long, default_value_t = 30)]
        days: u32,
        #[arg(long, help = "Emit rows as JSON for chart consumers")]
        json: bool,
    },
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let app_dir = create_application_default_path()?;
    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    enable_logging(CLI_PREFIX, &app_dir, logging_level, args.log)?;

    match args.commands {
        Commands::Init { dir } => {
            restart_daemon(dir.as_deref())?;
            Ok(())
        }
        Commands::Stop {} => {
            let process_name = env::current_exe()?;
            kill_running_daemons(&process_name);
            Ok(())
        }
        Commands::Serve { dir } => {
            let dir = dir.unwrap_or(app_dir);
            start_daemon(dir, DaemonConfig::default()).await?;
            Ok(())
        }
        Commands::Day {
            date,
            date_style,
            json,
        } => {
            let database = open_database(&app_dir)?;
            let day = stats::parse_day_arg(date.as_deref(), date_style)?;
            stats::show_day(&database, day, json)
        }
        Commands::Week { json } => {
            let database = open_database(&app_dir)?;
            stats::show_week(&database, chrono::Utc::now().date_naive(), json)
        }
        Commands::History { app, days, json } => {
            let database = open_database(&app_dir)?;
            stats::show_history(&database, &app, days, json)
        }
    }
}

fn open_database(app_dir: &std::path::Path) -> Result<UsageDatabase> {
    UsageDatabase::open(&app_dir.join(DATABASE_FILE))
}
