use std::{path::PathBuf, time::Duration};

use anyhow::Result;
use aggregator::AggregationModule;
use observer::{idle::IdleEvaluator, TickEvent, WindowObserverModule};
use storage::database::UsageDatabase;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::error;

use crate::{
    utils::clock::{Clock, DefaultClock},
    window_api::{GenericWindowManager, WindowManager},
};

pub mod aggregator;
pub mod args;
pub mod observer;
pub mod shutdown;
pub mod storage;

pub const DATABASE_FILE: &str = "screentime.db";

/// Knobs for the polling and flush cadence, filled in from [args::DaemonArgs].
#[derive(Debug, Clone, Copy)]
pub struct DaemonConfig {
    pub poll_interval: Duration,
    pub flush_interval: chrono::Duration,
    pub idle_threshold_s: u32,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            flush_interval: chrono::Duration::seconds(30),
            idle_threshold_s: 120,
        }
    }
}

impl From<&args::DaemonArgs> for DaemonConfig {
    fn from(args: &args::DaemonArgs) -> Self {
        Self {
            poll_interval: Duration::from_secs(args.poll_interval.max(1)),
            flush_interval: chrono::Duration::seconds(args.flush_interval.max(1) as i64),
            idle_threshold_s: args.idle_threshold,
        }
    }
}

/// Represents the starting point for the daemon
pub async fn start_daemon(dir: PathBuf, config: DaemonConfig) -> Result<()> {
    let (sender, receiver) = mpsc::channel::<TickEvent>(10);
    let manager = GenericWindowManager::new()?;

    let shutdown_token = CancellationToken::new();

    let observer = create_observer(sender, manager, &shutdown_token, DefaultClock, &config);

    let aggregator = create_aggregator(dir.join(DATABASE_FILE), receiver, &config)?;

    let (_, observer_result, aggregation_result) = tokio::join!(
        shutdown::detect_shutdown(shutdown_token),
        observer.run(),
        aggregator.run(),
    );

    if let Err(observer_result) = observer_result {
        error!("Observer module got an error {:?}", observer_result);
    }

    if let Err(aggregation_result) = aggregation_result {
        error!("Aggregation module got an error {:?}", aggregation_result);
    }

    Ok(())
}

fn create_observer(
    sender: mpsc::Sender<TickEvent>,
    manager: impl WindowManager + 'static,
    shutdown_token: &CancellationToken,
    clock: impl Clock,
    config: &DaemonConfig,
) -> WindowObserverModule {
    WindowObserverModule::new(
        sender,
        Box::new(manager),
        shutdown_token.clone(),
        IdleEvaluator::from_seconds(config.idle_threshold_s),
        config.poll_interval,
        Box::new(clock),
    )
}

fn create_aggregator(
    database_path: PathBuf,
    receiver: mpsc::Receiver<TickEvent>,
    config: &DaemonConfig,
) -> Result<AggregationModule<UsageDatabase>> {
    let database = UsageDatabase::open(&database_path)?;
    Ok(AggregationModule::new(
        receiver,
        database,
        config.flush_interval,
    ))
}

#[cfg(test)]
mod daemon_tests {
    use std::time::Duration;

    use anyhow::Result;
    use async_trait::async_trait;
    use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
    use tempfile::tempdir;
    use tokio::{sync::mpsc, time::Instant};
    use tokio_util::sync::CancellationToken;

    use crate::{
        daemon::{
            create_aggregator, create_observer, storage::database::UsageDatabase, DaemonConfig,
            DATABASE_FILE,
        },
        utils::{clock::Clock, logging::TEST_LOGGING},
        window_api::{ActiveWindowData, MockWindowManager},
    };

    const TEST_START_DATE: NaiveDateTime =
        NaiveDateTime::new(NaiveDate::from_ymd_opt(2018, 7, 4).unwrap(), NaiveTime::MIN);

    // Eight polls of the editor then four of the terminal, so each focus
    // span lasts a whole number of seconds at a 250ms poll interval.
    fn test_windows() -> Vec<ActiveWindowData> {
        let editor = ActiveWindowData {
            window_title: "main.rs - editor".into(),
            process_name: r"C:\tools\editor.exe".into(),
        };
        let terminal = ActiveWindowData {
            window_title: "terminal".into(),
            process_name: r"C:\tools\terminal.exe".into(),
        };
        let mut windows = vec![editor; 8];
        windows.extend(vec![terminal; 4]);
        windows
    }

    #[derive(Clone)]
    struct TestClock {
        start_time: DateTime<Utc>,
        reference: Instant,
    }

    #[async_trait]
    impl Clock for TestClock {
        fn time(&self) -> DateTime<Utc> {
            self.start_time + self.reference.elapsed()
        }

        fn instant(&self) -> Instant {
            Instant::now()
        }

        async fn sleep_until(&self, instant: tokio::time::Instant) {
            tokio::time::sleep_until(instant).await;
        }
    }

    /// Smoke test for the full pipeline: mocked window manager, short poll
    /// interval, real SQLite file in a temp dir.
    #[tokio::test]
    async fn smoke_test_daemon() -> Result<()> {
        *TEST_LOGGING;
        let mut mock_window_manager = MockWindowManager::new();
        mock_window_manager
            .expect_get_idle_time()
            .returning(|| Ok(0));
        let mut windows = test_windows().into_iter().cycle();
        mock_window_manager
            .expect_get_active_window_data()
            .returning(move || Ok(windows.next().unwrap()));

        let shutdown_token = CancellationToken::new();
        let (sender, receiver) = mpsc::channel(10);
        let test_clock = TestClock {
            start_time: Utc.from_utc_datetime(&TEST_START_DATE),
            reference: Instant::now(),
        };

        let config = DaemonConfig {
            poll_interval: Duration::from_millis(250),
            flush_interval: chrono::Duration::seconds(1),
            idle_threshold_s: 120,
        };

        let observer = create_observer(
            sender,
            mock_window_manager,
            &shutdown_token,
            test_clock.clone(),
            &config,
        );

        let dir = tempdir()?;
        let database_path = dir.path().join(DATABASE_FILE);
        let aggregator = create_aggregator(database_path.clone(), receiver, &config)?;

        let (_, observer_result, aggregation_result) = tokio::join!(
            async {
                tokio::time::sleep(Duration::from_millis(4100)).await;
                shutdown_token.cancel()
            },
            observer.run(),
            aggregator.run(),
        );

        observer_result?;
        aggregation_result?;

        let database = UsageDatabase::open(&database_path)?;
        let totals = database.day_totals(TEST_START_DATE.date())?;
        assert_eq!(totals.len(), 2);
        let tracked: i64 = totals.iter().map(|total| total.seconds).sum();
        // ~4 seconds of wall time were observed; allow polling slack.
        assert!((2..=5).contains(&tracked), "tracked {tracked} seconds");

        assert!(!database.sessions_for_day(TEST_START_DATE.date())?.is_empty());
        Ok(())
    }
}
