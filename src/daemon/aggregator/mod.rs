//! Consumes tick events from the observer, folds them into per-application
//! usage through [UsageTracker], and flushes the result to the store on a
//! fixed cadence. A failed flush only logs; the batch is retried whole on the
//! next cycle since commits are transactional.

pub mod tracker;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::mpsc::Receiver;
use tracing::{debug, error, info};

use crate::daemon::{observer::TickEvent, storage::UsageStore};

use tracker::UsageTracker;

pub struct AggregationModule<S> {
    receiver: Receiver<TickEvent>,
    tracker: UsageTracker,
    store: S,
    flush_interval: Duration,
    last_flush: Option<DateTime<Utc>>,
}

impl<S: UsageStore> AggregationModule<S> {
    pub fn new(receiver: Receiver<TickEvent>, store: S, flush_interval: Duration) -> Self {
        Self {
            receiver,
            tracker: UsageTracker::new(),
            store,
            flush_interval,
            last_flush: None,
        }
    }

    fn flush(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.last_flush = Some(now);
        self.tracker.attribute_open(now);
        if self.tracker.pending().is_empty() {
            return Ok(());
        }
        self.store.commit_batch(self.tracker.pending())?;
        self.tracker.clear_pending();
        Ok(())
    }

    fn flush_due(&self, now: DateTime<Utc>) -> bool {
        match self.last_flush {
            Some(last) => now - last >= self.flush_interval,
            None => false,
        }
    }

    pub async fn run(mut self) -> Result<()> {
        let mut last_tick: Option<DateTime<Utc>> = None;
        while let Some(tick) = self.receiver.recv().await {
            debug!("Processing tick {:?}", tick);
            let now = tick.timestamp;
            if self.last_flush.is_none() {
                self.last_flush = Some(now);
            }
            last_tick = Some(now);

            self.tracker.record_tick(tick.focus, now);

            if self.flush_due(now) {
                if let Err(e) = self.flush(now) {
                    error!("Flush failed, batch kept for next cycle {e:?}");
                }
            }
        }

        // Channel closed: the observer stopped. Close the open interval at
        // the last observed moment and persist what is left.
        let result = match last_tick {
            Some(now) => {
                self.tracker.close_current(now);
                let result = self.flush(now);
                if result.is_ok() {
                    info!("Final flush complete");
                }
                result
            }
            None => Ok(()),
        };
        self.receiver.close();
        result
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use anyhow::{anyhow, Result};
    use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
    use tokio::sync::mpsc;

    use crate::daemon::{
        observer::TickEvent,
        storage::{database::UsageDatabase, entities::UsageBatch, UsageStore},
    };

    use super::AggregationModule;

    const TEST_START_DATE: NaiveDateTime =
        NaiveDateTime::new(NaiveDate::from_ymd_opt(2018, 7, 4).unwrap(), NaiveTime::MIN);

    fn at(seconds: i64) -> DateTime<Utc> {
        Utc.from_utc_datetime(&TEST_START_DATE) + Duration::seconds(seconds)
    }

    fn tick(app: Option<&str>, seconds: i64) -> TickEvent {
        TickEvent {
            focus: app.map(Into::into),
            timestamp: at(seconds),
        }
    }

    // `run` consumes the module, so tests hand it a store sharing state
    // through an Arc and inspect that state afterwards.
    async fn drive<S: UsageStore>(
        store: S,
        flush_interval_s: i64,
        ticks: Vec<TickEvent>,
    ) -> Result<()> {
        let (sender, receiver) = mpsc::channel(16);
        let module = AggregationModule::new(receiver, store, Duration::seconds(flush_interval_s));
        for tick in ticks {
            sender.send(tick).await?;
        }
        drop(sender);
        module.run().await
    }

    struct SharedStore(Arc<std::sync::Mutex<UsageDatabase>>);

    impl UsageStore for SharedStore {
        fn commit_batch(&mut self, batch: &UsageBatch) -> Result<()> {
            self.0.lock().expect("store lock poisoned").commit_batch(batch)
        }
    }

    #[tokio::test]
    async fn ticks_end_up_in_daily_totals() -> Result<()> {
        let database = Arc::new(std::sync::Mutex::new(UsageDatabase::open_in_memory()?));
        drive(
            SharedStore(database.clone()),
            30,
            vec![
                tick(Some("AppA"), 0),
                tick(Some("AppA"), 5),
                tick(Some("AppB"), 10),
                tick(Some("AppB"), 15),
            ],
        )
        .await?;

        let database = database.lock().expect("store lock poisoned");
        let totals = database.day_totals(TEST_START_DATE.date())?;
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0].app_name, "AppA");
        assert_eq!(totals[0].seconds, 10);
        assert_eq!(totals[1].app_name, "AppB");
        assert_eq!(totals[1].seconds, 5);

        let sessions = database.sessions_for_day(TEST_START_DATE.date())?;
        assert_eq!(sessions.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn long_focus_is_flushed_incrementally() -> Result<()> {
        let database = Arc::new(std::sync::Mutex::new(UsageDatabase::open_in_memory()?));
        // Flush every 4 seconds while the same app stays focused for 10.
        drive(
            SharedStore(database.clone()),
            4,
            (0..=10).map(|s| tick(Some("AppA"), s)).collect(),
        )
        .await?;

        let database = database.lock().expect("store lock poisoned");
        let totals = database.day_totals(TEST_START_DATE.date())?;
        assert_eq!(totals[0].seconds, 10);
        // One session row for the whole span despite multiple flushes.
        let sessions = database.sessions_for_day(TEST_START_DATE.date())?;
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].duration_seconds(), 10);
        Ok(())
    }

    /// Fails the first `failures` commits, then delegates to the shared
    /// in-memory database.
    struct FlakyStore {
        failures: u32,
        attempts: Arc<std::sync::Mutex<u32>>,
        inner: Arc<std::sync::Mutex<UsageDatabase>>,
    }

    impl UsageStore for FlakyStore {
        fn commit_batch(&mut self, batch: &UsageBatch) -> Result<()> {
            let mut attempts = self.attempts.lock().expect("store lock poisoned");
            *attempts += 1;
            if *attempts <= self.failures {
                return Err(anyhow!("disk unavailable"));
            }
            self.inner.lock().expect("store lock poisoned").commit_batch(batch)
        }
    }

    #[tokio::test]
    async fn failed_flush_is_retried_without_double_counting() -> Result<()> {
        let attempts = Arc::new(std::sync::Mutex::new(0));
        let database = Arc::new(std::sync::Mutex::new(UsageDatabase::open_in_memory()?));
        let store = FlakyStore {
            failures: 1,
            attempts: attempts.clone(),
            inner: database.clone(),
        };

        drive(store, 4, (0..=10).map(|s| tick(Some("AppA"), s)).collect()).await?;

        assert!(*attempts.lock().expect("store lock poisoned") >= 2);
        let database = database.lock().expect("store lock poisoned");
        let totals = database.day_totals(TEST_START_DATE.date())?;
        assert_eq!(totals[0].seconds, 10);
        Ok(())
    }
}
