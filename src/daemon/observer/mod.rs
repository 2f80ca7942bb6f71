//! Polls the foreground window on a fixed interval and emits one [TickEvent]
//! per poll. Idle users, system processes and failed OS queries all produce
//! an unfocused tick instead of an error; tracking resumes on the next poll.

pub mod idle;
pub mod normalize;

use std::{sync::Arc, time::Duration};

use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::{utils::clock::Clock, window_api::WindowManager};

use idle::IdleEvaluator;

/// One observation of the foreground state. `focus` is `None` when no window
/// is focused, the user is idle, or the OS query failed.
#[derive(Debug, Clone)]
pub struct TickEvent {
    pub focus: Option<Arc<str>>,
    pub timestamp: DateTime<Utc>,
}

pub struct WindowObserverModule {
    next: mpsc::Sender<TickEvent>,
    manager: Box<dyn WindowManager>,
    shutdown: CancellationToken,
    idle_evaluator: IdleEvaluator,
    poll_interval: Duration,
    clock: Box<dyn Clock>,
}

impl WindowObserverModule {
    pub fn new(
        next: mpsc::Sender<TickEvent>,
        manager: Box<dyn WindowManager>,
        shutdown: CancellationToken,
        idle_evaluator: IdleEvaluator,
        poll_interval: Duration,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            next,
            manager,
            shutdown,
            idle_evaluator,
            poll_interval,
            clock,
        }
    }

    /// Samples the foreground application. `Ok(None)` covers idle users and
    /// filtered system processes; query errors bubble up to [observe].
    fn sample_focus(&mut self) -> Result<Option<Arc<str>>> {
        let idle_ms = self.manager.get_idle_time()?;
        if self.idle_evaluator.is_idle(idle_ms) {
            return Ok(None);
        }
        let window = self.manager.get_active_window_data()?;
        Ok(normalize::app_identity(&window.process_name))
    }

    fn observe(&mut self) -> TickEvent {
        let timestamp = self.clock.time();
        let focus = match self.sample_focus() {
            Ok(focus) => focus,
            Err(e) => {
                // Treated as unknown rather than fatal.
                warn!("Window query failed, recording tick as idle {e:?}");
                None
            }
        };
        TickEvent { focus, timestamp }
    }

    /// Executes the polling event loop.
    pub async fn run(mut self) -> Result<()> {
        let mut poll_point = self.clock.instant();
        loop {
            poll_point += self.poll_interval;

            let tick = self.observe();
            debug!("Sending tick {:?}", tick);
            self.next
                .send(tick)
                .await
                .inspect_err(|e| error!("Unexpected error during sending {e:?}"))?;

            tokio::select! {
                // Cancelation stops the loop, which drops the sender and in
                // turn lets the aggregator finalize.
                _ = self.shutdown.cancelled() => {
                    return Ok(())
                }
                _ = self.clock.sleep_until(poll_point) => ()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use anyhow::{anyhow, Result};
    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;

    use crate::{
        utils::clock::DefaultClock,
        window_api::{ActiveWindowData, MockWindowManager},
    };

    use super::{idle::IdleEvaluator, WindowObserverModule};

    fn observer_with(
        manager: MockWindowManager,
        sender: mpsc::Sender<super::TickEvent>,
        shutdown: &CancellationToken,
    ) -> WindowObserverModule {
        WindowObserverModule::new(
            sender,
            Box::new(manager),
            shutdown.clone(),
            IdleEvaluator::from_seconds(120),
            Duration::from_millis(50),
            Box::new(DefaultClock),
        )
    }

    #[tokio::test]
    async fn failed_query_becomes_idle_tick() -> Result<()> {
        let mut manager = MockWindowManager::new();
        manager.expect_get_idle_time().returning(|| Ok(0));
        manager
            .expect_get_active_window_data()
            .returning(|| Err(anyhow!("query failed")));

        let (sender, mut receiver) = mpsc::channel(4);
        let shutdown = CancellationToken::new();
        let observer = observer_with(manager, sender, &shutdown);

        let handle = tokio::spawn(observer.run());
        let tick = receiver.recv().await.expect("observer should keep ticking");
        assert!(tick.focus.is_none());
        shutdown.cancel();
        handle.await??;
        Ok(())
    }

    #[tokio::test]
    async fn idle_user_yields_unfocused_tick() -> Result<()> {
        let mut manager = MockWindowManager::new();
        manager.expect_get_idle_time().returning(|| Ok(10 * 60 * 1000));

        let (sender, mut receiver) = mpsc::channel(4);
        let shutdown = CancellationToken::new();
        let observer = observer_with(manager, sender, &shutdown);

        let handle = tokio::spawn(observer.run());
        let tick = receiver.recv().await.expect("observer should keep ticking");
        assert!(tick.focus.is_none());
        shutdown.cancel();
        handle.await??;
        Ok(())
    }

    #[tokio::test]
    async fn active_window_is_normalized() -> Result<()> {
        let mut manager = MockWindowManager::new();
        manager.expect_get_idle_time().returning(|| Ok(0));
        manager.expect_get_active_window_data().returning(|| {
            Ok(ActiveWindowData {
                window_title: "inbox - personal".into(),
                process_name: r"C:\Program Files\Mozilla Firefox\firefox.exe".into(),
            })
        });

        let (sender, mut receiver) = mpsc::channel(4);
        let shutdown = CancellationToken::new();
        let observer = observer_with(manager, sender, &shutdown);

        let handle = tokio::spawn(observer.run());
        let tick = receiver.recv().await.expect("observer should keep ticking");
        assert_eq!(tick.focus.as_deref(), Some("Mozilla Firefox"));
        shutdown.cancel();
        handle.await??;
        Ok(())
    }
}
