use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::daemon::storage::entities::{SessionInterval, UsageBatch};

/// The interval currently being accumulated. `attributed_to` is a watermark:
/// seconds before it already sit in the pending batch, so a crash loses at
/// most the stretch between the watermark and now.
#[derive(Debug)]
struct OpenInterval {
    app_name: Arc<str>,
    started_at: DateTime<Utc>,
    attributed_to: DateTime<Utc>,
}

/// State machine behind the aggregator. Owns the open interval and the
/// pending flush batch; knows nothing about the database or the channel.
#[derive(Debug, Default)]
pub struct UsageTracker {
    current: Option<OpenInterval>,
    pending: UsageBatch,
}

impl UsageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one observation. A focus change closes the prior interval,
    /// attributing its remaining duration, and opens a new one at `now`.
    /// Repeated ticks for the same application leave the interval open.
    pub fn record_tick(&mut self, focus: Option<Arc<str>>, now: DateTime<Utc>) {
        let same_app = matches!(
            (&self.current, &focus),
            (Some(open), Some(app)) if open.app_name == *app
        );
        if same_app {
            return;
        }

        self.close_current(now);
        if let Some(app_name) = focus {
            self.current = Some(OpenInterval {
                app_name,
                started_at: now,
                attributed_to: now,
            });
        }
    }

    /// Moves the attribution watermark of the open interval up to `now`,
    /// adding the elapsed whole seconds to the pending totals. Called before
    /// each flush so long-lived focus still persists incrementally.
    pub fn attribute_open(&mut self, now: DateTime<Utc>) {
        if let Some(open) = self.current.as_mut() {
            let seconds = (now - open.attributed_to).num_seconds();
            if seconds <= 0 {
                return;
            }
            self.pending
                .add_seconds(open.attributed_to.date_naive(), open.app_name.clone(), seconds);
            // Advance by whole seconds so sub-second remainders carry over
            // instead of being dropped at every flush.
            open.attributed_to += Duration::seconds(seconds);
        }
    }

    /// Closes the open interval at `now`, recording its session row and any
    /// unattributed tail. Used for focus changes and daemon shutdown.
    pub fn close_current(&mut self, now: DateTime<Utc>) {
        self.attribute_open(now);
        if let Some(open) = self.current.take() {
            let session = SessionInterval {
                app_name: open.app_name,
                started_at: open.started_at,
                ended_at: now.max(open.started_at),
            };
            if session.duration_seconds() > 0 {
                self.pending.push_session(session);
            }
        }
    }

    pub fn pending(&self) -> &UsageBatch {
        &self.pending
    }

    /// Called after a successful commit. Until then the batch stays put so a
    /// failed flush is retried whole on the next cycle.
    pub fn clear_pending(&mut self) {
        self.pending.clear();
    }
}
