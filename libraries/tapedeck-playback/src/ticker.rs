//! Position ticker
//!
//! Periodic task that asks the controller to publish the playback position.
//! One ticker belongs to one prepare request; it is aborted whenever the
//! request ends or playback leaves `Playing`.

use crate::engine::EngineNotifier;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::debug;

/// Shortest accepted tick period
const MIN_TICK_INTERVAL: Duration = Duration::from_millis(10);

/// Cancellable periodic tick task
#[derive(Debug)]
pub struct Ticker {
    period: Duration,
    task: Option<JoinHandle<()>>,
}

impl Ticker {
    /// Create a stopped ticker
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(MIN_TICK_INTERVAL),
            task: None,
        }
    }

    /// Tick period
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Start ticking for the given request, replacing any running task
    ///
    /// Returns false when called outside a tokio runtime; ticks can then be
    /// delivered by hand.
    pub fn start(&mut self, notifier: EngineNotifier) -> bool {
        self.cancel();

        let Ok(runtime) = Handle::try_current() else {
            debug!("No tokio runtime, position ticks disabled");
            return false;
        };

        let period = self.period;
        self.task = Some(runtime.spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                if !notifier.tick() {
                    break;
                }
            }
        }));
        true
    }

    /// Abort the running task, if any
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// Whether a tick task is alive
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.cancel();
    }
}
