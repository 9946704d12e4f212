use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

const TICK: Duration = Duration::from_secs(1);

/// Once-a-second display counter for a running quiz.
///
/// Purely cosmetic: completion time comes from the clock, not from here.
/// The tick task is stopped at most once and aborted on drop.
#[derive(Debug)]
pub struct SessionTimer {
    ticks: watch::Receiver<u64>,
    handle: Option<JoinHandle<()>>,
}

impl SessionTimer {
    /// Spawn the tick task. Must be called inside a tokio runtime.
    #[must_use]
    pub fn start() -> Self {
        let (tx, rx) = watch::channel(0_u64);
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(TICK);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // first tick completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                tx.send_modify(|seconds| *seconds += 1);
                if tx.is_closed() {
                    break;
                }
            }
        });
        Self {
            ticks: rx,
            handle: Some(handle),
        }
    }

    /// Seconds counted so far.
    #[must_use]
    pub fn elapsed_seconds(&self) -> u64 {
        *self.ticks.borrow()
    }

    /// A receiver notified on every tick, for views that redraw the counter.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.ticks.clone()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Stop ticking. Returns the final count the first time only.
    pub fn stop(&mut self) -> Option<u64> {
        let handle = self.handle.take()?;
        handle.abort();
        Some(self.elapsed_seconds())
    }
}

impl Drop for SessionTimer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
