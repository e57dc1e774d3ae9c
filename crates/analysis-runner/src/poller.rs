//! Owned cancelable polling task
//!
//! At most one polling task is active at a time: `start` refuses while
//! a timer is running and `stop` is idempotent. Ticks execute
//! sequentially inside a single task, so a status fetch that outlives
//! the interval can never overlap the next tick; missed ticks are
//! skipped.

use std::future::Future;
use std::ops::ControlFlow;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// Handle owning at most one periodic polling task
pub struct Poller {
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Poller {
    /// Create a poller with no active task
    pub fn new() -> Self {
        Self {
            handle: Mutex::new(None),
        }
    }

    /// Start a periodic task running `tick` at the given interval.
    ///
    /// The first tick fires one full interval after start. The task
    /// ends when `tick` returns `ControlFlow::Break` or when [`stop`]
    /// is called. Returns `false` without starting anything when a
    /// timer is already active.
    ///
    /// [`stop`]: Poller::stop
    pub async fn start<F, Fut>(&self, interval: Duration, mut tick: F) -> bool
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ControlFlow<()>> + Send + 'static,
    {
        let mut guard = self.handle.lock().await;
        if let Some(handle) = guard.as_ref() {
            if !handle.is_finished() {
                return false;
            }
        }

        let task = tokio::spawn(async move {
            let mut timer = tokio::time::interval(interval);
            timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first interval tick completes immediately; consume
            // it so ticks start one interval after start.
            timer.tick().await;

            loop {
                timer.tick().await;
                if let ControlFlow::Break(()) = tick().await {
                    debug!("Polling task finished");
                    break;
                }
            }
        });

        *guard = Some(task);
        true
    }

    /// Check whether a polling task is currently active
    pub async fn is_active(&self) -> bool {
        self.handle
            .lock()
            .await
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Stop the active polling task, if any. Idempotent.
    pub async fn stop(&self) {
        if let Some(handle) = self.handle.lock().await.take() {
            handle.abort();
            debug!("Polling task stopped");
        }
    }
}

impl Default for Poller {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn test_ticks_run_until_break() {
        let poller = Poller::new();
        let count = Arc::new(AtomicU32::new(0));

        let ticks = Arc::clone(&count);
        let started = poller
            .start(Duration::from_millis(5), move || {
                let n = ticks.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n >= 3 {
                        ControlFlow::Break(())
                    } else {
                        ControlFlow::Continue(())
                    }
                }
            })
            .await;
        assert!(started);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert!(!poller.is_active().await);
    }

    #[tokio::test]
    async fn test_second_start_is_refused_while_active() {
        let poller = Poller::new();

        let started = poller
            .start(Duration::from_millis(5), || async {
                ControlFlow::Continue(())
            })
            .await;
        assert!(started);

        let second = poller
            .start(Duration::from_millis(5), || async {
                ControlFlow::Break(())
            })
            .await;
        assert!(!second);
        assert!(poller.is_active().await);

        poller.stop().await;
    }

    #[tokio::test]
    async fn test_stop_is_idempotent_and_allows_restart() {
        let poller = Poller::new();
        let count = Arc::new(AtomicU32::new(0));

        let ticks = Arc::clone(&count);
        poller
            .start(Duration::from_millis(5), move || {
                ticks.fetch_add(1, Ordering::SeqCst);
                async { ControlFlow::Continue(()) }
            })
            .await;

        poller.stop().await;
        poller.stop().await;
        assert!(!poller.is_active().await);

        let ticked = count.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(count.load(Ordering::SeqCst), ticked);

        // A new timer may start after stop
        let restarted = poller
            .start(Duration::from_millis(5), || async {
                ControlFlow::Break(())
            })
            .await;
        assert!(restarted);
        poller.stop().await;
    }

    #[tokio::test]
    async fn test_slow_tick_does_not_overlap() {
        let poller = Poller::new();
        let in_flight = Arc::new(AtomicU32::new(0));
        let overlaps = Arc::new(AtomicU32::new(0));

        let flight = Arc::clone(&in_flight);
        let seen = Arc::clone(&overlaps);
        poller
            .start(Duration::from_millis(2), move || {
                let flight = Arc::clone(&flight);
                let seen = Arc::clone(&seen);
                async move {
                    if flight.fetch_add(1, Ordering::SeqCst) > 0 {
                        seen.fetch_add(1, Ordering::SeqCst);
                    }
                    // Slower than the interval
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    flight.fetch_sub(1, Ordering::SeqCst);
                    ControlFlow::Continue(())
                }
            })
            .await;

        tokio::time::sleep(Duration::from_millis(60)).await;
        poller.stop().await;
        assert_eq!(overlaps.load(Ordering::SeqCst), 0);
    }
}
