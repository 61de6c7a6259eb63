use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Recurring background task: a fixed interval plus a cancellation token.
///
/// Ticks run sequentially on one task, so a slow tick can never overlap the
/// next one; missed ticks are skipped rather than bursted. `start` is a
/// no-op while already running, and `stop` cancels deterministically and is
/// itself idempotent.
pub struct Ticker {
    name: &'static str,
    interval: Duration,
    cancel: CancellationToken,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Ticker {
    pub fn new(name: &'static str, interval: Duration) -> Self {
        Self {
            name,
            interval,
            cancel: CancellationToken::new(),
            handle: Mutex::new(None),
        }
    }

    /// Spawns the tick loop. Returns `false` when the ticker was already
    /// running (or has been stopped for good).
    pub fn start<F, Fut>(self: &Arc<Self>, tick: F) -> bool
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let mut guard = self.handle.lock().expect("ticker handle lock poisoned");
        if guard.is_some() || self.cancel.is_cancelled() {
            return false;
        }

        let name = self.name;
        let period = self.interval;
        let cancel = self.cancel.clone();
        *guard = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first interval tick fires immediately; consume it so the
            // loop waits one full period before the first real tick.
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        tracing::debug!(task = name, "Ticker stopped");
                        return;
                    }
                    _ = interval.tick() => {}
                }
                tick().await;
            }
        }));
        true
    }

    /// Cancels the loop and waits for the in-flight tick to finish. No new
    /// tick starts after this returns.
    pub async fn stop(&self) {
        self.cancel.cancel();
        let handle = self
            .handle
            .lock()
            .expect("ticker handle lock poisoned")
            .take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .lock()
            .expect("ticker handle lock poisoned")
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn start_is_idempotent() {
        let ticker = Arc::new(Ticker::new("test", Duration::from_millis(5)));
        let count = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&count);
        assert!(ticker.start(move || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
            }
        }));
        // Second start while running is a no-op.
        let c = Arc::clone(&count);
        assert!(!ticker.start(move || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1000, Ordering::SeqCst);
            }
        }));

        tokio::time::sleep(Duration::from_millis(30)).await;
        ticker.stop().await;
        let ticks = count.load(Ordering::SeqCst);
        assert!(ticks >= 1 && ticks < 1000, "ticks = {ticks}");
    }

    #[tokio::test]
    async fn stop_halts_ticks_and_is_idempotent() {
        let ticker = Arc::new(Ticker::new("test", Duration::from_millis(5)));
        let count = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&count);
        ticker.start(move || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        ticker.stop().await;
        let after_stop = count.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(count.load(Ordering::SeqCst), after_stop);

        // Idempotent stop, and no restart after stop.
        ticker.stop().await;
        assert!(!ticker.is_running());
        let c = Arc::clone(&count);
        assert!(!ticker.start(move || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
            }
        }));
    }
}
