use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeDelta, Utc};

use crate::dialer::ticker::Ticker;
use crate::error::AppResult;
use crate::repositories::Repositories;

/// Janitor for queue rows stranded by crashed sessions: expired manual
/// locks go back to queued, and items stuck in-progress past the stale
/// cutoff are reverted.
pub struct LockSweeper {
    repos: Repositories,
    stale_in_progress: TimeDelta,
    ticker: Arc<Ticker>,
}

impl LockSweeper {
    pub fn new(repos: Repositories, sweep_interval: Duration, stale_in_progress_secs: i64) -> Self {
        Self {
            repos,
            stale_in_progress: TimeDelta::seconds(stale_in_progress_secs),
            ticker: Arc::new(Ticker::new("lock-sweeper", sweep_interval)),
        }
    }

    pub fn start(self: &Arc<Self>) -> bool {
        let sweeper = Arc::clone(self);
        self.ticker.start(move || {
            let sweeper = Arc::clone(&sweeper);
            async move {
                if let Err(e) = sweeper.sweep().await {
                    tracing::error!(error = %e, "Lock sweep failed");
                }
            }
        })
    }

    pub async fn stop(&self) {
        self.ticker.stop().await;
    }

    pub async fn sweep(&self) -> AppResult<()> {
        let now = Utc::now().naive_utc();

        let released = self.repos.queue.release_expired_locks(now).await?;
        let reverted = self
            .repos
            .queue
            .revert_stale_in_progress(now - self.stale_in_progress)
            .await?;

        if released > 0 || reverted > 0 {
            tracing::info!(released, reverted, "Swept stranded queue items");
        }

        Ok(())
    }
}
