use std::sync::Arc;
use std::time::Duration;

use crate::dialer::distributor::CallDistributor;
use crate::dialer::pacing::PacingController;
use crate::dialer::ticker::Ticker;
use crate::error::AppResult;
use crate::repositories::Repositories;

/// Drives the dial loop. Each tick walks the active campaigns, asks the
/// pacing controller how many calls to place, and hands the batch to the
/// distributor. One campaign failing never stops the others.
pub struct DialerScheduler {
    repos: Repositories,
    pacing: Arc<PacingController>,
    distributor: Arc<CallDistributor>,
    ticker: Arc<Ticker>,
    /// When set, agents in after-call work are deducted from the idle count
    /// before sizing the batch, damping over-dial under bursty call endings.
    reserve_wrapup_headroom: bool,
}

impl DialerScheduler {
    pub fn new(
        repos: Repositories,
        pacing: Arc<PacingController>,
        distributor: Arc<CallDistributor>,
        tick_interval: Duration,
        reserve_wrapup_headroom: bool,
    ) -> Self {
        Self {
            repos,
            pacing,
            distributor,
            ticker: Arc::new(Ticker::new("dialer-scheduler", tick_interval)),
            reserve_wrapup_headroom,
        }
    }

    /// Starts the tick loop. Returns `false` when already running.
    pub fn start(self: &Arc<Self>) -> bool {
        let scheduler = Arc::clone(self);
        self.ticker.start(move || {
            let scheduler = Arc::clone(&scheduler);
            async move {
                if let Err(e) = scheduler.tick().await {
                    tracing::error!(error = %e, "Scheduler tick failed");
                }
            }
        })
    }

    pub async fn stop(&self) {
        self.ticker.stop().await;
    }

    pub fn is_running(&self) -> bool {
        self.ticker.is_running()
    }

    async fn tick(&self) -> AppResult<()> {
        let campaigns = self.repos.campaigns.active_dialer_campaigns().await?;

        for campaign in campaigns {
            if let Err(e) = self.run_campaign(&campaign).await {
                tracing::error!(
                    campaign_id = %campaign.id,
                    error = %e,
                    "Campaign pass failed; continuing with next campaign"
                );
            }
        }

        Ok(())
    }

    async fn run_campaign(&self, campaign: &crate::models::Campaign) -> AppResult<()> {
        let idle = self.repos.agents.idle_agents(campaign.id).await?;
        let mut idle_count = idle.len();
        if self.reserve_wrapup_headroom {
            let wrapping = self.repos.agents.wrap_up_count(campaign.id).await? as usize;
            idle_count = idle_count.saturating_sub(wrapping);
        }
        let batch = self.pacing.calls_to_place(campaign, idle_count);
        if batch == 0 {
            return Ok(());
        }

        let report = self.distributor.distribute(campaign, &idle, batch).await?;
        if report.dialed > 0 || report.removed > 0 {
            tracing::debug!(
                campaign_id = %campaign.id,
                dialed = report.dialed,
                removed = report.removed,
                deferred = report.deferred_outside_hours,
                lost_races = report.lost_races,
                "Distribution pass complete"
            );
        }

        Ok(())
    }
}
