use dashmap::DashMap;
use serde::Serialize;
use uuid::Uuid;

use crate::dialer::types::DialMode;
use crate::models::Campaign;

/// Tuning knobs for the predictive controller.
#[derive(Debug, Clone)]
pub struct PacingConfig {
    /// Answered+abandoned samples required before the ratio adapts.
    pub min_samples: u64,
    /// Dead band around the target abandon rate (absolute).
    pub tolerance: f64,
    /// Relative ratio adjustment per cycle.
    pub step: f64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            min_samples: 20,
            tolerance: 0.01,
            step: 0.10,
        }
    }
}

/// Per-campaign pacing counters and the current dial ratio.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct PacingMetrics {
    pub calls_initiated: u64,
    pub calls_answered: u64,
    pub calls_abandoned: u64,
    pub abandon_rate: f64,
    pub target_abandon_rate: f64,
    pub current_dial_ratio: f64,
}

impl PacingMetrics {
    fn new(campaign: &Campaign) -> Self {
        Self {
            calls_initiated: 0,
            calls_answered: 0,
            calls_abandoned: 0,
            abandon_rate: 0.0,
            target_abandon_rate: campaign.target_abandon_rate,
            current_dial_ratio: campaign.base_dial_ratio,
        }
    }

    fn samples(&self) -> u64 {
        self.calls_answered + self.calls_abandoned
    }

    fn recompute_abandon_rate(&mut self) {
        let samples = self.samples();
        self.abandon_rate = if samples == 0 {
            0.0
        } else {
            self.calls_abandoned as f64 / samples as f64
        };
    }
}

/// Per-campaign feedback loop sizing each dial batch.
///
/// Predictive pacing is a bounded proportional controller: once enough
/// samples exist, the dial ratio steps down 10% when the observed abandon
/// rate runs more than a point above target (floor 1.0) and steps up 10%
/// when it runs more than a point below (ceiling: the campaign's base
/// ratio). The metrics map lives in process memory only; a restart starts
/// the controller over from the campaign's base ratio.
pub struct PacingController {
    config: PacingConfig,
    metrics: DashMap<Uuid, PacingMetrics>,
}

impl PacingController {
    pub fn new(config: PacingConfig) -> Self {
        Self {
            config,
            metrics: DashMap::new(),
        }
    }

    /// Calls to place this cycle for one campaign.
    pub fn calls_to_place(&self, campaign: &Campaign, idle_agents: usize) -> usize {
        match campaign.dial_mode {
            DialMode::Preview => 0,
            DialMode::Progressive => idle_agents.min(campaign.max_concurrent_calls.max(0) as usize),
            DialMode::Predictive => {
                let ratio = self.adapt_ratio(campaign);
                (idle_agents as f64 * ratio).floor() as usize
            }
        }
    }

    /// One controller step; returns the ratio to dial with this cycle.
    fn adapt_ratio(&self, campaign: &Campaign) -> f64 {
        let mut entry = self
            .metrics
            .entry(campaign.id)
            .or_insert_with(|| PacingMetrics::new(campaign));

        if entry.samples() >= self.config.min_samples {
            let error = entry.abandon_rate - campaign.target_abandon_rate;
            if error > self.config.tolerance {
                entry.current_dial_ratio =
                    (entry.current_dial_ratio * (1.0 - self.config.step)).max(1.0);
            } else if error < -self.config.tolerance {
                entry.current_dial_ratio = (entry.current_dial_ratio
                    * (1.0 + self.config.step))
                    .min(campaign.base_dial_ratio);
            }
        }
        entry.current_dial_ratio
    }

    pub fn record_initiated(&self, campaign: &Campaign, calls: u64) {
        let mut entry = self
            .metrics
            .entry(campaign.id)
            .or_insert_with(|| PacingMetrics::new(campaign));
        entry.calls_initiated += calls;
    }

    pub fn record_answered(&self, campaign: &Campaign) {
        let mut entry = self
            .metrics
            .entry(campaign.id)
            .or_insert_with(|| PacingMetrics::new(campaign));
        entry.calls_answered += 1;
        entry.recompute_abandon_rate();
    }

    pub fn record_abandoned(&self, campaign: &Campaign) {
        let mut entry = self
            .metrics
            .entry(campaign.id)
            .or_insert_with(|| PacingMetrics::new(campaign));
        entry.calls_abandoned += 1;
        entry.recompute_abandon_rate();
    }

    /// Current metrics for one campaign, for observability and tests.
    pub fn snapshot(&self, campaign_id: Uuid) -> Option<PacingMetrics> {
        self.metrics.get(&campaign_id).map(|m| m.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialer::types::{AmdFallback, DialMode};
    use chrono::NaiveDateTime;

    fn campaign(mode: DialMode, base_ratio: f64, max_concurrent: i32) -> Campaign {
        Campaign {
            id: Uuid::new_v4(),
            name: "test".to_string(),
            dial_mode: mode,
            dialer_active: true,
            base_dial_ratio: base_ratio,
            max_concurrent_calls: max_concurrent,
            target_abandon_rate: 0.03,
            amd_enabled: true,
            amd_confidence_threshold: 0.7,
            amd_fallback: AmdFallback::Agent,
            utc_offset_minutes: 0,
            calling_window_start: None,
            calling_window_end: None,
            max_leads: None,
            vm_action: None,
            vm_tts_template: None,
            vm_asset_id: None,
            vm_max_per_contact: 3,
            vm_daily_cap: None,
            vm_cooldown_hours: 24,
            vm_window_start: None,
            vm_window_end: None,
            callback_delay_minutes: 120,
            created_at: NaiveDateTime::default(),
            updated_at: NaiveDateTime::default(),
        }
    }

    fn seed_samples(controller: &PacingController, campaign: &Campaign, answered: u64, abandoned: u64) {
        for _ in 0..answered {
            controller.record_answered(campaign);
        }
        for _ in 0..abandoned {
            controller.record_abandoned(campaign);
        }
    }

    #[test]
    fn progressive_is_min_of_idle_and_max_concurrent() {
        let controller = PacingController::new(PacingConfig::default());
        let c = campaign(DialMode::Progressive, 1.5, 5);
        assert_eq!(controller.calls_to_place(&c, 3), 3);
        assert_eq!(controller.calls_to_place(&c, 8), 5);
    }

    #[test]
    fn preview_places_nothing() {
        let controller = PacingController::new(PacingConfig::default());
        let c = campaign(DialMode::Preview, 1.5, 5);
        assert_eq!(controller.calls_to_place(&c, 10), 0);
    }

    #[test]
    fn predictive_reduces_ratio_when_abandons_run_hot() {
        let controller = PacingController::new(PacingConfig::default());
        let c = campaign(DialMode::Predictive, 1.5, 5);
        // 25 samples at a 6% abandon rate against a 3% target.
        seed_samples(&controller, &c, 23, 2);
        {
            let mut entry = controller.metrics.get_mut(&c.id).unwrap();
            entry.calls_abandoned = 0;
            entry.calls_answered = 25;
            entry.abandon_rate = 0.06;
        }

        let batch = controller.calls_to_place(&c, 10);
        let metrics = controller.snapshot(c.id).unwrap();
        assert!((metrics.current_dial_ratio - 1.35).abs() < 1e-9);
        assert_eq!(batch, 13); // floor(10 * 1.35)
    }

    #[test]
    fn predictive_holds_until_enough_samples() {
        let controller = PacingController::new(PacingConfig::default());
        let c = campaign(DialMode::Predictive, 1.5, 5);
        seed_samples(&controller, &c, 5, 5); // 50% abandon, 10 samples
        controller.calls_to_place(&c, 10);
        let metrics = controller.snapshot(c.id).unwrap();
        assert!((metrics.current_dial_ratio - 1.5).abs() < 1e-9);
    }

    #[test]
    fn ratio_converges_to_floor_without_undershooting() {
        let controller = PacingController::new(PacingConfig::default());
        let c = campaign(DialMode::Predictive, 2.0, 5);
        seed_samples(&controller, &c, 10, 15); // abandon rate stays high

        let mut prev = f64::MAX;
        for _ in 0..100 {
            controller.calls_to_place(&c, 10);
            let ratio = controller.snapshot(c.id).unwrap().current_dial_ratio;
            assert!(ratio <= prev, "ratio must decrease monotonically");
            assert!(ratio >= 1.0, "ratio must never drop below 1.0");
            prev = ratio;
        }
        assert!((prev - 1.0).abs() < 1e-6);
    }

    #[test]
    fn ratio_recovers_but_never_exceeds_base() {
        let controller = PacingController::new(PacingConfig::default());
        let c = campaign(DialMode::Predictive, 1.5, 5);
        // Drive the ratio down first.
        seed_samples(&controller, &c, 10, 15);
        for _ in 0..20 {
            controller.calls_to_place(&c, 10);
        }
        // Then hold the abandon rate at zero.
        {
            let mut entry = controller.metrics.get_mut(&c.id).unwrap();
            entry.calls_abandoned = 0;
            entry.calls_answered = 50;
            entry.abandon_rate = 0.0;
        }
        let mut prev = 0.0;
        for _ in 0..100 {
            controller.calls_to_place(&c, 10);
            let ratio = controller.snapshot(c.id).unwrap().current_dial_ratio;
            assert!(ratio >= prev, "ratio must increase monotonically");
            assert!(ratio <= c.base_dial_ratio + 1e-9, "ratio must respect the base ceiling");
            prev = ratio;
        }
        assert!((prev - 1.5).abs() < 1e-6);
    }

    proptest::proptest! {
        #[test]
        fn ratio_stays_within_bounds(
            answered in 0u64..500,
            abandoned in 0u64..500,
            cycles in 1usize..50,
            base in 1.0f64..4.0,
        ) {
            let controller = PacingController::new(PacingConfig::default());
            let c = campaign(DialMode::Predictive, base, 5);
            seed_samples(&controller, &c, answered, abandoned);
            for _ in 0..cycles {
                controller.calls_to_place(&c, 10);
                let ratio = controller.snapshot(c.id).unwrap().current_dial_ratio;
                proptest::prop_assert!(ratio >= 1.0 - 1e-9);
                proptest::prop_assert!(ratio <= base + 1e-9);
            }
        }
    }
}
