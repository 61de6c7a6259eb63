//! Pacing snapshot DTOs.

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dialer::pacing::PacingMetrics;

/// Point-in-time view of one campaign's pacing controller.
#[derive(Debug, Serialize, ToSchema)]
pub struct PacingSnapshotResponse {
    pub campaign_id: Uuid,
    pub calls_initiated: u64,
    pub calls_answered: u64,
    pub calls_abandoned: u64,
    pub abandon_rate: f64,
    pub target_abandon_rate: f64,
    pub current_dial_ratio: f64,
}

impl PacingSnapshotResponse {
    pub fn from_metrics(campaign_id: Uuid, metrics: PacingMetrics) -> Self {
        Self {
            campaign_id,
            calls_initiated: metrics.calls_initiated,
            calls_answered: metrics.calls_answered,
            calls_abandoned: metrics.calls_abandoned,
            abandon_rate: metrics.abandon_rate,
            target_abandon_rate: metrics.target_abandon_rate,
            current_dial_ratio: metrics.current_dial_ratio,
        }
    }
}
