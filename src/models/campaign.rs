use chrono::{NaiveDateTime, NaiveTime};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::dialer::types::{AmdFallback, DialMode, VmAction};
use crate::schema::campaigns;

/// Campaign configuration as read by the dialer engine. The CRM surface
/// that edits these rows lives outside this service.
#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = campaigns)]
pub struct Campaign {
    pub id: Uuid,
    pub name: String,
    pub dial_mode: DialMode,
    pub dialer_active: bool,
    pub base_dial_ratio: f64,
    pub max_concurrent_calls: i32,
    pub target_abandon_rate: f64,
    pub amd_enabled: bool,
    pub amd_confidence_threshold: f64,
    pub amd_fallback: AmdFallback,
    pub utc_offset_minutes: i32,
    pub calling_window_start: Option<NaiveTime>,
    pub calling_window_end: Option<NaiveTime>,
    pub max_leads: Option<i32>,
    pub vm_action: Option<VmAction>,
    pub vm_tts_template: Option<String>,
    pub vm_asset_id: Option<Uuid>,
    pub vm_max_per_contact: i32,
    pub vm_daily_cap: Option<i32>,
    pub vm_cooldown_hours: i32,
    pub vm_window_start: Option<NaiveTime>,
    pub vm_window_end: Option<NaiveTime>,
    pub callback_delay_minutes: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
