use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::Serialize;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::dialer::types::{AmdVerdict, CallDisposition};
use crate::schema::{call_attempts, call_events, leads};

/// One outbound call attempt. Created at dial time, mutated when the AMD
/// verdict arrives and when the call ends, immutable thereafter.
#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = call_attempts)]
pub struct CallAttempt {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub contact_id: Uuid,
    pub account_id: Uuid,
    pub agent_id: Option<Uuid>,
    pub queue_item_id: Option<i64>,
    pub phone: String,
    pub started_at: NaiveDateTime,
    pub connected_at: Option<NaiveDateTime>,
    pub ended_at: Option<NaiveDateTime>,
    pub duration_secs: Option<i32>,
    pub disposition: Option<CallDisposition>,
    pub amd_verdict: Option<AmdVerdict>,
    pub amd_confidence: Option<f64>,
    pub recording_url: Option<String>,
    pub vm_asset_id: Option<Uuid>,
    pub vm_delivered: bool,
    pub vm_duration_secs: Option<i32>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = call_attempts)]
pub struct NewCallAttempt {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub contact_id: Uuid,
    pub account_id: Uuid,
    pub agent_id: Option<Uuid>,
    pub queue_item_id: Option<i64>,
    pub phone: String,
}

/// Append-only audit trail entry for one attempt.
#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = call_events)]
pub struct CallEvent {
    pub id: i64,
    pub attempt_id: Uuid,
    pub event_type: String,
    pub payload: Option<JsonValue>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = call_events)]
pub struct NewCallEvent {
    pub attempt_id: Uuid,
    pub event_type: String,
    pub payload: Option<JsonValue>,
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = leads)]
pub struct Lead {
    pub id: Uuid,
    pub attempt_id: Uuid,
    pub campaign_id: Uuid,
    pub contact_id: Uuid,
    pub account_id: Uuid,
    pub agent_id: Option<Uuid>,
    pub status: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = leads)]
pub struct NewLead {
    pub attempt_id: Uuid,
    pub campaign_id: Uuid,
    pub contact_id: Uuid,
    pub account_id: Uuid,
    pub agent_id: Option<Uuid>,
    pub status: String,
}
