use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::dialer::types::{AudienceSource, SuppressionScope};
use crate::schema::{activity_logs, audience_members, suppression_entries, voicemail_tracking};

/// Per (contact, campaign) voicemail bookkeeping for cap and cooldown
/// enforcement. Mutated only by the voicemail policy executor.
#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = voicemail_tracking)]
pub struct VoicemailTracking {
    pub id: i64,
    pub contact_id: Uuid,
    pub campaign_id: Uuid,
    pub vm_count: i32,
    pub last_vm_at: NaiveDateTime,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = suppression_entries)]
pub struct SuppressionEntry {
    pub id: i64,
    pub scope: SuppressionScope,
    pub campaign_id: Option<Uuid>,
    pub contact_id: Option<Uuid>,
    pub account_id: Option<Uuid>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub reason: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = suppression_entries)]
pub struct NewSuppressionEntry {
    pub scope: SuppressionScope,
    pub campaign_id: Option<Uuid>,
    pub contact_id: Option<Uuid>,
    pub account_id: Option<Uuid>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = audience_members)]
pub struct AudienceMember {
    pub id: i64,
    pub campaign_id: Uuid,
    pub contact_id: Uuid,
    pub source: AudienceSource,
    pub added_at: NaiveDateTime,
}

/// Aggregate counter row shared by campaign_stats and account_stats reads.
#[derive(Debug, Clone, Copy, Default, Queryable, Serialize)]
pub struct StatCounters {
    pub queued_count: i64,
    pub connected_count: i64,
    pub positive_count: i64,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = activity_logs)]
pub struct NewActivityLog {
    pub contact_id: Uuid,
    pub kind: String,
    pub body: String,
}
