use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::dialer::types::{QueueKind, QueueStatus};
use crate::schema::queue_items;

/// One contact pending or being worked for one campaign. Power-dial rows
/// carry no agent until distribution; manual-dial rows belong to an agent
/// and may hold a lock.
#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = queue_items)]
pub struct QueueItem {
    pub id: i64,
    pub queue_kind: QueueKind,
    pub campaign_id: Uuid,
    pub contact_id: Uuid,
    pub account_id: Uuid,
    pub agent_id: Option<Uuid>,
    pub priority: i32,
    pub status: QueueStatus,
    pub locked_by: Option<Uuid>,
    pub lock_expires_at: Option<NaiveDateTime>,
    pub removal_reason: Option<String>,
    pub queued_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = queue_items)]
pub struct NewQueueItem {
    pub queue_kind: QueueKind,
    pub campaign_id: Uuid,
    pub contact_id: Uuid,
    pub account_id: Uuid,
    pub agent_id: Option<Uuid>,
    pub priority: i32,
    pub status: QueueStatus,
}
