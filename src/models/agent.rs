use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::dialer::types::AgentState;
use crate::schema::agent_statuses;

/// Per-agent availability row. An agent is busy for at most one attempt
/// at a time; state changes flow through the lifecycle manager and the
/// queue-assignment rollback path only.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, Serialize)]
#[diesel(table_name = agent_statuses)]
pub struct AgentStatus {
    pub agent_id: Uuid,
    pub state: AgentState,
    pub campaign_id: Option<Uuid>,
    pub current_attempt_id: Option<Uuid>,
    pub last_state_change_at: NaiveDateTime,
    pub last_call_ended_at: Option<NaiveDateTime>,
    pub calls_today: i32,
    pub talk_time_today_secs: i64,
    pub updated_at: NaiveDateTime,
}
