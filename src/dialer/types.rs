use diesel_derive_enum::DbEnum;
use serde::{Deserialize, Serialize};

/// How a campaign's dialer paces outbound calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, DbEnum, utoipa::ToSchema)]
#[db_enum(existing_type_path = "crate::schema::sql_types::DialMode")]
#[serde(rename_all = "lowercase")]
pub enum DialMode {
    /// One call per idle agent, capped by the configured concurrency.
    Progressive,
    /// Over-dial by the adaptive dial ratio.
    Predictive,
    /// Agent-initiated dialing only; the scheduler places nothing.
    Preview,
}

/// Which queue flavor a row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, DbEnum, utoipa::ToSchema)]
#[db_enum(existing_type_path = "crate::schema::sql_types::QueueKind")]
#[serde(rename_all = "lowercase")]
pub enum QueueKind {
    /// Campaign-wide power-dial queue worked by the scheduler.
    Power,
    /// Per-agent manual-dial queue with lock ownership.
    Manual,
}

/// Queue item lifecycle. Exactly one value holds at any instant; every
/// transition is conditional on the previously observed status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, DbEnum, utoipa::ToSchema)]
#[db_enum(existing_type_path = "crate::schema::sql_types::QueueStatus")]
#[serde(rename_all = "snake_case")]
pub enum QueueStatus {
    Queued,
    Calling,
    Locked,
    InProgress,
    Done,
    Removed,
}

impl QueueStatus {
    /// Statuses that count as "actively held" for collision checks.
    pub const ACTIVE: [QueueStatus; 4] = [
        QueueStatus::Queued,
        QueueStatus::Calling,
        QueueStatus::Locked,
        QueueStatus::InProgress,
    ];
}

/// Agent availability state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, DbEnum, utoipa::ToSchema)]
#[db_enum(existing_type_path = "crate::schema::sql_types::AgentState")]
#[serde(rename_all = "snake_case")]
pub enum AgentState {
    Available,
    Busy,
    AfterCallWork,
}

/// Answering-machine-detection classification from the call-control provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, DbEnum, utoipa::ToSchema)]
#[db_enum(existing_type_path = "crate::schema::sql_types::AmdVerdict")]
#[serde(rename_all = "lowercase")]
pub enum AmdVerdict {
    Human,
    Machine,
    Unknown,
}

/// Where an unknown/low-confidence AMD result is routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, DbEnum, utoipa::ToSchema)]
#[db_enum(existing_type_path = "crate::schema::sql_types::AmdFallback")]
#[serde(rename_all = "lowercase")]
pub enum AmdFallback {
    Agent,
    Voicemail,
}

/// Outcome code recorded when a call attempt ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, DbEnum, utoipa::ToSchema)]
#[db_enum(existing_type_path = "crate::schema::sql_types::CallDisposition")]
#[serde(rename_all = "snake_case")]
pub enum CallDisposition {
    Qualified,
    NotQualified,
    Callback,
    NoAnswer,
    VoicemailLeft,
    DroppedSilent,
    Abandoned,
    Failed,
}

/// Configured action for machine-detected calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, DbEnum, utoipa::ToSchema)]
#[db_enum(existing_type_path = "crate::schema::sql_types::VmAction")]
#[serde(rename_all = "snake_case")]
pub enum VmAction {
    LeaveVoicemail,
    ScheduleCallback,
    DropSilent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, DbEnum)]
#[db_enum(existing_type_path = "crate::schema::sql_types::SuppressionScope")]
#[serde(rename_all = "snake_case")]
pub enum SuppressionScope {
    GlobalDnc,
    Campaign,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, DbEnum)]
#[db_enum(existing_type_path = "crate::schema::sql_types::AudienceSource")]
#[serde(rename_all = "lowercase")]
pub enum AudienceSource {
    Snapshot,
    List,
    Segment,
}

/// Reason recorded when the distributor or assignment service drops an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalReason {
    NoCallablePhone,
    ContactMissing,
    SuppressedCampaign,
    SuppressedDnc,
    QueueReplaced,
    QueueCleared,
}

impl RemovalReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemovalReason::NoCallablePhone => "no_callable_phone",
            RemovalReason::ContactMissing => "contact_missing",
            RemovalReason::SuppressedCampaign => "suppressed_campaign",
            RemovalReason::SuppressedDnc => "suppressed_dnc",
            RemovalReason::QueueReplaced => "queue_replaced",
            RemovalReason::QueueCleared => "queue_cleared",
        }
    }
}

impl std::fmt::Display for RemovalReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reason a machine-policy execution was skipped without acting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VmSkipReason {
    NoPolicyConfigured,
    CampaignVmCapReached,
    ContactVmCapReached,
    CooldownActive,
    OutsideVmWindow,
}

impl VmSkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            VmSkipReason::NoPolicyConfigured => "no_policy_configured",
            VmSkipReason::CampaignVmCapReached => "campaign_vm_cap_reached",
            VmSkipReason::ContactVmCapReached => "contact_vm_cap_reached",
            VmSkipReason::CooldownActive => "cooldown_active",
            VmSkipReason::OutsideVmWindow => "outside_vm_window",
        }
    }
}

/// Result of running the machine policy for one attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum MachinePolicyOutcome {
    VoicemailLeft {
        rendered_message: Option<String>,
    },
    CallbackScheduled {
        suggested_at: chrono::NaiveDateTime,
    },
    DroppedSilent,
    Skipped {
        reason: VmSkipReason,
    },
}
