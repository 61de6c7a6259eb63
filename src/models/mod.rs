//! Diesel models for the dialer engine's tables.

mod agent;
mod call;
mod campaign;
mod contact;
mod queue;
mod tracking;

pub use agent::AgentStatus;
pub use call::{CallAttempt, CallEvent, Lead, NewCallAttempt, NewCallEvent, NewLead};
pub use campaign::Campaign;
pub use contact::{Account, Contact};
pub use queue::{NewQueueItem, QueueItem};
pub use tracking::{
    AudienceMember, NewActivityLog, NewSuppressionEntry, StatCounters, SuppressionEntry,
    VoicemailTracking,
};
