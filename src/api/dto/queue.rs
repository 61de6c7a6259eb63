//! Queue assignment request/response DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::external::AudienceFilter;
use crate::services::{ClaimedQueueItem, SetQueueOptions};

fn default_true() -> bool {
    true
}

/// Request body for replacing an agent's manual queue.
///
/// `contact_ids` / `account_ids` narrow the campaign audience; omitting both
/// assigns the whole audience.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SetQueueRequest {
    /// Agent whose manual queue is replaced
    pub agent_id: Uuid,

    #[validate(length(min = 1, max = 10_000))]
    pub contact_ids: Option<Vec<Uuid>>,

    #[validate(length(min = 1, max = 1_000))]
    pub account_ids: Option<Vec<Uuid>>,

    /// Allow contacts already queued for another agent to be assigned anyway
    #[serde(default)]
    pub allow_sharing: bool,

    /// Keep the agent's in-progress items instead of releasing them
    #[serde(default = "default_true")]
    pub preserve_in_progress: bool,

    #[validate(range(min = 1))]
    pub per_account_cap: Option<usize>,

    #[validate(range(min = 1))]
    pub max_queue_size: Option<usize>,

    #[serde(default)]
    pub priority: i32,

    /// Compute the outcome without committing any change
    #[serde(default)]
    pub dry_run: bool,
}

impl SetQueueRequest {
    pub fn filter(&self) -> Option<AudienceFilter> {
        if self.contact_ids.is_none() && self.account_ids.is_none() {
            return None;
        }
        Some(AudienceFilter {
            contact_ids: self.contact_ids.clone(),
            account_ids: self.account_ids.clone(),
        })
    }

    pub fn options(&self) -> SetQueueOptions {
        SetQueueOptions {
            allow_sharing: self.allow_sharing,
            preserve_in_progress: self.preserve_in_progress,
            per_account_cap: self.per_account_cap,
            max_queue_size: self.max_queue_size,
            priority: self.priority,
            dry_run: self.dry_run,
        }
    }
}

/// Request body for clearing one agent's manual queue.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ClearQueueRequest {
    pub agent_id: Uuid,
}

/// Number of queue items released by a clear operation.
#[derive(Debug, Serialize, ToSchema)]
pub struct ClearQueueResponse {
    pub released: usize,
}

/// Request body for seeding a campaign's power queue from its audience.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SeedQueueRequest {
    #[validate(range(min = 1))]
    pub limit: Option<usize>,

    #[serde(default)]
    pub priority: i32,
}

/// Number of queue items inserted by a seed operation.
#[derive(Debug, Serialize, ToSchema)]
pub struct SeedQueueResponse {
    pub inserted: usize,
}

/// Request body for claiming the agent's next manual-dial item.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ClaimQueueRequest {
    pub agent_id: Uuid,
}

/// The claimed item, or `null` when the agent's queue holds nothing
/// claimable.
#[derive(Debug, Serialize, ToSchema)]
pub struct ClaimQueueResponse {
    pub item: Option<ClaimedQueueItem>,
}

/// Request body for handing a locked item back to the queue.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ReleaseQueueRequest {
    pub agent_id: Uuid,
    pub item_id: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReleaseQueueResponse {
    pub released: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_queue_request_defaults() {
        let json = r#"{"agent_id": "6f2a1a2e-4f0a-4f6b-9af7-000000000001"}"#;
        let req: SetQueueRequest = serde_json::from_str(json).unwrap();

        assert!(!req.allow_sharing);
        assert!(req.preserve_in_progress);
        assert!(!req.dry_run);
        assert_eq!(req.priority, 0);
        assert!(req.filter().is_none());
    }

    #[test]
    fn test_filter_built_from_ids() {
        let json = r#"{
            "agent_id": "6f2a1a2e-4f0a-4f6b-9af7-000000000001",
            "account_ids": ["6f2a1a2e-4f0a-4f6b-9af7-000000000002"]
        }"#;
        let req: SetQueueRequest = serde_json::from_str(json).unwrap();

        let filter = req.filter().unwrap();
        assert!(filter.contact_ids.is_none());
        assert_eq!(filter.account_ids.unwrap().len(), 1);
    }

    #[test]
    fn test_claim_and_release_bodies_parse() {
        let claim: ClaimQueueRequest =
            serde_json::from_str(r#"{"agent_id": "6f2a1a2e-4f0a-4f6b-9af7-000000000001"}"#)
                .unwrap();
        assert_eq!(claim.agent_id, Uuid::parse_str("6f2a1a2e-4f0a-4f6b-9af7-000000000001").unwrap());

        let release: ReleaseQueueRequest = serde_json::from_str(
            r#"{"agent_id": "6f2a1a2e-4f0a-4f6b-9af7-000000000001", "item_id": 7}"#,
        )
        .unwrap();
        assert_eq!(release.item_id, 7);
    }

    #[test]
    fn test_empty_contact_ids_rejected() {
        let json = r#"{
            "agent_id": "6f2a1a2e-4f0a-4f6b-9af7-000000000001",
            "contact_ids": []
        }"#;
        let req: SetQueueRequest = serde_json::from_str(json).unwrap();
        assert!(req.validate().is_err());
    }
}
