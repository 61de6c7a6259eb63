use async_trait::async_trait;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::error::AppResult;
use crate::repositories::Repositories;

/// Caller-supplied narrowing applied on top of a campaign audience.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct AudienceFilter {
    #[validate(length(min = 1, max = 10_000))]
    pub contact_ids: Option<Vec<Uuid>>,
    #[validate(length(min = 1, max = 1_000))]
    pub account_ids: Option<Vec<Uuid>>,
}

impl AudienceFilter {
    pub fn is_empty(&self) -> bool {
        self.contact_ids.is_none() && self.account_ids.is_none()
    }
}

/// Audience membership seam. `None` from `resolve_audience` means the
/// campaign has no audience defined at all, which callers must surface as
/// a configuration error rather than treat as an empty audience.
#[async_trait]
pub trait AudienceResolver: Send + Sync {
    async fn resolve_audience(&self, campaign_id: Uuid) -> AppResult<Option<Vec<Uuid>>>;

    async fn resolve_filter(&self, filter: &AudienceFilter) -> AppResult<Vec<Uuid>>;
}

/// Resolves audiences from the campaign membership tables. A snapshot, when
/// present, wins over dynamic list/segment membership.
pub struct DbAudienceResolver {
    repos: Repositories,
}

impl DbAudienceResolver {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }
}

#[async_trait]
impl AudienceResolver for DbAudienceResolver {
    async fn resolve_audience(&self, campaign_id: Uuid) -> AppResult<Option<Vec<Uuid>>> {
        let snapshot = self.repos.audience.snapshot_ids(campaign_id).await?;
        if !snapshot.is_empty() {
            return Ok(Some(snapshot));
        }

        let dynamic = self.repos.audience.dynamic_ids(campaign_id).await?;
        if dynamic.is_empty() {
            // No membership rows of any source: audience never defined.
            return Ok(None);
        }
        Ok(Some(dynamic))
    }

    async fn resolve_filter(&self, filter: &AudienceFilter) -> AppResult<Vec<Uuid>> {
        self.repos
            .contacts
            .ids_matching(filter.contact_ids.as_deref(), filter.account_ids.as_deref())
            .await
    }
}
