use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::AsyncDbPool;
use crate::dialer::types::AudienceSource;
use crate::error::{AppError, AppResult};
use crate::repositories::acquire;
use crate::schema::audience_members;

/// Read access to resolved campaign audience membership.
#[derive(Clone)]
pub struct AudienceRepository {
    pool: AsyncDbPool,
}

impl AudienceRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }

    /// Contact ids from the latest immutable snapshot, if one exists.
    pub async fn snapshot_ids(&self, campaign_id: Uuid) -> AppResult<Vec<Uuid>> {
        let mut conn = acquire(&self.pool).await?;

        audience_members::table
            .filter(audience_members::campaign_id.eq(campaign_id))
            .filter(audience_members::source.eq(AudienceSource::Snapshot))
            .select(audience_members::contact_id)
            .load(&mut conn)
            .await
            .map_err(AppError::from)
    }

    /// Deduplicated union of list and segment membership, for campaigns
    /// without a snapshot.
    pub async fn dynamic_ids(&self, campaign_id: Uuid) -> AppResult<Vec<Uuid>> {
        let mut conn = acquire(&self.pool).await?;

        audience_members::table
            .filter(audience_members::campaign_id.eq(campaign_id))
            .filter(audience_members::source.eq_any(vec![
                AudienceSource::List,
                AudienceSource::Segment,
            ]))
            .select(audience_members::contact_id)
            .distinct()
            .load(&mut conn)
            .await
            .map_err(AppError::from)
    }
}
