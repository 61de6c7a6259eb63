use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::AsyncDbPool;
use crate::error::{AppError, AppResult};
use crate::models::Campaign;
use crate::repositories::acquire;
use crate::schema::campaigns;

#[derive(Clone)]
pub struct CampaignRepository {
    pool: AsyncDbPool,
}

impl CampaignRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Campaign> {
        let mut conn = acquire(&self.pool).await?;

        campaigns::table
            .find(id)
            .select(Campaign::as_select())
            .first(&mut conn)
            .await
            .map_err(|e| match e {
                diesel::result::Error::NotFound => AppError::NotFound {
                    entity: "Campaign".to_string(),
                    field: "id".to_string(),
                    value: id.to_string(),
                },
                _ => AppError::from(e),
            })
    }

    /// Campaigns whose power-dial queue is live.
    pub async fn active_dialer_campaigns(&self) -> AppResult<Vec<Campaign>> {
        let mut conn = acquire(&self.pool).await?;

        campaigns::table
            .filter(campaigns::dialer_active.eq(true))
            .select(Campaign::as_select())
            .load(&mut conn)
            .await
            .map_err(AppError::from)
    }
}
