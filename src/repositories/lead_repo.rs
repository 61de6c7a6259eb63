use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::AsyncDbPool;
use crate::error::AppResult;
use crate::models::{Lead, NewLead};
use crate::repositories::acquire;
use crate::schema::leads;

#[derive(Clone)]
pub struct LeadRepository {
    pool: AsyncDbPool,
}

impl LeadRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }

    /// Creates the lead for an attempt, exactly once. The unique index on
    /// attempt_id plus ON CONFLICT DO NOTHING makes re-derivation from the
    /// same attempt a no-op; `None` means the lead already existed.
    pub async fn create_from_attempt(&self, lead: NewLead) -> AppResult<Option<Lead>> {
        let mut conn = acquire(&self.pool).await?;

        diesel::insert_into(leads::table)
            .values(&lead)
            .on_conflict(leads::attempt_id)
            .do_nothing()
            .returning(Lead::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(crate::error::AppError::from)
    }

    pub async fn count_for_campaign(&self, campaign_id: Uuid) -> AppResult<i64> {
        let mut conn = acquire(&self.pool).await?;

        leads::table
            .filter(leads::campaign_id.eq(campaign_id))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(crate::error::AppError::from)
    }
}
