use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::AsyncDbPool;
use crate::dialer::types::SuppressionScope;
use crate::error::{AppError, AppResult};
use crate::repositories::acquire;
use crate::schema::suppression_entries;

/// Yes/no suppression lookups for the distributor's eligibility checks.
#[derive(Clone)]
pub struct SuppressionRepository {
    pool: AsyncDbPool,
}

impl SuppressionRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }

    /// Campaign-level suppression: matches the contact, its account, or the
    /// resolved phone within the given campaign.
    pub async fn is_campaign_suppressed(
        &self,
        campaign_id: Uuid,
        contact_id: Uuid,
        account_id: Uuid,
        phone: &str,
    ) -> AppResult<bool> {
        let mut conn = acquire(&self.pool).await?;

        let count: i64 = suppression_entries::table
            .filter(suppression_entries::scope.eq(SuppressionScope::Campaign))
            .filter(suppression_entries::campaign_id.eq(campaign_id))
            .filter(
                suppression_entries::contact_id
                    .eq(contact_id)
                    .or(suppression_entries::account_id.eq(account_id))
                    .or(suppression_entries::phone.eq(phone)),
            )
            .count()
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)?;

        Ok(count > 0)
    }

    /// Global Do-Not-Call: matches the phone or the contact directly.
    pub async fn is_global_dnc(&self, contact_id: Uuid, phone: &str) -> AppResult<bool> {
        let mut conn = acquire(&self.pool).await?;

        let count: i64 = suppression_entries::table
            .filter(suppression_entries::scope.eq(SuppressionScope::GlobalDnc))
            .filter(
                suppression_entries::contact_id
                    .eq(contact_id)
                    .or(suppression_entries::phone.eq(phone)),
            )
            .count()
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)?;

        Ok(count > 0)
    }
}
