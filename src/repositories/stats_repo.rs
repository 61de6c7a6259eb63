use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::AsyncDbPool;
use crate::error::{AppError, AppResult};
use crate::models::StatCounters;
use crate::repositories::acquire;
use crate::schema::{account_stats, campaign_stats};

/// Aggregate campaign/account counters. Every write is upsert arithmetic
/// in SQL; application code never does read-modify-write on these rows.
#[derive(Clone)]
pub struct StatsRepository {
    pool: AsyncDbPool,
}

impl StatsRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }

    pub async fn bump_campaign(
        &self,
        campaign_id: Uuid,
        queued: i64,
        connected: i64,
        positive: i64,
    ) -> AppResult<()> {
        let mut conn = acquire(&self.pool).await?;

        diesel::insert_into(campaign_stats::table)
            .values((
                campaign_stats::campaign_id.eq(campaign_id),
                campaign_stats::queued_count.eq(queued),
                campaign_stats::connected_count.eq(connected),
                campaign_stats::positive_count.eq(positive),
            ))
            .on_conflict(campaign_stats::campaign_id)
            .do_update()
            .set((
                campaign_stats::queued_count
                    .eq(campaign_stats::queued_count + excluded(campaign_stats::queued_count)),
                campaign_stats::connected_count.eq(campaign_stats::connected_count
                    + excluded(campaign_stats::connected_count)),
                campaign_stats::positive_count
                    .eq(campaign_stats::positive_count + excluded(campaign_stats::positive_count)),
                campaign_stats::updated_at.eq(diesel::dsl::now),
            ))
            .execute(&mut conn)
            .await
            .map_err(AppError::from)?;

        Ok(())
    }

    pub async fn bump_account(
        &self,
        account_id: Uuid,
        queued: i64,
        connected: i64,
        positive: i64,
    ) -> AppResult<()> {
        let mut conn = acquire(&self.pool).await?;

        diesel::insert_into(account_stats::table)
            .values((
                account_stats::account_id.eq(account_id),
                account_stats::queued_count.eq(queued),
                account_stats::connected_count.eq(connected),
                account_stats::positive_count.eq(positive),
            ))
            .on_conflict(account_stats::account_id)
            .do_update()
            .set((
                account_stats::queued_count
                    .eq(account_stats::queued_count + excluded(account_stats::queued_count)),
                account_stats::connected_count.eq(account_stats::connected_count
                    + excluded(account_stats::connected_count)),
                account_stats::positive_count
                    .eq(account_stats::positive_count + excluded(account_stats::positive_count)),
                account_stats::updated_at.eq(diesel::dsl::now),
            ))
            .execute(&mut conn)
            .await
            .map_err(AppError::from)?;

        Ok(())
    }

    pub async fn campaign_counters(&self, campaign_id: Uuid) -> AppResult<StatCounters> {
        let mut conn = acquire(&self.pool).await?;

        let row: Option<StatCounters> = campaign_stats::table
            .filter(campaign_stats::campaign_id.eq(campaign_id))
            .select((
                campaign_stats::queued_count,
                campaign_stats::connected_count,
                campaign_stats::positive_count,
            ))
            .first(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)?;

        Ok(row.unwrap_or_default())
    }
}
