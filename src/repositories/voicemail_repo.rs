use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::AsyncDbPool;
use crate::error::{AppError, AppResult};
use crate::models::VoicemailTracking;
use crate::repositories::acquire;
use crate::schema::voicemail_tracking;

/// Per (contact, campaign) voicemail counters.
#[derive(Clone)]
pub struct VoicemailRepository {
    pool: AsyncDbPool,
}

impl VoicemailRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }

    pub async fn get_tracking(
        &self,
        contact_id: Uuid,
        campaign_id: Uuid,
    ) -> AppResult<Option<VoicemailTracking>> {
        let mut conn = acquire(&self.pool).await?;

        voicemail_tracking::table
            .filter(voicemail_tracking::contact_id.eq(contact_id))
            .filter(voicemail_tracking::campaign_id.eq(campaign_id))
            .select(VoicemailTracking::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    /// Increments the counter row, creating it on first voicemail. The
    /// arithmetic runs in SQL so concurrent deliveries cannot lose updates.
    pub async fn record_voicemail(
        &self,
        contact_id: Uuid,
        campaign_id: Uuid,
        at: NaiveDateTime,
    ) -> AppResult<()> {
        let mut conn = acquire(&self.pool).await?;

        diesel::insert_into(voicemail_tracking::table)
            .values((
                voicemail_tracking::contact_id.eq(contact_id),
                voicemail_tracking::campaign_id.eq(campaign_id),
                voicemail_tracking::vm_count.eq(1),
                voicemail_tracking::last_vm_at.eq(at),
            ))
            .on_conflict((voicemail_tracking::contact_id, voicemail_tracking::campaign_id))
            .do_update()
            .set((
                voicemail_tracking::vm_count.eq(voicemail_tracking::vm_count + 1),
                voicemail_tracking::last_vm_at.eq(at),
                voicemail_tracking::updated_at.eq(diesel::dsl::now),
            ))
            .execute(&mut conn)
            .await
            .map_err(AppError::from)?;

        Ok(())
    }
}
