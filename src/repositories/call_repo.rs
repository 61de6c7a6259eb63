use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::db::AsyncDbPool;
use crate::dialer::types::{AmdVerdict, CallDisposition};
use crate::error::{AppError, AppResult};
use crate::models::{CallAttempt, NewCallAttempt, NewCallEvent};
use crate::repositories::acquire;
use crate::schema::{call_attempts, call_events};

/// Data access for call attempts and their append-only event trail.
#[derive(Clone)]
pub struct CallRepository {
    pool: AsyncDbPool,
}

impl CallRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }

    pub async fn create_attempt(&self, attempt: NewCallAttempt) -> AppResult<CallAttempt> {
        let mut conn = acquire(&self.pool).await?;

        diesel::insert_into(call_attempts::table)
            .values(&attempt)
            .returning(CallAttempt::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)
    }

    pub async fn get_attempt(&self, id: Uuid) -> AppResult<CallAttempt> {
        let mut conn = acquire(&self.pool).await?;

        call_attempts::table
            .find(id)
            .select(CallAttempt::as_select())
            .first(&mut conn)
            .await
            .map_err(|e| match e {
                diesel::result::Error::NotFound => AppError::NotFound {
                    entity: "CallAttempt".to_string(),
                    field: "id".to_string(),
                    value: id.to_string(),
                },
                _ => AppError::from(e),
            })
    }

    pub async fn delete_attempt(&self, id: Uuid) -> AppResult<()> {
        let mut conn = acquire(&self.pool).await?;

        diesel::delete(call_attempts::table.find(id))
            .execute(&mut conn)
            .await
            .map_err(AppError::from)?;

        Ok(())
    }

    /// Persists the AMD classification and, when routed to an agent, the
    /// agent that took the call.
    pub async fn record_amd(
        &self,
        id: Uuid,
        verdict: AmdVerdict,
        confidence: f64,
        agent_id: Option<Uuid>,
    ) -> AppResult<()> {
        let mut conn = acquire(&self.pool).await?;

        diesel::update(call_attempts::table.find(id))
            .set((
                call_attempts::amd_verdict.eq(verdict),
                call_attempts::amd_confidence.eq(confidence),
                call_attempts::agent_id.eq(agent_id),
                call_attempts::updated_at.eq(diesel::dsl::now),
            ))
            .execute(&mut conn)
            .await
            .map_err(AppError::from)?;

        Ok(())
    }

    /// Stamps the moment the call went live. Guarded on the column still
    /// being unset, so a replayed callback keeps the first timestamp.
    pub async fn mark_connected(&self, id: Uuid) -> AppResult<()> {
        let mut conn = acquire(&self.pool).await?;

        mark_connected_statement(id)
            .execute(&mut conn)
            .await
            .map_err(AppError::from)?;

        Ok(())
    }

    /// Closes an attempt. Only writes rows that have not already ended, so
    /// a duplicate ended-callback is a no-op.
    pub async fn finish_attempt(
        &self,
        id: Uuid,
        ended_at: NaiveDateTime,
        duration_secs: i32,
        disposition: CallDisposition,
        recording_url: Option<String>,
    ) -> AppResult<bool> {
        let mut conn = acquire(&self.pool).await?;

        let updated = diesel::update(
            call_attempts::table
                .filter(call_attempts::id.eq(id))
                .filter(call_attempts::ended_at.is_null()),
        )
        .set((
            call_attempts::ended_at.eq(ended_at),
            call_attempts::duration_secs.eq(duration_secs),
            call_attempts::disposition.eq(disposition),
            call_attempts::recording_url.eq(recording_url),
            call_attempts::updated_at.eq(diesel::dsl::now),
        ))
        .execute(&mut conn)
        .await
        .map_err(AppError::from)?;

        Ok(updated == 1)
    }

    /// Writes the disposition ahead of call end, e.g. when the voicemail
    /// policy settles the outcome while the call is still up.
    pub async fn set_disposition(&self, id: Uuid, disposition: CallDisposition) -> AppResult<()> {
        let mut conn = acquire(&self.pool).await?;

        diesel::update(call_attempts::table.find(id))
            .set((
                call_attempts::disposition.eq(disposition),
                call_attempts::updated_at.eq(diesel::dsl::now),
            ))
            .execute(&mut conn)
            .await
            .map_err(AppError::from)?;

        Ok(())
    }

    pub async fn record_voicemail(
        &self,
        id: Uuid,
        asset_id: Option<Uuid>,
        duration_secs: Option<i32>,
    ) -> AppResult<()> {
        let mut conn = acquire(&self.pool).await?;

        diesel::update(call_attempts::table.find(id))
            .set((
                call_attempts::vm_asset_id.eq(asset_id),
                call_attempts::vm_delivered.eq(true),
                call_attempts::vm_duration_secs.eq(duration_secs),
                call_attempts::updated_at.eq(diesel::dsl::now),
            ))
            .execute(&mut conn)
            .await
            .map_err(AppError::from)?;

        Ok(())
    }

    /// Voicemails delivered today for one campaign, for the daily cap gate.
    pub async fn campaign_voicemails_since(
        &self,
        campaign_id: Uuid,
        since: NaiveDateTime,
    ) -> AppResult<i64> {
        let mut conn = acquire(&self.pool).await?;

        call_attempts::table
            .filter(call_attempts::campaign_id.eq(campaign_id))
            .filter(call_attempts::vm_delivered.eq(true))
            .filter(call_attempts::started_at.ge(since))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)
    }

    /// Appends one audit event. Events are never updated or deleted.
    pub async fn append_event(
        &self,
        attempt_id: Uuid,
        event_type: &str,
        payload: Option<JsonValue>,
    ) -> AppResult<()> {
        let mut conn = acquire(&self.pool).await?;

        diesel::insert_into(call_events::table)
            .values(&NewCallEvent {
                attempt_id,
                event_type: event_type.to_string(),
                payload,
            })
            .execute(&mut conn)
            .await
            .map_err(AppError::from)?;

        Ok(())
    }
}

fn mark_connected_statement(
    id: Uuid,
) -> impl diesel::query_builder::QueryFragment<diesel::pg::Pg>
+ diesel::query_builder::QueryId
+ Send {
    diesel::update(
        call_attempts::table
            .filter(call_attempts::id.eq(id))
            .filter(call_attempts::connected_at.is_null()),
    )
    .set((
        call_attempts::connected_at.eq(diesel::dsl::now),
        call_attempts::updated_at.eq(diesel::dsl::now),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use diesel::pg::Pg;

    #[test]
    fn connected_stamp_never_overwrites_an_earlier_one() {
        let statement = mark_connected_statement(Uuid::nil());
        let sql = diesel::debug_query::<Pg, _>(&statement).to_string();

        assert!(
            sql.contains(r#""call_attempts"."connected_at" IS NULL"#),
            "{sql}"
        );
    }
}
