use diesel_async::RunQueryDsl;

use crate::db::AsyncDbPool;
use crate::error::{AppError, AppResult};
use crate::models::NewActivityLog;
use crate::repositories::acquire;
use crate::schema::activity_logs;

/// Append-only activity trail for contacts. Callers treat failures here as
/// non-fatal; a lost log line must never abort a call flow.
#[derive(Clone)]
pub struct ActivityLogRepository {
    pool: AsyncDbPool,
}

impl ActivityLogRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }

    pub async fn append(&self, entry: NewActivityLog) -> AppResult<()> {
        let mut conn = acquire(&self.pool).await?;

        diesel::insert_into(activity_logs::table)
            .values(&entry)
            .execute(&mut conn)
            .await
            .map_err(AppError::from)?;

        Ok(())
    }

    /// Best-effort append: logs a warning on failure instead of propagating.
    pub async fn append_best_effort(&self, entry: NewActivityLog) {
        if let Err(e) = self.append(entry).await {
            tracing::warn!(error = %e, "Activity log write failed; continuing");
        }
    }
}
