use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

use crate::db::AsyncDbPool;
use crate::dialer::types::{QueueKind, QueueStatus, RemovalReason};
use crate::error::{AppError, AppResult};
use crate::models::{NewQueueItem, QueueItem};
use crate::repositories::acquire;
use crate::schema::queue_items;

/// Data access for both queue flavors. Every status mutation is a
/// conditional update keyed on the expected prior status; callers treat
/// a zero-row result as a lost race, not an error.
#[derive(Clone)]
pub struct QueueRepository {
    pool: AsyncDbPool,
}

impl QueueRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }

    /// Next power-dial candidates: queued items in priority-then-FIFO order.
    pub async fn next_power_candidates(
        &self,
        campaign_id: Uuid,
        limit: i64,
    ) -> AppResult<Vec<QueueItem>> {
        let mut conn = acquire(&self.pool).await?;

        queue_items::table
            .filter(queue_items::campaign_id.eq(campaign_id))
            .filter(queue_items::queue_kind.eq(QueueKind::Power))
            .filter(queue_items::status.eq(QueueStatus::Queued))
            .order((queue_items::priority.desc(), queue_items::queued_at.asc()))
            .limit(limit)
            .select(QueueItem::as_select())
            .load(&mut conn)
            .await
            .map_err(AppError::from)
    }

    /// Conditional status transition. Returns `true` when this caller won
    /// the row, `false` when a concurrent writer got there first.
    pub async fn transition(
        &self,
        item_id: i64,
        expected: &[QueueStatus],
        next: QueueStatus,
    ) -> AppResult<bool> {
        let mut conn = acquire(&self.pool).await?;

        let updated = transition_statement(item_id, expected.to_vec(), next)
            .execute(&mut conn)
            .await
            .map_err(AppError::from)?;

        Ok(updated == 1)
    }

    /// Next items an agent could manually dial: their queued manual rows in
    /// priority-then-FIFO order.
    pub async fn next_manual_candidates(
        &self,
        campaign_id: Uuid,
        agent_id: Uuid,
        limit: i64,
    ) -> AppResult<Vec<QueueItem>> {
        let mut conn = acquire(&self.pool).await?;

        queue_items::table
            .filter(queue_items::campaign_id.eq(campaign_id))
            .filter(queue_items::queue_kind.eq(QueueKind::Manual))
            .filter(queue_items::agent_id.eq(agent_id))
            .filter(queue_items::status.eq(QueueStatus::Queued))
            .order((queue_items::priority.desc(), queue_items::queued_at.asc()))
            .limit(limit)
            .select(QueueItem::as_select())
            .load(&mut conn)
            .await
            .map_err(AppError::from)
    }

    /// Claims a manual item for an agent's dial. Queued rows only; a `false`
    /// result means another claim won the item.
    pub async fn lock_item(
        &self,
        item_id: i64,
        agent_id: Uuid,
        expires_at: NaiveDateTime,
    ) -> AppResult<bool> {
        let mut conn = acquire(&self.pool).await?;

        let updated = lock_statement(item_id, agent_id, expires_at)
            .execute(&mut conn)
            .await
            .map_err(AppError::from)?;

        Ok(updated == 1)
    }

    /// Hands a locked item back to the queue. Only the lock owner can
    /// release it; everyone else waits for the expiry sweep.
    pub async fn release_lock(
        &self,
        campaign_id: Uuid,
        item_id: i64,
        agent_id: Uuid,
    ) -> AppResult<bool> {
        let mut conn = acquire(&self.pool).await?;

        let updated = release_lock_statement(campaign_id, item_id, agent_id)
            .execute(&mut conn)
            .await
            .map_err(AppError::from)?;

        Ok(updated == 1)
    }

    /// Removes an item with a recorded reason, conditional on its status.
    pub async fn remove(
        &self,
        item_id: i64,
        expected: &[QueueStatus],
        reason: RemovalReason,
    ) -> AppResult<bool> {
        let mut conn = acquire(&self.pool).await?;

        let updated = diesel::update(
            queue_items::table
                .filter(queue_items::id.eq(item_id))
                .filter(queue_items::status.eq_any(expected.to_vec())),
        )
        .set((
            queue_items::status.eq(QueueStatus::Removed),
            queue_items::removal_reason.eq(reason.as_str()),
            queue_items::updated_at.eq(diesel::dsl::now),
        ))
        .execute(&mut conn)
        .await
        .map_err(AppError::from)?;

        Ok(updated == 1)
    }

    /// Releases expired manual-dial locks back to queued. The expiry check
    /// rides in the WHERE clause so a concurrently completed item is never
    /// resurrected.
    pub async fn release_expired_locks(&self, now: NaiveDateTime) -> AppResult<usize> {
        let mut conn = acquire(&self.pool).await?;

        release_expired_locks_statement(now)
            .execute(&mut conn)
            .await
            .map_err(AppError::from)
    }

    /// Force-reverts power-dial items stuck in_progress past the staleness
    /// cutoff back to queued.
    pub async fn revert_stale_in_progress(&self, cutoff: NaiveDateTime) -> AppResult<usize> {
        let mut conn = acquire(&self.pool).await?;

        revert_stale_statement(cutoff)
            .execute(&mut conn)
            .await
            .map_err(AppError::from)
    }

    /// Per-status item counts for one campaign.
    pub async fn counts_by_status(
        &self,
        campaign_id: Uuid,
    ) -> AppResult<Vec<(QueueStatus, i64)>> {
        let mut conn = acquire(&self.pool).await?;

        queue_items::table
            .filter(queue_items::campaign_id.eq(campaign_id))
            .group_by(queue_items::status)
            .select((queue_items::status, diesel::dsl::count_star()))
            .load(&mut conn)
            .await
            .map_err(AppError::from)
    }

    /// Queued-item counts per agent for one campaign's manual queues.
    pub async fn queued_counts_by_agent(
        &self,
        campaign_id: Uuid,
    ) -> AppResult<Vec<(Option<Uuid>, i64)>> {
        let mut conn = acquire(&self.pool).await?;

        queue_items::table
            .filter(queue_items::campaign_id.eq(campaign_id))
            .filter(queue_items::queue_kind.eq(QueueKind::Manual))
            .filter(queue_items::status.eq(QueueStatus::Queued))
            .group_by(queue_items::agent_id)
            .select((queue_items::agent_id, diesel::dsl::count_star()))
            .load(&mut conn)
            .await
            .map_err(AppError::from)
    }

    /// Removes every active manual item in the campaign, regardless of
    /// agent. Returns how many rows were released.
    pub async fn clear_campaign_manual(
        &self,
        campaign_id: Uuid,
        reason: RemovalReason,
    ) -> AppResult<usize> {
        let mut conn = acquire(&self.pool).await?;

        diesel::update(
            queue_items::table
                .filter(queue_items::campaign_id.eq(campaign_id))
                .filter(queue_items::queue_kind.eq(QueueKind::Manual))
                .filter(queue_items::status.eq_any(QueueStatus::ACTIVE.to_vec())),
        )
        .set((
            queue_items::status.eq(QueueStatus::Removed),
            queue_items::removal_reason.eq(reason.as_str()),
            queue_items::locked_by.eq(None::<Uuid>),
            queue_items::lock_expires_at.eq(None::<NaiveDateTime>),
            queue_items::updated_at.eq(diesel::dsl::now),
        ))
        .execute(&mut conn)
        .await
        .map_err(AppError::from)
    }

    /// Contacts that already hold an active power-dial row, so a seeding
    /// pass does not enqueue them twice.
    pub async fn active_power_contacts(&self, campaign_id: Uuid) -> AppResult<Vec<Uuid>> {
        let mut conn = acquire(&self.pool).await?;

        queue_items::table
            .filter(queue_items::campaign_id.eq(campaign_id))
            .filter(queue_items::queue_kind.eq(QueueKind::Power))
            .filter(queue_items::status.eq_any(QueueStatus::ACTIVE.to_vec()))
            .select(queue_items::contact_id)
            .load(&mut conn)
            .await
            .map_err(AppError::from)
    }

    pub async fn insert_batch(&self, items: &[NewQueueItem]) -> AppResult<usize> {
        let mut conn = acquire(&self.pool).await?;

        diesel::insert_into(queue_items::table)
            .values(items)
            .execute(&mut conn)
            .await
            .map_err(AppError::from)
    }

    // ------------------------------------------------------------------
    // Connection-scoped operations used inside the queue-assignment
    // transaction. These take the transaction's connection directly so the
    // whole set/clear runs atomically.
    // ------------------------------------------------------------------

    /// Marks the agent's active manual items as removed. Returns how many
    /// rows were released.
    pub async fn release_agent_items_on(
        conn: &mut AsyncPgConnection,
        campaign_id: Uuid,
        agent_id: Uuid,
        preserve_in_progress: bool,
        reason: RemovalReason,
    ) -> Result<usize, diesel::result::Error> {
        let releasable: Vec<QueueStatus> = if preserve_in_progress {
            vec![QueueStatus::Queued, QueueStatus::Locked]
        } else {
            vec![QueueStatus::Queued, QueueStatus::Locked, QueueStatus::InProgress]
        };

        diesel::update(
            queue_items::table
                .filter(queue_items::campaign_id.eq(campaign_id))
                .filter(queue_items::queue_kind.eq(QueueKind::Manual))
                .filter(queue_items::agent_id.eq(agent_id))
                .filter(queue_items::status.eq_any(releasable)),
        )
        .set((
            queue_items::status.eq(QueueStatus::Removed),
            queue_items::removal_reason.eq(reason.as_str()),
            queue_items::locked_by.eq(None::<Uuid>),
            queue_items::lock_expires_at.eq(None::<NaiveDateTime>),
            queue_items::updated_at.eq(diesel::dsl::now),
        ))
        .execute(conn)
        .await
    }

    /// Contact ids from the given set that are actively queued for a
    /// different agent in the same campaign.
    pub async fn active_elsewhere_on(
        conn: &mut AsyncPgConnection,
        campaign_id: Uuid,
        agent_id: Uuid,
        contact_ids: &[Uuid],
    ) -> Result<Vec<Uuid>, diesel::result::Error> {
        queue_items::table
            .filter(queue_items::campaign_id.eq(campaign_id))
            .filter(queue_items::queue_kind.eq(QueueKind::Manual))
            .filter(queue_items::contact_id.eq_any(contact_ids.to_vec()))
            .filter(queue_items::agent_id.ne(agent_id).or(queue_items::agent_id.is_null()))
            .filter(queue_items::status.eq_any(QueueStatus::ACTIVE.to_vec()))
            .select(queue_items::contact_id)
            .distinct()
            .load(conn)
            .await
    }

    /// Deletes the agent's manual rows outright. Paired with a bulk insert
    /// this sidesteps unique-constraint collisions on re-run.
    pub async fn delete_agent_rows_on(
        conn: &mut AsyncPgConnection,
        campaign_id: Uuid,
        agent_id: Uuid,
        preserve_in_progress: bool,
    ) -> Result<usize, diesel::result::Error> {
        let deletable = queue_items::table
            .filter(queue_items::campaign_id.eq(campaign_id))
            .filter(queue_items::queue_kind.eq(QueueKind::Manual))
            .filter(queue_items::agent_id.eq(agent_id));

        if preserve_in_progress {
            diesel::delete(deletable.filter(queue_items::status.ne(QueueStatus::InProgress)))
                .execute(conn)
                .await
        } else {
            diesel::delete(deletable).execute(conn).await
        }
    }

    /// Contacts the agent currently holds in progress (kept rows a re-run
    /// must not duplicate).
    pub async fn in_progress_contacts_on(
        conn: &mut AsyncPgConnection,
        campaign_id: Uuid,
        agent_id: Uuid,
    ) -> Result<Vec<Uuid>, diesel::result::Error> {
        queue_items::table
            .filter(queue_items::campaign_id.eq(campaign_id))
            .filter(queue_items::queue_kind.eq(QueueKind::Manual))
            .filter(queue_items::agent_id.eq(agent_id))
            .filter(queue_items::status.eq(QueueStatus::InProgress))
            .select(queue_items::contact_id)
            .load(conn)
            .await
    }

    pub async fn insert_many_on(
        conn: &mut AsyncPgConnection,
        items: &[NewQueueItem],
    ) -> Result<usize, diesel::result::Error> {
        diesel::insert_into(queue_items::table)
            .values(items)
            .execute(conn)
            .await
    }
}

// Statement builders for the conditional writes. Separated from the
// executing methods so the guarding predicates stay inspectable.

fn transition_statement(
    item_id: i64,
    expected: Vec<QueueStatus>,
    next: QueueStatus,
) -> impl diesel::query_builder::QueryFragment<diesel::pg::Pg>
+ diesel::query_builder::QueryId
+ Send {
    diesel::update(
        queue_items::table
            .filter(queue_items::id.eq(item_id))
            .filter(queue_items::status.eq_any(expected)),
    )
    .set((
        queue_items::status.eq(next),
        queue_items::updated_at.eq(diesel::dsl::now),
    ))
}

fn lock_statement(
    item_id: i64,
    agent_id: Uuid,
    expires_at: NaiveDateTime,
) -> impl diesel::query_builder::QueryFragment<diesel::pg::Pg>
+ diesel::query_builder::QueryId
+ Send {
    diesel::update(
        queue_items::table
            .filter(queue_items::id.eq(item_id))
            .filter(queue_items::status.eq(QueueStatus::Queued)),
    )
    .set((
        queue_items::status.eq(QueueStatus::Locked),
        queue_items::locked_by.eq(agent_id),
        queue_items::lock_expires_at.eq(expires_at),
        queue_items::updated_at.eq(diesel::dsl::now),
    ))
}

fn release_lock_statement(
    campaign_id: Uuid,
    item_id: i64,
    agent_id: Uuid,
) -> impl diesel::query_builder::QueryFragment<diesel::pg::Pg>
+ diesel::query_builder::QueryId
+ Send {
    diesel::update(
        queue_items::table
            .filter(queue_items::id.eq(item_id))
            .filter(queue_items::campaign_id.eq(campaign_id))
            .filter(queue_items::status.eq(QueueStatus::Locked))
            .filter(queue_items::locked_by.eq(agent_id)),
    )
    .set((
        queue_items::status.eq(QueueStatus::Queued),
        queue_items::locked_by.eq(None::<Uuid>),
        queue_items::lock_expires_at.eq(None::<NaiveDateTime>),
        queue_items::updated_at.eq(diesel::dsl::now),
    ))
}

fn release_expired_locks_statement(
    now: NaiveDateTime,
) -> impl diesel::query_builder::QueryFragment<diesel::pg::Pg>
+ diesel::query_builder::QueryId
+ Send {
    diesel::update(
        queue_items::table
            .filter(queue_items::queue_kind.eq(QueueKind::Manual))
            .filter(queue_items::status.eq(QueueStatus::Locked))
            .filter(queue_items::lock_expires_at.le(now)),
    )
    .set((
        queue_items::status.eq(QueueStatus::Queued),
        queue_items::locked_by.eq(None::<Uuid>),
        queue_items::lock_expires_at.eq(None::<NaiveDateTime>),
        queue_items::updated_at.eq(diesel::dsl::now),
    ))
}

fn revert_stale_statement(
    cutoff: NaiveDateTime,
) -> impl diesel::query_builder::QueryFragment<diesel::pg::Pg>
+ diesel::query_builder::QueryId
+ Send {
    diesel::update(
        queue_items::table
            .filter(queue_items::queue_kind.eq(QueueKind::Power))
            .filter(queue_items::status.eq_any(vec![
                QueueStatus::Calling,
                QueueStatus::InProgress,
            ]))
            .filter(queue_items::updated_at.le(cutoff)),
    )
    .set((
        queue_items::status.eq(QueueStatus::Queued),
        queue_items::updated_at.eq(diesel::dsl::now),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use diesel::pg::Pg;

    fn sql_of<T: diesel::query_builder::QueryFragment<Pg>>(statement: &T) -> String {
        diesel::debug_query::<Pg, _>(statement).to_string()
    }

    #[test]
    fn transition_is_guarded_by_expected_status() {
        let sql = sql_of(&transition_statement(
            1,
            vec![QueueStatus::Queued],
            QueueStatus::Calling,
        ));
        // A done or removed item never matches, so it cannot be revived.
        assert!(sql.contains(r#""queue_items"."status" = ANY($"#), "{sql}");
    }

    #[test]
    fn lock_claim_only_touches_queued_rows() {
        let sql = sql_of(&lock_statement(1, Uuid::nil(), NaiveDateTime::default()));
        assert!(sql.contains(r#""queue_items"."status" = $"#), "{sql}");
    }

    #[test]
    fn lock_release_requires_the_owner() {
        let sql = sql_of(&release_lock_statement(Uuid::nil(), 1, Uuid::nil()));
        assert!(sql.contains(r#""queue_items"."locked_by" = $"#), "{sql}");
        assert!(sql.contains(r#""queue_items"."status" = $"#), "{sql}");
    }

    #[test]
    fn expiry_sweep_only_matches_expired_manual_locks() {
        let sql = sql_of(&release_expired_locks_statement(NaiveDateTime::default()));
        assert!(sql.contains(r#""queue_items"."queue_kind" = $"#), "{sql}");
        assert!(sql.contains(r#""queue_items"."status" = $"#), "{sql}");
        assert!(sql.contains(r#""queue_items"."lock_expires_at" <= $"#), "{sql}");
    }

    #[test]
    fn stale_revert_only_matches_active_power_items_past_cutoff() {
        let sql = sql_of(&revert_stale_statement(NaiveDateTime::default()));
        assert!(sql.contains(r#""queue_items"."queue_kind" = $"#), "{sql}");
        assert!(sql.contains(r#""queue_items"."status" = ANY($"#), "{sql}");
        assert!(sql.contains(r#""queue_items"."updated_at" <= $"#), "{sql}");
    }
}
