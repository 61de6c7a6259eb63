use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use chrono::{NaiveDateTime, TimeDelta, Utc};
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::AsyncConnection;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::AsyncDbPool;
use crate::dialer::types::{QueueKind, QueueStatus, RemovalReason};
use crate::error::{AppError, AppResult};
use crate::external::audience::{AudienceFilter, AudienceResolver};
use crate::models::NewQueueItem;
use crate::repositories::{acquire, QueueRepository, Repositories};

/// Knobs for a manual queue assignment.
#[derive(Debug, Clone)]
pub struct SetQueueOptions {
    /// Allow a contact to sit in several agents' queues at once.
    pub allow_sharing: bool,
    /// Keep the agent's in-progress items instead of releasing them.
    pub preserve_in_progress: bool,
    pub per_account_cap: Option<usize>,
    pub max_queue_size: Option<usize>,
    pub priority: i32,
    /// Compute the outcome, then roll the whole write back.
    pub dry_run: bool,
}

impl Default for SetQueueOptions {
    fn default() -> Self {
        Self {
            allow_sharing: false,
            preserve_in_progress: true,
            per_account_cap: None,
            max_queue_size: None,
            priority: 0,
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct SetQueueOutcome {
    pub released: usize,
    pub assigned: usize,
    pub skipped_collisions: usize,
    pub dry_run: bool,
}

/// Queue composition for one campaign.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct QueueStats {
    pub by_status: BTreeMap<String, i64>,
    pub by_agent: Vec<AgentQueueCount>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AgentQueueCount {
    pub agent_id: Option<Uuid>,
    pub queued: i64,
}

/// A manual queue item an agent holds the dial lock on.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ClaimedQueueItem {
    pub item_id: i64,
    pub contact_id: Uuid,
    pub account_id: Uuid,
    pub priority: i32,
    #[schema(value_type = String, format = DateTime)]
    pub lock_expires_at: NaiveDateTime,
}

/// Queued candidates tried per claim before reporting queue exhaustion.
const CLAIM_CANDIDATE_WINDOW: i64 = 5;

/// Transaction-local error carrying the dry-run outcome out through the
/// rollback path.
enum SetQueueTxError {
    Db(diesel::result::Error),
    Rollback(SetQueueOutcome),
}

impl From<diesel::result::Error> for SetQueueTxError {
    fn from(e: diesel::result::Error) -> Self {
        SetQueueTxError::Db(e)
    }
}

/// Replaces, clears, and inspects manual dial queues, and seeds power-dial
/// queues from campaign audiences. Set and clear run inside one database
/// transaction so an observer never sees a half-replaced queue.
pub struct QueueAssignmentService {
    pool: AsyncDbPool,
    repos: Repositories,
    audience: Arc<dyn AudienceResolver>,
    /// Seconds a manual-dial lock lives before the sweeper reclaims it.
    lock_ttl: u64,
}

impl QueueAssignmentService {
    pub fn new(
        pool: AsyncDbPool,
        repos: Repositories,
        audience: Arc<dyn AudienceResolver>,
        lock_ttl: u64,
    ) -> Self {
        Self {
            pool,
            repos,
            audience,
            lock_ttl,
        }
    }

    /// Replaces the agent's manual queue for the campaign with contacts
    /// drawn from the campaign audience, optionally narrowed by a filter.
    pub async fn set_queue(
        &self,
        campaign_id: Uuid,
        agent_id: Uuid,
        filter: Option<&AudienceFilter>,
        options: &SetQueueOptions,
    ) -> AppResult<SetQueueOutcome> {
        self.repos.campaigns.get(campaign_id).await?;

        let audience = self
            .audience
            .resolve_audience(campaign_id)
            .await?
            .ok_or_else(|| AppError::UnprocessableContent {
                message: format!("campaign {campaign_id} has no audience defined"),
            })?;

        let mut contact_ids = audience;
        if let Some(filter) = filter
            && !filter.is_empty()
        {
            let narrowed = self.audience.resolve_filter(filter).await?;
            contact_ids = intersect_preserving_order(&contact_ids, &narrowed);
        }

        // Account mapping comes from the contact rows; ids without a row
        // (deleted contacts still in an old snapshot) drop out here.
        let contacts = self.repos.contacts.get_many(&contact_ids).await?;
        let mut pairs: Vec<(Uuid, Uuid)> =
            contacts.iter().map(|c| (c.id, c.account_id)).collect();

        pairs = apply_account_cap(pairs, options.per_account_cap);
        if let Some(max) = options.max_queue_size {
            pairs.truncate(max);
        }

        let mut conn = acquire(&self.pool).await?;
        let options = options.clone();
        let result = conn
            .transaction::<SetQueueOutcome, SetQueueTxError, _>(|conn| {
                async move {
                    let released = QueueRepository::release_agent_items_on(
                        conn,
                        campaign_id,
                        agent_id,
                        options.preserve_in_progress,
                        RemovalReason::QueueReplaced,
                    )
                    .await?;

                    let candidate_ids: Vec<Uuid> = pairs.iter().map(|(c, _)| *c).collect();

                    let mut excluded: HashSet<Uuid> = HashSet::new();
                    if !options.allow_sharing {
                        excluded.extend(
                            QueueRepository::active_elsewhere_on(
                                conn,
                                campaign_id,
                                agent_id,
                                &candidate_ids,
                            )
                            .await?,
                        );
                    }
                    let skipped_collisions = pairs
                        .iter()
                        .filter(|(c, _)| excluded.contains(c))
                        .count();

                    // In-progress rows survive the replacement, so the same
                    // contacts must not be inserted a second time.
                    if options.preserve_in_progress {
                        excluded.extend(
                            QueueRepository::in_progress_contacts_on(conn, campaign_id, agent_id)
                                .await?,
                        );
                    }

                    QueueRepository::delete_agent_rows_on(
                        conn,
                        campaign_id,
                        agent_id,
                        options.preserve_in_progress,
                    )
                    .await?;

                    let items: Vec<NewQueueItem> = pairs
                        .iter()
                        .filter(|(c, _)| !excluded.contains(c))
                        .map(|(contact_id, account_id)| NewQueueItem {
                            queue_kind: QueueKind::Manual,
                            campaign_id,
                            contact_id: *contact_id,
                            account_id: *account_id,
                            agent_id: Some(agent_id),
                            priority: options.priority,
                            status: QueueStatus::Queued,
                        })
                        .collect();

                    let assigned = QueueRepository::insert_many_on(conn, &items).await?;

                    let outcome = SetQueueOutcome {
                        released,
                        assigned,
                        skipped_collisions,
                        dry_run: options.dry_run,
                    };

                    if options.dry_run {
                        return Err(SetQueueTxError::Rollback(outcome));
                    }
                    Ok(outcome)
                }
                .scope_boxed()
            })
            .await;

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(SetQueueTxError::Rollback(outcome)) => return Ok(outcome),
            Err(SetQueueTxError::Db(e)) => return Err(AppError::from(e)),
        };

        if outcome.assigned > 0
            && let Err(e) = self
                .repos
                .stats
                .bump_campaign(campaign_id, outcome.assigned as i64, 0, 0)
                .await
        {
            tracing::warn!(campaign_id = %campaign_id, error = %e, "Failed to bump campaign queued count");
        }

        tracing::info!(
            campaign_id = %campaign_id,
            agent_id = %agent_id,
            released = outcome.released,
            assigned = outcome.assigned,
            skipped = outcome.skipped_collisions,
            "Manual queue replaced"
        );
        Ok(outcome)
    }

    /// Releases the agent's active manual items.
    pub async fn clear_queue(&self, campaign_id: Uuid, agent_id: Uuid) -> AppResult<usize> {
        self.repos.campaigns.get(campaign_id).await?;

        let mut conn = acquire(&self.pool).await?;
        let released = QueueRepository::release_agent_items_on(
            &mut conn,
            campaign_id,
            agent_id,
            false,
            RemovalReason::QueueCleared,
        )
        .await
        .map_err(AppError::from)?;

        tracing::info!(campaign_id = %campaign_id, agent_id = %agent_id, released, "Manual queue cleared");
        Ok(released)
    }

    /// Releases every agent's manual items in the campaign.
    pub async fn clear_all(&self, campaign_id: Uuid) -> AppResult<usize> {
        self.repos.campaigns.get(campaign_id).await?;

        let released = self
            .repos
            .queue
            .clear_campaign_manual(campaign_id, RemovalReason::QueueCleared)
            .await?;

        tracing::info!(campaign_id = %campaign_id, released, "All manual queues cleared");
        Ok(released)
    }

    /// Locks the agent's next queued manual item for dialing. The claim is
    /// a conditional queued-to-locked write, so two sessions racing for the
    /// same item resolve to one owner; losers fall through to the next
    /// candidate. `None` means nothing is left to claim.
    pub async fn claim_next(
        &self,
        campaign_id: Uuid,
        agent_id: Uuid,
    ) -> AppResult<Option<ClaimedQueueItem>> {
        self.repos.campaigns.get(campaign_id).await?;

        let candidates = self
            .repos
            .queue
            .next_manual_candidates(campaign_id, agent_id, CLAIM_CANDIDATE_WINDOW)
            .await?;
        let expires_at = Utc::now().naive_utc() + TimeDelta::seconds(self.lock_ttl as i64);

        for item in candidates {
            if self.repos.queue.lock_item(item.id, agent_id, expires_at).await? {
                tracing::info!(
                    campaign_id = %campaign_id,
                    agent_id = %agent_id,
                    queue_item_id = item.id,
                    "Manual queue item locked"
                );
                return Ok(Some(ClaimedQueueItem {
                    item_id: item.id,
                    contact_id: item.contact_id,
                    account_id: item.account_id,
                    priority: item.priority,
                    lock_expires_at: expires_at,
                }));
            }
        }
        Ok(None)
    }

    /// Hands a locked item back to the queue. `false` when the agent no
    /// longer owns the lock, e.g. it already expired and was reclaimed.
    pub async fn release_claim(
        &self,
        campaign_id: Uuid,
        agent_id: Uuid,
        item_id: i64,
    ) -> AppResult<bool> {
        self.repos.campaigns.get(campaign_id).await?;

        let released = self
            .repos
            .queue
            .release_lock(campaign_id, item_id, agent_id)
            .await?;
        if released {
            tracing::info!(
                campaign_id = %campaign_id,
                agent_id = %agent_id,
                queue_item_id = item_id,
                "Manual queue item released"
            );
        }
        Ok(released)
    }

    pub async fn stats(&self, campaign_id: Uuid) -> AppResult<QueueStats> {
        self.repos.campaigns.get(campaign_id).await?;

        let by_status = self
            .repos
            .queue
            .counts_by_status(campaign_id)
            .await?
            .into_iter()
            .map(|(status, count)| (format!("{status:?}").to_lowercase(), count))
            .collect();

        let by_agent = self
            .repos
            .queue
            .queued_counts_by_agent(campaign_id)
            .await?
            .into_iter()
            .map(|(agent_id, queued)| AgentQueueCount { agent_id, queued })
            .collect();

        Ok(QueueStats { by_status, by_agent })
    }

    /// Enqueues the campaign audience for power dialing, skipping contacts
    /// that already hold an active power row. Safe to re-run.
    pub async fn seed_power_queue(
        &self,
        campaign_id: Uuid,
        limit: Option<usize>,
        priority: i32,
    ) -> AppResult<usize> {
        self.repos.campaigns.get(campaign_id).await?;

        let audience = self
            .audience
            .resolve_audience(campaign_id)
            .await?
            .ok_or_else(|| AppError::UnprocessableContent {
                message: format!("campaign {campaign_id} has no audience defined"),
            })?;

        let existing: HashSet<Uuid> = self
            .repos
            .queue
            .active_power_contacts(campaign_id)
            .await?
            .into_iter()
            .collect();

        let mut candidate_ids: Vec<Uuid> = audience
            .into_iter()
            .filter(|id| !existing.contains(id))
            .collect();
        if let Some(limit) = limit {
            candidate_ids.truncate(limit);
        }
        if candidate_ids.is_empty() {
            return Ok(0);
        }

        let contacts = self.repos.contacts.get_many(&candidate_ids).await?;
        let items: Vec<NewQueueItem> = contacts
            .iter()
            .map(|c| NewQueueItem {
                queue_kind: QueueKind::Power,
                campaign_id,
                contact_id: c.id,
                account_id: c.account_id,
                agent_id: None,
                priority,
                status: QueueStatus::Queued,
            })
            .collect();

        let inserted = self.repos.queue.insert_batch(&items).await?;
        self.bump_queued_stats(campaign_id, &contacts, inserted).await;

        tracing::info!(campaign_id = %campaign_id, inserted, "Power queue seeded");
        Ok(inserted)
    }

    /// Counter bumps are best-effort; losing one never fails the mutation
    /// that already committed.
    async fn bump_queued_stats(
        &self,
        campaign_id: Uuid,
        contacts: &[crate::models::Contact],
        queued: usize,
    ) {
        if queued == 0 {
            return;
        }
        if let Err(e) = self
            .repos
            .stats
            .bump_campaign(campaign_id, queued as i64, 0, 0)
            .await
        {
            tracing::warn!(campaign_id = %campaign_id, error = %e, "Failed to bump campaign queued count");
        }

        let mut per_account: BTreeMap<Uuid, i64> = BTreeMap::new();
        for contact in contacts {
            *per_account.entry(contact.account_id).or_default() += 1;
        }
        for (account_id, count) in per_account {
            if let Err(e) = self.repos.stats.bump_account(account_id, count, 0, 0).await {
                tracing::warn!(account_id = %account_id, error = %e, "Failed to bump account queued count");
            }
        }
    }
}

/// Keeps `base` order while dropping ids absent from `narrowing`.
fn intersect_preserving_order(base: &[Uuid], narrowing: &[Uuid]) -> Vec<Uuid> {
    let allowed: HashSet<&Uuid> = narrowing.iter().collect();
    base.iter().filter(|id| allowed.contains(id)).copied().collect()
}

/// Keeps at most `cap` contacts per account. Input is sorted by contact id
/// first so the kept window is deterministic across runs.
fn apply_account_cap(mut pairs: Vec<(Uuid, Uuid)>, cap: Option<usize>) -> Vec<(Uuid, Uuid)> {
    let Some(cap) = cap else {
        return pairs;
    };
    pairs.sort_by_key(|(contact_id, _)| *contact_id);

    let mut taken: BTreeMap<Uuid, usize> = BTreeMap::new();
    pairs
        .into_iter()
        .filter(|(_, account_id)| {
            let count = taken.entry(*account_id).or_default();
            if *count < cap {
                *count += 1;
                true
            } else {
                false
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uuid(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    #[test]
    fn intersection_preserves_base_order() {
        let base = vec![uuid(3), uuid(1), uuid(2)];
        let narrowing = vec![uuid(2), uuid(3)];
        assert_eq!(intersect_preserving_order(&base, &narrowing), vec![uuid(3), uuid(2)]);
    }

    #[test]
    fn intersection_with_empty_narrowing_is_empty() {
        let base = vec![uuid(1), uuid(2)];
        assert!(intersect_preserving_order(&base, &[]).is_empty());
    }

    #[test]
    fn account_cap_keeps_first_n_per_account() {
        let acct = uuid(100);
        let other = uuid(200);
        let pairs = vec![
            (uuid(3), acct),
            (uuid(1), acct),
            (uuid(2), acct),
            (uuid(4), other),
        ];

        let capped = apply_account_cap(pairs, Some(2));
        assert_eq!(capped, vec![(uuid(1), acct), (uuid(2), acct), (uuid(4), other)]);
    }

    #[test]
    fn account_cap_is_deterministic_across_input_order() {
        let acct = uuid(100);
        let a = vec![(uuid(2), acct), (uuid(1), acct), (uuid(3), acct)];
        let b = vec![(uuid(3), acct), (uuid(2), acct), (uuid(1), acct)];
        assert_eq!(apply_account_cap(a, Some(1)), apply_account_cap(b, Some(1)));
    }

    #[test]
    fn no_cap_passes_through_untouched() {
        let pairs = vec![(uuid(2), uuid(9)), (uuid(1), uuid(9))];
        assert_eq!(apply_account_cap(pairs.clone(), None), pairs);
    }
}
