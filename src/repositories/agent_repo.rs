use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::AsyncDbPool;
use crate::dialer::types::AgentState;
use crate::error::{AppError, AppResult};
use crate::models::AgentStatus;
use crate::repositories::acquire;
use crate::schema::agent_statuses;

/// Data access for the agent availability state machine.
#[derive(Clone)]
pub struct AgentRepository {
    pool: AsyncDbPool,
}

impl AgentRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, agent_id: Uuid) -> AppResult<AgentStatus> {
        let mut conn = acquire(&self.pool).await?;

        agent_statuses::table
            .find(agent_id)
            .select(AgentStatus::as_select())
            .first(&mut conn)
            .await
            .map_err(|e| match e {
                diesel::result::Error::NotFound => AppError::NotFound {
                    entity: "Agent".to_string(),
                    field: "id".to_string(),
                    value: agent_id.to_string(),
                },
                _ => AppError::from(e),
            })
    }

    /// Idle agents assigned to a campaign, longest idle first.
    pub async fn idle_agents(&self, campaign_id: Uuid) -> AppResult<Vec<AgentStatus>> {
        let mut conn = acquire(&self.pool).await?;

        agent_statuses::table
            .filter(agent_statuses::campaign_id.eq(campaign_id))
            .filter(agent_statuses::state.eq(AgentState::Available))
            .order(agent_statuses::last_state_change_at.asc())
            .select(AgentStatus::as_select())
            .load(&mut conn)
            .await
            .map_err(AppError::from)
    }

    /// Number of the campaign's agents currently in after-call work.
    pub async fn wrap_up_count(&self, campaign_id: Uuid) -> AppResult<i64> {
        let mut conn = acquire(&self.pool).await?;

        agent_statuses::table
            .filter(agent_statuses::campaign_id.eq(campaign_id))
            .filter(agent_statuses::state.eq(AgentState::AfterCallWork))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)
    }

    /// Conditional state transition. Returns `false` when the agent was no
    /// longer in one of the expected states (a concurrent claim won).
    pub async fn transition(
        &self,
        agent_id: Uuid,
        expected: &[AgentState],
        next: AgentState,
        current_attempt_id: Option<Uuid>,
    ) -> AppResult<bool> {
        let mut conn = acquire(&self.pool).await?;

        let updated = diesel::update(
            agent_statuses::table
                .filter(agent_statuses::agent_id.eq(agent_id))
                .filter(agent_statuses::state.eq_any(expected.to_vec())),
        )
        .set((
            agent_statuses::state.eq(next),
            agent_statuses::current_attempt_id.eq(current_attempt_id),
            agent_statuses::last_state_change_at.eq(diesel::dsl::now),
            agent_statuses::updated_at.eq(diesel::dsl::now),
        ))
        .execute(&mut conn)
        .await
        .map_err(AppError::from)?;

        Ok(updated == 1)
    }

    /// Unconditional state write, used only by the initiation rollback path
    /// to restore the pre-call state.
    pub async fn force_state(
        &self,
        agent_id: Uuid,
        state: AgentState,
        current_attempt_id: Option<Uuid>,
    ) -> AppResult<()> {
        let mut conn = acquire(&self.pool).await?;

        diesel::update(agent_statuses::table.find(agent_id))
            .set((
                agent_statuses::state.eq(state),
                agent_statuses::current_attempt_id.eq(current_attempt_id),
                agent_statuses::last_state_change_at.eq(diesel::dsl::now),
                agent_statuses::updated_at.eq(diesel::dsl::now),
            ))
            .execute(&mut conn)
            .await
            .map_err(AppError::from)?;

        Ok(())
    }

    /// Moves an agent to after-call-work and folds the finished call into
    /// the daily counters in one atomic write. Conditional on the agent
    /// still being busy with the given attempt: an agent released early and
    /// claimed for a new call is left alone, and the caller sees `false`.
    pub async fn finish_call(
        &self,
        agent_id: Uuid,
        attempt_id: Uuid,
        talk_secs: i64,
    ) -> AppResult<bool> {
        let mut conn = acquire(&self.pool).await?;

        let updated = finish_call_statement(agent_id, attempt_id, talk_secs)
            .execute(&mut conn)
            .await
            .map_err(AppError::from)?;

        Ok(updated == 1)
    }
}

fn finish_call_statement(
    agent_id: Uuid,
    attempt_id: Uuid,
    talk_secs: i64,
) -> impl diesel::query_builder::QueryFragment<diesel::pg::Pg>
+ diesel::query_builder::QueryId
+ Send {
    diesel::update(
        agent_statuses::table
            .filter(agent_statuses::agent_id.eq(agent_id))
            .filter(agent_statuses::state.eq(AgentState::Busy))
            .filter(agent_statuses::current_attempt_id.eq(attempt_id)),
    )
    .set((
        agent_statuses::state.eq(AgentState::AfterCallWork),
        agent_statuses::current_attempt_id.eq(None::<Uuid>),
        agent_statuses::calls_today.eq(agent_statuses::calls_today + 1),
        agent_statuses::talk_time_today_secs
            .eq(agent_statuses::talk_time_today_secs + talk_secs),
        agent_statuses::last_call_ended_at.eq(diesel::dsl::now),
        agent_statuses::last_state_change_at.eq(diesel::dsl::now),
        agent_statuses::updated_at.eq(diesel::dsl::now),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use diesel::pg::Pg;

    #[test]
    fn wrap_up_write_requires_busy_state_and_matching_attempt() {
        let statement = finish_call_statement(Uuid::nil(), Uuid::nil(), 42);
        let sql = diesel::debug_query::<Pg, _>(&statement).to_string();

        // An agent already released to another call must not be touched.
        assert!(sql.contains(r#""agent_statuses"."state" = $"#), "{sql}");
        assert!(
            sql.contains(r#""agent_statuses"."current_attempt_id" = $"#),
            "{sql}"
        );
    }
}
