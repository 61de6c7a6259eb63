use std::sync::Arc;

use chrono::{NaiveDateTime, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::dialer::pacing::PacingController;
use crate::dialer::types::{
    AgentState, AmdFallback, AmdVerdict, CallDisposition, MachinePolicyOutcome, QueueStatus,
};
use crate::dialer::voicemail::VoicemailPolicyExecutor;
use crate::error::{AppError, AppResult};
use crate::external::call_control::{CallControl, PlaceCallRequest};
use crate::models::{AgentStatus, CallAttempt, Campaign, Contact, NewCallAttempt, NewLead, QueueItem};
use crate::repositories::Repositories;

/// Owns a call's state from dial to disposition. Every step that touches
/// shared rows goes through a conditional write, so two engine instances
/// processing the same event converge on one outcome.
pub struct CallLifecycleManager {
    repos: Repositories,
    pacing: Arc<PacingController>,
    voicemail: Arc<VoicemailPolicyExecutor>,
    call_control: Arc<dyn CallControl>,
}

impl CallLifecycleManager {
    pub fn new(
        repos: Repositories,
        pacing: Arc<PacingController>,
        voicemail: Arc<VoicemailPolicyExecutor>,
        call_control: Arc<dyn CallControl>,
    ) -> Self {
        Self {
            repos,
            pacing,
            voicemail,
            call_control,
        }
    }

    /// Claims the queue item (and agent, in progressive mode), persists the
    /// attempt, then hands the dial to the provider. Returns `Ok(None)` when
    /// a concurrent claim won the item. Any failure after a claim unwinds
    /// what was claimed so nothing stays stuck in a transient state.
    pub async fn initiate(
        &self,
        campaign: &Campaign,
        item: &QueueItem,
        contact: &Contact,
        phone: &str,
        agent: Option<&AgentStatus>,
    ) -> AppResult<Option<CallAttempt>> {
        let claimed = self
            .repos
            .queue
            .transition(item.id, &[QueueStatus::Queued], QueueStatus::Calling)
            .await?;
        if !claimed {
            return Ok(None);
        }

        let attempt_id = Uuid::new_v4();

        if let Some(agent) = agent {
            let agent_claimed = self
                .repos
                .agents
                .transition(
                    agent.agent_id,
                    &[AgentState::Available],
                    AgentState::Busy,
                    Some(attempt_id),
                )
                .await?;
            if !agent_claimed {
                // Agent went away between the idle snapshot and now.
                self.repos
                    .queue
                    .transition(item.id, &[QueueStatus::Calling], QueueStatus::Queued)
                    .await?;
                return Ok(None);
            }
        }

        let attempt = match self
            .repos
            .calls
            .create_attempt(NewCallAttempt {
                id: attempt_id,
                campaign_id: campaign.id,
                contact_id: contact.id,
                account_id: contact.account_id,
                agent_id: agent.map(|a| a.agent_id),
                queue_item_id: Some(item.id),
                phone: phone.to_string(),
            })
            .await
        {
            Ok(attempt) => attempt,
            Err(e) => {
                self.unwind_initiation(item, agent, None).await;
                return Err(e);
            }
        };

        if let Err(e) = self
            .call_control
            .place_call(PlaceCallRequest {
                attempt_id: attempt.id,
                campaign_id: campaign.id,
                phone: phone.to_string(),
                amd_enabled: campaign.amd_enabled,
                agent_id: agent.map(|a| a.agent_id),
            })
            .await
        {
            self.unwind_initiation(item, agent, Some(attempt.id)).await;
            return Err(e);
        }

        self.pacing.record_initiated(campaign, 1);
        self.repos
            .calls
            .append_event(
                attempt.id,
                "dial_started",
                Some(json!({ "phone": phone, "dial_mode": campaign.dial_mode })),
            )
            .await?;

        tracing::info!(
            attempt_id = %attempt.id,
            campaign_id = %campaign.id,
            contact_id = %contact.id,
            agent_id = ?agent.map(|a| a.agent_id),
            "Call initiated"
        );

        Ok(Some(attempt))
    }

    /// Best-effort compensation for a failed initiation. Restores the queue
    /// item, the agent, and deletes the orphan attempt row. Failures here
    /// are logged, not propagated: the sweeper catches whatever is left.
    async fn unwind_initiation(
        &self,
        item: &QueueItem,
        agent: Option<&AgentStatus>,
        attempt_id: Option<Uuid>,
    ) {
        if let Some(id) = attempt_id
            && let Err(e) = self.repos.calls.delete_attempt(id).await
        {
            tracing::warn!(attempt_id = %id, error = %e, "Failed to delete orphan attempt");
        }

        if let Some(agent) = agent
            && let Err(e) = self
                .repos
                .agents
                .force_state(agent.agent_id, AgentState::Available, None)
                .await
        {
            tracing::warn!(agent_id = %agent.agent_id, error = %e, "Failed to release agent after dial failure");
        }

        if let Err(e) = self
            .repos
            .queue
            .transition(item.id, &[QueueStatus::Calling], QueueStatus::Queued)
            .await
        {
            tracing::warn!(queue_item_id = item.id, error = %e, "Failed to revert queue item after dial failure");
        }
    }

    /// Routes the answered call on the provider's AMD verdict. An unknown
    /// verdict, or one below the campaign's confidence threshold, is treated
    /// per the campaign's fallback, not at face value.
    pub async fn handle_amd(
        &self,
        attempt_id: Uuid,
        verdict: AmdVerdict,
        confidence: f64,
    ) -> AppResult<()> {
        let attempt = self.repos.calls.get_attempt(attempt_id).await?;
        if attempt.amd_verdict.is_some() {
            tracing::debug!(attempt_id = %attempt_id, "Duplicate AMD callback ignored");
            return Ok(());
        }
        let campaign = self.repos.campaigns.get(attempt.campaign_id).await?;

        let effective = effective_verdict(
            verdict,
            confidence,
            campaign.amd_confidence_threshold,
            campaign.amd_fallback,
        );

        self.repos
            .calls
            .append_event(
                attempt_id,
                "amd_result",
                Some(json!({
                    "verdict": verdict,
                    "confidence": confidence,
                    "effective": effective,
                })),
            )
            .await?;

        match effective {
            AmdVerdict::Human | AmdVerdict::Unknown => {
                self.route_human(&campaign, &attempt, effective, confidence)
                    .await
            }
            AmdVerdict::Machine => {
                self.route_machine(&campaign, &attempt, confidence).await
            }
        }
    }

    async fn route_human(
        &self,
        campaign: &Campaign,
        attempt: &CallAttempt,
        verdict: AmdVerdict,
        confidence: f64,
    ) -> AppResult<()> {
        let agent_id = match attempt.agent_id {
            // Progressive: the agent was bound at dial time.
            Some(agent_id) => Some(agent_id),
            // Predictive: claim an idle agent now that a human answered.
            None => self.claim_idle_agent(campaign.id, attempt.id).await?,
        };

        let Some(agent_id) = agent_id else {
            // Nobody free: this is an abandoned call by definition.
            tracing::warn!(
                attempt_id = %attempt.id,
                campaign_id = %campaign.id,
                "Human answered but no agent available; call abandoned"
            );
            self.repos
                .calls
                .record_amd(attempt.id, verdict, confidence, None)
                .await?;
            self.repos
                .calls
                .set_disposition(attempt.id, CallDisposition::Abandoned)
                .await?;
            self.repos
                .calls
                .append_event(attempt.id, "call_abandoned", None)
                .await?;
            self.pacing.record_abandoned(campaign);
            if let Some(item_id) = attempt.queue_item_id {
                self.repos
                    .queue
                    .transition(item_id, &[QueueStatus::Calling], QueueStatus::Done)
                    .await?;
            }
            return Ok(());
        };

        self.repos
            .calls
            .record_amd(attempt.id, verdict, confidence, Some(agent_id))
            .await?;
        self.repos.calls.mark_connected(attempt.id).await?;
        self.repos
            .calls
            .append_event(
                attempt.id,
                "routed_to_agent",
                Some(json!({ "agent_id": agent_id })),
            )
            .await?;

        if let Some(item_id) = attempt.queue_item_id {
            self.repos
                .queue
                .transition(item_id, &[QueueStatus::Calling], QueueStatus::InProgress)
                .await?;
        }

        self.pacing.record_answered(campaign);
        self.repos
            .stats
            .bump_campaign(campaign.id, 0, 1, 0)
            .await?;
        self.repos
            .stats
            .bump_account(attempt.account_id, 0, 1, 0)
            .await?;

        tracing::info!(attempt_id = %attempt.id, agent_id = %agent_id, "Call connected to agent");
        Ok(())
    }

    /// Claims the longest-idle available agent for a predictive connect.
    /// Loops because the snapshot races other claims.
    async fn claim_idle_agent(
        &self,
        campaign_id: Uuid,
        attempt_id: Uuid,
    ) -> AppResult<Option<Uuid>> {
        let idle = self.repos.agents.idle_agents(campaign_id).await?;
        for candidate in idle {
            let claimed = self
                .repos
                .agents
                .transition(
                    candidate.agent_id,
                    &[AgentState::Available],
                    AgentState::Busy,
                    Some(attempt_id),
                )
                .await?;
            if claimed {
                return Ok(Some(candidate.agent_id));
            }
        }
        Ok(None)
    }

    async fn route_machine(
        &self,
        campaign: &Campaign,
        attempt: &CallAttempt,
        confidence: f64,
    ) -> AppResult<()> {
        // A progressive agent bound at dial time goes back to the pool; the
        // machine policy does not need a human. The attempt's agent binding
        // is cleared with it, so the later ended-callback cannot disturb an
        // agent who has since picked up a different call.
        self.repos
            .calls
            .record_amd(attempt.id, AmdVerdict::Machine, confidence, None)
            .await?;

        if let Some(agent_id) = attempt.agent_id {
            self.repos
                .agents
                .transition(
                    agent_id,
                    &[AgentState::Busy],
                    AgentState::Available,
                    None,
                )
                .await?;
        }

        self.pacing.record_abandoned(campaign);

        let contact = self.repos.contacts.get(attempt.contact_id).await?;
        let outcome = self
            .voicemail
            .execute_machine_policy(campaign, attempt, &contact)
            .await?;

        if matches!(outcome, MachinePolicyOutcome::Skipped { .. }) {
            self.repos
                .calls
                .set_disposition(attempt.id, CallDisposition::NoAnswer)
                .await?;
        }

        if let Some(item_id) = attempt.queue_item_id {
            self.repos
                .queue
                .transition(item_id, &[QueueStatus::Calling], QueueStatus::Done)
                .await?;
        }

        tracing::info!(attempt_id = %attempt.id, outcome = ?outcome, "Machine detected");
        Ok(())
    }

    /// Provider answered-callback for campaigns dialing without AMD. When
    /// AMD is on, `handle_amd` already counted the connect.
    pub async fn handle_answered(&self, attempt_id: Uuid) -> AppResult<()> {
        let attempt = self.repos.calls.get_attempt(attempt_id).await?;
        self.repos.calls.mark_connected(attempt_id).await?;
        self.repos
            .calls
            .append_event(attempt_id, "call_answered", None)
            .await?;

        if attempt.amd_verdict.is_none() {
            let campaign = self.repos.campaigns.get(attempt.campaign_id).await?;
            if !campaign.amd_enabled {
                self.pacing.record_answered(&campaign);
                self.repos.stats.bump_campaign(campaign.id, 0, 1, 0).await?;
                self.repos
                    .stats
                    .bump_account(attempt.account_id, 0, 1, 0)
                    .await?;
                if let Some(item_id) = attempt.queue_item_id {
                    self.repos
                        .queue
                        .transition(item_id, &[QueueStatus::Calling], QueueStatus::InProgress)
                        .await?;
                }
            }
        }

        Ok(())
    }

    /// Final settlement for an attempt. Idempotent: the conditional close on
    /// `ended_at` makes a duplicate callback a no-op.
    pub async fn handle_ended(
        &self,
        attempt_id: Uuid,
        ended_at: NaiveDateTime,
        disposition: Option<CallDisposition>,
        recording_url: Option<String>,
    ) -> AppResult<()> {
        let attempt = self.repos.calls.get_attempt(attempt_id).await?;

        let final_disposition = disposition
            .or(attempt.disposition)
            .unwrap_or(CallDisposition::NoAnswer);
        let duration_secs = (ended_at - attempt.started_at).num_seconds().max(0) as i32;

        let closed = self
            .repos
            .calls
            .finish_attempt(
                attempt_id,
                ended_at,
                duration_secs,
                final_disposition,
                recording_url,
            )
            .await?;
        if !closed {
            tracing::debug!(attempt_id = %attempt_id, "Duplicate ended callback ignored");
            return Ok(());
        }

        if final_disposition == CallDisposition::Qualified {
            self.record_qualified_lead(&attempt).await?;
        }

        if let Some(agent_id) = attempt.agent_id {
            let settled = self
                .repos
                .agents
                .finish_call(agent_id, attempt_id, duration_secs as i64)
                .await?;
            if !settled {
                tracing::debug!(
                    attempt_id = %attempt_id,
                    agent_id = %agent_id,
                    "Agent no longer on this attempt; wrap-up skipped"
                );
            }
        }

        if let Some(item_id) = attempt.queue_item_id {
            self.repos
                .queue
                .transition(
                    item_id,
                    &[QueueStatus::Calling, QueueStatus::InProgress],
                    QueueStatus::Done,
                )
                .await?;
        }

        self.repos
            .calls
            .append_event(
                attempt_id,
                "call_ended",
                Some(json!({
                    "disposition": final_disposition,
                    "duration_secs": duration_secs,
                })),
            )
            .await?;

        self.repos
            .activity
            .append_best_effort(crate::models::NewActivityLog {
                contact_id: attempt.contact_id,
                kind: "call".to_string(),
                body: format!(
                    "Outbound call ended: {final_disposition:?}, {duration_secs}s"
                ),
            })
            .await;

        tracing::info!(
            attempt_id = %attempt_id,
            disposition = ?final_disposition,
            duration_secs,
            "Call ended"
        );
        Ok(())
    }

    async fn record_qualified_lead(&self, attempt: &CallAttempt) -> AppResult<()> {
        let campaign = self.repos.campaigns.get(attempt.campaign_id).await?;

        if let Some(cap) = campaign.max_leads {
            let current = self.repos.leads.count_for_campaign(campaign.id).await?;
            if current >= cap as i64 {
                tracing::warn!(
                    campaign_id = %campaign.id,
                    cap,
                    "Lead cap reached; qualified call not converted"
                );
                return Ok(());
            }
        }

        let created = self
            .repos
            .leads
            .create_from_attempt(NewLead {
                attempt_id: attempt.id,
                campaign_id: attempt.campaign_id,
                contact_id: attempt.contact_id,
                account_id: attempt.account_id,
                agent_id: attempt.agent_id,
                status: "new".to_string(),
            })
            .await?;

        // None means a lead for this attempt already exists, which is the
        // idempotent path for a replayed callback.
        if created.is_some() {
            self.repos
                .stats
                .bump_campaign(attempt.campaign_id, 0, 0, 1)
                .await?;
            self.repos
                .stats
                .bump_account(attempt.account_id, 0, 0, 1)
                .await?;
        }

        Ok(())
    }

    /// Agent finished after-call work and is callable again.
    pub async fn complete_wrap_up(&self, agent_id: Uuid) -> AppResult<()> {
        let moved = self
            .repos
            .agents
            .transition(
                agent_id,
                &[AgentState::AfterCallWork],
                AgentState::Available,
                None,
            )
            .await?;
        if !moved {
            return Err(AppError::BadRequest {
                message: "agent is not in after-call work".to_string(),
            });
        }
        Ok(())
    }
}

/// Resolves the verdict the router acts on. Unknown classifications and
/// anything below the campaign's confidence threshold take the campaign's
/// fallback action instead of their face value.
fn effective_verdict(
    verdict: AmdVerdict,
    confidence: f64,
    threshold: f64,
    fallback: AmdFallback,
) -> AmdVerdict {
    if verdict == AmdVerdict::Unknown || confidence < threshold {
        match fallback {
            AmdFallback::Agent => AmdVerdict::Human,
            AmdFallback::Voicemail => AmdVerdict::Machine,
        }
    } else {
        verdict
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confident_verdicts_taken_at_face_value() {
        assert_eq!(
            effective_verdict(AmdVerdict::Human, 0.9, 0.7, AmdFallback::Voicemail),
            AmdVerdict::Human
        );
        assert_eq!(
            effective_verdict(AmdVerdict::Machine, 0.8, 0.7, AmdFallback::Agent),
            AmdVerdict::Machine
        );
    }

    #[test]
    fn unknown_takes_fallback_even_at_high_confidence() {
        assert_eq!(
            effective_verdict(AmdVerdict::Unknown, 0.95, 0.7, AmdFallback::Voicemail),
            AmdVerdict::Machine
        );
        assert_eq!(
            effective_verdict(AmdVerdict::Unknown, 0.95, 0.7, AmdFallback::Agent),
            AmdVerdict::Human
        );
    }

    #[test]
    fn low_confidence_takes_fallback() {
        assert_eq!(
            effective_verdict(AmdVerdict::Human, 0.4, 0.7, AmdFallback::Voicemail),
            AmdVerdict::Machine
        );
        assert_eq!(
            effective_verdict(AmdVerdict::Machine, 0.4, 0.7, AmdFallback::Agent),
            AmdVerdict::Human
        );
    }

    #[test]
    fn threshold_is_inclusive() {
        assert_eq!(
            effective_verdict(AmdVerdict::Machine, 0.7, 0.7, AmdFallback::Agent),
            AmdVerdict::Machine
        );
    }
}
