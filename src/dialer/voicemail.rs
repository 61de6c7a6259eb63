use std::sync::LazyLock;

use chrono::{NaiveDateTime, NaiveTime, TimeDelta, Utc};
use regex::Regex;
use serde_json::json;

use crate::dialer::types::{CallDisposition, MachinePolicyOutcome, VmAction, VmSkipReason};
use crate::error::AppResult;
use crate::models::{CallAttempt, Campaign, Contact};
use crate::repositories::Repositories;

/// Executes a campaign's machine policy for one AMD-machine attempt.
///
/// Gates run in a fixed order and short-circuit on the first failure:
/// campaign daily cap, per-contact cap, cooldown, then the local-time
/// window. A contact without a timezone hint passes the window gate.
pub struct VoicemailPolicyExecutor {
    repos: Repositories,
}

impl VoicemailPolicyExecutor {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    pub async fn execute_machine_policy(
        &self,
        campaign: &Campaign,
        attempt: &CallAttempt,
        contact: &Contact,
    ) -> AppResult<MachinePolicyOutcome> {
        let now = Utc::now().naive_utc();

        let daily_count = match campaign.vm_daily_cap {
            Some(_) => {
                let midnight = now.date().and_hms_opt(0, 0, 0).unwrap_or(now);
                self.repos
                    .calls
                    .campaign_voicemails_since(campaign.id, midnight)
                    .await?
            }
            None => 0,
        };
        let tracking = self
            .repos
            .voicemail
            .get_tracking(contact.id, campaign.id)
            .await?;

        let gates = VmGateInput {
            action: campaign.vm_action,
            daily_cap: campaign.vm_daily_cap,
            daily_count,
            max_per_contact: campaign.vm_max_per_contact,
            vm_count: tracking.as_ref().map(|t| t.vm_count).unwrap_or(0),
            cooldown_hours: campaign.vm_cooldown_hours,
            last_vm_at: tracking.as_ref().map(|t| t.last_vm_at),
            window: match (campaign.vm_window_start, campaign.vm_window_end) {
                (Some(s), Some(e)) => Some((s, e)),
                _ => None,
            },
            contact_offset_minutes: contact.utc_offset_minutes,
            now,
        };

        let action = match evaluate_gates(&gates) {
            Ok(action) => action,
            Err(reason) => {
                tracing::debug!(
                    attempt_id = %attempt.id,
                    campaign_id = %campaign.id,
                    reason = reason.as_str(),
                    "Machine policy skipped"
                );
                return Ok(MachinePolicyOutcome::Skipped { reason });
            }
        };

        match action {
            VmAction::LeaveVoicemail => self.leave_voicemail(campaign, attempt, contact, now).await,
            VmAction::ScheduleCallback => self.schedule_callback(campaign, attempt, now).await,
            VmAction::DropSilent => {
                self.repos
                    .calls
                    .set_disposition(attempt.id, CallDisposition::DroppedSilent)
                    .await?;
                self.repos
                    .calls
                    .append_event(attempt.id, "machine_dropped_silent", None)
                    .await?;
                Ok(MachinePolicyOutcome::DroppedSilent)
            }
        }
    }

    async fn leave_voicemail(
        &self,
        campaign: &Campaign,
        attempt: &CallAttempt,
        contact: &Contact,
        now: NaiveDateTime,
    ) -> AppResult<MachinePolicyOutcome> {
        let rendered = campaign.vm_tts_template.as_deref().map(|template| {
            let ctx = TemplateContext::for_call(campaign, contact, now);
            render_template(template, &ctx)
        });

        self.repos
            .calls
            .record_voicemail(attempt.id, campaign.vm_asset_id, None)
            .await?;
        self.repos
            .calls
            .set_disposition(attempt.id, CallDisposition::VoicemailLeft)
            .await?;
        self.repos
            .voicemail
            .record_voicemail(contact.id, campaign.id, now)
            .await?;
        self.repos
            .calls
            .append_event(
                attempt.id,
                "voicemail_left",
                Some(json!({ "asset_id": campaign.vm_asset_id, "tts": rendered.is_some() })),
            )
            .await?;

        Ok(MachinePolicyOutcome::VoicemailLeft {
            rendered_message: rendered,
        })
    }

    async fn schedule_callback(
        &self,
        campaign: &Campaign,
        attempt: &CallAttempt,
        now: NaiveDateTime,
    ) -> AppResult<MachinePolicyOutcome> {
        // Re-queue timing belongs to the campaign's retry policy; this only
        // records intent plus a suggested time.
        let suggested_at =
            now + TimeDelta::minutes(campaign.callback_delay_minutes.max(0) as i64);

        self.repos
            .calls
            .set_disposition(attempt.id, CallDisposition::Callback)
            .await?;
        self.repos
            .calls
            .append_event(
                attempt.id,
                "callback_scheduled",
                Some(json!({ "suggested_at": suggested_at.and_utc().to_rfc3339() })),
            )
            .await?;

        Ok(MachinePolicyOutcome::CallbackScheduled { suggested_at })
    }
}

/// Everything the gate chain looks at, snapshotted so the decision is a
/// pure function.
#[derive(Debug, Clone)]
pub(crate) struct VmGateInput {
    pub action: Option<VmAction>,
    pub daily_cap: Option<i32>,
    pub daily_count: i64,
    pub max_per_contact: i32,
    pub vm_count: i32,
    pub cooldown_hours: i32,
    pub last_vm_at: Option<NaiveDateTime>,
    pub window: Option<(NaiveTime, NaiveTime)>,
    pub contact_offset_minutes: Option<i32>,
    pub now: NaiveDateTime,
}

pub(crate) fn evaluate_gates(input: &VmGateInput) -> Result<VmAction, VmSkipReason> {
    let Some(action) = input.action else {
        return Err(VmSkipReason::NoPolicyConfigured);
    };

    if let Some(cap) = input.daily_cap
        && input.daily_count >= cap as i64
    {
        return Err(VmSkipReason::CampaignVmCapReached);
    }

    if input.vm_count >= input.max_per_contact {
        return Err(VmSkipReason::ContactVmCapReached);
    }

    if let Some(last) = input.last_vm_at {
        let cooldown_until = last + TimeDelta::hours(input.cooldown_hours.max(0) as i64);
        if input.now < cooldown_until {
            return Err(VmSkipReason::CooldownActive);
        }
    }

    if let (Some((start, end)), Some(offset)) = (input.window, input.contact_offset_minutes) {
        let local = (input.now + TimeDelta::minutes(offset as i64)).time();
        let inside = if start <= end {
            local >= start && local < end
        } else {
            local >= start || local < end
        };
        if !inside {
            return Err(VmSkipReason::OutsideVmWindow);
        }
    }

    Ok(action)
}

static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([a-zA-Z]+)\.([a-zA-Z_]+)\s*\}\}").expect("token regex is valid")
});

/// Typed substitution context for voicemail TTS templates.
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    pub contact_first_name: String,
    pub contact_last_name: String,
    pub contact_full_name: String,
    pub company_name: String,
    pub campaign_name: String,
    pub callback_time: String,
}

impl TemplateContext {
    pub fn for_call(campaign: &Campaign, contact: &Contact, now: NaiveDateTime) -> Self {
        let callback_at = now + TimeDelta::minutes(campaign.callback_delay_minutes.max(0) as i64);
        Self {
            contact_first_name: contact.first_name.clone(),
            contact_last_name: contact.last_name.clone(),
            contact_full_name: contact.full_name(),
            company_name: contact.company_name.clone().unwrap_or_default(),
            campaign_name: campaign.name.clone(),
            callback_time: callback_at.format("%H:%M").to_string(),
        }
    }

    /// Enumerated `{{namespace.field}}` lookup. `None` means the token is
    /// unknown and must be left verbatim.
    fn lookup(&self, namespace: &str, field: &str) -> Option<&str> {
        match (namespace, field) {
            ("contact", "first_name") => Some(&self.contact_first_name),
            ("contact", "last_name") => Some(&self.contact_last_name),
            ("contact", "full_name") => Some(&self.contact_full_name),
            ("company", "name") => Some(&self.company_name),
            ("campaign", "name") => Some(&self.campaign_name),
            ("callback", "time") => Some(&self.callback_time),
            _ => None,
        }
    }
}

/// Substitutes `{{namespace.field}}` tokens. Unknown tokens stay verbatim,
/// never silently dropped.
pub fn render_template(template: &str, ctx: &TemplateContext) -> String {
    TOKEN_RE
        .replace_all(template, |caps: &regex::Captures<'_>| {
            match ctx.lookup(&caps[1], &caps[2]) {
                Some(value) => value.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn base_input() -> VmGateInput {
        VmGateInput {
            action: Some(VmAction::LeaveVoicemail),
            daily_cap: None,
            daily_count: 0,
            max_per_contact: 3,
            vm_count: 0,
            cooldown_hours: 24,
            last_vm_at: None,
            window: None,
            contact_offset_minutes: None,
            now: NaiveDate::from_ymd_opt(2025, 6, 2)
                .unwrap()
                .and_hms_opt(15, 0, 0)
                .unwrap(),
        }
    }

    #[test]
    fn passes_with_clean_slate() {
        assert_eq!(evaluate_gates(&base_input()), Ok(VmAction::LeaveVoicemail));
    }

    #[test]
    fn no_policy_short_circuits_first() {
        let mut input = base_input();
        input.action = None;
        input.vm_count = 99; // would also fail later gates
        assert_eq!(evaluate_gates(&input), Err(VmSkipReason::NoPolicyConfigured));
    }

    #[test]
    fn campaign_daily_cap_precedes_contact_cap() {
        let mut input = base_input();
        input.daily_cap = Some(50);
        input.daily_count = 50;
        input.vm_count = 3;
        assert_eq!(evaluate_gates(&input), Err(VmSkipReason::CampaignVmCapReached));
    }

    #[test]
    fn contact_cap_blocks_all_further_voicemails() {
        let mut input = base_input();
        input.vm_count = 3;
        assert_eq!(evaluate_gates(&input), Err(VmSkipReason::ContactVmCapReached));
        input.vm_count = 7;
        assert_eq!(evaluate_gates(&input), Err(VmSkipReason::ContactVmCapReached));
    }

    #[test]
    fn cooldown_blocks_until_elapsed() {
        let mut input = base_input();
        input.last_vm_at = Some(input.now - TimeDelta::hours(12));
        assert_eq!(evaluate_gates(&input), Err(VmSkipReason::CooldownActive));

        input.last_vm_at = Some(input.now - TimeDelta::hours(25));
        assert_eq!(evaluate_gates(&input), Ok(VmAction::LeaveVoicemail));
    }

    #[test]
    fn window_gate_uses_contact_local_time() {
        let mut input = base_input();
        input.window = Some((
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
        ));
        // 15:00 UTC at UTC+6 is 21:00 local: outside.
        input.contact_offset_minutes = Some(360);
        assert_eq!(evaluate_gates(&input), Err(VmSkipReason::OutsideVmWindow));
        // Unknown timezone: treated as allowed.
        input.contact_offset_minutes = None;
        assert_eq!(evaluate_gates(&input), Ok(VmAction::LeaveVoicemail));
    }

    fn ctx() -> TemplateContext {
        TemplateContext {
            contact_first_name: "Grace".to_string(),
            contact_last_name: "Hopper".to_string(),
            contact_full_name: "Grace Hopper".to_string(),
            company_name: "Eckert-Mauchly".to_string(),
            campaign_name: "Q3 Outreach".to_string(),
            callback_time: "14:30".to_string(),
        }
    }

    #[test]
    fn renders_known_tokens() {
        let out = render_template(
            "Hi {{contact.first_name}}, this is about {{campaign.name}} at {{company.name}}.",
            &ctx(),
        );
        assert_eq!(out, "Hi Grace, this is about Q3 Outreach at Eckert-Mauchly.");
    }

    #[test]
    fn unresolved_tokens_stay_verbatim() {
        let out = render_template("Hello {{contact.first_name}} {{contact.fax_number}}", &ctx());
        assert_eq!(out, "Hello Grace {{contact.fax_number}}");
    }

    #[test]
    fn tolerates_whitespace_inside_tokens() {
        let out = render_template("Call back around {{ callback.time }}.", &ctx());
        assert_eq!(out, "Call back around 14:30.");
    }

    #[test]
    fn unknown_namespace_left_untouched() {
        let out = render_template("{{weather.today}}", &ctx());
        assert_eq!(out, "{{weather.today}}");
    }
}
