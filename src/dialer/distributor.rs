use std::sync::Arc;

use chrono::{NaiveDateTime, NaiveTime, TimeDelta, Utc};

use crate::dialer::lifecycle::CallLifecycleManager;
use crate::dialer::types::{DialMode, QueueStatus, RemovalReason};
use crate::error::AppResult;
use crate::models::{AgentStatus, Campaign, Contact, QueueItem};
use crate::repositories::Repositories;

/// What happened to each candidate drawn in one distribution pass.
#[derive(Debug, Default, Clone, Copy)]
pub struct DistributionReport {
    pub dialed: usize,
    pub deferred_outside_hours: usize,
    pub removed: usize,
    pub lost_races: usize,
}

/// Pulls eligible queued contacts and pairs them with idle agents.
///
/// Candidates come out in priority-then-FIFO order; agents are consumed
/// longest-idle first. Eligibility short-circuits on the first failing
/// check: no callable phone, outside calling hours (left queued for the
/// next cycle), campaign suppression, then DNC (the contact's own row
/// flag or a global list entry).
pub struct CallDistributor {
    repos: Repositories,
    lifecycle: Arc<CallLifecycleManager>,
}

impl CallDistributor {
    pub fn new(repos: Repositories, lifecycle: Arc<CallLifecycleManager>) -> Self {
        Self { repos, lifecycle }
    }

    pub async fn distribute(
        &self,
        campaign: &Campaign,
        idle_agents: &[AgentStatus],
        batch_size: usize,
    ) -> AppResult<DistributionReport> {
        let mut report = DistributionReport::default();
        if batch_size == 0 {
            return Ok(report);
        }

        let candidates = self
            .repos
            .queue
            .next_power_candidates(campaign.id, batch_size as i64)
            .await?;

        // Progressive mode binds an agent up front; predictive dials ahead
        // and routes on AMD, so no agent is reserved here.
        let mut agents = idle_agents.iter();
        let now = Utc::now().naive_utc();

        for item in candidates {
            if report.dialed >= batch_size {
                break;
            }

            let contact = match self.repos.contacts.get(item.contact_id).await {
                Ok(contact) => contact,
                Err(crate::error::AppError::NotFound { .. }) => {
                    self.remove_item(&item, RemovalReason::ContactMissing).await?;
                    report.removed += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };

            let Some(phone) = resolve_callable_phone(&contact) else {
                self.remove_item(&item, RemovalReason::NoCallablePhone).await?;
                report.removed += 1;
                continue;
            };

            if !within_calling_window(now, effective_offset(campaign, &contact), calling_window(campaign)) {
                // Not a removal: the contact becomes eligible again once
                // their local clock enters the window.
                report.deferred_outside_hours += 1;
                continue;
            }

            if self
                .repos
                .suppression
                .is_campaign_suppressed(campaign.id, contact.id, contact.account_id, &phone)
                .await?
            {
                self.remove_item(&item, RemovalReason::SuppressedCampaign).await?;
                report.removed += 1;
                continue;
            }

            let listed_dnc = self.repos.suppression.is_global_dnc(contact.id, &phone).await?;
            if dnc_blocked(&contact, listed_dnc) {
                self.remove_item(&item, RemovalReason::SuppressedDnc).await?;
                report.removed += 1;
                continue;
            }

            let agent = match campaign.dial_mode {
                DialMode::Progressive => {
                    let Some(agent) = agents.next() else {
                        break; // no idle agent left this pass
                    };
                    Some(agent)
                }
                _ => None,
            };

            match self.lifecycle.initiate(campaign, &item, &contact, &phone, agent).await {
                Ok(Some(_attempt)) => report.dialed += 1,
                Ok(None) => report.lost_races += 1,
                Err(e) => {
                    tracing::error!(
                        campaign_id = %campaign.id,
                        queue_item_id = item.id,
                        error = %e,
                        "Call initiation failed; item left queued"
                    );
                }
            }
        }

        Ok(report)
    }

    async fn remove_item(&self, item: &QueueItem, reason: RemovalReason) -> AppResult<()> {
        let removed = self
            .repos
            .queue
            .remove(item.id, &[QueueStatus::Queued], reason)
            .await?;
        if removed {
            tracing::debug!(queue_item_id = item.id, reason = %reason, "Queue item removed");
        }
        Ok(())
    }
}

/// Best callable number for the contact: direct line first, then mobile,
/// first one that survives the sanity check wins.
pub fn resolve_callable_phone(contact: &Contact) -> Option<String> {
    [&contact.direct_phone, &contact.mobile_phone]
        .into_iter()
        .flatten()
        .find(|p| is_dialable(p))
        .cloned()
}

/// E.164-lite sanity check: optional leading '+', 7 to 15 digits after
/// stripping separators.
fn is_dialable(phone: &str) -> bool {
    let trimmed = phone.trim();
    let rest = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let digits: String = rest.chars().filter(|c| !matches!(c, ' ' | '-' | '(' | ')' | '.')).collect();
    (7..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit())
}

/// A contact is DNC-blocked by the flag on their own row or by a global
/// suppression entry; either alone is enough.
pub fn dnc_blocked(contact: &Contact, globally_listed: bool) -> bool {
    contact.do_not_call || globally_listed
}

/// Contact-local offset when the contact carries a timezone hint, else the
/// campaign's timezone.
pub fn effective_offset(campaign: &Campaign, contact: &Contact) -> i32 {
    contact.utc_offset_minutes.unwrap_or(campaign.utc_offset_minutes)
}

fn calling_window(campaign: &Campaign) -> Option<(NaiveTime, NaiveTime)> {
    match (campaign.calling_window_start, campaign.calling_window_end) {
        (Some(start), Some(end)) => Some((start, end)),
        _ => None,
    }
}

/// Whether the local clock at `offset_minutes` falls inside the window.
/// No configured window means always callable; windows may wrap midnight.
pub fn within_calling_window(
    now_utc: NaiveDateTime,
    offset_minutes: i32,
    window: Option<(NaiveTime, NaiveTime)>,
) -> bool {
    let Some((start, end)) = window else {
        return true;
    };
    let local = (now_utc + TimeDelta::minutes(offset_minutes as i64)).time();
    if start <= end {
        local >= start && local < end
    } else {
        local >= start || local < end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn contact(direct: Option<&str>, mobile: Option<&str>) -> Contact {
        Contact {
            id: Uuid::new_v4(),
            account_id: Uuid::new_v4(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            title: None,
            company_name: None,
            email: None,
            direct_phone: direct.map(str::to_string),
            mobile_phone: mobile.map(str::to_string),
            country_code: Some("US".to_string()),
            utc_offset_minutes: None,
            do_not_call: false,
            created_at: NaiveDateTime::default(),
            updated_at: NaiveDateTime::default(),
        }
    }

    #[test]
    fn direct_phone_preferred_over_mobile() {
        let c = contact(Some("+1 415 555 0100"), Some("+1 415 555 0101"));
        assert_eq!(resolve_callable_phone(&c).as_deref(), Some("+1 415 555 0100"));
    }

    #[test]
    fn falls_back_to_mobile_when_direct_is_junk() {
        let c = contact(Some("n/a"), Some("+44 20 7946 0958"));
        assert_eq!(resolve_callable_phone(&c).as_deref(), Some("+44 20 7946 0958"));
    }

    #[test]
    fn no_callable_phone_when_both_invalid() {
        assert!(resolve_callable_phone(&contact(Some("123"), None)).is_none());
        assert!(resolve_callable_phone(&contact(None, None)).is_none());
        assert!(resolve_callable_phone(&contact(Some("+1-800-CALL-NOW"), None)).is_none());
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 2)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn window(s: (u32, u32), e: (u32, u32)) -> Option<(NaiveTime, NaiveTime)> {
        Some((
            NaiveTime::from_hms_opt(s.0, s.1, 0).unwrap(),
            NaiveTime::from_hms_opt(e.0, e.1, 0).unwrap(),
        ))
    }

    #[test]
    fn row_level_dnc_flag_blocks_without_a_list_entry() {
        let mut flagged = contact(Some("+1 415 555 0100"), None);
        flagged.do_not_call = true;
        assert!(dnc_blocked(&flagged, false));

        let clean = contact(Some("+1 415 555 0100"), None);
        assert!(!dnc_blocked(&clean, false));
        assert!(dnc_blocked(&clean, true));
    }

    #[test]
    fn no_window_always_callable() {
        assert!(within_calling_window(at(3, 0), 0, None));
    }

    #[test]
    fn window_respects_local_offset() {
        // 16:00 UTC is 09:00 at UTC-7, inside a 9-17 window.
        assert!(within_calling_window(at(16, 0), -420, window((9, 0), (17, 0))));
        // But 16:00 UTC is outside the window for a UTC+6 contact (22:00).
        assert!(!within_calling_window(at(16, 0), 360, window((9, 0), (17, 0))));
    }

    #[test]
    fn window_end_is_exclusive() {
        assert!(!within_calling_window(at(17, 0), 0, window((9, 0), (17, 0))));
        assert!(within_calling_window(at(16, 59), 0, window((9, 0), (17, 0))));
    }

    #[test]
    fn overnight_window_wraps_midnight() {
        let w = window((22, 0), (6, 0));
        assert!(within_calling_window(at(23, 30), 0, w));
        assert!(within_calling_window(at(2, 0), 0, w));
        assert!(!within_calling_window(at(12, 0), 0, w));
    }
}
