//! Repository layer for data access operations.
//!
//! Provides async data access for all dialer aggregates. Status mutations
//! go through conditional updates (old status in the WHERE clause) so that
//! concurrent workers cannot both win the same row.

mod activity_repo;
mod agent_repo;
mod audience_repo;
mod call_repo;
mod campaign_repo;
mod contact_repo;
mod lead_repo;
mod queue_repo;
mod stats_repo;
mod suppression_repo;
mod voicemail_repo;

pub use activity_repo::ActivityLogRepository;
pub use agent_repo::AgentRepository;
pub use audience_repo::AudienceRepository;
pub use call_repo::CallRepository;
pub use campaign_repo::CampaignRepository;
pub use contact_repo::ContactRepository;
pub use lead_repo::LeadRepository;
pub use queue_repo::QueueRepository;
pub use stats_repo::StatsRepository;
pub use suppression_repo::SuppressionRepository;
pub use voicemail_repo::VoicemailRepository;

use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::bb8::PooledConnection;

use crate::db::AsyncDbPool;
use crate::error::{AppError, AppResult};

/// Checks out a pooled connection, mapping pool failures to `AppError`.
pub(crate) async fn acquire(
    pool: &AsyncDbPool,
) -> AppResult<PooledConnection<'_, AsyncPgConnection>> {
    pool.get().await.map_err(|e| AppError::ConnectionPool {
        source: anyhow::Error::from(e),
    })
}

/// Aggregates all repositories for convenient access.
///
/// Since `AsyncDbPool` uses `Arc` internally, cloning is cheap.
#[derive(Clone)]
pub struct Repositories {
    pub campaigns: CampaignRepository,
    pub contacts: ContactRepository,
    pub queue: QueueRepository,
    pub agents: AgentRepository,
    pub calls: CallRepository,
    pub leads: LeadRepository,
    pub suppression: SuppressionRepository,
    pub voicemail: VoicemailRepository,
    pub audience: AudienceRepository,
    pub stats: StatsRepository,
    pub activity: ActivityLogRepository,
}

impl Repositories {
    /// Creates a new Repositories instance with all repositories initialized.
    pub fn new(pool: AsyncDbPool) -> Self {
        Self {
            campaigns: CampaignRepository::new(pool.clone()),
            contacts: ContactRepository::new(pool.clone()),
            queue: QueueRepository::new(pool.clone()),
            agents: AgentRepository::new(pool.clone()),
            calls: CallRepository::new(pool.clone()),
            leads: LeadRepository::new(pool.clone()),
            suppression: SuppressionRepository::new(pool.clone()),
            voicemail: VoicemailRepository::new(pool.clone()),
            audience: AudienceRepository::new(pool.clone()),
            stats: StatsRepository::new(pool.clone()),
            activity: ActivityLogRepository::new(pool),
        }
    }
}
