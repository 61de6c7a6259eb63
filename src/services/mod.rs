//! Service layer holding the business workflows that sit between the HTTP
//! surface and the repositories.

pub mod queue_assignment;

pub use queue_assignment::{
    AgentQueueCount, ClaimedQueueItem, QueueAssignmentService, QueueStats, SetQueueOptions,
    SetQueueOutcome,
};

use std::sync::Arc;

use crate::db::AsyncDbPool;
use crate::external::audience::AudienceResolver;
use crate::repositories::Repositories;

/// Aggregates all services for convenient access.
#[derive(Clone)]
pub struct Services {
    pub queue_assignment: Arc<QueueAssignmentService>,
}

impl Services {
    pub fn new(
        pool: AsyncDbPool,
        repos: Repositories,
        audience: Arc<dyn AudienceResolver>,
        lock_ttl: u64,
    ) -> Self {
        Self {
            queue_assignment: Arc::new(QueueAssignmentService::new(
                pool, repos, audience, lock_ttl,
            )),
        }
    }
}
