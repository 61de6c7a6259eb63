//! Data Transfer Objects for API requests and responses.
//!
//! DTOs are organized by domain:
//! - `queue` - Queue assignment request/response DTOs
//! - `call` - Call event callback DTOs
//! - `pacing` - Pacing snapshot DTOs
//! - `error` - Common error response DTOs
//! - `health` - Health check DTOs

mod call;
mod error;
mod health;
mod pacing;
mod queue;

pub use call::{AmdCallbackRequest, EndedCallbackRequest};
pub use error::ErrorResponse;
pub use health::{ComponentHealth, HealthResponse, HealthStatus};
pub use pacing::PacingSnapshotResponse;
pub use queue::{
    ClaimQueueRequest, ClaimQueueResponse, ClearQueueRequest, ClearQueueResponse,
    ReleaseQueueRequest, ReleaseQueueResponse, SeedQueueRequest, SeedQueueResponse,
    SetQueueRequest,
};
