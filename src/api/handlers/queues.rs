//! Queue assignment request handlers.

use crate::api::doc::QUEUE_TAG;
use crate::api::dto::{
    ClaimQueueRequest, ClaimQueueResponse, ClearQueueRequest, ClearQueueResponse,
    ReleaseQueueRequest, ReleaseQueueResponse, SeedQueueRequest, SeedQueueResponse,
    SetQueueRequest,
};
use crate::api::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::services::{QueueStats, SetQueueOutcome};
use crate::state::AppState;
use crate::utils::validate::ValidatedJson;
use axum::{
    Extension, Json,
    extract::{Path, State},
};
use uuid::Uuid;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

/// Creates queue-related routes.
pub fn queue_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(set_queue))
        .routes(routes!(clear_queue))
        .routes(routes!(clear_all_queues))
        .routes(routes!(seed_power_queue))
        .routes(routes!(claim_queue_item))
        .routes(routes!(release_queue_item))
        .routes(routes!(queue_stats))
}

/// POST /api/campaigns/:campaign_id/queues/set - Replace an agent's manual queue
#[utoipa::path(
    post,
    path = "/{campaign_id}/queues/set",
    tag = QUEUE_TAG,
    params(
        ("campaign_id" = Uuid, Path, description = "Campaign ID")
    ),
    request_body = SetQueueRequest,
    responses(
        (status = 200, description = "Queue replaced", body = SetQueueOutcome),
        (status = 403, description = "Caller may not modify this agent's queue"),
        (status = 404, description = "Campaign not found"),
        (status = 422, description = "Campaign has no audience defined")
    ),
    security(
        ("bearerAuth" = [])
    )
)]
async fn set_queue(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(campaign_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<SetQueueRequest>,
) -> AppResult<Json<SetQueueOutcome>> {
    if !auth_user.can_act_for(req.agent_id) {
        return Err(AppError::Forbidden {
            message: "Agents may only set their own queue".to_string(),
        });
    }

    let outcome = state
        .services
        .queue_assignment
        .set_queue(campaign_id, req.agent_id, req.filter().as_ref(), &req.options())
        .await?;
    Ok(Json(outcome))
}

/// POST /api/campaigns/:campaign_id/queues/clear - Clear one agent's manual queue
#[utoipa::path(
    post,
    path = "/{campaign_id}/queues/clear",
    tag = QUEUE_TAG,
    params(
        ("campaign_id" = Uuid, Path, description = "Campaign ID")
    ),
    request_body = ClearQueueRequest,
    responses(
        (status = 200, description = "Queue cleared", body = ClearQueueResponse),
        (status = 403, description = "Caller may not modify this agent's queue")
    ),
    security(
        ("bearerAuth" = [])
    )
)]
async fn clear_queue(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(campaign_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<ClearQueueRequest>,
) -> AppResult<Json<ClearQueueResponse>> {
    if !auth_user.can_act_for(req.agent_id) {
        return Err(AppError::Forbidden {
            message: "Agents may only clear their own queue".to_string(),
        });
    }

    let released = state
        .services
        .queue_assignment
        .clear_queue(campaign_id, req.agent_id)
        .await?;
    Ok(Json(ClearQueueResponse { released }))
}

/// POST /api/campaigns/:campaign_id/queues/clear_all - Clear every manual queue
#[utoipa::path(
    post,
    path = "/{campaign_id}/queues/clear_all",
    tag = QUEUE_TAG,
    params(
        ("campaign_id" = Uuid, Path, description = "Campaign ID")
    ),
    responses(
        (status = 200, description = "All manual queues cleared", body = ClearQueueResponse),
        (status = 403, description = "Requires manager or admin role")
    ),
    security(
        ("bearerAuth" = [])
    )
)]
async fn clear_all_queues(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(campaign_id): Path<Uuid>,
) -> AppResult<Json<ClearQueueResponse>> {
    require_manager(&auth_user)?;

    let released = state
        .services
        .queue_assignment
        .clear_all(campaign_id)
        .await?;
    Ok(Json(ClearQueueResponse { released }))
}

/// POST /api/campaigns/:campaign_id/queues/seed - Seed the power-dial queue
#[utoipa::path(
    post,
    path = "/{campaign_id}/queues/seed",
    tag = QUEUE_TAG,
    params(
        ("campaign_id" = Uuid, Path, description = "Campaign ID")
    ),
    request_body = SeedQueueRequest,
    responses(
        (status = 200, description = "Power queue seeded", body = SeedQueueResponse),
        (status = 403, description = "Requires manager or admin role"),
        (status = 422, description = "Campaign has no audience defined")
    ),
    security(
        ("bearerAuth" = [])
    )
)]
async fn seed_power_queue(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(campaign_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<SeedQueueRequest>,
) -> AppResult<Json<SeedQueueResponse>> {
    require_manager(&auth_user)?;

    let inserted = state
        .services
        .queue_assignment
        .seed_power_queue(campaign_id, req.limit, req.priority)
        .await?;
    Ok(Json(SeedQueueResponse { inserted }))
}

/// POST /api/campaigns/:campaign_id/queues/claim - Lock the agent's next manual item
#[utoipa::path(
    post,
    path = "/{campaign_id}/queues/claim",
    tag = QUEUE_TAG,
    params(
        ("campaign_id" = Uuid, Path, description = "Campaign ID")
    ),
    request_body = ClaimQueueRequest,
    responses(
        (status = 200, description = "Claimed item, or null when the queue is empty", body = ClaimQueueResponse),
        (status = 403, description = "Caller may not claim for this agent"),
        (status = 404, description = "Campaign not found")
    ),
    security(
        ("bearerAuth" = [])
    )
)]
async fn claim_queue_item(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(campaign_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<ClaimQueueRequest>,
) -> AppResult<Json<ClaimQueueResponse>> {
    if !auth_user.can_act_for(req.agent_id) {
        return Err(AppError::Forbidden {
            message: "Agents may only claim from their own queue".to_string(),
        });
    }

    let item = state
        .services
        .queue_assignment
        .claim_next(campaign_id, req.agent_id)
        .await?;
    Ok(Json(ClaimQueueResponse { item }))
}

/// POST /api/campaigns/:campaign_id/queues/release - Hand a locked item back
#[utoipa::path(
    post,
    path = "/{campaign_id}/queues/release",
    tag = QUEUE_TAG,
    params(
        ("campaign_id" = Uuid, Path, description = "Campaign ID")
    ),
    request_body = ReleaseQueueRequest,
    responses(
        (status = 200, description = "Release outcome; false when the lock was not held", body = ReleaseQueueResponse),
        (status = 403, description = "Caller may not release for this agent"),
        (status = 404, description = "Campaign not found")
    ),
    security(
        ("bearerAuth" = [])
    )
)]
async fn release_queue_item(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(campaign_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<ReleaseQueueRequest>,
) -> AppResult<Json<ReleaseQueueResponse>> {
    if !auth_user.can_act_for(req.agent_id) {
        return Err(AppError::Forbidden {
            message: "Agents may only release their own locks".to_string(),
        });
    }

    let released = state
        .services
        .queue_assignment
        .release_claim(campaign_id, req.agent_id, req.item_id)
        .await?;
    Ok(Json(ReleaseQueueResponse { released }))
}

/// GET /api/campaigns/:campaign_id/queues/stats - Queue composition counts
#[utoipa::path(
    get,
    path = "/{campaign_id}/queues/stats",
    tag = QUEUE_TAG,
    params(
        ("campaign_id" = Uuid, Path, description = "Campaign ID")
    ),
    responses(
        (status = 200, description = "Queue statistics", body = QueueStats)
    ),
    security(
        ("bearerAuth" = [])
    )
)]
async fn queue_stats(
    State(state): State<AppState>,
    Path(campaign_id): Path<Uuid>,
) -> AppResult<Json<QueueStats>> {
    let stats = state.services.queue_assignment.stats(campaign_id).await?;
    Ok(Json(stats))
}

fn require_manager(auth_user: &AuthUser) -> AppResult<()> {
    if auth_user.role.can_manage_queues() {
        Ok(())
    } else {
        Err(AppError::Forbidden {
            message: "Requires manager or admin role".to_string(),
        })
    }
}
