//! Call event callback handlers.
//!
//! The call control provider posts AMD, answered, and ended events here.
//! All three are idempotent; replaying a callback never double-counts.

use crate::api::doc::CALL_TAG;
use crate::api::dto::{AmdCallbackRequest, EndedCallbackRequest};
use crate::error::AppResult;
use crate::state::AppState;
use crate::utils::validate::ValidatedJson;
use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

/// Creates call event callback routes.
pub fn call_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(amd_callback))
        .routes(routes!(answered_callback))
        .routes(routes!(ended_callback))
}

/// POST /api/calls/:attempt_id/amd - Answering-machine detection result
#[utoipa::path(
    post,
    path = "/{attempt_id}/amd",
    tag = CALL_TAG,
    params(
        ("attempt_id" = Uuid, Path, description = "Call attempt ID")
    ),
    request_body = AmdCallbackRequest,
    responses(
        (status = 204, description = "Verdict processed"),
        (status = 404, description = "Call attempt not found")
    ),
    security(
        ("bearerAuth" = [])
    )
)]
async fn amd_callback(
    State(state): State<AppState>,
    Path(attempt_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<AmdCallbackRequest>,
) -> AppResult<StatusCode> {
    state
        .lifecycle
        .handle_amd(attempt_id, req.verdict, req.confidence)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/calls/:attempt_id/answered - Call was picked up
#[utoipa::path(
    post,
    path = "/{attempt_id}/answered",
    tag = CALL_TAG,
    params(
        ("attempt_id" = Uuid, Path, description = "Call attempt ID")
    ),
    responses(
        (status = 204, description = "Answer processed"),
        (status = 404, description = "Call attempt not found")
    ),
    security(
        ("bearerAuth" = [])
    )
)]
async fn answered_callback(
    State(state): State<AppState>,
    Path(attempt_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.lifecycle.handle_answered(attempt_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/calls/:attempt_id/ended - Call teardown and final disposition
#[utoipa::path(
    post,
    path = "/{attempt_id}/ended",
    tag = CALL_TAG,
    params(
        ("attempt_id" = Uuid, Path, description = "Call attempt ID")
    ),
    request_body = EndedCallbackRequest,
    responses(
        (status = 204, description = "Call settled"),
        (status = 404, description = "Call attempt not found")
    ),
    security(
        ("bearerAuth" = [])
    )
)]
async fn ended_callback(
    State(state): State<AppState>,
    Path(attempt_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<EndedCallbackRequest>,
) -> AppResult<StatusCode> {
    state
        .lifecycle
        .handle_ended(attempt_id, req.ended_at, req.disposition, req.recording_url)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
