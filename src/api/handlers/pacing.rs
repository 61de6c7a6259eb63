//! Pacing inspection handlers.

use crate::api::doc::PACING_TAG;
use crate::api::dto::PacingSnapshotResponse;
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
};
use uuid::Uuid;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

/// Creates pacing routes.
pub fn pacing_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(pacing_snapshot))
}

/// GET /api/campaigns/:campaign_id/pacing - Current pacing controller state
///
/// Metrics exist only after the campaign has dialed at least once since
/// the process started; before that this returns 404.
#[utoipa::path(
    get,
    path = "/{campaign_id}/pacing",
    tag = PACING_TAG,
    params(
        ("campaign_id" = Uuid, Path, description = "Campaign ID")
    ),
    responses(
        (status = 200, description = "Pacing snapshot", body = PacingSnapshotResponse),
        (status = 404, description = "No pacing metrics for this campaign")
    ),
    security(
        ("bearerAuth" = [])
    )
)]
async fn pacing_snapshot(
    State(state): State<AppState>,
    Path(campaign_id): Path<Uuid>,
) -> AppResult<Json<PacingSnapshotResponse>> {
    let metrics = state
        .pacing
        .snapshot(campaign_id)
        .ok_or_else(|| AppError::NotFound {
            entity: "pacing metrics".to_string(),
            field: "campaign_id".to_string(),
            value: campaign_id.to_string(),
        })?;
    Ok(Json(PacingSnapshotResponse::from_metrics(
        campaign_id,
        metrics,
    )))
}
