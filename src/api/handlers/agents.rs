//! Agent state handlers.

use crate::api::doc::AGENT_TAG;
use crate::api::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

/// Creates agent-related routes.
pub fn agent_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(complete_wrap_up))
}

/// POST /api/agents/:agent_id/wrap_up - Finish after-call work
///
/// Returns the agent to the available pool so the scheduler can hand them
/// the next call.
#[utoipa::path(
    post,
    path = "/{agent_id}/wrap_up",
    tag = AGENT_TAG,
    params(
        ("agent_id" = Uuid, Path, description = "Agent ID")
    ),
    responses(
        (status = 204, description = "Agent returned to available"),
        (status = 400, description = "Agent is not in after-call work"),
        (status = 403, description = "Caller may not act for this agent")
    ),
    security(
        ("bearerAuth" = [])
    )
)]
async fn complete_wrap_up(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(agent_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    if !auth_user.can_act_for(agent_id) {
        return Err(AppError::Forbidden {
            message: "Agents may only complete their own wrap-up".to_string(),
        });
    }

    state.lifecycle.complete_wrap_up(agent_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
