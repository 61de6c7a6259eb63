//! Router configuration for the API.
//!
//! Centralized route registration, OpenAPI document assembly, and
//! middleware configuration.

use axum::{Router, middleware};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::doc::ApiDoc;
use crate::api::handlers;
use crate::api::middleware::{auth_middleware, logging_middleware, request_id_middleware};
use crate::state::AppState;

/// Creates the main application router with all routes and middleware.
///
/// # Middleware Order
/// Middleware is applied in reverse order of declaration (last added runs
/// first): request ID first, then logging, then per-route auth.
///
/// # Routes
/// - `/api/campaigns/{id}/queues/*` - Queue assignment operations
/// - `/api/campaigns/{id}/pacing` - Pacing inspection
/// - `/api/calls/{id}/*` - Call event callbacks
/// - `/api/agents/{id}/wrap_up` - Agent wrap-up completion
/// - `/health*` - Unauthenticated health probes
/// - `/swagger-ui` - Interactive API documentation
pub fn create_router(state: AppState) -> Router {
    let campaign_routes = OpenApiRouter::new()
        .merge(handlers::queues::queue_routes())
        .merge(handlers::pacing::pacing_routes());

    let protected_routes = OpenApiRouter::new()
        .nest("/campaigns", campaign_routes)
        .nest("/calls", handlers::calls::call_routes())
        .nest("/agents", handlers::agents::agent_routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .nest("/api", protected_routes)
        .merge(handlers::health::health_routes())
        .split_for_parts();

    router
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api))
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        // Middleware is applied in reverse order - last added runs first
        // So logging runs after request_id has set the ID
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}
