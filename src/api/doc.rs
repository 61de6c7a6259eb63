use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

pub const QUEUE_TAG: &str = "Queues";
pub const CALL_TAG: &str = "Calls";
pub const AGENT_TAG: &str = "Agents";
pub const PACING_TAG: &str = "Pacing";
pub const HEALTH_TAG: &str = "Health";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Dialcast",
        description = "Outbound dialing and queue assignment service",
    ),
    modifiers(&SecurityAddon),
    components(
        schemas(
            crate::api::dto::ErrorResponse,
        )
    ),
    tags(
        (name = QUEUE_TAG, description = "Manual and power queue assignment endpoints"),
        (name = CALL_TAG, description = "Call event callback endpoints"),
        (name = AGENT_TAG, description = "Agent state endpoints"),
        (name = PACING_TAG, description = "Predictive pacing inspection endpoints"),
        (name = HEALTH_TAG, description = "Health check endpoints"),
    )
)]
pub struct ApiDoc;

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearerAuth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT Bearer Token Authentication"))
                        .build(),
                ),
            )
        }
    }
}
