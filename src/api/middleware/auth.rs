//! JWT authentication middleware.
//!
//! Validates bearer tokens minted by the CRM for agent sessions and puts
//! the caller's identity into request extensions.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;
use crate::utils::jwt::{Role, validate_token};

/// Authenticated caller, extracted in handlers via `Extension<AuthUser>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub agent_id: Uuid,
    pub role: Role,
}

impl AuthUser {
    /// Whether this caller may operate on `agent_id`'s queue. Agents are
    /// limited to their own; managers and admins reach everyone's.
    pub fn can_act_for(&self, agent_id: Uuid) -> bool {
        self.role.can_manage_queues() || self.agent_id == agent_id
    }
}

/// Validates the `Authorization: Bearer <token>` header and stores the
/// resulting [`AuthUser`] in request extensions.
///
/// Returns 401 when the header is missing, malformed, or carries an
/// invalid or expired token.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized {
            message: "Missing authorization header".to_string(),
        })?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized {
            message: "Invalid authorization header format. Expected: Bearer <token>".to_string(),
        })?;

    let claims = validate_token(token, &state.jwt_config.secret)?;
    let auth_user = AuthUser {
        agent_id: claims.agent_id()?,
        role: claims.role,
    };
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> AuthUser {
        AuthUser {
            agent_id: Uuid::from_u128(1),
            role,
        }
    }

    #[test]
    fn test_agent_limited_to_own_queue() {
        let agent = user(Role::Agent);
        assert!(agent.can_act_for(Uuid::from_u128(1)));
        assert!(!agent.can_act_for(Uuid::from_u128(2)));
    }

    #[test]
    fn test_manager_reaches_any_queue() {
        let manager = user(Role::Manager);
        assert!(manager.can_act_for(Uuid::from_u128(2)));

        let admin = user(Role::Admin);
        assert!(admin.can_act_for(Uuid::from_u128(2)));
    }
}
