use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Caller role carried in the token. Managers administer campaign queues;
/// agents act only on their own.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Agent,
    Manager,
    Admin,
}

impl Role {
    /// Whether this role can act on other agents' queues.
    pub fn can_manage_queues(&self) -> bool {
        matches!(self, Role::Manager | Role::Admin)
    }
}

/// JWT claims for an authenticated caller.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (agent ID)
    pub sub: String,
    pub role: Role,
    /// Issued at (timestamp)
    pub iat: i64,
    /// Expiration time (timestamp)
    pub exp: i64,
}

impl Claims {
    pub fn new(agent_id: Uuid, role: Role, expiration_hours: i64) -> Self {
        let now = Utc::now();
        let exp = now + Duration::hours(expiration_hours);

        Self {
            sub: agent_id.to_string(),
            role,
            iat: now.timestamp(),
            exp: exp.timestamp(),
        }
    }

    pub fn agent_id(&self) -> AppResult<Uuid> {
        self.sub.parse().map_err(|_| AppError::Unauthorized {
            message: "Invalid subject in token".to_string(),
        })
    }
}

/// Generates a signed token for an agent.
pub fn generate_token(
    agent_id: Uuid,
    role: Role,
    secret: &str,
    expiration_hours: i64,
) -> AppResult<String> {
    let claims = Claims::new(agent_id, role, expiration_hours);

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal {
        source: anyhow::anyhow!("Failed to generate JWT token: {}", e),
    })
}

/// Validates and decodes a token, mapping each failure mode to an
/// `Unauthorized` error with a caller-safe message.
pub fn validate_token(token: &str, secret: &str) -> AppResult<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::Unauthorized {
            message: "Token has expired".to_string(),
        },
        jsonwebtoken::errors::ErrorKind::InvalidToken => AppError::Unauthorized {
            message: "Invalid token".to_string(),
        },
        jsonwebtoken::errors::ErrorKind::InvalidSignature => AppError::Unauthorized {
            message: "Invalid token signature".to_string(),
        },
        _ => AppError::Unauthorized {
            message: format!("Token validation failed: {}", e),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &str = "test_secret_key_for_jwt_testing";

    #[test]
    fn round_trips_claims() {
        let agent_id = Uuid::new_v4();
        let token = generate_token(agent_id, Role::Agent, TEST_SECRET, 8).unwrap();

        let claims = validate_token(&token, TEST_SECRET).unwrap();
        assert_eq!(claims.agent_id().unwrap(), agent_id);
        assert_eq!(claims.role, Role::Agent);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn rejects_wrong_secret() {
        let token = generate_token(Uuid::new_v4(), Role::Manager, TEST_SECRET, 8).unwrap();

        let result = validate_token(&token, "wrong_secret");
        match result {
            Err(AppError::Unauthorized { message }) => assert!(message.contains("signature")),
            other => panic!("Expected Unauthorized, got {:?}", other),
        }
    }

    #[test]
    fn rejects_expired_token() {
        let token = generate_token(Uuid::new_v4(), Role::Agent, TEST_SECRET, -1).unwrap();

        let result = validate_token(&token, TEST_SECRET);
        match result {
            Err(AppError::Unauthorized { message }) => assert!(message.contains("expired")),
            other => panic!("Expected Unauthorized, got {:?}", other),
        }
    }

    #[test]
    fn rejects_garbage_token() {
        assert!(validate_token("not.a.token", TEST_SECRET).is_err());
    }

    #[test]
    fn role_permissions() {
        assert!(!Role::Agent.can_manage_queues());
        assert!(Role::Manager.can_manage_queues());
        assert!(Role::Admin.can_manage_queues());
    }

    #[test]
    fn role_serializes_lowercase() {
        let claims = Claims::new(Uuid::new_v4(), Role::Manager, 8);
        let json = serde_json::to_string(&claims).unwrap();
        assert!(json.contains("\"role\":\"manager\""));
    }
}
