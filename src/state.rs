//! Application state for Axum web framework.
//!
//! Contains shared services and resources that are accessible
//! across all request handlers.

use std::sync::Arc;

use crate::config::{CallControlConfig, JwtConfig, Settings};
use crate::db::AsyncDbPool;
use crate::dialer::{CallLifecycleManager, PacingConfig, PacingController, VoicemailPolicyExecutor};
use crate::error::{AppError, AppResult};
use crate::external::{
    AudienceResolver, CallControl, DbAudienceResolver, HttpCallControl, NullCallControl,
};
use crate::repositories::Repositories;
use crate::services::Services;

/// Application state containing all shared services and resources.
///
/// This struct is designed to be used with Axum's State extractor.
/// Cloning is cheap since everything inside is Arc-backed.
#[derive(Clone)]
pub struct AppState {
    /// All business logic services
    pub services: Services,
    /// Direct access to the database connection pool
    pub db_pool: AsyncDbPool,
    /// Repository layer, shared with the background dialer components
    pub repos: Repositories,
    /// JWT configuration for token validation
    pub jwt_config: JwtConfig,
    /// Predictive pacing controller, shared with the scheduler
    pub pacing: Arc<PacingController>,
    /// Call lifecycle manager handling provider callbacks
    pub lifecycle: Arc<CallLifecycleManager>,
}

impl AppState {
    /// Builds the full dependency graph from a connection pool and settings:
    /// repositories, audience resolver, call control provider, pacing
    /// controller, voicemail executor, lifecycle manager, and services.
    pub fn new(pool: AsyncDbPool, settings: &Settings) -> AppResult<Self> {
        let repos = Repositories::new(pool.clone());
        let audience: Arc<dyn AudienceResolver> =
            Arc::new(DbAudienceResolver::new(repos.clone()));
        let call_control = build_call_control(&settings.call_control)?;

        let pacing = Arc::new(PacingController::new(PacingConfig {
            min_samples: settings.dialer.pacing_min_samples,
            tolerance: settings.dialer.pacing_tolerance,
            step: settings.dialer.pacing_step,
        }));
        let voicemail = Arc::new(VoicemailPolicyExecutor::new(repos.clone()));
        let lifecycle = Arc::new(CallLifecycleManager::new(
            repos.clone(),
            Arc::clone(&pacing),
            voicemail,
            call_control,
        ));

        let services = Services::new(pool.clone(), repos.clone(), audience, settings.dialer.lock_ttl);

        Ok(Self {
            services,
            db_pool: pool,
            repos,
            jwt_config: settings.jwt.clone(),
            pacing,
            lifecycle,
        })
    }
}

fn build_call_control(config: &CallControlConfig) -> AppResult<Arc<dyn CallControl>> {
    match config.provider.as_str() {
        "http" => Ok(Arc::new(HttpCallControl::new(
            config.base_url.clone(),
            config.api_key.clone(),
            config.timeout,
        )?)),
        "null" => Ok(Arc::new(NullCallControl)),
        other => Err(AppError::Configuration {
            key: "call_control.provider".to_string(),
            source: anyhow::anyhow!("unknown call control provider '{other}'"),
        }),
    }
}
