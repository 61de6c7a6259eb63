use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Outbound request to the telephony provider. The provider reports call
/// progress back through the `/api/calls` webhooks, correlated by
/// `attempt_id`.
#[derive(Debug, Clone, Serialize)]
pub struct PlaceCallRequest {
    pub attempt_id: Uuid,
    pub campaign_id: Uuid,
    pub phone: String,
    pub amd_enabled: bool,
    pub agent_id: Option<Uuid>,
}

/// Telephony provider seam. Implementations must treat `place_call` as
/// fire-and-forget: success means the provider accepted the dial request,
/// not that anyone answered.
#[async_trait]
pub trait CallControl: Send + Sync {
    async fn place_call(&self, request: PlaceCallRequest) -> AppResult<()>;
}

/// HTTP client against the provider's dial endpoint.
pub struct HttpCallControl {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpCallControl {
    pub fn new(base_url: String, api_key: String, timeout_secs: u64) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration {
                key: "call_control".to_string(),
                source: anyhow::Error::new(e),
            })?;

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }
}

#[async_trait]
impl CallControl for HttpCallControl {
    async fn place_call(&self, request: PlaceCallRequest) -> AppResult<()> {
        let url = format!("{}/v1/calls", self.base_url.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Internal {
                source: anyhow::Error::new(e).context("call control request failed"),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Internal {
                source: anyhow::anyhow!("call control rejected dial ({status}): {body}"),
            });
        }

        tracing::debug!(attempt_id = %request.attempt_id, "Dial request accepted");
        Ok(())
    }
}

/// Accepts every dial without talking to a provider. Used by tests and by
/// deployments that run the engine against a simulator.
#[derive(Debug, Default)]
pub struct NullCallControl;

#[async_trait]
impl CallControl for NullCallControl {
    async fn place_call(&self, request: PlaceCallRequest) -> AppResult<()> {
        tracing::debug!(attempt_id = %request.attempt_id, phone = %request.phone, "Dial accepted (null provider)");
        Ok(())
    }
}
