//! Call event callback DTOs.

use chrono::NaiveDateTime;
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::dialer::types::{AmdVerdict, CallDisposition};

/// Answering-machine detection result posted by the call control provider.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AmdCallbackRequest {
    pub verdict: AmdVerdict,

    /// Detector confidence in the verdict, 0.0 to 1.0
    #[validate(range(min = 0.0, max = 1.0))]
    pub confidence: f64,
}

/// Call teardown posted by the call control provider, or a manual
/// disposition posted by the agent's client.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct EndedCallbackRequest {
    /// UTC wall-clock time the call ended
    #[schema(value_type = String, format = DateTime)]
    pub ended_at: NaiveDateTime,

    /// Final disposition when known; omitted for provider-side hangups
    pub disposition: Option<CallDisposition>,

    #[validate(url)]
    pub recording_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amd_callback_deserializes_verdict() {
        let json = r#"{"verdict": "machine", "confidence": 0.92}"#;
        let req: AmdCallbackRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.verdict, AmdVerdict::Machine);
    }

    #[test]
    fn test_amd_confidence_out_of_range_rejected() {
        let json = r#"{"verdict": "human", "confidence": 1.5}"#;
        let req: AmdCallbackRequest = serde_json::from_str(json).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_ended_callback_without_disposition() {
        let json = r#"{"ended_at": "2025-06-01T12:30:00"}"#;
        let req: EndedCallbackRequest = serde_json::from_str(json).unwrap();
        assert!(req.disposition.is_none());
        assert!(req.recording_url.is_none());
    }
}
