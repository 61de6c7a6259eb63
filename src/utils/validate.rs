use axum::Json;
use axum::extract::{FromRequest, FromRequestParts, Query, Request, rejection::JsonRejection};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::{AppError, AppResult};

/// JSON extractor that runs `validator` rules after deserialization.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> AppResult<Self> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest {
                message: format!("Invalid JSON body: {e}"),
            })?;
        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

/// Query-string extractor that runs `validator` rules after
/// deserialization.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> AppResult<Self> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::BadRequest {
                message: format!("Invalid query string: {e}"),
            })?;
        value.validate()?;
        Ok(ValidatedQuery(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, header};
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Validate)]
    struct SeedBody {
        #[validate(range(min = 1, max = 10_000, message = "limit must be between 1 and 10000"))]
        limit: u32,
    }

    #[tokio::test]
    async fn accepts_valid_json() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/test")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"limit": 50}"#))
            .unwrap();

        let ValidatedJson(body) = ValidatedJson::<SeedBody>::from_request(request, &())
            .await
            .unwrap();
        assert_eq!(body.limit, 50);
    }

    #[tokio::test]
    async fn rejects_validation_failure() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/test")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"limit": 0}"#))
            .unwrap();

        let result = ValidatedJson::<SeedBody>::from_request(request, &()).await;
        match result {
            Err(AppError::Validation { field, .. }) => assert_eq!(field, "limit"),
            other => panic!("Expected Validation error, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn rejects_malformed_json() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/test")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let result = ValidatedJson::<SeedBody>::from_request(request, &()).await;
        assert!(matches!(result, Err(AppError::BadRequest { .. })));
    }

    #[tokio::test]
    async fn validates_query_strings() {
        let request = Request::builder()
            .method(Method::GET)
            .uri("/test?limit=25")
            .body(Body::empty())
            .unwrap();
        let (mut parts, _) = request.into_parts();

        let ValidatedQuery(query) = ValidatedQuery::<SeedBody>::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(query.limit, 25);
    }
}
