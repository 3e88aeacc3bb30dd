//! Unified API error handling
//!
//! Every failure leaving the service goes through [`ApiError`]. Internal
//! detail is logged here and never reaches the response body: the caller only
//! sees the fixed message for the error category.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::domain::request::{FieldViolation, ValidationError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Invalid JSON body: {0}")]
    InvalidJson(String),

    #[error("Request body exceeds the configured limit")]
    PayloadTooLarge,

    #[error("Unauthorized: {0}")]
    Unauthorized(&'static str),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Not found: {0}")]
    NotFound(&'static str),

    #[error("Conflict ({code}): {message}")]
    Conflict {
        code: &'static str,
        message: &'static str,
    },

    #[error("AI gateway rate limit exceeded")]
    RateLimited,

    #[error("AI gateway quota exhausted")]
    QuotaExceeded,

    #[error("AI gateway error: {0}")]
    Upstream(#[source] anyhow::Error),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldViolation>>,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::InvalidJson(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) | Self::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            Self::QuotaExceeded => StatusCode::PAYMENT_REQUIRED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Upstream(_) | Self::ServiceUnavailable(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InvalidJson(_) => "INVALID_JSON",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::InvalidToken(_) => "INVALID_TOKEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            Self::Conflict { code, .. } => *code,
            Self::RateLimited => "RATE_LIMIT",
            Self::QuotaExceeded => "QUOTA_EXCEEDED",
            Self::Upstream(_) => "UPSTREAM_ERROR",
            Self::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn public_message(&self) -> String {
        match self {
            Self::Validation(_) => "Request validation failed".to_string(),
            Self::InvalidJson(_) => "Request body is not valid JSON".to_string(),
            Self::Unauthorized(msg) => msg.to_string(),
            Self::InvalidToken(_) => "Invalid or expired token".to_string(),
            Self::NotFound(msg) => msg.to_string(),
            Self::PayloadTooLarge => "Request body is too large".to_string(),
            Self::Conflict { message, .. } => message.to_string(),
            Self::RateLimited => "Rate limit exceeded. Please try again in a moment.".to_string(),
            Self::QuotaExceeded => {
                "AI credits exhausted. Please add credits to continue.".to_string()
            }
            // Don't leak upstream or configuration details
            Self::Upstream(_) => "Failed to analyze quotation".to_string(),
            Self::ServiceUnavailable(_) => "Service temporarily unavailable".to_string(),
            Self::Internal(_) => "An internal error occurred".to_string(),
        }
    }

    fn details(&self) -> Option<Vec<FieldViolation>> {
        match self {
            Self::Validation(e) => Some(e.violations().to_vec()),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::Upstream(e) => {
                tracing::error!(error = ?e, "AI gateway failure");
            }
            Self::Internal(e) => {
                tracing::error!(error = ?e, "Internal server error");
            }
            Self::ServiceUnavailable(reason) => {
                tracing::error!(reason = %reason, "Service unavailable");
            }
            _ => {
                tracing::warn!(error = %self, "API error");
            }
        }

        let status = self.status_code();
        let body = ErrorResponse {
            error: self.public_message(),
            code: self.error_code().to_string(),
            details: self.details(),
        };

        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");
        (status, serde_json::from_slice(&bytes).expect("body should be JSON"))
    }

    #[tokio::test]
    async fn internal_details_never_reach_the_body() {
        let (status, body) = body_json(ApiError::Upstream(anyhow::anyhow!(
            "gateway said: stack trace at line 42, key AI_GATEWAY_API_KEY"
        )))
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "UPSTREAM_ERROR");
        let text = body.to_string();
        assert!(!text.contains("stack trace"));
        assert!(!text.contains("AI_GATEWAY_API_KEY"));
    }

    #[tokio::test]
    async fn service_unavailable_hides_configuration_names() {
        let (status, body) =
            body_json(ApiError::ServiceUnavailable("AI_GATEWAY_API_KEY is not set".into())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "SERVICE_UNAVAILABLE");
        assert!(!body.to_string().contains("AI_GATEWAY_API_KEY"));
    }

    #[tokio::test]
    async fn gateway_limits_map_to_their_status_codes() {
        let (status, body) = body_json(ApiError::RateLimited).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["code"], "RATE_LIMIT");

        let (status, body) = body_json(ApiError::QuotaExceeded).await;
        assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
        assert_eq!(body["code"], "QUOTA_EXCEEDED");
    }

    #[tokio::test]
    async fn validation_errors_carry_every_violation() {
        let err = ValidationError::new(vec![
            FieldViolation::new("location", "location is required"),
            FieldViolation::new("productName", "productName is required in manual mode"),
        ]);
        let (status, body) = body_json(ApiError::Validation(err)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["details"].as_array().map(Vec::len), Some(2));
        assert_eq!(body["details"][0]["field"], "location");
    }
}
