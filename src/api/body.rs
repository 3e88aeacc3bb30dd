//! JSON request body parsing with the service's error taxonomy
//!
//! Bodies are read as raw bytes so that syntactically broken JSON
//! (`INVALID_JSON`) can be told apart from well-formed JSON of the wrong
//! shape (`VALIDATION_ERROR`). Bodies over the configured limit become
//! `PAYLOAD_TOO_LARGE`.

use axum::{
    async_trait,
    body::Bytes,
    extract::{rejection::BytesRejection, FromRequest, Request},
    http::StatusCode,
};
use serde::de::DeserializeOwned;

use crate::domain::request::{FieldViolation, ValidationError};
use crate::error::{ApiError, ApiResult};

/// Extractor for a JSON body, rejecting with [`ApiError`].
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await?;
        parse_json_body(&bytes).map(JsonBody)
    }
}

impl From<BytesRejection> for ApiError {
    fn from(rejection: BytesRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge
        } else {
            ApiError::InvalidJson(rejection.body_text())
        }
    }
}

pub fn parse_json_body<T: DeserializeOwned>(bytes: &[u8]) -> ApiResult<T> {
    let value: serde_json::Value =
        serde_json::from_slice(bytes).map_err(|e| ApiError::InvalidJson(e.to_string()))?;

    serde_json::from_value(value).map_err(|e| {
        tracing::debug!(error = %e, "Request body has the wrong shape");
        ApiError::Validation(ValidationError::new(vec![FieldViolation::new(
            "body",
            "request body does not match the expected fields and types",
        )]))
    })
}
