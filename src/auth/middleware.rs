use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use std::sync::Arc;

use super::context::AuthContext;
use super::verifier::VerifyError;
use crate::app::AppState;
use crate::error::ApiError;

/// Extractor that requires authentication
/// Use this in route handlers to require a token the auth service accepts
///
/// Example:
/// ```ignore
/// async fn protected_route(auth: RequireAuth) -> impl IntoResponse {
///     format!("Hello, user {}", auth.user_id)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequireAuth(pub AuthContext);

impl std::ops::Deref for RequireAuth {
    type Target = AuthContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<VerifyError> for ApiError {
    fn from(err: VerifyError) -> Self {
        match err {
            VerifyError::Rejected(_) => ApiError::InvalidToken(err.to_string()),
            other => ApiError::ServiceUnavailable(other.to_string()),
        }
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for RequireAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        // Extract Authorization header
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(ApiError::Unauthorized("Missing authorization header"))?
            .to_str()
            .map_err(|_| ApiError::Unauthorized("Invalid authorization format"))?;

        // Parse Bearer token
        let token = auth_header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .ok_or(ApiError::Unauthorized("Invalid authorization format"))?;

        if token.is_empty() {
            return Err(ApiError::Unauthorized("Missing authorization token"));
        }

        // Verify token with the auth service
        let user = state.auth.verify_token(token).await.map_err(|e| {
            tracing::warn!(error = %e, "Token verification failed");
            ApiError::from(e)
        })?;

        // Build auth context
        let context = AuthContext::from_user(user).map_err(|e| {
            tracing::warn!(error = %e, "Failed to build auth context");
            ApiError::InvalidToken(e.to_string())
        })?;

        Ok(RequireAuth(context))
    }
}
