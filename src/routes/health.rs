use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::app::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub services: ServiceHealth,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceHealth {
    pub ai_gateway: String,
    pub auth_service: String,
}

fn configured(ok: bool) -> &'static str {
    if ok {
        "configured"
    } else {
        "missing"
    }
}

/// Health check endpoint - public
///
/// Reports configuration only; no outbound call is made.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let gateway_ok = state.gateway.is_configured();
    let auth_ok = state.auth.is_configured();

    let status = if gateway_ok && auth_ok {
        "healthy"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        services: ServiceHealth {
            ai_gateway: configured(gateway_ok).to_string(),
            auth_service: configured(auth_ok).to_string(),
        },
    })
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::testing::{request, HarnessBuilder};

    #[tokio::test]
    async fn health_is_public_and_reports_configuration() {
        let harness = HarnessBuilder::default().build().await;

        let (status, body) = harness.send_json(request("GET", "/health", None, None)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["services"]["aiGateway"], "configured");
        assert_eq!(body["services"]["authService"], "configured");
    }

    #[tokio::test]
    async fn missing_gateway_key_degrades_health() {
        let harness = HarnessBuilder::default().without_gateway_key().build().await;

        let (status, body) = harness.send_json(request("GET", "/health", None, None)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["services"]["aiGateway"], "missing");
    }
}
