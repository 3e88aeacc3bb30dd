use anyhow::{Context, Result};
use axum::{extract::DefaultBodyLimit, middleware::from_fn, Router};
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::auth::AuthVerifier;
use crate::config::Settings;
use crate::middleware::{cors_header_layers, preflight, request_id_layer};
use crate::routes;
use crate::services::{GatewayClient, SessionStore};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub gateway: GatewayClient,
    pub auth: AuthVerifier,
    pub sessions: SessionStore,
}

impl AppState {
    /// Build state from settings, sharing one HTTP client between the
    /// AI gateway and the auth service.
    pub fn new(settings: Settings) -> Result<Arc<Self>> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.ai_gateway_timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        let gateway = GatewayClient::new(
            http_client.clone(),
            &settings.ai_gateway_url,
            &settings.ai_gateway_model,
            settings.ai_gateway_api_key.clone(),
        )?;

        let auth = AuthVerifier::new(
            http_client,
            settings.supabase_url.as_ref(),
            settings.supabase_anon_key.clone(),
        );

        if !gateway.is_configured() {
            tracing::warn!("AI gateway key missing - analysis requests will be refused");
        }
        if !auth.is_configured() {
            tracing::warn!("Auth service not configured - authenticated requests will be refused");
        }

        Ok(Arc::new(Self {
            settings,
            gateway,
            auth,
            sessions: SessionStore::new(),
        }))
    }
}

/// Build the complete application with all middleware
pub fn create_app(state: Arc<AppState>) -> Router {
    // Build trace layer (use DEBUG for spans to reduce overhead at INFO level)
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
        .on_response(DefaultOnResponse::new().level(Level::DEBUG));

    // Request ID layers
    let (set_request_id, propagate_request_id) = request_id_layer();

    let [allow_origin, allow_headers, allow_methods] = cors_header_layers();

    Router::new()
        .merge(routes::api_router())
        // Middleware stack (applied bottom-up)
        .layer(DefaultBodyLimit::max(state.settings.max_body_bytes))
        .layer(from_fn(preflight))
        .layer(propagate_request_id)
        .layer(trace_layer)
        .layer(set_request_id)
        .layer(allow_methods)
        .layer(allow_headers)
        .layer(allow_origin)
        .with_state(state)
}
