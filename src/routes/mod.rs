pub mod analysis;
pub mod health;
pub mod session;

use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

use crate::app::AppState;

/// Build the API router with all routes
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        // Public routes
        .route("/health", get(health::health_check))
        // Analysis
        .route("/analyze-quotation", post(analysis::analyze_quotation))
        // Session state
        .route("/session", get(session::get_session))
        .route("/session/comparisons", get(session::list_comparisons))
        .route(
            "/session/favorites",
            post(session::add_favorite).delete(session::clear_favorites),
        )
        .route("/session/favorites/:index", delete(session::remove_favorite))
        .route("/session/export.csv", get(session::export_csv))
}
