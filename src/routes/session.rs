//! Per-user session endpoints: current analysis, favorites and CSV export.

use axum::{
    extract::{Path, Query, State},
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::IntoResponse,
};
use chrono::Utc;
use std::sync::Arc;

use crate::api::{Created, DataResponse, JsonBody, NoContent};
use crate::app::AppState;
use crate::auth::RequireAuth;
use crate::domain::request::{FieldViolation, ValidationError};
use crate::domain::{ComparisonFilter, MarketComparison, QuotationAnalysis};
use crate::error::{ApiError, ApiResult};
use crate::services::export;
use crate::services::session::SessionSnapshot;

/// GET /session
pub async fn get_session(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
) -> DataResponse<SessionSnapshot> {
    DataResponse::new(state.sessions.snapshot(&auth.session_key()))
}

/// Market comparisons of the current analysis, narrowed by the query.
///
/// GET /session/comparisons?search=&minPrice=&maxPrice=
pub async fn list_comparisons(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Query(filter): Query<ComparisonFilter>,
) -> DataResponse<Vec<MarketComparison>> {
    let comparisons = state
        .sessions
        .current_analysis(&auth.session_key())
        .and_then(|(analysis, _)| match analysis {
            QuotationAnalysis::Parsed(report) => Some(filter.apply(&report.market_comparisons)),
            QuotationAnalysis::Unparsed(_) => None,
        })
        .unwrap_or_default();

    DataResponse::new(comparisons)
}

/// POST /session/favorites
pub async fn add_favorite(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    JsonBody(comparison): JsonBody<MarketComparison>,
) -> ApiResult<Created<DataResponse<SessionSnapshot>>> {
    if !comparison.price_range.is_well_formed() {
        return Err(ValidationError::new(vec![FieldViolation::new(
            "priceRange",
            "priceRange must hold non-negative prices with min <= max",
        )])
        .into());
    }

    let snapshot = state.sessions.add_favorite(&auth.session_key(), comparison)?;
    tracing::debug!(user_id = %auth.user_id, favorites = snapshot.favorites.len(), "Favorite added");

    Ok(Created(DataResponse::new(snapshot)))
}

/// DELETE /session/favorites/:index
pub async fn remove_favorite(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
) -> ApiResult<NoContent> {
    state.sessions.remove_favorite(&auth.session_key(), index)?;
    Ok(NoContent)
}

/// DELETE /session/favorites
pub async fn clear_favorites(auth: RequireAuth, State(state): State<Arc<AppState>>) -> NoContent {
    state.sessions.clear_favorites(&auth.session_key());
    NoContent
}

/// Download the current analysis as CSV.
///
/// GET /session/export.csv
pub async fn export_csv(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
) -> ApiResult<impl IntoResponse> {
    let (analysis, location) = state
        .sessions
        .current_analysis(&auth.session_key())
        .ok_or(ApiError::NotFound("No analysis to export"))?;
    let report = analysis
        .report()
        .ok_or(ApiError::NotFound("No analysis to export"))?;

    let csv = export::analysis_csv(report, &location);
    let filename = export::export_filename(Utc::now().date_naive());

    Ok((
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        csv,
    ))
}
