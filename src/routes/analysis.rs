//! Quotation analysis endpoint.
//!
//! Validates the request, asks the AI gateway for market research and
//! decodes the reply. A reply that cannot be decoded is still a success: the
//! caller gets the raw text back with `parseError: true`.

use axum::{extract::State, http::HeaderMap};
use std::sync::Arc;
use tracing::Instrument;

use crate::api::{JsonBody, SuccessResponse};
use crate::app::AppState;
use crate::auth::RequireAuth;
use crate::domain::{AnalyzePayload, QuotationAnalysis};
use crate::error::{ApiError, ApiResult};
use crate::middleware::request_id::RequestIdExt;
use crate::services::{decoder, prompts};

/// Analyze a quotation or a manual product query.
///
/// POST /analyze-quotation
pub async fn analyze_quotation(
    auth: RequireAuth,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    JsonBody(payload): JsonBody<AnalyzePayload>,
) -> ApiResult<SuccessResponse<QuotationAnalysis>> {
    let request = payload.validate()?;

    // Nothing below may run for an invalid request or a missing key
    state.gateway.ensure_configured()?;

    let session_key = auth.session_key();
    let _in_flight = state.sessions.begin_analysis(&session_key)?;

    let span = tracing::info_span!(
        "analysis",
        user_id = %auth.user_id,
        email = ?auth.email,
        role = ?auth.role,
        mode = request.mode().as_str(),
    );

    async move {
        tracing::info!(
            location = %request.location,
            quoted_price = ?request.quoted_price,
            "Starting price analysis"
        );

        let prompt_pair = prompts::build_prompts(&request);
        let content = state
            .gateway
            .complete(&prompt_pair, headers.request_id())
            .await?;

        let analysis = decoder::decode_analysis(&content);
        match &analysis {
            QuotationAnalysis::Parsed(report) => tracing::info!(
                quoted_items = report.quoted_items.len(),
                comparisons = report.market_comparisons.len(),
                "Analysis decoded"
            ),
            QuotationAnalysis::Unparsed(raw) => tracing::warn!(
                length = raw.raw_content.len(),
                "AI reply could not be decoded, returning raw content"
            ),
        }

        state
            .sessions
            .record_analysis(&session_key, analysis.clone(), &request.location);

        Ok::<_, ApiError>(SuccessResponse::new(analysis))
    }
    .instrument(span)
    .await
}
