//! Decoding of chat-completion text into analysis records.
//!
//! Models wrap their JSON in prose and markdown fences, so the decoder first
//! locates the most plausible JSON span and only then parses it. Decoding is
//! total: any failure becomes [`QuotationAnalysis::Unparsed`] carrying the
//! original text.

use thiserror::Error;

use crate::domain::analysis::{AnalysisReport, QuotationAnalysis, ShapeError, UnparsedAnalysis};

const JSON_FENCE: &str = "```json";
const FENCE: &str = "```";

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("reply is not a valid analysis document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("reply violates the analysis shape: {0}")]
    Shape(#[from] ShapeError),
}

/// Decode completion text, falling back to the raw text on any failure.
pub fn decode_analysis(content: &str) -> QuotationAnalysis {
    match parse_report(content) {
        Ok(report) => QuotationAnalysis::Parsed(report),
        Err(e) => {
            tracing::debug!(error = %e, "Falling back to raw AI content");
            QuotationAnalysis::Unparsed(UnparsedAnalysis::new(content))
        }
    }
}

/// Parse and structurally check the JSON embedded in `content`.
pub fn parse_report(content: &str) -> Result<AnalysisReport, DecodeError> {
    let span = extract_json_span(content).unwrap_or(content);
    let report: AnalysisReport = serde_json::from_str(span)?;
    report.check_structure()?;
    Ok(report)
}

/// Locate the JSON payload: a ```` ```json ```` fenced block if one is
/// closed, else the widest `{ ... }` span.
pub fn extract_json_span(content: &str) -> Option<&str> {
    fenced_block(content).or_else(|| brace_span(content))
}

fn fenced_block(content: &str) -> Option<&str> {
    let start = content.find(JSON_FENCE)? + JSON_FENCE.len();
    let rest = &content[start..];
    let rest = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))
        .unwrap_or(rest);
    let end = rest.find(FENCE)?;
    Some(rest[..end].trim())
}

fn brace_span(content: &str) -> Option<&str> {
    let open = content.find('{')?;
    let close = content.rfind('}')?;
    (close > open).then(|| &content[open..=close])
}
