//! Domain types and DTOs
//!
//! Request validation lives in `request`; the analysis records returned by
//! the AI gateway (and everything derived from them) live in `analysis`.

pub mod analysis;
pub mod request;

// Re-export commonly used types
pub use analysis::{ComparisonFilter, MarketComparison, QuotationAnalysis};
pub use request::AnalyzePayload;
