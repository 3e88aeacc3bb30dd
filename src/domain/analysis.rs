//! Analysis records produced from AI gateway replies.
//!
//! Field names follow the camelCase JSON contract shared with the browser
//! client and with the shape the model is instructed to emit.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Percentage distance from the market midpoint tolerated as "market rate".
pub const MARKET_RATE_TOLERANCE_PCT: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

impl PriceRange {
    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    pub fn is_well_formed(&self) -> bool {
        is_price(self.min) && is_price(self.max) && self.min <= self.max
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotedItem {
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub specifications: String,
    pub quoted_price: f64,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub hsn_sac: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketComparison {
    pub product_name: String,
    pub location: String,
    pub vendor_name: String,
    pub price_range: PriceRange,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl MarketComparison {
    /// Two comparisons describe the same listing when vendor, product and
    /// location all match.
    pub fn same_listing(&self, other: &MarketComparison) -> bool {
        self.vendor_name == other.vendor_name
            && self.product_name == other.product_name
            && self.location == other.location
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummary {
    pub total_quoted_amount: f64,
    pub estimated_market_range: PriceRange,
    pub recommendation: String,
}

impl AnalysisSummary {
    /// Where the quoted total sits against the estimated market range.
    /// `None` when nothing was quoted.
    pub fn verdict(&self) -> Option<PricePosition> {
        (self.total_quoted_amount > 0.0)
            .then(|| PricePosition::classify(self.total_quoted_amount, &self.estimated_market_range))
    }
}

/// Structured result of a successful decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    #[serde(default)]
    pub quoted_items: Vec<QuotedItem>,
    #[serde(default)]
    pub market_comparisons: Vec<MarketComparison>,
    pub summary: AnalysisSummary,
}

#[derive(Debug, Error, PartialEq)]
pub enum ShapeError {
    #[error("quotedItems[{0}] has an invalid quotedPrice")]
    QuotedPrice(usize),
    #[error("marketComparisons[{0}] has an invalid priceRange")]
    ComparisonRange(usize),
    #[error("summary.totalQuotedAmount is invalid")]
    TotalQuoted,
    #[error("summary.estimatedMarketRange is invalid")]
    SummaryRange,
}

impl AnalysisReport {
    /// Check the numeric invariants serde cannot express: every price is a
    /// finite non-negative number and every range has `min <= max`.
    pub fn check_structure(&self) -> Result<(), ShapeError> {
        if let Some(idx) = self
            .quoted_items
            .iter()
            .position(|item| !is_price(item.quoted_price))
        {
            return Err(ShapeError::QuotedPrice(idx));
        }
        if let Some(idx) = self
            .market_comparisons
            .iter()
            .position(|c| !c.price_range.is_well_formed())
        {
            return Err(ShapeError::ComparisonRange(idx));
        }
        if !is_price(self.summary.total_quoted_amount) {
            return Err(ShapeError::TotalQuoted);
        }
        if !self.summary.estimated_market_range.is_well_formed() {
            return Err(ShapeError::SummaryRange);
        }
        Ok(())
    }
}

/// Fallback record carrying the AI reply verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnparsedAnalysis {
    pub raw_content: String,
    pub parse_error: bool,
}

impl UnparsedAnalysis {
    pub fn new(raw_content: impl Into<String>) -> Self {
        Self {
            raw_content: raw_content.into(),
            parse_error: true,
        }
    }
}

/// Either a typed report or the raw-content fallback. Serialized without a
/// tag: consumers branch on the presence of `parseError`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuotationAnalysis {
    Parsed(AnalysisReport),
    Unparsed(UnparsedAnalysis),
}

impl QuotationAnalysis {
    pub fn report(&self) -> Option<&AnalysisReport> {
        match self {
            Self::Parsed(report) => Some(report),
            Self::Unparsed(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricePosition {
    BelowMarket,
    MarketRate,
    AboveMarket,
}

impl PricePosition {
    pub fn classify(quoted: f64, market: &PriceRange) -> Self {
        let midpoint = market.midpoint();
        if midpoint <= 0.0 {
            return Self::MarketRate;
        }

        let diff_pct = (quoted - midpoint) / midpoint * 100.0;
        if diff_pct < -MARKET_RATE_TOLERANCE_PCT {
            Self::BelowMarket
        } else if diff_pct > MARKET_RATE_TOLERANCE_PCT {
            Self::AboveMarket
        } else {
            Self::MarketRate
        }
    }
}

// ============================================================================
// Favorites and filtering
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FavoriteStats {
    pub count: usize,
    pub lowest: f64,
    pub highest: f64,
    pub average: f64,
}

impl FavoriteStats {
    pub fn from_favorites(favorites: &[MarketComparison]) -> Option<Self> {
        if favorites.is_empty() {
            return None;
        }

        let lowest = favorites
            .iter()
            .map(|f| f.price_range.min)
            .fold(f64::INFINITY, f64::min);
        let highest = favorites
            .iter()
            .map(|f| f.price_range.max)
            .fold(f64::NEG_INFINITY, f64::max);
        let average = favorites
            .iter()
            .map(|f| f.price_range.midpoint())
            .sum::<f64>()
            / favorites.len() as f64;

        Some(Self {
            count: favorites.len(),
            lowest,
            highest,
            average,
        })
    }
}

/// Query parameters for narrowing a comparison list.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonFilter {
    pub search: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

impl ComparisonFilter {
    pub fn matches(&self, comparison: &MarketComparison) -> bool {
        let min = self.min_price.unwrap_or(0.0);
        let max = self.max_price.unwrap_or(f64::INFINITY);
        let in_range = comparison.price_range.min >= min && comparison.price_range.max <= max;

        let matches_search = match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(needle) => {
                let needle = needle.to_lowercase();
                [
                    &comparison.product_name,
                    &comparison.vendor_name,
                    &comparison.location,
                ]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle))
            }
        };

        in_range && matches_search
    }

    pub fn apply(&self, comparisons: &[MarketComparison]) -> Vec<MarketComparison> {
        comparisons
            .iter()
            .filter(|c| self.matches(c))
            .cloned()
            .collect()
    }
}

fn is_price(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

/// Optional display text as the model wrote it: numbers and booleans are
/// stringified, anything else is dropped.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    })
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_text(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn comparison(vendor: &str, product: &str, min: f64, max: f64) -> MarketComparison {
        MarketComparison {
            product_name: product.to_string(),
            location: "Andheri West, Mumbai".to_string(),
            vendor_name: vendor.to_string(),
            price_range: PriceRange { min, max },
            address: None,
            phone: None,
            website: None,
            notes: None,
        }
    }

    #[test]
    fn verdict_uses_five_percent_band_around_midpoint() {
        let market = PriceRange { min: 900.0, max: 1_100.0 };

        assert_eq!(PricePosition::classify(940.0, &market), PricePosition::BelowMarket);
        assert_eq!(PricePosition::classify(950.0, &market), PricePosition::MarketRate);
        assert_eq!(PricePosition::classify(1_050.0, &market), PricePosition::MarketRate);
        assert_eq!(PricePosition::classify(1_060.0, &market), PricePosition::AboveMarket);
        assert_eq!(
            PricePosition::classify(10.0, &PriceRange { min: 0.0, max: 0.0 }),
            PricePosition::MarketRate
        );
    }

    #[test]
    fn summary_without_quoted_amount_has_no_verdict() {
        let summary = AnalysisSummary {
            total_quoted_amount: 0.0,
            estimated_market_range: PriceRange { min: 1.0, max: 2.0 },
            recommendation: "ok".into(),
        };
        assert_eq!(summary.verdict(), None);
    }

    #[test]
    fn inverted_ranges_fail_structure_check() {
        let report = AnalysisReport {
            quoted_items: vec![],
            market_comparisons: vec![comparison("A", "Laptop", 10.0, 20.0), comparison("B", "Laptop", 30.0, 5.0)],
            summary: AnalysisSummary {
                total_quoted_amount: 0.0,
                estimated_market_range: PriceRange { min: 1.0, max: 2.0 },
                recommendation: "ok".into(),
            },
        };
        assert_eq!(report.check_structure(), Err(ShapeError::ComparisonRange(1)));
    }

    #[test]
    fn unparsed_serializes_with_parse_error_flag() {
        let value = serde_json::to_value(QuotationAnalysis::Unparsed(UnparsedAnalysis::new("hi")))
            .unwrap();
        assert_eq!(value, serde_json::json!({"rawContent": "hi", "parseError": true}));
    }

    #[test]
    fn favorite_stats_cover_lowest_highest_and_mean_midpoint() {
        let favorites = vec![
            comparison("Croma", "Laptop", 50_000.0, 60_000.0),
            comparison("Reliance Digital", "Laptop", 45_000.0, 52_000.0),
        ];

        let stats = FavoriteStats::from_favorites(&favorites).unwrap();
        assert_eq!(stats.count, 2);
        assert_eq!(stats.lowest, 45_000.0);
        assert_eq!(stats.highest, 60_000.0);
        assert_eq!(stats.average, 51_750.0);
        assert!(FavoriteStats::from_favorites(&[]).is_none());
    }

    #[test]
    fn filter_combines_price_bounds_and_search() {
        let list = vec![
            comparison("Croma", "Laptop", 50_000.0, 60_000.0),
            comparison("Vijay Sales", "Laptop", 40_000.0, 45_000.0),
            comparison("Amazon", "Tablet", 20_000.0, 25_000.0),
        ];

        let filter = ComparisonFilter {
            search: Some("LAPTOP".into()),
            min_price: Some(35_000.0),
            max_price: Some(50_000.0),
        };
        let hits = filter.apply(&list);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].vendor_name, "Vijay Sales");

        assert_eq!(ComparisonFilter::default().apply(&list).len(), 3);
    }
}
