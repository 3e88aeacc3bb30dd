//! CSV export of an analysis report.

use chrono::NaiveDate;

use crate::domain::analysis::AnalysisReport;

const HEADERS: [&str; 7] = [
    "Type",
    "Product Name",
    "Vendor",
    "Location",
    "Price/Price Range",
    "Specifications",
    "Contact",
];

pub fn export_filename(date: NaiveDate) -> String {
    format!("price-analysis-{}.csv", date.format("%Y-%m-%d"))
}

/// Render quoted items followed by market comparisons, one row each.
pub fn analysis_csv(report: &AnalysisReport, location: &str) -> String {
    let mut rows: Vec<[String; 7]> = Vec::with_capacity(
        1 + report.quoted_items.len() + report.market_comparisons.len(),
    );
    rows.push(HEADERS.map(String::from));

    for item in &report.quoted_items {
        rows.push([
            "Your Quotation".to_string(),
            item.name.clone(),
            "-".to_string(),
            location.to_string(),
            format!("₹{}", item.quoted_price),
            item.specifications.clone(),
            "-".to_string(),
        ]);
    }

    for item in &report.market_comparisons {
        rows.push([
            "Market Price".to_string(),
            item.product_name.clone(),
            item.vendor_name.clone(),
            item.location.clone(),
            format!("₹{} - ₹{}", item.price_range.min, item.price_range.max),
            item.notes.clone().unwrap_or_else(|| "-".to_string()),
            item.phone.clone().unwrap_or_else(|| "-".to_string()),
        ]);
    }

    rows.iter()
        .map(|row| row.iter().map(|f| escape_field(f)).collect::<Vec<_>>().join(","))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Quote a field when it contains a delimiter, quote or line break,
/// doubling embedded quotes.
fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::analysis::tests::comparison;
    use crate::domain::analysis::{AnalysisSummary, PriceRange, QuotedItem};

    fn report() -> AnalysisReport {
        let mut croma = comparison("Croma", "Laptop", 50_000.0, 60_000.0);
        croma.phone = Some("022-1234".into());
        croma.notes = Some("Has \"festive\" offers, EMI available".into());

        AnalysisReport {
            quoted_items: vec![QuotedItem {
                name: "Laptop".into(),
                specifications: "16GB, 512GB".into(),
                quoted_price: 58_000.5,
                hsn_sac: None,
            }],
            market_comparisons: vec![croma],
            summary: AnalysisSummary {
                total_quoted_amount: 58_000.5,
                estimated_market_range: PriceRange { min: 50_000.0, max: 60_000.0 },
                recommendation: "Fair".into(),
            },
        }
    }

    #[test]
    fn rows_follow_header_quoted_then_market_order() {
        let csv = analysis_csv(&report(), "Mumbai");
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "Type,Product Name,Vendor,Location,Price/Price Range,Specifications,Contact"
        );
        assert_eq!(
            lines[1],
            "Your Quotation,Laptop,-,Mumbai,₹58000.5,\"16GB, 512GB\",-"
        );
        assert_eq!(
            lines[2],
            "Market Price,Laptop,Croma,\"Andheri West, Mumbai\",₹50000 - ₹60000,\"Has \"\"festive\"\" offers, EMI available\",022-1234"
        );
    }

    #[test]
    fn missing_contact_and_notes_render_as_dash() {
        let mut report = report();
        report.quoted_items.clear();
        report.market_comparisons[0].notes = None;
        report.market_comparisons[0].phone = None;
        report.market_comparisons[0].location = "Pune".into();

        let csv = analysis_csv(&report, "Pune");
        assert!(csv.ends_with("Market Price,Laptop,Croma,Pune,₹50000 - ₹60000,-,-"));
    }

    #[test]
    fn filename_uses_iso_date() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
        assert_eq!(export_filename(date), "price-analysis-2026-03-07.csv");
    }
}
