//! Analysis request types
//!
//! [`AnalyzePayload`] is the loose wire shape accepted from callers.
//! [`AnalysisRequest`] is what survives validation: the mode is encoded in
//! [`AnalysisSubject`], so a request can never carry both a product query
//! and a quotation body.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const MAX_LOCATION_CHARS: usize = 200;
pub const MAX_PRODUCT_NAME_CHARS: usize = 500;
pub const MAX_SPECIFICATIONS_CHARS: usize = 2_000;
pub const MAX_QUOTATION_TEXT_CHARS: usize = 50_000;
pub const MAX_QUOTED_PRICE: f64 = 999_999_999.0;

// ============================================================================
// Wire payload
// ============================================================================

/// Request body of `POST /analyze-quotation`, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzePayload {
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub specifications: Option<String>,
    #[serde(default)]
    pub quoted_price: Option<f64>,
    #[serde(default)]
    pub quotation_text: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Manual,
    Quotation,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Quotation => "quotation",
        }
    }
}

// ============================================================================
// Validated request
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    pub location: String,
    /// Price the user was quoted; `None` when absent or zero.
    pub quoted_price: Option<f64>,
    pub subject: AnalysisSubject,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisSubject {
    Manual {
        product_name: String,
        specifications: Option<String>,
    },
    Quotation {
        quotation_text: String,
    },
}

impl AnalysisRequest {
    pub fn mode(&self) -> Mode {
        match self.subject {
            AnalysisSubject::Manual { .. } => Mode::Manual,
            AnalysisSubject::Quotation { .. } => Mode::Quotation,
        }
    }
}

// ============================================================================
// Validation errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Every constraint a payload violated, in field order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError(Vec<FieldViolation>);

impl ValidationError {
    pub fn new(violations: Vec<FieldViolation>) -> Self {
        Self(violations)
    }

    pub fn violations(&self) -> &[FieldViolation] {
        &self.0
    }

    #[cfg(test)]
    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|v| v.field == field)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = self.0.iter().map(|v| v.field.as_str()).collect();
        write!(f, "{} violation(s) on [{}]", self.0.len(), fields.join(", "))
    }
}

impl std::error::Error for ValidationError {}

// ============================================================================
// Validation
// ============================================================================

impl AnalyzePayload {
    /// Validate the payload against the per-mode constraints.
    ///
    /// All violations are collected; nothing is returned partially.
    pub fn validate(self) -> Result<AnalysisRequest, ValidationError> {
        let mut violations = Vec::new();

        let mode = match self.mode.as_deref().map(str::trim) {
            None | Some("") | Some("quotation") => Some(Mode::Quotation),
            Some("manual") => Some(Mode::Manual),
            Some(_) => {
                violations.push(FieldViolation::new(
                    "mode",
                    "mode must be either \"manual\" or \"quotation\"",
                ));
                None
            }
        };

        let location = trimmed(self.location);
        match &location {
            None => violations.push(FieldViolation::new("location", "location is required")),
            Some(value) => check_length(&mut violations, "location", value, MAX_LOCATION_CHARS),
        }

        let product_name = trimmed(self.product_name);
        if let Some(value) = &product_name {
            check_length(&mut violations, "productName", value, MAX_PRODUCT_NAME_CHARS);
        }

        let specifications = trimmed(self.specifications);
        if let Some(value) = &specifications {
            check_length(&mut violations, "specifications", value, MAX_SPECIFICATIONS_CHARS);
        }

        let quotation_text = trimmed(self.quotation_text);
        if let Some(value) = &quotation_text {
            check_length(&mut violations, "quotationText", value, MAX_QUOTATION_TEXT_CHARS);
        }

        if let Some(price) = self.quoted_price {
            if !price.is_finite() || !(0.0..=MAX_QUOTED_PRICE).contains(&price) {
                violations.push(FieldViolation::new(
                    "quotedPrice",
                    format!("quotedPrice must be between 0 and {MAX_QUOTED_PRICE:.0}"),
                ));
            }
        }

        match mode {
            Some(Mode::Manual) => {
                if product_name.is_none() {
                    violations.push(FieldViolation::new(
                        "productName",
                        "productName is required in manual mode",
                    ));
                }
                if quotation_text.is_some() {
                    violations.push(FieldViolation::new(
                        "quotationText",
                        "quotationText is not accepted in manual mode",
                    ));
                }
            }
            Some(Mode::Quotation) => {
                if quotation_text.is_none() {
                    violations.push(FieldViolation::new(
                        "quotationText",
                        "quotationText is required in quotation mode",
                    ));
                }
                if product_name.is_some() {
                    violations.push(FieldViolation::new(
                        "productName",
                        "productName is not accepted in quotation mode",
                    ));
                }
            }
            None => {}
        }

        if !violations.is_empty() {
            return Err(ValidationError(violations));
        }

        // Every branch below is guaranteed by the checks above.
        let (Some(mode), Some(location)) = (mode, location) else {
            return Err(ValidationError(violations));
        };
        let subject = match (mode, product_name, quotation_text) {
            (Mode::Manual, Some(product_name), _) => AnalysisSubject::Manual {
                product_name,
                specifications,
            },
            (Mode::Quotation, _, Some(quotation_text)) => {
                AnalysisSubject::Quotation { quotation_text }
            }
            _ => return Err(ValidationError(violations)),
        };

        Ok(AnalysisRequest {
            location,
            quoted_price: self.quoted_price.filter(|p| *p > 0.0),
            subject,
        })
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn check_length(violations: &mut Vec<FieldViolation>, field: &str, value: &str, max: usize) {
    if value.chars().count() > max {
        violations.push(FieldViolation::new(
            field,
            format!("{field} must be at most {max} characters"),
        ));
    }
}

/// Cut `value` to at most `max` characters on a char boundary.
pub fn truncate_chars(value: &str, max: usize) -> &str {
    match value.char_indices().nth(max) {
        Some((idx, _)) => &value[..idx],
        None => value,
    }
}
