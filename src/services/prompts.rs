//! Prompt construction for market-research requests.
//!
//! Every prompt asks for the same JSON document so that a single decoder
//! handles both modes. Caller-supplied text is cut to its field limit before
//! it is embedded, whatever validation already did.

use crate::domain::request::{
    truncate_chars, AnalysisRequest, AnalysisSubject, MAX_LOCATION_CHARS, MAX_PRODUCT_NAME_CHARS,
    MAX_QUOTATION_TEXT_CHARS, MAX_SPECIFICATIONS_CHARS,
};

/// JSON document the model must answer with.
const RESPONSE_SHAPE: &str = r#"{
  "quotedItems": [
    {
      "name": "Product name from quotation",
      "specifications": "Brand, model, size, quantity, etc.",
      "quotedPrice": 1234.56,
      "hsnSac": "HSN/SAC code if available"
    }
  ],
  "marketComparisons": [
    {
      "productName": "Product name",
      "location": "Specific area/store location",
      "vendorName": "Vendor/Store name",
      "priceRange": { "min": 1000, "max": 1500 },
      "address": "Full address",
      "phone": "Contact number if known",
      "website": "Store or listing URL if known",
      "notes": "Any relevant notes about availability, quality, etc."
    }
  ],
  "summary": {
    "totalQuotedAmount": 12345.67,
    "estimatedMarketRange": { "min": 10000, "max": 15000 },
    "recommendation": "Brief recommendation about the quotation value"
  }
}"#;

const MARKET_GUIDANCE: &str = "Be realistic and provide credible vendor names and locations for the Indian market. \
Include department stores, local shops, and online marketplaces commonly found in Indian cities. \
Use INR (₹) for all prices. Every priceRange must have min less than or equal to max. \
Respond with the JSON document only.";

/// System and user message for one chat completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPair {
    pub system: String,
    pub user: String,
}

pub fn build_prompts(request: &AnalysisRequest) -> PromptPair {
    let location = truncate_chars(&request.location, MAX_LOCATION_CHARS);

    match &request.subject {
        AnalysisSubject::Quotation { quotation_text } => PromptPair {
            system: quotation_system_prompt(request.quoted_price),
            user: format!(
                "Analyze this quotation for location: {location}\n\nQuotation Content:\n{}",
                truncate_chars(quotation_text, MAX_QUOTATION_TEXT_CHARS)
            ),
        },
        AnalysisSubject::Manual {
            product_name,
            specifications,
        } => {
            let mut user = format!(
                "Find current market prices for this product in location: {location}\n\nProduct: {}",
                truncate_chars(product_name, MAX_PRODUCT_NAME_CHARS)
            );
            if let Some(specs) = specifications {
                user.push_str("\nSpecifications: ");
                user.push_str(truncate_chars(specs, MAX_SPECIFICATIONS_CHARS));
            }
            PromptPair {
                system: manual_system_prompt(request.quoted_price),
                user,
            }
        }
    }
}

fn quotation_system_prompt(quoted_price: Option<f64>) -> String {
    format!(
        "You are a price comparison research assistant for India. When given a product quotation, you must:\n\n\
1. Extract all products/items from the quotation with their prices\n\
2. Research and provide realistic market price comparisons from other vendors in the specified location\n\
3. Return structured data in this exact JSON format:\n\n\
{RESPONSE_SHAPE}\n\n\
{price}{MARKET_GUIDANCE}",
        price = quoted_price_instruction(quoted_price),
    )
}

fn manual_system_prompt(quoted_price: Option<f64>) -> String {
    format!(
        "You are a price comparison research assistant for India. When given a product name, optional specifications and a location, you must:\n\n\
1. Identify the product and list it as the single entry of quotedItems\n\
2. Research and provide at least three realistic vendor price ranges for it in or near the specified location\n\
3. Return structured data in this exact JSON format:\n\n\
{RESPONSE_SHAPE}\n\n\
{price}{MARKET_GUIDANCE}",
        price = quoted_price_instruction(quoted_price),
    )
}

fn quoted_price_instruction(quoted_price: Option<f64>) -> String {
    match quoted_price {
        Some(price) => format!(
            "The user was quoted ₹{price:.2}. Use {price:.2} as the quotedPrice of the quoted item \
and as summary.totalQuotedAmount, and say in the recommendation whether this quote is fair.\n\n"
        ),
        None => String::from(
            "If no price is available for the user's item, set quotedPrice and summary.totalQuotedAmount to 0.\n\n",
        ),
    }
}
