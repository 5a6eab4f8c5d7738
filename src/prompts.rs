//! Prompt templates and the fixed receipt JSON Schema.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth** — changing the extraction instructions or
//!    a schema field requires editing exactly one place.
//!
//! 2. **Testability** — unit tests can inspect prompts and the tool schema
//!    directly without calling a real model.
//!
//! Callers can override the selected prompt via
//! [`crate::config::ExtractionConfig::prompt_override`]; the constants here
//! are used only when no override is provided.

use serde_json::{json, Value};

/// Name of the function declaration forced in strict-schema mode.
pub const EXTRACT_FUNCTION_NAME: &str = "extract_receipt_data";

/// Free-form prompt, used when strict-schema mode is off.
pub const DEFAULT_PROMPT: &str = "\
Analyze this receipt image and extract the information it contains as JSON. \
Include the merchant name, date and time, each line item with its price and \
quantity, the subtotal, any tax or VAT, any service charge or tip, and the \
total. Respond with JSON only, no commentary.";

/// Schema-instructing prompt, used in strict-schema mode when the model
/// does not support function calling (or as the text half of the request
/// when it does).
pub const STRICT_SCHEMA_PROMPT: &str = r#"Analyze this receipt image and extract the data as JSON matching exactly this shape:

{
  "merchant_name": string,
  "datetime": string,
  "items": [ { "name": string, "price": number, "count": integer } ],
  "sub_total": number,
  "vat": number,
  "service_charge": number,
  "total": number
}

Rules:
- Use these exact field names.
- Prices and totals are plain numbers without currency symbols.
- Use 0 for amounts that do not appear on the receipt, "" for unknown strings, and 1 for unknown counts.
- Respond with the JSON object only. Do not wrap it in a code fence and do not add commentary."#;

/// The fixed receipt JSON Schema.
///
/// Used as the parameter schema of the [`EXTRACT_FUNCTION_NAME`] tool
/// declaration; it is also the implicit contract of
/// [`crate::receipt::ReceiptRecord`].
pub fn receipt_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "merchant_name": { "type": "string" },
            "datetime": { "type": "string" },
            "items": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string" },
                        "price": { "type": "number" },
                        "count": { "type": "integer" }
                    },
                    "required": ["name", "price", "count"]
                }
            },
            "sub_total": { "type": "number" },
            "vat": { "type": "number" },
            "service_charge": { "type": "number" },
            "total": { "type": "number" }
        },
        "required": [
            "merchant_name", "datetime", "items",
            "sub_total", "vat", "service_charge", "total"
        ]
    })
}

/// Select the prompt for one extraction: operator override first, then the
/// template matching the strict-schema flag.
pub fn select_prompt(prompt_override: Option<&str>, strict_schema: bool) -> &str {
    match prompt_override {
        Some(p) => p,
        None if strict_schema => STRICT_SCHEMA_PROMPT,
        None => DEFAULT_PROMPT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_wins() {
        assert_eq!(select_prompt(Some("custom"), true), "custom");
        assert_eq!(select_prompt(Some("custom"), false), "custom");
    }

    #[test]
    fn strict_flag_selects_schema_prompt() {
        assert_eq!(select_prompt(None, true), STRICT_SCHEMA_PROMPT);
        assert_eq!(select_prompt(None, false), DEFAULT_PROMPT);
    }

    #[test]
    fn schema_lists_all_required_fields() {
        let schema = receipt_schema();
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        for field in [
            "merchant_name",
            "datetime",
            "items",
            "sub_total",
            "vat",
            "service_charge",
            "total",
        ] {
            assert!(required.contains(&field), "missing required field {field}");
        }
        assert_eq!(schema["properties"]["items"]["type"], "array");
    }
}
