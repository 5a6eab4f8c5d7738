//! Output types: the canonical receipt record and the extraction result.
//!
//! [`ReceiptRecord`] is the fixed schema every strict-mode extraction is
//! guaranteed to satisfy. It is a pure value — constructed fresh per
//! request, never mutated afterwards, never shared across requests.
//!
//! [`ExtractionResult`] is what the pipeline hands back to callers. It is
//! `#[serde(untagged)]` so each variant serializes to the plain JSON object
//! the HTTP endpoint returns: a receipt record, a raw pass-through payload,
//! or the diagnostic fallback `{raw_text, error}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single line item on the receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Item description as printed on the receipt. Default: `""`.
    pub name: String,
    /// Unit price. Default: `0`.
    pub price: f64,
    /// Quantity purchased. Default: `1`.
    pub count: i64,
}

// Not derived: the schema default for count is 1, not the i64 zero.
impl Default for LineItem {
    fn default() -> Self {
        Self {
            name: String::new(),
            price: 0.0,
            count: 1,
        }
    }
}

/// The canonical receipt shape — always fully populated after normalization.
///
/// Field names and types mirror the JSON Schema sent to the model as the
/// `extract_receipt_data` tool declaration (see
/// [`crate::prompts::receipt_schema`]), so a function-call reply
/// deserializes into this without renames.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReceiptRecord {
    /// Merchant name. Default: `""`.
    pub merchant_name: String,
    /// Date/time string exactly as extracted — no format validation.
    pub datetime: String,
    /// Line items, in receipt order. Default: empty.
    pub items: Vec<LineItem>,
    /// Subtotal before tax and service. Default: `0`.
    pub sub_total: f64,
    /// VAT / sales tax. Default: `0`.
    pub vat: f64,
    /// Service charge / tip. Default: `0`.
    pub service_charge: f64,
    /// Grand total. Default: `0`.
    pub total: f64,
}

/// What an extraction produces.
///
/// Untagged: callers and the HTTP endpoint see exactly one of three plain
/// JSON shapes, with no enum wrapper in the output.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExtractionResult {
    /// Strict-schema mode: the normalized receipt record.
    Receipt(ReceiptRecord),
    /// Strict-schema mode off: the parsed model payload, passed through.
    Raw(Value),
    /// The model replied but its content was not parseable JSON. Returned
    /// as an observable JSON body rather than failing the request.
    Unparsed {
        /// Best-effort extracted reply text, or a placeholder when the
        /// reply carried no text at all.
        raw_text: String,
        /// Always [`crate::pipeline::parse::PARSE_ERROR`].
        error: String,
    },
}
