//! Normalization: arbitrary model JSON → a fully-populated [`ReceiptRecord`].
//!
//! ## Why is normalization necessary?
//!
//! Even in strict-schema mode the model payload cannot be trusted. Replies
//! that are *semantically correct* still arrive *structurally wrong* — for
//! example:
//!
//! - camelCase spellings (`merchantName`, `subTotal`) instead of the
//!   schema's snake_case
//! - receipt vocabulary drift: `tax` for `vat`, `tip` for `service_charge`,
//!   `quantity` for `count`
//! - amounts as strings with currency symbols (`"$1,234.50"`)
//! - missing fields, null fields, or `items` that is not an array
//!
//! This module applies cheap, deterministic rules that fix all of the above
//! without touching content. Every function here is pure and total: no
//! input shape can make it fail, every branch has a default. Either the
//! whole record is produced or — upstream of here — the diagnostic fallback
//! is; there is no half-normalized state.
//!
//! ## Presence semantics
//!
//! A synonym matches when the key exists and its value is not JSON null.
//! Falsy-but-present values (`0`, `""`, `false`) therefore do NOT fall
//! through to the next synonym; only absent or null keys do. Exhausting
//! every synonym yields the hardcoded default.

use crate::receipt::{LineItem, ReceiptRecord};
use serde_json::{Map, Value};

/// Accepted spellings per canonical field, in priority order.
/// First present key wins; order is part of the contract.
const MERCHANT_NAME_KEYS: &[&str] = &["merchant_name", "merchantName", "merchant"];
const DATETIME_KEYS: &[&str] = &["datetime", "date", "dateTime"];
const SUB_TOTAL_KEYS: &[&str] = &["sub_total", "subTotal", "subtotal"];
const VAT_KEYS: &[&str] = &["vat", "tax"];
const SERVICE_CHARGE_KEYS: &[&str] = &["service_charge", "serviceCharge", "tip"];
const TOTAL_KEYS: &[&str] = &["total"];
const ITEM_NAME_KEYS: &[&str] = &["name", "description"];
const ITEM_PRICE_KEYS: &[&str] = &["price", "unit_price"];
const ITEM_COUNT_KEYS: &[&str] = &["count", "quantity"];

/// Map an arbitrary JSON payload to the fixed receipt schema.
///
/// Total: any `Value` — empty object, null fields, wrong-typed fields,
/// extra unknown keys, non-object `items` elements — produces a record
/// satisfying every schema invariant. Non-object input yields the
/// all-defaults record.
pub fn normalize(payload: &Value) -> ReceiptRecord {
    let Some(obj) = payload.as_object() else {
        return ReceiptRecord::default();
    };

    ReceiptRecord {
        merchant_name: ensure_string(pick(obj, MERCHANT_NAME_KEYS)),
        datetime: ensure_string(pick(obj, DATETIME_KEYS)),
        items: normalize_items(obj.get("items")),
        sub_total: ensure_number(pick(obj, SUB_TOTAL_KEYS)),
        vat: ensure_number(pick(obj, VAT_KEYS)),
        service_charge: ensure_number(pick(obj, SERVICE_CHARGE_KEYS)),
        total: ensure_number(pick(obj, TOTAL_KEYS)),
    }
}

/// First present, non-null value among `keys`.
fn pick<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .find(|v| !v.is_null())
}

/// String coercion: JSON strings pass through, everything else defaults.
fn ensure_string(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        _ => String::new(),
    }
}

/// Numeric coercion.
///
/// Numbers pass through unchanged (negative and fractional included).
/// Strings have currency symbols (`$ € £ ¥`) and thousands-separator
/// commas stripped, then parse as f64; unparseable strings and every other
/// type yield `0`.
pub fn ensure_number(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => {
            let cleaned: String = s
                .chars()
                .filter(|c| !matches!(c, '$' | '€' | '£' | '¥' | ','))
                .collect();
            cleaned.trim().parse::<f64>().unwrap_or(0.0)
        }
        _ => 0.0,
    }
}

/// Integer coercion.
///
/// Integer-valued numbers pass through; non-integer numbers round to the
/// nearest integer. Strings parse as base-10 integers, defaulting to `1`
/// on failure; every other type also defaults to `1`.
pub fn ensure_integer(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                i
            } else {
                n.as_f64().map(|f| f.round() as i64).unwrap_or(1)
            }
        }
        Some(Value::String(s)) => s.trim().parse::<i64>().unwrap_or(1),
        _ => 1,
    }
}

/// Normalize the `items` field.
///
/// A non-array source yields an empty list. Each array element is mapped
/// independently; elements that are not objects still produce a
/// fully-defaulted item rather than being dropped or aborting the record.
fn normalize_items(items: Option<&Value>) -> Vec<LineItem> {
    let Some(Value::Array(elements)) = items else {
        return Vec::new();
    };

    elements.iter().map(normalize_item).collect()
}

fn normalize_item(element: &Value) -> LineItem {
    let Some(obj) = element.as_object() else {
        return LineItem::default();
    };

    LineItem {
        name: ensure_string(pick(obj, ITEM_NAME_KEYS)),
        price: ensure_number(pick(obj, ITEM_PRICE_KEYS)),
        count: ensure_integer(pick(obj, ITEM_COUNT_KEYS)),
    }
}
