//! Reply parsing: pull a JSON payload out of a Gemini response.
//!
//! Three paths, tried in order:
//!
//! 1. **Function-call shortcut** — when the reply carries a `functionCall`
//!    named `extract_receipt_data`, its `args` ARE the structured payload.
//!    No text parsing at all.
//! 2. **Text** — locate the first text part. Models frequently wrap JSON
//!    in a markdown fence (with or without a language tag) despite being
//!    told not to; strip the fence, trim, parse.
//! 3. **Diagnostic fallback** — no text at all, or the text is not JSON.
//!    Deliberately NOT an error: malformed model output must still come
//!    back as *some* observable JSON body, so the caller gets
//!    `{raw_text, error}` instead of a failed request.

use crate::pipeline::gemini::GenerateContentResponse;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

/// The `error` field of the diagnostic fallback object.
pub const PARSE_ERROR: &str = "Failed to parse JSON from Gemini response";

/// `raw_text` placeholder when the reply carried no text content at all.
pub const NO_TEXT_PLACEHOLDER: &str = "(no text in response)";

/// Outcome of reply parsing. The fallback variant is a success as far as
/// the pipeline is concerned — it just skips normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedReply {
    /// A JSON payload was recovered (function-call args or parsed text).
    Payload(Value),
    /// Nothing parseable; `raw_text` is the best-effort reply text.
    Fallback { raw_text: String },
}

/// Extract a JSON payload from the model reply.
pub fn parse_reply(response: &GenerateContentResponse) -> ParsedReply {
    let parts = response
        .candidates
        .first()
        .and_then(|c| c.content.as_ref())
        .map(|c| c.parts.as_slice())
        .unwrap_or_default();

    // Function-call shortcut: the args are already structured.
    if let Some(call) = parts
        .iter()
        .filter_map(|p| p.function_call.as_ref())
        .find(|c| c.name == crate::prompts::EXTRACT_FUNCTION_NAME)
    {
        debug!("Reply used function call, skipping text parsing");
        return ParsedReply::Payload(call.args.clone());
    }

    let Some(text) = parts.iter().find_map(|p| p.text.as_deref()) else {
        warn!("Reply contained no text and no function call");
        return ParsedReply::Fallback {
            raw_text: NO_TEXT_PLACEHOLDER.to_string(),
        };
    };

    let candidate = strip_code_fence(text);
    match serde_json::from_str::<Value>(candidate) {
        Ok(payload) => ParsedReply::Payload(payload),
        Err(e) => {
            warn!("Reply text is not valid JSON: {}", e);
            ParsedReply::Fallback {
                raw_text: text.to_string(),
            }
        }
    }
}

// Matches a reply that is one outer fence, optionally language-tagged
// (```json, ```JSON, bare ```). (?s) so the body may span lines.
static RE_OUTER_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```[A-Za-z]*\s*\n?(.*?)\n?```\s*$").unwrap());

/// Strip one outer markdown fence, if present, and trim.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    match RE_OUTER_FENCE.captures(trimmed) {
        Some(caps) => caps.get(1).map_or("", |m| m.as_str()).trim(),
        None => trimmed,
    }
}
