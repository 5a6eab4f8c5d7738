//! Top-level extraction entry points.
//!
//! One call to [`extract_receipt`] drives the whole pipeline for a single
//! image: encode, one Gemini API call, reply parsing, and — in
//! strict-schema mode — normalization. Each invocation is stateless and
//! independent; the only suspending operation is the outbound API call.

use crate::config::ExtractionConfig;
use crate::error::ExtractError;
use crate::normalize;
use crate::pipeline::gemini::{self, GeminiClient};
use crate::pipeline::parse::{self, ParsedReply};
use crate::receipt::ExtractionResult;
use std::time::Instant;
use tracing::{debug, info};

/// Extract receipt data from an image using a shared [`GeminiClient`].
///
/// # Arguments
/// * `client` — Gemini API handle (reusable across requests)
/// * `image` — raw image bytes; must be non-empty
/// * `config` — extraction configuration
///
/// # Returns
/// `Ok` with one of three shapes (see [`ExtractionResult`]): the normalized
/// receipt record (strict mode), the raw parsed payload (strict mode off),
/// or the `{raw_text, error}` diagnostic object when the model's reply was
/// not parseable JSON. The diagnostic shape is a *success* — malformed
/// model output degrades gracefully instead of failing the request.
///
/// # Errors
/// Only transport-level failures propagate: an empty image,
/// [`ExtractError::Upstream`] for a non-2xx API response, or
/// [`ExtractError::Network`]. No retries are attempted.
pub async fn extract_receipt(
    client: &GeminiClient,
    image: &[u8],
    config: &ExtractionConfig,
) -> Result<ExtractionResult, ExtractError> {
    if image.is_empty() {
        return Err(ExtractError::EmptyImage);
    }

    let start = Instant::now();
    info!(
        "Extracting receipt: {} image bytes, model {}, strict_schema {}",
        image.len(),
        config.model,
        config.strict_schema
    );

    // Encoding happens inside build_request; one request, one call.
    let request = gemini::build_request(image, config);
    let response = client.generate_content(&config.model, &request).await?;

    let result = match parse::parse_reply(&response) {
        ParsedReply::Payload(payload) if config.strict_schema => {
            let record = normalize::normalize(&payload);
            debug!(
                "Normalized receipt: merchant {:?}, {} item(s)",
                record.merchant_name,
                record.items.len()
            );
            ExtractionResult::Receipt(record)
        }
        ParsedReply::Payload(payload) => ExtractionResult::Raw(payload),
        ParsedReply::Fallback { raw_text } => ExtractionResult::Unparsed {
            raw_text,
            error: parse::PARSE_ERROR.to_string(),
        },
    };

    info!("Extraction finished in {}ms", start.elapsed().as_millis());
    Ok(result)
}

/// One-shot convenience: build a throwaway client and extract.
///
/// Prefer constructing a [`GeminiClient`] once and calling
/// [`extract_receipt`] when handling more than one request — the client
/// pools connections.
pub async fn extract_receipt_with_key(
    image: &[u8],
    config: &ExtractionConfig,
    api_key: &str,
) -> Result<ExtractionResult, ExtractError> {
    let client = GeminiClient::new(api_key);
    extract_receipt(&client, image, config).await
}
