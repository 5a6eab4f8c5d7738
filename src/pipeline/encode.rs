//! Image encoding: raw bytes → base64 inline data for the request body.
//!
//! Gemini accepts images as base64 strings embedded in the JSON request
//! (`inlineData` parts). The bytes are passed through untouched — no
//! re-encoding or resizing — so whatever the camera produced is exactly
//! what the model sees.

use crate::pipeline::gemini::InlineData;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::debug;

/// MIME type declared for inline image data.
///
/// The wire contract fixes this to JPEG regardless of the actual container;
/// Gemini sniffs the real format from the bytes, so PNG or WebP uploads
/// still work.
pub const IMAGE_MIME_TYPE: &str = "image/jpeg";

/// Encode image bytes as an inline-data part ready for the API request.
pub fn encode_image(bytes: &[u8]) -> InlineData {
    let b64 = STANDARD.encode(bytes);
    debug!("Encoded image: {} bytes → {} bytes base64", bytes.len(), b64.len());

    InlineData {
        mime_type: IMAGE_MIME_TYPE.to_string(),
        data: b64,
    }
}
