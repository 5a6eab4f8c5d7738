//! Error types for the receipt2json library.
//!
//! The error surface is intentionally small. Per the pipeline contract,
//! the only failure that propagates to callers is a failed upstream call
//! (non-2xx transport response or a network-level error). Everything else
//! degrades: unparseable model output becomes the diagnostic
//! `{raw_text, error}` object, and missing/wrong-typed fields are silently
//! defaulted by the normalizer — neither is ever an `Err`.

use thiserror::Error;

/// All errors returned by the receipt2json library.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The caller supplied an empty image.
    #[error("Image payload is empty")]
    EmptyImage,

    /// The Gemini API returned a non-success transport status.
    ///
    /// Carries the upstream status and body text verbatim so operators can
    /// see what the API actually said. Never retried here — the call is
    /// caller-billed and potentially slow, so retry policy belongs to the
    /// caller.
    #[error("Gemini API returned {status}: {body}")]
    Upstream { status: u16, body: String },

    /// The request never got a response (DNS, TLS, connection reset, …).
    #[error("Gemini API request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
