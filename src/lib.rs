//! # receipt2json
//!
//! Extract structured receipt data from images using the Gemini vision API.
//!
//! ## Why this crate?
//!
//! Classic OCR gives you a wall of text; what billing and expense systems
//! want is `{merchant_name, datetime, items[], totals}`. A multimodal model
//! reads the receipt photo directly — but its reply is free-form JSON with
//! drifting field names (`tax` vs `vat`, `quantity` vs `count`), amounts as
//! currency strings, and the occasional markdown fence around the whole
//! thing. This crate owns that last mile: one API call, then deterministic
//! normalization into a fixed schema that is guaranteed to hold.
//!
//! ## Pipeline Overview
//!
//! ```text
//! image bytes
//!  │
//!  ├─ 1. Encode     bytes → base64 inline data
//!  ├─ 2. Gemini     one generateContent call (tool-forced in strict mode)
//!  ├─ 3. Parse      functionCall args, or fence-stripped JSON text
//!  └─ 4. Normalize  aliases + coercions → ReceiptRecord (strict mode)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use receipt2json::{extract_receipt, ExtractionConfig, GeminiClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = GeminiClient::new(std::env::var("GEMINI_API_KEY")?);
//!     let config = ExtractionConfig::default();
//!     let image = std::fs::read("receipt.jpg")?;
//!     let result = extract_receipt(&client, &image, &config).await?;
//!     println!("{}", serde_json::to_string_pretty(&result)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Guarantees
//!
//! - **Strict-schema mode** (default): the output always matches the fixed
//!   receipt schema — every field present, correctly typed, defaulted when
//!   the model omitted or mangled it.
//! - **Graceful degradation**: a reply that is not JSON at all still comes
//!   back as a `{raw_text, error}` object, never as a failed request.
//! - **One upstream call**: no retries, no backoff — the API call is
//!   caller-billed, so retry policy stays with the operator.
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `cli`    | on      | Enables the `receipt2json` binary (clap + anyhow + tracing-subscriber) |
//! | `server` | on      | Enables the axum HTTP endpoint ([`server`]) |
//!
//! Disable both when using only the library:
//! ```toml
//! receipt2json = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod extract;
pub mod normalize;
pub mod pipeline;
pub mod prompts;
pub mod receipt;
#[cfg(feature = "server")]
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ExtractionConfig, ExtractionConfigBuilder, DEFAULT_MODEL};
pub use error::ExtractError;
pub use extract::{extract_receipt, extract_receipt_with_key};
pub use pipeline::gemini::GeminiClient;
pub use receipt::{ExtractionResult, LineItem, ReceiptRecord};
