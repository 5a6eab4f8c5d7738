//! Pipeline stages for receipt extraction.
//!
//! Each submodule implements exactly one transformation step. Keeping
//! stages separate makes each independently testable and lets us swap
//! implementations without touching other stages.
//!
//! ## Data Flow
//!
//! ```text
//! image bytes ──▶ encode ──▶ gemini ──▶ parse ──▶ normalize
//!                (base64)   (one API    (fence    (strict mode
//!                            call)       strip,    only; see
//!                                        JSON)     crate::normalize)
//! ```
//!
//! 1. [`encode`] — wrap the raw image bytes as base64 inline data for the
//!    multimodal request body
//! 2. [`gemini`] — build and submit the `generateContent` call; the only
//!    stage with network I/O
//! 3. [`parse`]  — extract a JSON payload from the reply: function-call
//!    shortcut, fenced-text stripping, or the diagnostic fallback

pub mod encode;
pub mod gemini;
pub mod parse;
