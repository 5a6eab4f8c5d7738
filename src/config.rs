//! Configuration for receipt extraction.
//!
//! All behaviour is controlled through [`ExtractionConfig`], built via its
//! [`ExtractionConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share a config across requests, serialise it for logging, and
//! diff two runs to understand why their outputs differ.

use crate::error::ExtractError;
use serde::{Deserialize, Serialize};

/// Default Gemini model. Supports function calling, so strict-schema mode
/// gets guaranteed-shaped output instead of relying on prompt discipline.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Configuration for a receipt extraction.
///
/// Built via [`ExtractionConfig::builder()`] or
/// [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use receipt2json::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .model("gemini-1.5-pro")
///     .temperature(0.0)
///     .strict_schema(true)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Gemini model identifier. Default: [`DEFAULT_MODEL`].
    pub model: String,

    /// Sampling temperature. Default: 0.1.
    ///
    /// Low temperature keeps the model faithful to what is actually printed
    /// on the receipt; higher values introduce creativity that worsens
    /// transcription accuracy.
    pub temperature: f32,

    /// Maximum tokens the model may generate. Default: 2048.
    ///
    /// Long receipts with many line items can exceed 1 000 output tokens.
    /// Setting this too low silently truncates the JSON mid-object, which
    /// then lands on the diagnostic fallback path.
    pub max_output_tokens: u32,

    /// Custom prompt. If `None`, the built-in template for the selected
    /// mode is used (see [`crate::prompts`]).
    pub prompt_override: Option<String>,

    /// Guarantee the output matches the fixed receipt schema. Default: true.
    ///
    /// When on, the reply is routed through the normalizer, and models that
    /// support function calling are additionally forced to invoke the
    /// `extract_receipt_data` tool. When off, whatever JSON the model
    /// produced is passed through untouched.
    pub strict_schema: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.1,
            max_output_tokens: 2048,
            prompt_override: None,
            strict_schema: true,
        }
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t;
        self
    }

    pub fn max_output_tokens(mut self, n: u32) -> Self {
        self.config.max_output_tokens = n;
        self
    }

    pub fn prompt_override(mut self, prompt: impl Into<String>) -> Self {
        self.config.prompt_override = Some(prompt.into());
        self
    }

    pub fn strict_schema(mut self, v: bool) -> Self {
        self.config.strict_schema = v;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, ExtractError> {
        let c = &self.config;
        if c.model.trim().is_empty() {
            return Err(ExtractError::InvalidConfig("model must not be empty".into()));
        }
        if !(0.0..=2.0).contains(&c.temperature) {
            return Err(ExtractError::InvalidConfig(format!(
                "temperature must be 0.0–2.0, got {}",
                c.temperature
            )));
        }
        if c.max_output_tokens == 0 {
            return Err(ExtractError::InvalidConfig(
                "max_output_tokens must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}
