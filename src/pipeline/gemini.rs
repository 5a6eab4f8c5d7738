//! Gemini REST client: typed wire structs and the single API call.
//!
//! This module is intentionally thin — prompt engineering lives in
//! [`crate::prompts`] and reply interpretation in [`crate::pipeline::parse`],
//! so this file only has to reproduce the `generateContent` wire contract:
//!
//! - API key in the URL query parameter, not a header
//! - `contents` carrying a text part plus an `inlineData` image part
//! - `generationConfig` with `topP` fixed at 0.1 and `topK` fixed at 16
//! - in strict mode on capable models, a `tools` declaration plus a
//!   `toolConfig` forcing the `extract_receipt_data` function
//! - reply content in `candidates[0].content.parts[0]`, either a
//!   `functionCall` or `text`
//!
//! A non-2xx response is fatal for the call and surfaces the upstream
//! status and body verbatim. There are no retries: the call is
//! caller-billed and slow, so retry policy belongs to the operator.

use crate::config::ExtractionConfig;
use crate::error::ExtractError;
use crate::pipeline::encode;
use crate::prompts::{self, EXTRACT_FUNCTION_NAME};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// Default Gemini API base URL. Overridable for tests via
/// [`GeminiClient::with_base_url`].
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Nucleus-sampling cap sent with every request.
const TOP_P: f64 = 0.1;
/// Top-k sampling cap sent with every request.
const TOP_K: i32 = 16;

// ── Request types ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    pub generation_config: GenerationConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
    #[serde(rename = "toolConfig", skip_serializing_if = "Option::is_none")]
    pub tool_config: Option<ToolConfig>,
}

#[derive(Debug, Serialize)]
pub struct Content {
    pub parts: Vec<Part>,
}

/// One part of a content block: prompt text or inline image data.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Part {
    Text { text: String },
    Image {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize)]
pub struct InlineData {
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_p: f64,
    pub top_k: i32,
    pub max_output_tokens: u32,
}

#[derive(Debug, Serialize)]
pub struct Tool {
    #[serde(rename = "functionDeclarations")]
    pub function_declarations: Vec<FunctionDeclaration>,
}

#[derive(Debug, Serialize)]
pub struct FunctionDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[derive(Debug, Serialize)]
pub struct ToolConfig {
    #[serde(rename = "functionCallingConfig")]
    pub function_calling_config: FunctionCallingConfig,
}

#[derive(Debug, Serialize)]
pub struct FunctionCallingConfig {
    pub mode: String,
    #[serde(rename = "allowedFunctionNames")]
    pub allowed_function_names: Vec<String>,
}

// ── Response types ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
    #[serde(rename = "functionCall")]
    pub function_call: Option<FunctionCall>,
}

#[derive(Debug, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub args: Value,
}

// ── Client ───────────────────────────────────────────────────────────────

/// Does this model accept `tools`/`toolConfig` declarations?
///
/// The 1.5 and 2.x families do; older vision models (gemini-pro-vision)
/// reject requests that carry tools, so strict mode falls back to the
/// schema-instructing prompt for them.
pub fn supports_function_calling(model: &str) -> bool {
    model.contains("1.5") || model.contains("2.")
}

/// Build the `generateContent` request for one extraction.
///
/// The tool declaration is attached only when strict-schema mode is on AND
/// the model supports function calling; `toolConfig` then forces the model
/// to invoke `extract_receipt_data` rather than reply in free text.
pub fn build_request(image: &[u8], config: &ExtractionConfig) -> GenerateContentRequest {
    let prompt = prompts::select_prompt(config.prompt_override.as_deref(), config.strict_schema);

    let (tools, tool_config) = if config.strict_schema && supports_function_calling(&config.model) {
        debug!("Attaching {} tool declaration", EXTRACT_FUNCTION_NAME);
        (
            Some(vec![Tool {
                function_declarations: vec![FunctionDeclaration {
                    name: EXTRACT_FUNCTION_NAME.to_string(),
                    description: "Record the structured data extracted from a receipt image"
                        .to_string(),
                    parameters: prompts::receipt_schema(),
                }],
            }]),
            Some(ToolConfig {
                function_calling_config: FunctionCallingConfig {
                    mode: "ANY".to_string(),
                    allowed_function_names: vec![EXTRACT_FUNCTION_NAME.to_string()],
                },
            }),
        )
    } else {
        (None, None)
    };

    GenerateContentRequest {
        contents: vec![Content {
            parts: vec![
                Part::Text {
                    text: prompt.to_string(),
                },
                Part::Image {
                    inline_data: encode::encode_image(image),
                },
            ],
        }],
        generation_config: GenerationConfig {
            temperature: config.temperature,
            top_p: TOP_P,
            top_k: TOP_K,
            max_output_tokens: config.max_output_tokens,
        },
        tools,
        tool_config,
    }
}

/// Handle to the Gemini API: a reusable HTTP client plus credentials.
///
/// Cheap to clone is not a goal — construct once and share by reference;
/// the inner `reqwest::Client` already pools connections.
#[derive(Debug)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    /// Create a client for the public Gemini endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point the client at a different host (mock servers in tests,
    /// regional endpoints, proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        // Query-string key concatenation below assumes no trailing slash.
        while self.base_url.ends_with('/') {
            self.base_url.pop();
        }
        self
    }

    /// Submit one `generateContent` call.
    ///
    /// # Errors
    /// [`ExtractError::Upstream`] for a non-2xx response (status and body
    /// attached), [`ExtractError::Network`] when no response arrived at
    /// all. Neither is retried.
    pub async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, ExtractError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        );

        let response = self.http.post(&url).json(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Gemini API returned {}: {}", status, body);
            return Err(ExtractError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let reply = response.json::<GenerateContentResponse>().await?;
        debug!("Gemini reply: {} candidate(s)", reply.candidates.len());
        Ok(reply)
    }
}
