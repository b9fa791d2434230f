//! LLM backend abstraction and implementations.
//!
//! Enum dispatch over the three supported HTTP APIs. Every request carries
//! the response schema for the content being asked for: Gemini enforces it
//! natively, `OpenAI`-compatible servers through a `json_schema` response
//! format, and Anthropic through the system prompt.

use serde_json::{Value, json};

use crate::config::{BackendType, LlmBackendConfig};
use crate::error::ProviderError;
use crate::prompt::RenderedPrompt;
use crate::schema::{SchemaKind, to_json_schema};

const TEMPERATURE: f64 = 0.8;

// ---------------------------------------------------------------------------
// Unified backend enum
// ---------------------------------------------------------------------------

/// An LLM backend that can turn a prompt into schema-shaped JSON text.
#[derive(Debug)]
pub enum LlmBackend {
    /// Google Gemini `generateContent`.
    Gemini(GeminiBackend),
    /// `OpenAI`-compatible chat completions API.
    OpenAi(OpenAiBackend),
    /// Anthropic Messages API.
    Anthropic(AnthropicBackend),
}

impl LlmBackend {
    /// Send a prompt and return the raw response text.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::LlmBackend`] if the HTTP call fails or the
    /// response text cannot be located.
    pub async fn complete(
        &self,
        prompt: &RenderedPrompt,
        kind: SchemaKind,
    ) -> Result<String, ProviderError> {
        match self {
            Self::Gemini(backend) => backend.complete(prompt, kind).await,
            Self::OpenAi(backend) => backend.complete(prompt, kind).await,
            Self::Anthropic(backend) => backend.complete(prompt, kind).await,
        }
    }

    /// Human-readable name for logging.
    pub const fn name(&self) -> &str {
        match self {
            Self::Gemini(_) => "gemini",
            Self::OpenAi(_) => "openai-compatible",
            Self::Anthropic(_) => "anthropic",
        }
    }

    /// Model identifier requests are sent to.
    pub fn model(&self) -> &str {
        match self {
            Self::Gemini(backend) => &backend.model,
            Self::OpenAi(backend) => &backend.model,
            Self::Anthropic(backend) => &backend.model,
        }
    }
}

/// POST a JSON body and return the decoded JSON response.
async fn post_json(
    request: reqwest::RequestBuilder,
    body: &Value,
    label: &str,
) -> Result<Value, ProviderError> {
    let response = request
        .header("Content-Type", "application/json")
        .json(body)
        .send()
        .await
        .map_err(|e| ProviderError::LlmBackend(format!("{label} request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let error_body = response
            .text()
            .await
            .unwrap_or_else(|_| "unable to read error body".to_owned());
        return Err(ProviderError::LlmBackend(format!(
            "{label} returned {status}: {error_body}"
        )));
    }

    response
        .json()
        .await
        .map_err(|e| ProviderError::LlmBackend(format!("{label} response parse failed: {e}")))
}

// ---------------------------------------------------------------------------
// Gemini backend
// ---------------------------------------------------------------------------

/// Backend for the Gemini `generateContent` API.
///
/// Sends requests to `{api_url}/models/{model}:generateContent` with the
/// key in the `x-goog-api-key` header.
#[derive(Debug)]
pub struct GeminiBackend {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl GeminiBackend {
    /// Create a new Gemini backend.
    pub fn new(config: &LlmBackendConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        }
    }

    async fn complete(
        &self,
        prompt: &RenderedPrompt,
        kind: SchemaKind,
    ) -> Result<String, ProviderError> {
        let url = format!("{}/models/{}:generateContent", self.api_url, self.model);
        let body = gemini_request_body(prompt, kind, self.max_tokens);
        let request = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key);
        let json = post_json(request, &body, "Gemini").await?;
        extract_gemini_content(&json)
    }
}

fn gemini_request_body(prompt: &RenderedPrompt, kind: SchemaKind, max_tokens: u32) -> Value {
    json!({
        "systemInstruction": { "parts": [{ "text": prompt.system }] },
        "contents": [{ "role": "user", "parts": [{ "text": prompt.user }] }],
        "generationConfig": {
            "temperature": TEMPERATURE,
            "maxOutputTokens": max_tokens,
            "responseMimeType": "application/json",
            "responseSchema": kind.schema()
        }
    })
}

/// Extract the text from a Gemini `generateContent` response.
fn extract_gemini_content(json: &Value) -> Result<String, ProviderError> {
    json.get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.get(0))
        .and_then(|p| p.get("text"))
        .and_then(Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| {
            ProviderError::LlmBackend(
                "Gemini response missing candidates[0].content.parts[0].text".to_owned(),
            )
        })
}

// ---------------------------------------------------------------------------
// OpenAI-compatible backend
// ---------------------------------------------------------------------------

/// Backend for `OpenAI`-compatible chat completions APIs.
///
/// Works with `OpenAI`, `DeepSeek`, and Ollama endpoints.
#[derive(Debug)]
pub struct OpenAiBackend {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl OpenAiBackend {
    /// Create a new `OpenAI`-compatible backend.
    pub fn new(config: &LlmBackendConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        }
    }

    async fn complete(
        &self,
        prompt: &RenderedPrompt,
        kind: SchemaKind,
    ) -> Result<String, ProviderError> {
        let url = format!("{}/chat/completions", self.api_url);
        let body = openai_request_body(&self.model, prompt, kind, self.max_tokens);
        let request = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key));
        let json = post_json(request, &body, "OpenAI").await?;
        extract_openai_content(&json)
    }
}

fn openai_request_body(
    model: &str,
    prompt: &RenderedPrompt,
    kind: SchemaKind,
    max_tokens: u32,
) -> Value {
    json!({
        "model": model,
        "messages": [
            {"role": "system", "content": prompt.system},
            {"role": "user", "content": prompt.user}
        ],
        "temperature": TEMPERATURE,
        "max_tokens": max_tokens,
        "response_format": {
            "type": "json_schema",
            "json_schema": {
                "name": kind.name(),
                "schema": to_json_schema(&kind.schema())
            }
        }
    })
}

/// Extract the text content from an `OpenAI` chat completions response.
fn extract_openai_content(json: &Value) -> Result<String, ProviderError> {
    json.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| {
            ProviderError::LlmBackend(
                "OpenAI response missing choices[0].message.content".to_owned(),
            )
        })
}

// ---------------------------------------------------------------------------
// Anthropic Messages API backend
// ---------------------------------------------------------------------------

/// Backend for the Anthropic Messages API.
///
/// There is no native response schema, so the JSON Schema is appended to
/// the system prompt.
#[derive(Debug)]
pub struct AnthropicBackend {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl AnthropicBackend {
    /// Create a new Anthropic Messages API backend.
    pub fn new(config: &LlmBackendConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        }
    }

    async fn complete(
        &self,
        prompt: &RenderedPrompt,
        kind: SchemaKind,
    ) -> Result<String, ProviderError> {
        let url = format!("{}/messages", self.api_url);
        let body = anthropic_request_body(&self.model, prompt, kind, self.max_tokens);
        let request = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01");
        let json = post_json(request, &body, "Anthropic").await?;
        extract_anthropic_content(&json)
    }
}

fn anthropic_request_body(
    model: &str,
    prompt: &RenderedPrompt,
    kind: SchemaKind,
    max_tokens: u32,
) -> Value {
    let schema = to_json_schema(&kind.schema());
    let system = format!(
        "{}\n\nResponde ÚNICAMENTE con un objeto JSON que cumpla este JSON Schema:\n{schema}",
        prompt.system
    );
    json!({
        "model": model,
        "max_tokens": max_tokens,
        "temperature": TEMPERATURE,
        "system": system,
        "messages": [
            {"role": "user", "content": prompt.user}
        ]
    })
}

/// Extract the text content from an Anthropic Messages API response.
fn extract_anthropic_content(json: &Value) -> Result<String, ProviderError> {
    json.get("content")
        .and_then(|c| c.get(0))
        .and_then(|b| b.get("text"))
        .and_then(Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| {
            ProviderError::LlmBackend("Anthropic response missing content[0].text".to_owned())
        })
}

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

/// Create an LLM backend from configuration.
pub fn create_backend(config: &LlmBackendConfig) -> LlmBackend {
    match config.backend_type {
        BackendType::Gemini => LlmBackend::Gemini(GeminiBackend::new(config)),
        BackendType::OpenAi => LlmBackend::OpenAi(OpenAiBackend::new(config)),
        BackendType::Anthropic => LlmBackend::Anthropic(AnthropicBackend::new(config)),
    }
}
