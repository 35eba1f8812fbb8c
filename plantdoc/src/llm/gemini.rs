//! Gemini `generateContent` client.
//!
//! Thin wrapper over the dispatcher. Pure request building and response
//! extraction live in free functions for testability.

use dispatch::{Dispatcher, Endpoint};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::types::{GenerationConfig, LlmError, SafetySetting, TextGenerator};
use crate::config::GeminiConfig;

// =============================================================================
// CLIENT
// =============================================================================

pub struct GeminiClient {
    dispatcher: Dispatcher,
    endpoint: Endpoint,
    model: String,
    safety: Option<Vec<SafetySetting>>,
}

impl GeminiClient {
    #[must_use]
    pub fn new(dispatcher: Dispatcher, config: &GeminiConfig) -> Self {
        let url = format!("{}/models/{}:generateContent?key={}", config.base_url, config.model, config.api_key);
        Self {
            dispatcher,
            endpoint: Endpoint::new("gemini", url),
            model: config.model.clone(),
            safety: Some(SafetySetting::defaults()),
        }
    }

    /// Replace the safety settings sent with each request (`None` omits them).
    #[must_use]
    pub fn with_safety(mut self, safety: Option<Vec<SafetySetting>>) -> Self {
        self.safety = safety;
        self
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait::async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String, LlmError> {
        if prompt.trim().is_empty() {
            return Err(LlmError::EmptyPrompt);
        }

        let body = build_request(prompt, config, self.safety.as_deref());
        let response: GenerateResponse = self.dispatcher.call(&self.endpoint, &body).await?;
        let text = extract_text(response)?;
        info!(model = %self.model, prompt_len = prompt.len(), reply_len = text.len(), "gemini: reply received");
        Ok(text)
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    generation_config: &'a GenerationConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    safety_settings: Option<&'a [SafetySetting]>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
}

#[derive(Debug, Deserialize)]
struct ResponseCandidate {
    content: Option<ResponseContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

// =============================================================================
// BUILD / EXTRACT
// =============================================================================

pub(crate) fn build_request<'a>(
    prompt: &'a str,
    config: &'a GenerationConfig,
    safety: Option<&'a [SafetySetting]>,
) -> GenerateRequest<'a> {
    GenerateRequest {
        contents: vec![RequestContent { parts: vec![RequestPart { text: prompt }] }],
        generation_config: config,
        safety_settings: safety,
    }
}

/// Text of the first part of the first candidate.
pub(crate) fn extract_text(response: GenerateResponse) -> Result<String, LlmError> {
    let Some(first) = response.candidates.into_iter().next() else {
        return Err(LlmError::UnexpectedShape("no candidates".into()));
    };

    let text = first
        .content
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.text);

    match text {
        Some(text) => Ok(text),
        None => {
            warn!(finish_reason = ?first.finish_reason, "gemini: candidate without text");
            Err(LlmError::UnexpectedShape(format!(
                "candidate has no text part (finish reason: {})",
                first.finish_reason.as_deref().unwrap_or("unknown")
            )))
        }
    }
}

#[cfg(test)]
#[path = "gemini_test.rs"]
mod tests;
