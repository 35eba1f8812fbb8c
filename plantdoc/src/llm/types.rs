//! Provider-neutral generation settings, errors, and the generator trait.

use dispatch::{DispatchError, ErrorCode};
use serde::{Deserialize, Serialize};

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by text generation.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// The prompt was empty after trimming; nothing was sent.
    #[error("prompt is empty")]
    EmptyPrompt,

    /// The dispatcher gave up or hit a terminal status.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// The provider answered 2xx without any generated text.
    #[error("unexpected response format: {0}")]
    UnexpectedShape(String),
}

impl ErrorCode for LlmError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyPrompt => "E_EMPTY_PROMPT",
            Self::Dispatch(e) => e.error_code(),
            Self::UnexpectedShape(_) => "E_UNEXPECTED_SHAPE",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Dispatch(e) if e.retryable())
    }
}

// =============================================================================
// GENERATION SETTINGS
// =============================================================================

/// Sampling settings sent with every generation request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

impl GenerationConfig {
    /// Long-form disease guide: slightly warmer, larger budget.
    #[must_use]
    pub fn guide() -> Self {
        Self { temperature: 0.3, top_k: 40, top_p: 0.95, max_output_tokens: 1200 }
    }

    /// Assistant replies: conservative and shorter.
    #[must_use]
    pub fn chat() -> Self {
        Self { temperature: 0.2, top_k: 40, top_p: 0.95, max_output_tokens: 800 }
    }
}

/// One provider-side content filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetySetting {
    pub category: String,
    pub threshold: String,
}

impl SafetySetting {
    /// The four standard harm categories, blocked at medium and above.
    #[must_use]
    pub fn defaults() -> Vec<Self> {
        [
            "HARM_CATEGORY_HARASSMENT",
            "HARM_CATEGORY_HATE_SPEECH",
            "HARM_CATEGORY_SEXUALLY_EXPLICIT",
            "HARM_CATEGORY_DANGEROUS_CONTENT",
        ]
        .into_iter()
        .map(|category| Self { category: category.into(), threshold: "BLOCK_MEDIUM_AND_ABOVE".into() })
        .collect()
    }
}

// =============================================================================
// GENERATOR TRAIT
// =============================================================================

/// Text-in/text-out generation. Enables mocking in tests.
#[async_trait::async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a reply for `prompt`.
    ///
    /// # Errors
    ///
    /// Returns an [`LlmError`] if the prompt is empty, dispatch fails, or the
    /// response carries no text.
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String, LlmError>;
}
