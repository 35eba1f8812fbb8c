//! Generative-text adapter.
//!
//! DESIGN
//! ======
//! Text in, text out. [`TextGenerator`] is the seam the assistant and the
//! guide service depend on; [`gemini::GeminiClient`] is the only production
//! implementation. No streaming: the full reply is awaited, then revealed
//! locally by [`crate::typewriter`].

pub mod gemini;
pub mod types;

pub use gemini::GeminiClient;
pub use types::{GenerationConfig, LlmError, SafetySetting, TextGenerator};
