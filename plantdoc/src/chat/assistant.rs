//! Topic-focused assistant driving a [`Conversation`] through a generator.
//!
//! One turn at a time: `send` and `retry` take `&mut self`, so a second
//! submission cannot start while a reply is pending. Failed replies are only
//! ever re-submitted by an explicit [`Assistant::retry`].

use std::fmt::Write;
use std::sync::Arc;

use dispatch::ErrorCode;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{ChatError, Conversation, Message, Turn};
use crate::llm::{GenerationConfig, TextGenerator};
use crate::notify::{Notifier, Toast};

pub const REPLY_ERROR_TEXT: &str =
    "I encountered an error processing your question. Please try again or ask something different.";
pub const NO_CONTEXT_TEXT: &str =
    "Please complete the symptom assessment first so I can identify potential deficiencies and provide targeted advice.";
pub const NUTRITION_REFUSAL: &str = "I apologize, but I can only answer questions related to nutrition, vitamins, \
     minerals, and related health topics. Please ask about nutritional deficiencies, supplements, or dietary recommendations.";

const REFUSAL_MARKERS: [&str; 2] = ["i can only answer questions about nutrition", "i cannot provide information"];

/// The detected deficiency or disease a conversation focuses on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl Topic {
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self { name: name.into(), description: description.into() }
    }
}

// =============================================================================
// PERSONA
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Persona {
    Nutrition,
    Plant,
}

impl Persona {
    #[must_use]
    pub fn greeting(self, topic: Option<&Topic>) -> String {
        match (self, topic) {
            (Self::Nutrition, Some(t)) => format!(
                "I've detected a potential {}. How can I help you with information, symptoms, or supplementation options?",
                t.name
            ),
            (Self::Nutrition, None) => "Hello! I'm your nutrition assistant. Please complete the symptom assessment \
                 first to detect potential vitamin deficiencies."
                .into(),
            (Self::Plant, Some(t)) => format!(
                "I've detected signs of {} on your plant. How can I help you with symptoms, treatment, or prevention?",
                t.name
            ),
            (Self::Plant, None) => "Hello! I'm your plant disease assistant. How can I help you today?".into(),
        }
    }

    /// Nutrition advice needs a detected deficiency to focus on.
    #[must_use]
    pub fn requires_topic(self) -> bool {
        matches!(self, Self::Nutrition)
    }

    fn subject(self) -> &'static str {
        match self {
            Self::Nutrition => "nutrition, vitamins, minerals, and health conditions related to nutritional deficiencies",
            Self::Plant => "plant health, plant diseases, pests, and gardening care",
        }
    }

    fn context(self, topic: Option<&Topic>) -> String {
        let (expert, kind) = match self {
            Self::Nutrition => ("nutrition expert", "vitamin/mineral deficiency"),
            Self::Plant => ("plant disease expert", "plant disease"),
        };
        let Some(t) = topic else {
            return match self {
                Self::Nutrition => "You are a nutrition expert who can help identify and treat vitamin deficiencies.".into(),
                Self::Plant => "You are a plant disease expert who helps gardeners identify and treat plant diseases.".into(),
            };
        };
        let description = if t.description.is_empty() { "No detailed description available." } else { &t.description };
        format!(
            "You are a {expert} specialized in {name}.\n\
             Details: {description}\n\
             Your role is to provide accurate information about this {kind}, including symptoms, causes, \
             prevention, and treatment options.\n\
             Format your responses with markdown for better readability.\n\
             Begin your response by directly addressing the user's question.",
            name = t.name,
        )
    }

    /// Full prompt for one user question.
    #[must_use]
    pub fn prompt(self, topic: Option<&Topic>, question: &str) -> String {
        let focus = topic.map_or("unknown", |t| t.name.as_str());
        let rules = [
            format!("ONLY answer questions related to {}.", self.subject()),
            "If the question is off-topic, politely refuse to answer and redirect to the supported topics.".into(),
            format!("Keep responses focused on the detected condition: {focus}."),
            "Be helpful and accurate, and give concrete recommendations when possible.".into(),
            "If you don't know something specific, be honest about it.".into(),
            "Keep responses under 500 tokens.".into(),
            "Organize information clearly with bullet points when listing options.".into(),
            "Be concise but comprehensive.".into(),
        ];

        let mut prompt = self.context(topic);
        prompt.push_str("\n\nIMPORTANT RULES:\n");
        for (i, rule) in rules.iter().enumerate() {
            let _ = writeln!(prompt, "{}. {rule}", i + 1);
        }
        let _ = write!(prompt, "\nUser question: {question}\n");
        prompt
    }

    /// Replace model-side refusals with the persona's canned refusal.
    #[must_use]
    pub fn normalize_reply(self, reply: String) -> String {
        match self {
            Self::Nutrition => {
                let lower = reply.to_lowercase();
                if REFUSAL_MARKERS.iter().any(|m| lower.contains(m)) { NUTRITION_REFUSAL.to_string() } else { reply }
            }
            Self::Plant => reply,
        }
    }
}

// =============================================================================
// ASSISTANT
// =============================================================================

pub struct Assistant {
    persona: Persona,
    topic: Option<Topic>,
    conversation: Conversation,
    generator: Arc<dyn TextGenerator>,
    notifier: Notifier,
}

impl Assistant {
    #[must_use]
    pub fn new(persona: Persona, topic: Option<Topic>, generator: Arc<dyn TextGenerator>, notifier: Notifier) -> Self {
        let conversation = Conversation::with_greeting(persona.greeting(topic.as_ref()));
        Self { persona, topic, conversation, generator, notifier }
    }

    #[must_use]
    pub fn persona(&self) -> Persona {
        self.persona
    }

    #[must_use]
    pub fn topic(&self) -> Option<&Topic> {
        self.topic.as_ref()
    }

    #[must_use]
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Submit a user message and wait for the resolved reply.
    ///
    /// Generation failures do not surface as `Err`: the reply comes back with
    /// `error` set and a destructive toast is published.
    ///
    /// Dropping the returned future mid-generation leaves its placeholder
    /// loading. The next `send` or `retry` resolves that placeholder as an
    /// errored reply first, so the abandoned question can be retried.
    ///
    /// # Errors
    ///
    /// [`ChatError::EmptyMessage`] when the message is blank.
    pub async fn send(&mut self, text: &str) -> Result<Message, ChatError> {
        self.abandon_stale_turn();
        let turn = self.conversation.begin_turn(text)?;
        self.answer(turn).await
    }

    /// Re-submit the last user message after an errored reply.
    ///
    /// # Errors
    ///
    /// [`ChatError::NothingToRetry`] unless the latest reply failed.
    pub async fn retry(&mut self) -> Result<Message, ChatError> {
        self.abandon_stale_turn();
        let turn = self.conversation.retry_last()?;
        info!(persona = ?self.persona, "chat: retrying last message");
        self.answer(turn).await
    }

    /// Record feedback on a reply and acknowledge it with a toast.
    pub fn mark_helpful(&mut self, id: uuid::Uuid, helpful: bool) -> bool {
        let found = self.conversation.mark_helpful(id, helpful);
        if found {
            let description = if helpful {
                "Thanks for the positive feedback!"
            } else {
                "We'll improve our responses based on your feedback."
            };
            self.notifier.publish(Toast::info("Feedback Received", description));
        }
        found
    }

    /// `&mut self` rules out a concurrent turn, so a loading placeholder here
    /// belongs to a cancelled `send` or `retry`.
    fn abandon_stale_turn(&mut self) {
        if self.conversation.is_busy() {
            warn!(persona = ?self.persona, "chat: resolving reply abandoned by a cancelled request");
            let _ = self.conversation.fail(REPLY_ERROR_TEXT);
        }
    }

    async fn answer(&mut self, turn: Turn) -> Result<Message, ChatError> {
        if self.persona.requires_topic() && self.topic.is_none() {
            return self.conversation.complete(NO_CONTEXT_TEXT).cloned();
        }

        let prompt = self.persona.prompt(self.topic.as_ref(), &turn.prompt);
        let generator = Arc::clone(&self.generator);
        match generator.generate(&prompt, &GenerationConfig::chat()).await {
            Ok(reply) => {
                let reply = self.persona.normalize_reply(reply);
                info!(persona = ?self.persona, chars = reply.len(), "chat: reply generated");
                self.conversation.complete(reply).cloned()
            }
            Err(e) => {
                warn!(persona = ?self.persona, code = e.error_code(), error = %e, "chat: generation failed");
                self.notifier.publish(Toast::error("Error", "Failed to generate a response. Please try again."));
                self.conversation.fail(REPLY_ERROR_TEXT).cloned()
            }
        }
    }
}

#[cfg(test)]
#[path = "assistant_test.rs"]
mod tests;
