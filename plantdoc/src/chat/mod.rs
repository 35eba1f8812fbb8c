//! Conversation state for the assistant chats.
//!
//! DESIGN
//! ======
//! The log is append-only apart from two in-place edits: resolving the
//! loading placeholder, and dropping errored replies before a manual retry.
//! At most one placeholder exists at any time; while it does, the
//! conversation is busy and refuses new turns.
//!
//! ERROR HANDLING
//! ==============
//! Every rejected operation leaves the log untouched and reports a
//! [`ChatError`]. Generation failures are not errors here: they resolve the
//! placeholder as an errored bot message via [`Conversation::fail`].

pub mod assistant;

use std::time::{SystemTime, UNIX_EPOCH};

use dispatch::ErrorCode;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use assistant::{Assistant, Persona, Topic};

/// Placeholder text shown while a reply is pending.
pub const LOADING_TEXT: &str = "Thinking...";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatError {
    #[error("message is empty")]
    EmptyMessage,
    #[error("a reply is already pending")]
    Busy,
    #[error("no reply is pending")]
    NoPendingTurn,
    #[error("the last reply did not fail; nothing to retry")]
    NothingToRetry,
}

impl ErrorCode for ChatError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyMessage => "E_EMPTY_MESSAGE",
            Self::Busy => "E_BUSY",
            Self::NoPendingTurn => "E_NO_PENDING_TURN",
            Self::NothingToRetry => "E_NOTHING_TO_RETRY",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub content: String,
    pub sender: Sender,
    pub timestamp_ms: i64,
    #[serde(default)]
    pub is_loading: bool,
    #[serde(default)]
    pub error: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub helpful: Option<bool>,
}

impl Message {
    fn new(sender: Sender, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            sender,
            timestamp_ms: now_ms(),
            is_loading: false,
            error: false,
            helpful: None,
        }
    }

    fn placeholder() -> Self {
        Self { is_loading: true, ..Self::new(Sender::Bot, LOADING_TEXT) }
    }
}

/// A turn awaiting its reply: the user text to answer and the placeholder to
/// resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub prompt: String,
    pub placeholder: Uuid,
}

fn now_ms() -> i64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}

// =============================================================================
// CONVERSATION
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A conversation opened by a bot greeting.
    #[must_use]
    pub fn with_greeting(text: impl Into<String>) -> Self {
        Self { messages: vec![Message::new(Sender::Bot, text)] }
    }

    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    #[must_use]
    pub fn loading_count(&self) -> usize {
        self.messages.iter().filter(|m| m.is_loading).count()
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.messages.iter().any(|m| m.is_loading)
    }

    /// Append the user's message and a loading placeholder.
    ///
    /// # Errors
    ///
    /// [`ChatError::EmptyMessage`] for blank input, [`ChatError::Busy`] while
    /// a reply is pending.
    pub fn begin_turn(&mut self, content: &str) -> Result<Turn, ChatError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if self.is_busy() {
            return Err(ChatError::Busy);
        }

        self.messages.push(Message::new(Sender::User, content));
        Ok(self.push_placeholder(content.to_string()))
    }

    /// Resolve the pending placeholder with a successful reply.
    ///
    /// # Errors
    ///
    /// [`ChatError::NoPendingTurn`] when nothing is loading.
    pub fn complete(&mut self, reply: impl Into<String>) -> Result<&Message, ChatError> {
        self.resolve(reply.into(), false)
    }

    /// Resolve the pending placeholder as an errored reply.
    ///
    /// # Errors
    ///
    /// [`ChatError::NoPendingTurn`] when nothing is loading.
    pub fn fail(&mut self, text: impl Into<String>) -> Result<&Message, ChatError> {
        self.resolve(text.into(), true)
    }

    /// Re-submit the last user message after an errored reply.
    ///
    /// Errored replies are removed and a fresh placeholder appended; no new
    /// user message is added.
    ///
    /// # Errors
    ///
    /// [`ChatError::Busy`] while a reply is pending, and
    /// [`ChatError::NothingToRetry`] unless the latest bot reply is an error.
    pub fn retry_last(&mut self) -> Result<Turn, ChatError> {
        if self.is_busy() {
            return Err(ChatError::Busy);
        }
        let last_bot_failed = self.messages.iter().rev().find(|m| m.sender == Sender::Bot).is_some_and(|m| m.error);
        if !last_bot_failed {
            return Err(ChatError::NothingToRetry);
        }
        let Some(prompt) = self.messages.iter().rev().find(|m| m.sender == Sender::User).map(|m| m.content.clone())
        else {
            return Err(ChatError::NothingToRetry);
        };

        self.messages.retain(|m| !m.error);
        Ok(self.push_placeholder(prompt))
    }

    /// Record feedback on a bot reply. Returns `false` if no such reply exists.
    pub fn mark_helpful(&mut self, id: Uuid, helpful: bool) -> bool {
        match self.messages.iter_mut().find(|m| m.id == id && m.sender == Sender::Bot) {
            Some(message) => {
                message.helpful = Some(helpful);
                true
            }
            None => false,
        }
    }

    fn push_placeholder(&mut self, prompt: String) -> Turn {
        let placeholder = Message::placeholder();
        let turn = Turn { prompt, placeholder: placeholder.id };
        self.messages.push(placeholder);
        turn
    }

    fn resolve(&mut self, content: String, error: bool) -> Result<&Message, ChatError> {
        let message = self.messages.iter_mut().find(|m| m.is_loading).ok_or(ChatError::NoPendingTurn)?;
        message.content = content;
        message.is_loading = false;
        message.error = error;
        message.timestamp_ms = now_ms();
        Ok(message)
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
