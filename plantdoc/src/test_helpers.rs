//! Shared fixtures for unit tests: fast dispatcher, mock generator, env lock.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use dispatch::testing::ScriptedTransport;
use dispatch::{Dispatcher, RetryPolicy};

use crate::llm::{GenerationConfig, LlmError, TextGenerator};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Serialise tests that mutate process environment variables.
pub fn env_guard() -> MutexGuard<'static, ()> {
    ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// TRANSPORT
// =============================================================================

/// Dispatcher with a 1 ms backoff base so retry tests stay fast.
pub fn fast_dispatcher(transport: Arc<ScriptedTransport>) -> Dispatcher {
    Dispatcher::new(transport, RetryPolicy::new(3, Duration::from_millis(1), Duration::from_secs(5)))
}

// =============================================================================
// GENERATOR
// =============================================================================

/// Returns queued replies; records prompts. An empty queue answers "done".
pub struct MockGenerator {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    pub prompts: Mutex<Vec<String>>,
}

impl MockGenerator {
    pub fn new(replies: Vec<Result<String, LlmError>>) -> Arc<Self> {
        Arc::new(Self { replies: Mutex::new(replies.into()), prompts: Mutex::new(Vec::new()) })
    }

    pub fn prompt_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl TextGenerator for MockGenerator {
    async fn generate(&self, prompt: &str, _config: &GenerationConfig) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies.lock().unwrap().pop_front().unwrap_or_else(|| Ok("done".into()))
    }
}
