use super::*;
use crate::chat::Sender;
use crate::llm::LlmError;
use crate::notify::ToastVariant;
use crate::test_helpers::MockGenerator;
use dispatch::{DispatchError, TransportError};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

fn iron() -> Option<Topic> {
    Some(Topic::new("Iron Deficiency", "Low iron limits oxygen delivery."))
}

fn exhausted() -> LlmError {
    LlmError::Dispatch(DispatchError::Exhausted {
        attempts: 3,
        last: Box::new(DispatchError::Transport(TransportError::Timeout)),
    })
}

/// Never answers its first prompt; answers every later one.
#[derive(Default)]
struct StallsOnce {
    calls: AtomicU32,
}

#[async_trait::async_trait]
impl TextGenerator for StallsOnce {
    async fn generate(&self, _prompt: &str, _config: &GenerationConfig) -> Result<String, LlmError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            std::future::pending::<()>().await;
        }
        Ok("Check the soil drainage.".into())
    }
}

#[test]
fn greetings_follow_topic() {
    let generator = MockGenerator::new(vec![]);
    let with_topic = Assistant::new(Persona::Nutrition, iron(), generator.clone(), Notifier::new());
    assert_eq!(
        with_topic.conversation().messages()[0].content,
        "I've detected a potential Iron Deficiency. How can I help you with information, symptoms, or supplementation options?"
    );

    let plant = Assistant::new(Persona::Plant, None, generator, Notifier::new());
    assert_eq!(
        plant.conversation().messages()[0].content,
        "Hello! I'm your plant disease assistant. How can I help you today?"
    );
}

#[test]
fn prompt_embeds_topic_and_question() {
    let prompt = Persona::Nutrition.prompt(iron().as_ref(), "Which foods help?");
    assert!(prompt.starts_with("You are a nutrition expert specialized in Iron Deficiency."));
    assert!(prompt.contains("Keep responses focused on the detected condition: Iron Deficiency."));
    assert!(prompt.trim_end().ends_with("User question: Which foods help?"));
}

#[test]
fn refusals_are_normalized() {
    let reply = Persona::Nutrition.normalize_reply("Sorry, I can only answer questions about nutrition.".into());
    assert_eq!(reply, NUTRITION_REFUSAL);
    let reply = Persona::Nutrition.normalize_reply("Eat lentils.".into());
    assert_eq!(reply, "Eat lentils.");
    let reply = Persona::Plant.normalize_reply("I cannot provide information on that.".into());
    assert_eq!(reply, "I cannot provide information on that.");
}

#[tokio::test]
async fn nutrition_without_topic_answers_locally() {
    let generator = MockGenerator::new(vec![]);
    let mut assistant = Assistant::new(Persona::Nutrition, None, generator.clone(), Notifier::new());

    let reply = assistant.send("What should I eat?").await.unwrap();
    assert_eq!(reply.content, NO_CONTEXT_TEXT);
    assert_eq!(generator.prompt_count(), 0);
}

#[tokio::test]
async fn send_resolves_placeholder_with_reply() {
    let generator = MockGenerator::new(vec![Ok("- Spinach\n- Lentils".into())]);
    let mut assistant = Assistant::new(Persona::Nutrition, iron(), generator.clone(), Notifier::new());

    let reply = assistant.send("Which foods help?").await.unwrap();
    assert_eq!(reply.content, "- Spinach\n- Lentils");
    assert!(!reply.error);
    assert_eq!(assistant.conversation().loading_count(), 0);
    assert_eq!(assistant.conversation().messages().len(), 3);
    assert_eq!(generator.prompt_count(), 1);
}

#[tokio::test]
async fn failure_marks_error_and_toasts() {
    let generator = MockGenerator::new(vec![Err(exhausted())]);
    let notifier = Notifier::new();
    let mut toasts = notifier.subscribe();
    let mut assistant = Assistant::new(Persona::Nutrition, iron(), generator, notifier);

    let reply = assistant.send("Which supplements?").await.unwrap();
    assert!(reply.error);
    assert_eq!(reply.content, REPLY_ERROR_TEXT);

    let toast = toasts.recv().await.unwrap();
    assert_eq!(toast.variant, ToastVariant::Destructive);
}

#[tokio::test]
async fn retry_resubmits_same_question() {
    let generator = MockGenerator::new(vec![Err(exhausted()), Ok("Try iron-rich foods.".into())]);
    let mut assistant = Assistant::new(Persona::Nutrition, iron(), generator.clone(), Notifier::new());

    assistant.send("Which supplements?").await.unwrap();
    let reply = assistant.retry().await.unwrap();
    assert_eq!(reply.content, "Try iron-rich foods.");

    let msgs = assistant.conversation().messages();
    let users: Vec<_> = msgs.iter().filter(|m| m.sender == Sender::User).collect();
    assert_eq!(users.len(), 1);
    assert!(msgs.iter().all(|m| !m.error));

    let prompts = generator.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 2);
    assert_eq!(prompts[0], prompts[1]);
}

#[tokio::test]
async fn retry_after_success_is_rejected() {
    let generator = MockGenerator::new(vec![]);
    let mut assistant = Assistant::new(Persona::Plant, None, generator, Notifier::new());
    assistant.send("Why are my leaves yellow?").await.unwrap();
    assert_eq!(assistant.retry().await.unwrap_err(), ChatError::NothingToRetry);
}

#[tokio::test]
async fn feedback_is_acknowledged() {
    let generator = MockGenerator::new(vec![]);
    let notifier = Notifier::new();
    let mut toasts = notifier.subscribe();
    let mut assistant = Assistant::new(Persona::Plant, None, generator, notifier);

    let reply = assistant.send("Is it mildew?").await.unwrap();
    assert!(assistant.mark_helpful(reply.id, true));
    assert_eq!(toasts.recv().await.unwrap().title, "Feedback Received");
}

#[tokio::test(start_paused = true)]
async fn cancelled_send_does_not_wedge_the_conversation() {
    let mut assistant = Assistant::new(Persona::Plant, None, Arc::new(StallsOnce::default()), Notifier::new());

    let abandoned = tokio::time::timeout(Duration::from_secs(1), assistant.send("Why are my leaves yellow?")).await;
    assert!(abandoned.is_err());
    assert!(assistant.conversation().is_busy());

    let reply = assistant.send("Is it overwatering?").await.unwrap();
    assert_eq!(reply.content, "Check the soil drainage.");
    assert_eq!(assistant.conversation().loading_count(), 0);

    let msgs = assistant.conversation().messages();
    let stale = &msgs[2];
    assert!(stale.error);
    assert_eq!(stale.content, REPLY_ERROR_TEXT);
}

#[tokio::test(start_paused = true)]
async fn cancelled_send_can_be_retried() {
    let mut assistant = Assistant::new(Persona::Plant, None, Arc::new(StallsOnce::default()), Notifier::new());

    let abandoned = tokio::time::timeout(Duration::from_secs(1), assistant.send("Why are my leaves yellow?")).await;
    assert!(abandoned.is_err());

    let reply = assistant.retry().await.unwrap();
    assert_eq!(reply.content, "Check the soil drainage.");
    let users = assistant.conversation().messages().iter().filter(|m| m.sender == Sender::User).count();
    assert_eq!(users, 1);
}
