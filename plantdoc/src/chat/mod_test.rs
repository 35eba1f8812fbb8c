use super::*;

fn greeted() -> Conversation {
    Conversation::with_greeting("Hello!")
}

#[test]
fn begin_turn_appends_user_and_placeholder() {
    let mut conv = greeted();
    let turn = conv.begin_turn("  What foods help?  ").unwrap();

    assert_eq!(turn.prompt, "What foods help?");
    let msgs = conv.messages();
    assert_eq!(msgs.len(), 3);
    assert_eq!(msgs[1].sender, Sender::User);
    assert_eq!(msgs[1].content, "What foods help?");
    assert_eq!(msgs[2].id, turn.placeholder);
    assert_eq!(msgs[2].content, LOADING_TEXT);
    assert_eq!(conv.loading_count(), 1);
    assert!(conv.is_busy());
}

#[test]
fn blank_message_is_rejected() {
    let mut conv = greeted();
    assert_eq!(conv.begin_turn(" \n\t"), Err(ChatError::EmptyMessage));
    assert_eq!(conv.messages().len(), 1);
}

#[test]
fn second_turn_while_busy_is_rejected() {
    let mut conv = greeted();
    conv.begin_turn("first").unwrap();
    assert_eq!(conv.begin_turn("second"), Err(ChatError::Busy));
    assert_eq!(conv.loading_count(), 1);
    assert_eq!(conv.messages().len(), 3);
}

#[test]
fn complete_resolves_placeholder() {
    let mut conv = greeted();
    let turn = conv.begin_turn("hi").unwrap();
    let reply = conv.complete("Eat spinach.").unwrap();

    assert_eq!(reply.id, turn.placeholder);
    assert_eq!(reply.content, "Eat spinach.");
    assert!(!reply.is_loading && !reply.error);
    assert_eq!(conv.loading_count(), 0);
    assert!(conv.begin_turn("again").is_ok());
}

#[test]
fn resolve_without_pending_turn_is_an_error() {
    let mut conv = greeted();
    assert_eq!(conv.complete("x").unwrap_err(), ChatError::NoPendingTurn);
    assert_eq!(conv.fail("x").unwrap_err(), ChatError::NoPendingTurn);
}

#[test]
fn retry_reuses_last_user_message() {
    let mut conv = greeted();
    conv.begin_turn("What supplements?").unwrap();
    conv.fail("I encountered an error.").unwrap();

    let turn = conv.retry_last().unwrap();
    assert_eq!(turn.prompt, "What supplements?");

    let msgs = conv.messages();
    let users = msgs.iter().filter(|m| m.sender == Sender::User).count();
    assert_eq!(users, 1);
    assert!(msgs.iter().all(|m| !m.error));
    assert_eq!(msgs.last().map(|m| m.id), Some(turn.placeholder));
    assert_eq!(conv.loading_count(), 1);
}

#[test]
fn retry_requires_failed_reply() {
    let mut conv = greeted();
    assert_eq!(conv.retry_last(), Err(ChatError::NothingToRetry));

    conv.begin_turn("q").unwrap();
    assert_eq!(conv.retry_last(), Err(ChatError::Busy));

    conv.complete("a").unwrap();
    assert_eq!(conv.retry_last(), Err(ChatError::NothingToRetry));
}

#[test]
fn loading_never_exceeds_one() {
    let mut conv = greeted();
    for i in 0..5 {
        let _ = conv.begin_turn(&format!("q{i}"));
        let _ = conv.begin_turn("extra");
        let _ = conv.retry_last();
        assert!(conv.loading_count() <= 1);
        if i % 2 == 0 {
            conv.fail("err").unwrap();
            let _ = conv.retry_last();
            assert_eq!(conv.loading_count(), 1);
            conv.complete("ok").unwrap();
        } else {
            conv.complete("ok").unwrap();
        }
    }
    assert_eq!(conv.loading_count(), 0);
}

#[test]
fn mark_helpful_only_on_bot_replies() {
    let mut conv = greeted();
    conv.begin_turn("q").unwrap();
    let reply_id = conv.complete("a").unwrap().id;
    let user_id = conv.messages()[1].id;

    assert!(conv.mark_helpful(reply_id, true));
    assert!(!conv.mark_helpful(user_id, true));
    assert!(!conv.mark_helpful(Uuid::new_v4(), false));
    assert_eq!(conv.messages()[2].helpful, Some(true));
}
