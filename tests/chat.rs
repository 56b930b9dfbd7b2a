mod common;

use std::{sync::Arc, time::Duration};

use common::{FlakyHistory, ScriptedGateway, TestStore, seeded_store};
use neuralnote::{
    chat::{
        ActionOutcome, ChatError, ChatSession, DEFAULT_AI_ERROR, DRAFT_NOTE_SEED,
        FileMessageStore, MemoryMessageStore, MessageStore, NO_NOTES_TO_SUMMARIZE,
        SUMMARIZE_PROMPT, SuggestedAction,
    },
    gateway::GatewayError,
    models::chat::{ChatMessage, MessageState, Sender},
    repository::{MemoryNoteStore, NoteStore},
};

async fn session(
    gateway: Arc<ScriptedGateway>,
    notes: Arc<dyn NoteStore>,
    history: Arc<dyn MessageStore>,
) -> ChatSession {
    ChatSession::start(gateway, notes, history, 5).await
}

fn pending_count(messages: &[ChatMessage]) -> usize {
    messages.iter().filter(|m| m.is_pending()).count()
}

#[tokio::test]
async fn reply_settles_the_placeholder() {
    let gateway = Arc::new(ScriptedGateway::new().reply(Ok("Hi there".to_string())));
    let history = Arc::new(MemoryMessageStore::new());
    let chat = session(
        gateway.clone(),
        Arc::new(MemoryNoteStore::new()),
        history.clone(),
    )
    .await;

    let reply = chat.send_message("  hello  ").await.unwrap();
    assert_eq!(reply.content, "Hi there");
    assert_eq!(reply.state, MessageState::Resolved);
    assert_eq!(reply.sender, Sender::Assistant);

    let messages = chat.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].sender, Sender::User);
    assert_eq!(messages[0].content, "hello");
    assert_eq!(messages[1], reply);
    assert!(!chat.is_awaiting_response());
    assert_eq!(gateway.prompts(), vec!["hello".to_string()]);
    assert_eq!(history.persisted().unwrap(), messages);
}

#[tokio::test]
async fn blank_message_is_rejected() {
    let gateway = Arc::new(ScriptedGateway::new());
    let chat = session(
        gateway.clone(),
        Arc::new(MemoryNoteStore::new()),
        Arc::new(MemoryMessageStore::new()),
    )
    .await;

    assert!(matches!(chat.send_message("   ").await, Err(ChatError::EmptyMessage)));
    assert!(chat.messages().is_empty());
    assert!(gateway.prompts().is_empty());
}

#[tokio::test]
async fn api_reason_is_shown_on_failure() {
    let gateway = Arc::new(ScriptedGateway::new().reply(Err(GatewayError::Api {
        status: 429,
        message: Some("Rate limit exceeded".to_string()),
    })));
    let chat = session(
        gateway,
        Arc::new(MemoryNoteStore::new()),
        Arc::new(MemoryMessageStore::new()),
    )
    .await;

    let reply = chat.send_message("hello").await.unwrap();
    assert_eq!(reply.state, MessageState::Failed);
    assert_eq!(reply.content, "Rate limit exceeded");
}

#[tokio::test]
async fn failure_without_reason_uses_default_text() {
    let gateway = Arc::new(
        ScriptedGateway::new()
            .reply(Err(GatewayError::Api {
                status: 500,
                message: None,
            }))
            .reply(Err(GatewayError::EmptyResponse)),
    );
    let chat = session(
        gateway,
        Arc::new(MemoryNoteStore::new()),
        Arc::new(MemoryMessageStore::new()),
    )
    .await;

    for _ in 0..2 {
        let reply = chat.send_message("hello").await.unwrap();
        assert_eq!(reply.state, MessageState::Failed);
        assert_eq!(reply.content, DEFAULT_AI_ERROR);
    }
    assert_eq!(chat.messages().len(), 4);
}

#[tokio::test]
async fn second_send_while_pending_is_refused() {
    let gateway = Arc::new(ScriptedGateway::gated().reply(Ok("first reply".to_string())));
    let history = Arc::new(MemoryMessageStore::new());
    let chat = Arc::new(
        session(
            gateway.clone(),
            Arc::new(MemoryNoteStore::new()),
            history.clone(),
        )
        .await,
    );

    let first = {
        let chat = chat.clone();
        tokio::spawn(async move { chat.send_message("first").await })
    };
    while gateway.prompts().is_empty() {
        tokio::task::yield_now().await;
    }

    let during = chat.messages();
    assert_eq!(during.len(), 2);
    assert_eq!(pending_count(&during), 1);
    // The placeholder is visible in memory but never written out.
    assert_eq!(history.persisted().unwrap().len(), 1);

    assert!(matches!(chat.send_message("second").await, Err(ChatError::Busy)));
    assert!(matches!(chat.summarize_recent().await, Err(ChatError::Busy)));
    assert_eq!(chat.messages().len(), 2);

    gateway.release();
    let reply = first.await.unwrap().unwrap();
    assert_eq!(reply.content, "first reply");
    assert_eq!(pending_count(&chat.messages()), 0);
    assert_eq!(history.persisted().unwrap().len(), 2);
}

#[tokio::test]
async fn clearing_mid_flight_drops_the_reply() {
    let gateway = Arc::new(ScriptedGateway::gated());
    let history = Arc::new(MemoryMessageStore::new());
    let chat = Arc::new(
        session(
            gateway.clone(),
            Arc::new(MemoryNoteStore::new()),
            history.clone(),
        )
        .await,
    );

    let turn = {
        let chat = chat.clone();
        tokio::spawn(async move { chat.send_message("hello").await })
    };
    while gateway.prompts().is_empty() {
        tokio::task::yield_now().await;
    }

    chat.clear().await.unwrap();
    gateway.release();

    assert!(matches!(turn.await.unwrap(), Err(ChatError::Abandoned)));
    assert!(chat.messages().is_empty());
    assert!(history.persisted().is_none());
}

#[tokio::test]
async fn dropped_send_still_settles() {
    let gateway = Arc::new(ScriptedGateway::gated().reply(Ok("late reply".to_string())));
    let history = Arc::new(MemoryMessageStore::new());
    let chat = session(
        gateway.clone(),
        Arc::new(MemoryNoteStore::new()),
        history.clone(),
    )
    .await;

    let timed_out = tokio::time::timeout(Duration::from_millis(50), chat.send_message("first"))
        .await
        .is_err();
    assert!(timed_out);
    assert!(chat.is_awaiting_response());

    gateway.release();
    while chat.is_awaiting_response() {
        tokio::task::yield_now().await;
    }

    let messages = chat.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].content, "late reply");
    assert_eq!(messages[1].state, MessageState::Resolved);

    gateway.release();
    let reply = chat.send_message("second").await.unwrap();
    assert_eq!(reply.state, MessageState::Resolved);
    assert_eq!(chat.messages().len(), 4);
    assert_eq!(history.persisted().unwrap().len(), 4);
}

#[tokio::test]
async fn failed_history_write_keeps_the_conversation() {
    let history = Arc::new(FlakyHistory::failing());
    let chat = session(
        Arc::new(ScriptedGateway::new().reply(Ok("still here".to_string()))),
        Arc::new(MemoryNoteStore::new()),
        history.clone(),
    )
    .await;

    let reply = chat.send_message("hello").await.unwrap();
    assert_eq!(reply.content, "still here");
    assert_eq!(chat.messages().len(), 2);
    assert!(!chat.is_awaiting_response());
    assert!(history.persisted().is_none());

    history.set_failing(false);
    chat.send_message("again").await.unwrap();
    assert_eq!(history.persisted().unwrap(), chat.messages());
}

#[tokio::test]
async fn summarize_without_notes_skips_the_gateway() {
    let gateway = Arc::new(ScriptedGateway::new());
    let chat = session(
        gateway.clone(),
        Arc::new(MemoryNoteStore::new()),
        Arc::new(MemoryMessageStore::new()),
    )
    .await;

    let reply = chat.summarize_recent().await.unwrap();
    assert_eq!(reply.content, NO_NOTES_TO_SUMMARIZE);
    assert_eq!(reply.state, MessageState::Failed);
    assert!(gateway.prompts().is_empty());

    let messages = chat.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].content, SUMMARIZE_PROMPT);
    assert_eq!(
        messages
            .iter()
            .filter(|m| m.sender == Sender::Assistant)
            .count(),
        1
    );
}

#[tokio::test]
async fn summarize_labels_the_newest_notes() {
    let notes = seeded_store(7).await;
    let gateway = Arc::new(ScriptedGateway::new().reply(Ok("A summary".to_string())));
    let chat = session(gateway.clone(), notes, Arc::new(MemoryMessageStore::new())).await;

    let reply = chat.summarize_recent().await.unwrap();
    assert_eq!(reply.content, "A summary");

    let prompts = gateway.prompts();
    assert_eq!(prompts.len(), 1);
    let prompt = &prompts[0];
    assert!(prompt.starts_with("Summarize my recent notes:\n\nNote 1: note 6"));
    assert!(prompt.contains("Note 5: note 2"));
    assert!(!prompt.contains("Note 6:"));
}

#[tokio::test]
async fn summarize_reports_store_failure_as_a_failed_reply() {
    let notes = Arc::new(TestStore::new(seeded_store(2).await));
    notes.set_failing(true);
    let gateway = Arc::new(ScriptedGateway::new());
    let chat = session(gateway.clone(), notes, Arc::new(MemoryMessageStore::new())).await;

    let reply = chat.summarize_recent().await.unwrap();
    assert_eq!(reply.state, MessageState::Failed);
    assert_eq!(reply.content, DEFAULT_AI_ERROR);
    assert!(gateway.prompts().is_empty());
    assert!(!chat.is_awaiting_response());
}

#[tokio::test]
async fn draft_action_only_seeds_the_composer() {
    let gateway = Arc::new(ScriptedGateway::new());
    let chat = session(
        gateway.clone(),
        Arc::new(MemoryNoteStore::new()),
        Arc::new(MemoryMessageStore::new()),
    )
    .await;

    let outcome = chat.run_action(SuggestedAction::DraftNote).await.unwrap();
    assert_eq!(outcome, ActionOutcome::ComposerSeed(DRAFT_NOTE_SEED.to_string()));
    assert!(chat.messages().is_empty());
    assert!(gateway.prompts().is_empty());
}

#[tokio::test]
async fn resolved_reply_becomes_a_draft() {
    let gateway = Arc::new(
        ScriptedGateway::new()
            .reply(Ok("Buy oat milk on Friday".to_string()))
            .reply(Err(GatewayError::EmptyResponse)),
    );
    let chat = session(
        gateway,
        Arc::new(MemoryNoteStore::new()),
        Arc::new(MemoryMessageStore::new()),
    )
    .await;

    let reply = chat.send_message("help me").await.unwrap();
    let draft = chat.promote_to_draft(reply.id).unwrap();
    assert_eq!(draft.content, "Buy oat milk on Friday");
    assert!(draft.can_save());

    let user_id = chat.messages()[0].id;
    assert!(matches!(
        chat.promote_to_draft(user_id),
        Err(ChatError::NotPromotable(_))
    ));

    let failed = chat.send_message("again").await.unwrap();
    assert!(matches!(
        chat.promote_to_draft(failed.id),
        Err(ChatError::NotPromotable(_))
    ));
    assert!(matches!(
        chat.promote_to_draft(uuid::Uuid::new_v4()),
        Err(ChatError::MessageNotFound(_))
    ));
}

#[tokio::test]
async fn conversation_survives_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chat-messages.json");
    let notes: Arc<dyn NoteStore> = Arc::new(MemoryNoteStore::new());

    let gateway = Arc::new(ScriptedGateway::new().reply(Ok("stored".to_string())));
    let chat = session(gateway, notes.clone(), Arc::new(FileMessageStore::new(&path))).await;
    chat.send_message("remember this").await.unwrap();
    let before = chat.messages();
    drop(chat);

    let restarted = session(
        Arc::new(ScriptedGateway::new()),
        notes,
        Arc::new(FileMessageStore::new(&path)),
    )
    .await;
    assert_eq!(restarted.messages(), before);
}

#[tokio::test]
async fn clear_erases_the_persisted_copy() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chat-messages.json");
    let notes: Arc<dyn NoteStore> = Arc::new(MemoryNoteStore::new());

    let chat = session(
        Arc::new(ScriptedGateway::new()),
        notes.clone(),
        Arc::new(FileMessageStore::new(&path)),
    )
    .await;
    chat.send_message("hello").await.unwrap();
    assert!(path.exists());

    chat.clear().await.unwrap();
    assert!(chat.messages().is_empty());
    assert!(!path.exists());

    let restarted = session(
        Arc::new(ScriptedGateway::new()),
        notes,
        Arc::new(FileMessageStore::new(&path)),
    )
    .await;
    assert!(restarted.messages().is_empty());
}

#[tokio::test]
async fn pending_messages_are_dropped_on_load() {
    let history = Arc::new(MemoryMessageStore::new());
    history
        .save(&[ChatMessage::user("left over"), ChatMessage::placeholder()])
        .await
        .unwrap();

    let chat = session(
        Arc::new(ScriptedGateway::new()),
        Arc::new(MemoryNoteStore::new()),
        history,
    )
    .await;
    let messages = chat.messages();
    assert_eq!(messages.len(), 1);
    assert!(!chat.is_awaiting_response());

    chat.send_message("next").await.unwrap();
    assert_eq!(chat.messages().len(), 3);
}

#[tokio::test]
async fn unreadable_history_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chat-messages.json");
    std::fs::write(&path, "not json").unwrap();

    let chat = session(
        Arc::new(ScriptedGateway::new()),
        Arc::new(MemoryNoteStore::new()),
        Arc::new(FileMessageStore::new(&path)),
    )
    .await;
    assert!(chat.messages().is_empty());
}
