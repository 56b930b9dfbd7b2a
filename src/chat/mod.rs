//! The assistant conversation.
//!
//! A [`ChatSession`] owns one ordered conversation and its persisted copy.
//! Every turn appends the user's message plus an assistant placeholder in
//! the [`MessageState::Pending`] state; the placeholder is settled in place
//! once the completion call returns. While a placeholder exists no other
//! turn can start, so the conversation never holds two pending messages.

mod history;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::{
    gateway::{AiGateway, GatewayError},
    models::{
        NoteDraft, SortOrder,
        chat::{ChatMessage, MessageState, Sender},
    },
    repository::NoteStore,
};

pub use history::{FileMessageStore, HistoryError, MemoryMessageStore, MessageStore};

/// Shown when a completion fails without a usable reason.
pub const DEFAULT_AI_ERROR: &str =
    "Looks like neural AI is not working right now, please try again later!";
pub const NO_NOTES_TO_SUMMARIZE: &str = "No notes found to summarize";
pub const SUMMARIZE_PROMPT: &str = "summarize my recent notes";
pub const DRAFT_NOTE_PROMPT: &str = "help me write a short note";
/// Composer text offered by the "help me write" action.
pub const DRAFT_NOTE_SEED: &str = "I want to write a short note about...";
pub const DEFAULT_SUMMARY_NOTES: usize = 5;

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Message is empty")]
    EmptyMessage,

    #[error("A response is already pending")]
    Busy,

    #[error("The conversation was cleared before the response arrived")]
    Abandoned,

    #[error("Message {0} not found")]
    MessageNotFound(Uuid),

    #[error("Message {0} is not a completed assistant reply")]
    NotPromotable(Uuid),

    #[error(transparent)]
    History(#[from] HistoryError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestedAction {
    Summarize,
    DraftNote,
}

impl SuggestedAction {
    /// Text of the suggestion chip.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Summarize => SUMMARIZE_PROMPT,
            Self::DraftNote => DRAFT_NOTE_PROMPT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Reply(ChatMessage),
    /// Text to put into the composer; nothing was sent.
    ComposerSeed(String),
}

pub struct ChatSession {
    gateway: Arc<dyn AiGateway>,
    notes: Arc<dyn NoteStore>,
    conversation: Arc<Conversation>,
    summary_note_count: usize,
}

/// The message list and its durable copy, shared with turns running in the background.
struct Conversation {
    messages: Mutex<Vec<ChatMessage>>,
    history: Arc<dyn MessageStore>,
    /// Serializes writes so the durable copy follows the order of mutations.
    writes: tokio::sync::Mutex<()>,
}

impl Conversation {
    fn lock(&self) -> MutexGuard<'_, Vec<ChatMessage>> {
        self.messages.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn settled_snapshot(&self) -> Vec<ChatMessage> {
        self.lock()
            .iter()
            .filter(|message| !message.is_pending())
            .cloned()
            .collect()
    }

    /// Writes the settled part of the conversation. Pending placeholders never reach storage.
    ///
    /// Persistence is best effort: the in-memory conversation stays
    /// authoritative, a failed write is logged, and the next mutation
    /// rewrites the whole sequence again.
    async fn persist(&self) {
        let _write = self.writes.lock().await;
        self.write_settled().await;
    }

    /// Like [`Conversation::persist`], but only while `placeholder` is still part of the conversation.
    async fn persist_turn(&self, placeholder: Uuid) {
        let _write = self.writes.lock().await;
        let live = self.lock().iter().any(|message| message.id == placeholder);
        if live {
            self.write_settled().await;
        }
    }

    /// Callers hold `writes`.
    async fn write_settled(&self) {
        let settled = self.settled_snapshot();
        if let Err(e) = self.history.save(&settled).await {
            tracing::error!("failed to persist chat history: {e}");
        }
    }

    fn begin_turn(&self, text: &str) -> Result<Uuid, ChatError> {
        let mut messages = self.lock();
        if messages.iter().any(ChatMessage::is_pending) {
            return Err(ChatError::Busy);
        }

        let placeholder = ChatMessage::placeholder();
        let id = placeholder.id;
        messages.push(ChatMessage::user(text));
        messages.push(placeholder);

        Ok(id)
    }

    async fn settle_completion(
        &self,
        placeholder: Uuid,
        completion: Result<String, GatewayError>,
    ) -> Result<ChatMessage, ChatError> {
        match completion {
            Ok(reply) => self.settle(placeholder, MessageState::Resolved, reply).await,
            Err(e) => {
                tracing::warn!("AI completion failed: {e}");
                let content = e.user_message().unwrap_or(DEFAULT_AI_ERROR).to_string();
                self.settle(placeholder, MessageState::Failed, content).await
            }
        }
    }

    async fn settle(
        &self,
        placeholder: Uuid,
        state: MessageState,
        content: String,
    ) -> Result<ChatMessage, ChatError> {
        let settled = {
            let mut messages = self.lock();
            let Some(message) = messages.iter_mut().find(|message| message.id == placeholder)
            else {
                tracing::debug!("dropping reply for a cleared conversation");
                return Err(ChatError::Abandoned);
            };
            message.settle(state, content);
            message.clone()
        };
        self.persist().await;

        Ok(settled)
    }

    async fn clear(&self) -> Result<(), ChatError> {
        let _write = self.writes.lock().await;
        self.lock().clear();
        self.history.clear().await?;
        Ok(())
    }
}

impl ChatSession {
    /// Starts a session from whatever the history store holds.
    pub async fn start(
        gateway: Arc<dyn AiGateway>,
        notes: Arc<dyn NoteStore>,
        history: Arc<dyn MessageStore>,
        summary_note_count: usize,
    ) -> Self {
        let mut messages = history.load().await.unwrap_or_else(|e| {
            tracing::warn!("failed to load chat history, starting empty: {e}");
            Vec::new()
        });
        messages.retain(|message| !message.is_pending());
        tracing::info!("chat session started with {} messages", messages.len());

        Self {
            gateway,
            notes,
            conversation: Arc::new(Conversation {
                messages: Mutex::new(messages),
                history,
                writes: tokio::sync::Mutex::new(()),
            }),
            summary_note_count: summary_note_count.max(1),
        }
    }

    #[must_use]
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.conversation.lock().clone()
    }

    #[must_use]
    pub fn is_awaiting_response(&self) -> bool {
        self.conversation.lock().iter().any(ChatMessage::is_pending)
    }

    /// Sends `text` to the assistant and returns the settled reply.
    ///
    /// Blank text and sends made while another turn is pending are rejected
    /// without touching the conversation. A failed completion still yields a
    /// reply, in the [`MessageState::Failed`] state. The turn runs on its own
    /// task, so a caller that stops waiting does not leave it pending.
    pub async fn send_message(&self, text: &str) -> Result<ChatMessage, ChatError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let placeholder = self.conversation.begin_turn(text)?;
        let conversation = self.conversation.clone();
        let gateway = self.gateway.clone();
        let prompt = text.to_string();
        let turn = tokio::spawn(async move {
            conversation.persist_turn(placeholder).await;
            let completion = gateway.complete(&prompt).await;
            conversation.settle_completion(placeholder, completion).await
        });

        self.finish_turn(placeholder, turn).await
    }

    pub async fn run_action(&self, action: SuggestedAction) -> Result<ActionOutcome, ChatError> {
        tracing::debug!("running suggested action '{}'", action.label());
        match action {
            SuggestedAction::DraftNote => Ok(ActionOutcome::ComposerSeed(DRAFT_NOTE_SEED.to_string())),
            SuggestedAction::Summarize => self.summarize_recent().await.map(ActionOutcome::Reply),
        }
    }

    /// Asks the assistant to summarize the most recently updated notes.
    pub async fn summarize_recent(&self) -> Result<ChatMessage, ChatError> {
        let placeholder = self.conversation.begin_turn(SUMMARIZE_PROMPT)?;
        let conversation = self.conversation.clone();
        let gateway = self.gateway.clone();
        let notes = self.notes.clone();
        let count = self.summary_note_count;
        let turn = tokio::spawn(async move {
            conversation.persist_turn(placeholder).await;

            let notes = match notes.list_page(0, count, SortOrder::Desc).await {
                Ok(slice) => slice.items,
                Err(e) => {
                    tracing::error!("failed to load notes for summary: {e}");
                    return conversation
                        .settle(placeholder, MessageState::Failed, DEFAULT_AI_ERROR.to_string())
                        .await;
                }
            };
            if notes.is_empty() {
                return conversation
                    .settle(
                        placeholder,
                        MessageState::Failed,
                        NO_NOTES_TO_SUMMARIZE.to_string(),
                    )
                    .await;
            }

            let prompt = compose_summary_prompt(notes.iter().map(|note| note.content.as_str()));
            let completion = gateway.complete(&prompt).await;
            conversation.settle_completion(placeholder, completion).await
        });

        self.finish_turn(placeholder, turn).await
    }

    async fn finish_turn(
        &self,
        placeholder: Uuid,
        turn: JoinHandle<Result<ChatMessage, ChatError>>,
    ) -> Result<ChatMessage, ChatError> {
        match turn.await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!("chat turn task failed: {e}");
                self.conversation
                    .settle(placeholder, MessageState::Failed, DEFAULT_AI_ERROR.to_string())
                    .await
            }
        }
    }

    /// Turns a completed assistant reply into a note draft.
    pub fn promote_to_draft(&self, id: Uuid) -> Result<NoteDraft, ChatError> {
        let messages = self.conversation.lock();
        let message = messages
            .iter()
            .find(|message| message.id == id)
            .ok_or(ChatError::MessageNotFound(id))?;

        if message.sender != Sender::Assistant || message.state != MessageState::Resolved {
            return Err(ChatError::NotPromotable(id));
        }
        Ok(NoteDraft::new(message.content.clone()))
    }

    /// Empties the conversation and erases the persisted copy.
    pub async fn clear(&self) -> Result<(), ChatError> {
        self.conversation.clear().await?;
        tracing::info!("chat conversation cleared");
        Ok(())
    }
}

fn compose_summary_prompt<'a>(notes: impl Iterator<Item = &'a str>) -> String {
    let labeled: Vec<String> = notes
        .enumerate()
        .map(|(i, content)| format!("Note {}: {content}", i + 1))
        .collect();
    format!("Summarize my recent notes:\n\n{}", labeled.join("\n\n"))
}
