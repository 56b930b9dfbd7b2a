use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    feed::{FeedCard, FeedSnapshot, ViewState},
    models::{
        Note, NoteDraft, Page, SortOrder,
        chat::{ChatMessage, MessageState, Sender},
    },
};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NoteResponse {
    /// Note ID
    pub id: i64,
    /// Note content
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Note> for NoteResponse {
    fn from(note: Note) -> Self {
        Self {
            id: note.id,
            content: note.content,
            created_at: note.created_at,
            updated_at: note.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateNoteRequest {
    /// Note content, at most 500 characters
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateNoteRequest {
    /// Note content, at most 500 characters
    pub content: String,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListNotesQuery {
    /// Rows to skip
    #[serde(default)]
    pub offset: usize,
    /// Page size, defaults to the configured one
    pub limit: Option<usize>,
    /// Ordering over `updated_at`
    #[serde(default)]
    pub sort: SortOrder,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PageResponse {
    pub items: Vec<NoteResponse>,
    /// Offset of the next page; absent on the last page
    pub next_cursor: Option<usize>,
    pub total_count: usize,
}

impl From<Page> for PageResponse {
    fn from(page: Page) -> Self {
        Self {
            items: page.items.into_iter().map(NoteResponse::from).collect(),
            next_cursor: page.next_cursor,
            total_count: page.total_count,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FeedResponse {
    pub view: ViewState,
    /// Query string reproducing this view
    pub query: String,
    pub columns: usize,
    pub cards: Vec<FeedCard>,
    pub has_next: bool,
    pub empty_hint: Option<String>,
    pub selected: Option<NoteResponse>,
}

impl FeedResponse {
    pub fn new(view: ViewState, snapshot: FeedSnapshot, selected: Option<Note>) -> Self {
        Self {
            query: view.to_query(),
            view,
            columns: snapshot.columns,
            cards: snapshot.cards,
            has_next: snapshot.has_next,
            empty_hint: snapshot.empty_hint,
            selected: selected.map(NoteResponse::from),
        }
    }
}

/// User-facing notification attached to failed requests.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Notice {
    pub title: String,
    pub description: String,
}

impl Notice {
    pub fn error(description: impl Into<String>) -> Self {
        Self {
            title: "Error".to_string(),
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatMessageResponse {
    pub id: Uuid,
    pub content: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
    pub state: MessageState,
    pub is_pending: bool,
}

impl From<ChatMessage> for ChatMessageResponse {
    fn from(message: ChatMessage) -> Self {
        Self {
            is_pending: message.is_pending(),
            id: message.id,
            content: message.content,
            sender: message.sender,
            timestamp: message.timestamp,
            state: message.state,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SendMessageRequest {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ActionResponse {
    /// Assistant reply, for actions that talk to the assistant
    pub reply: Option<ChatMessageResponse>,
    /// Composer text, for actions that only prepare input
    pub composer_seed: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NoteDraftResponse {
    pub content: String,
    pub char_count: usize,
    pub over_limit: bool,
    pub can_save: bool,
}

impl From<NoteDraft> for NoteDraftResponse {
    fn from(draft: NoteDraft) -> Self {
        Self {
            char_count: draft.char_count(),
            over_limit: draft.is_over_limit(),
            can_save: draft.can_save(),
            content: draft.content,
        }
    }
}
