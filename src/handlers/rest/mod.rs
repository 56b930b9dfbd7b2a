pub mod chat;

use axum::{
    Json,
    extract::{Path, Query, RawQuery, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_macros::debug_handler;
use serde::Deserialize;
use utoipa::OpenApi;

use std::sync::Arc;

use crate::{
    dto::{
        ActionResponse, ChatMessageResponse, CreateNoteRequest, FeedResponse, ListNotesQuery,
        NoteDraftResponse, NoteResponse, Notice, PageResponse, SendMessageRequest,
        UpdateNoteRequest,
    },
    feed::{FeedCard, ViewState},
    models::{
        GridView, SortOrder,
        chat::{MessageState, Sender},
    },
    service::{NoteService, NoteServiceError},
};

#[derive(OpenApi)]
#[openapi(
    paths(
        create_note,
        update_note,
        delete_note,
        get_one_note,
        list_notes,
        get_feed,
        chat::get_messages,
        chat::send_message,
        chat::run_action,
        chat::promote_message,
        chat::clear_messages
    ),
    components(schemas(
        NoteResponse,
        CreateNoteRequest,
        UpdateNoteRequest,
        PageResponse,
        FeedResponse,
        FeedCard,
        ViewState,
        SortOrder,
        GridView,
        Notice,
        ChatMessageResponse,
        SendMessageRequest,
        ActionResponse,
        NoteDraftResponse,
        Sender,
        MessageState
    )),
    tags(
        (name = "notes", description = "Notes management API"),
        (name = "chat", description = "Assistant conversation API")
    )
)]
pub struct ApiDoc;

pub(crate) fn notice(status: StatusCode, description: impl Into<String>) -> Response {
    (status, Json(Notice::error(description))).into_response()
}

fn invalid_content(e: &NoteServiceError) -> Response {
    notice(StatusCode::BAD_REQUEST, e.to_string())
}

#[utoipa::path(
    post,
    path = "/notes",
    request_body = CreateNoteRequest,
    responses(
        (status = 201, description = "Note created successfully", body = NoteResponse),
        (status = 400, description = "Empty or over-long content", body = Notice),
        (status = 500, description = "Internal server error", body = Notice)
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn create_note(
    State(service): State<Arc<NoteService>>,
    Json(payload): Json<CreateNoteRequest>,
) -> Response {
    match service.create_note(payload).await {
        Ok(note) => (StatusCode::CREATED, Json(note)).into_response(),
        Err(e @ NoteServiceError::Invalid(_)) => invalid_content(&e),
        Err(e) => {
            tracing::error!("failed to create note entry: {}", e);
            notice(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to create note. Please try again.",
            )
        }
    }
}

#[utoipa::path(
    put,
    path = "/notes/{id}",
    params(
        ("id" = i64, Path, description = "Note ID")
    ),
    request_body = UpdateNoteRequest,
    responses(
        (status = 200, description = "Note updated successfully", body = NoteResponse),
        (status = 400, description = "Empty or over-long content", body = Notice),
        (status = 404, description = "Note not found", body = Notice),
        (status = 500, description = "Internal server error", body = Notice)
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn update_note(
    State(service): State<Arc<NoteService>>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateNoteRequest>,
) -> Response {
    match service.update_note(id, payload).await {
        Ok(Some(note)) => (StatusCode::OK, Json(note)).into_response(),
        Ok(None) => notice(StatusCode::NOT_FOUND, "Note not found"),
        Err(e @ NoteServiceError::Invalid(_)) => invalid_content(&e),
        Err(e) => {
            tracing::error!("failed to update note entry: {}", e);
            notice(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to update note. Please try again.",
            )
        }
    }
}

#[utoipa::path(
    delete,
    path = "/notes/{id}",
    params(
        ("id" = i64, Path, description = "Note ID")
    ),
    responses(
        (status = 204, description = "Note deleted successfully"),
        (status = 404, description = "Note not found", body = Notice),
        (status = 500, description = "Internal server error", body = Notice)
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn delete_note(State(service): State<Arc<NoteService>>, Path(id): Path<i64>) -> Response {
    match service.delete_note(id).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => notice(StatusCode::NOT_FOUND, "Note not found"),
        Err(e) => {
            tracing::error!("failed to delete note entry: {}", e);
            notice(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to delete note. Please try again.",
            )
        }
    }
}

#[utoipa::path(
    get,
    path = "/notes/{id}",
    params(
        ("id" = i64, Path, description = "Note ID")
    ),
    responses(
        (status = 200, description = "Note found", body = NoteResponse),
        (status = 404, description = "Note not found", body = Notice),
        (status = 500, description = "Internal server error", body = Notice)
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn get_one_note(
    State(service): State<Arc<NoteService>>,
    Path(id): Path<i64>,
) -> Response {
    match service.get_one_note(id).await {
        Ok(Some(note)) => (StatusCode::OK, Json(note)).into_response(),
        Ok(None) => notice(StatusCode::NOT_FOUND, "Note not found"),
        Err(e) => {
            tracing::error!("failed to get note entry: {}", e);
            notice(StatusCode::INTERNAL_SERVER_ERROR, "Failed to get note")
        }
    }
}

#[utoipa::path(
    get,
    path = "/notes",
    params(ListNotesQuery),
    responses(
        (status = 200, description = "One page of notes", body = PageResponse),
        (status = 500, description = "Internal server error", body = Notice)
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn list_notes(
    State(service): State<Arc<NoteService>>,
    Query(query): Query<ListNotesQuery>,
) -> Response {
    match service.list_notes(query).await {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(e) => {
            tracing::error!("failed to list note entries: {}", e);
            notice(StatusCode::INTERNAL_SERVER_ERROR, "Failed to list notes")
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct FeedPages {
    pub pages: Option<usize>,
}

#[utoipa::path(
    get,
    path = "/feed",
    params(
        ("sort" = Option<SortOrder>, Query, description = "Ordering over updated_at, defaults to desc"),
        ("view" = Option<GridView>, Query, description = "Column density, defaults to double"),
        ("note" = Option<i64>, Query, description = "Selected note"),
        ("pages" = Option<usize>, Query, description = "Pages to scroll through, defaults to 1")
    ),
    responses(
        (status = 200, description = "Rendered feed", body = FeedResponse),
        (status = 500, description = "Internal server error", body = Notice)
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn get_feed(
    State(service): State<Arc<NoteService>>,
    RawQuery(raw): RawQuery,
    Query(FeedPages { pages }): Query<FeedPages>,
) -> Response {
    let view = ViewState::from_query(raw.as_deref().unwrap_or_default());
    match service.feed_snapshot(view, pages.unwrap_or(1)).await {
        Ok(feed) => (StatusCode::OK, Json(feed)).into_response(),
        Err(e) => {
            tracing::error!("failed to render feed: {}", e);
            notice(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load notes")
        }
    }
}
