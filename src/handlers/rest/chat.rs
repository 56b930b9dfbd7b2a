use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_macros::debug_handler;
use uuid::Uuid;

use std::sync::Arc;

use crate::{
    chat::{ActionOutcome, ChatError, ChatSession, SuggestedAction},
    dto::{ActionResponse, ChatMessageResponse, NoteDraftResponse, Notice, SendMessageRequest},
    handlers::rest::notice,
};

fn chat_error(e: ChatError) -> Response {
    match e {
        ChatError::EmptyMessage => notice(StatusCode::BAD_REQUEST, e.to_string()),
        ChatError::Busy => notice(StatusCode::CONFLICT, e.to_string()),
        ChatError::Abandoned => notice(StatusCode::GONE, e.to_string()),
        ChatError::MessageNotFound(_) => notice(StatusCode::NOT_FOUND, e.to_string()),
        ChatError::NotPromotable(_) => notice(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
        ChatError::History(e) => {
            tracing::error!("chat history failure: {}", e);
            notice(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to update the conversation",
            )
        }
    }
}

#[utoipa::path(
    get,
    path = "/chat/messages",
    responses(
        (status = 200, description = "The conversation, oldest first", body = Vec<ChatMessageResponse>)
    ),
    tag = "chat"
)]
#[debug_handler]
pub async fn get_messages(State(chat): State<Arc<ChatSession>>) -> Response {
    let messages: Vec<ChatMessageResponse> = chat
        .messages()
        .into_iter()
        .map(ChatMessageResponse::from)
        .collect();
    (StatusCode::OK, Json(messages)).into_response()
}

#[utoipa::path(
    post,
    path = "/chat/messages",
    request_body = SendMessageRequest,
    responses(
        (status = 200, description = "Assistant reply, possibly a failure notice", body = ChatMessageResponse),
        (status = 400, description = "Empty message", body = Notice),
        (status = 409, description = "A response is already pending", body = Notice),
        (status = 410, description = "Conversation cleared while waiting", body = Notice)
    ),
    tag = "chat"
)]
#[debug_handler]
pub async fn send_message(
    State(chat): State<Arc<ChatSession>>,
    Json(payload): Json<SendMessageRequest>,
) -> Response {
    match chat.send_message(&payload.text).await {
        Ok(reply) => (StatusCode::OK, Json(ChatMessageResponse::from(reply))).into_response(),
        Err(e) => chat_error(e),
    }
}

#[utoipa::path(
    post,
    path = "/chat/actions/{action}",
    params(
        ("action" = String, Path, description = "`summarize` or `draft`")
    ),
    responses(
        (status = 200, description = "Action result", body = ActionResponse),
        (status = 404, description = "Unknown action", body = Notice),
        (status = 409, description = "A response is already pending", body = Notice)
    ),
    tag = "chat"
)]
#[debug_handler]
pub async fn run_action(
    State(chat): State<Arc<ChatSession>>,
    Path(action): Path<String>,
) -> Response {
    let action = match action.as_str() {
        "summarize" => SuggestedAction::Summarize,
        "draft" => SuggestedAction::DraftNote,
        other => return notice(StatusCode::NOT_FOUND, format!("Unknown action '{other}'")),
    };

    match chat.run_action(action).await {
        Ok(ActionOutcome::Reply(reply)) => (
            StatusCode::OK,
            Json(ActionResponse {
                reply: Some(reply.into()),
                composer_seed: None,
            }),
        )
            .into_response(),
        Ok(ActionOutcome::ComposerSeed(seed)) => (
            StatusCode::OK,
            Json(ActionResponse {
                reply: None,
                composer_seed: Some(seed),
            }),
        )
            .into_response(),
        Err(e) => chat_error(e),
    }
}

#[utoipa::path(
    post,
    path = "/chat/messages/{id}/draft",
    params(
        ("id" = Uuid, Path, description = "Assistant message ID")
    ),
    responses(
        (status = 200, description = "Note draft built from the reply", body = NoteDraftResponse),
        (status = 404, description = "Message not found", body = Notice),
        (status = 422, description = "Message is not a completed assistant reply", body = Notice)
    ),
    tag = "chat"
)]
#[debug_handler]
pub async fn promote_message(
    State(chat): State<Arc<ChatSession>>,
    Path(id): Path<Uuid>,
) -> Response {
    match chat.promote_to_draft(id) {
        Ok(draft) => (StatusCode::OK, Json(NoteDraftResponse::from(draft))).into_response(),
        Err(e) => chat_error(e),
    }
}

#[utoipa::path(
    delete,
    path = "/chat/messages",
    responses(
        (status = 204, description = "Conversation cleared"),
        (status = 500, description = "Persisted copy could not be erased", body = Notice)
    ),
    tag = "chat"
)]
#[debug_handler]
pub async fn clear_messages(State(chat): State<Arc<ChatSession>>) -> Response {
    match chat.clear().await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => chat_error(e),
    }
}
