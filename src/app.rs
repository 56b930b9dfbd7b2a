use axum::{
    Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use axum_macros::FromRef;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use std::sync::Arc;

use crate::{
    chat::ChatSession,
    handlers::rest::{self, chat},
    service::NoteService,
};

/// Handles shared by every request. Built once by the composition root.
#[derive(Clone, FromRef)]
pub struct AppState {
    pub notes: Arc<NoteService>,
    pub chat: Arc<ChatSession>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/notes", get(rest::list_notes).post(rest::create_note))
        .route(
            "/notes/{id}",
            get(rest::get_one_note)
                .put(rest::update_note)
                .delete(rest::delete_note),
        )
        .route("/feed", get(rest::get_feed))
        .route(
            "/chat/messages",
            get(chat::get_messages)
                .post(chat::send_message)
                .delete(chat::clear_messages),
        )
        .route("/chat/messages/{id}/draft", post(chat::promote_message))
        .route("/chat/actions/{action}", post(chat::run_action))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", rest::ApiDoc::openapi()))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn root() -> Response {
    (StatusCode::OK, "neuralnote is running").into_response()
}
