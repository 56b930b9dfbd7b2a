use std::sync::Arc;

use neuralnote::{
    app::{self, AppState},
    chat::{ChatSession, FileMessageStore, MemoryMessageStore, MessageStore},
    config,
    gateway::{AiGateway, OpenRouterGateway},
    repository::{MemoryNoteStore, NoteStore, PgNoteStore},
    service::NoteService,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Log setup
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load config
    let cfg = config::load_config().unwrap_or_else(|e| {
        tracing::error!("Failed to load config: {e}");
        panic!("failed to load config: {e}");
    });
    tracing::info!("Successfully loaded neuralnote config");

    // Note store creation and migration
    let store: Arc<dyn NoteStore> = if let Some(dsn) = cfg.database_dsn.as_deref() {
        let mut store = PgNoteStore::new(dsn).await.unwrap_or_else(|e| {
            tracing::error!("Failed to establish database connection: {e}");
            panic!("failed to establish database connection: {e}");
        });
        store.migrate().await.unwrap_or_else(|e| {
            tracing::error!("Failed to migrate database: {e}");
            panic!("failed to migrate database: {e}");
        });
        Arc::new(store)
    } else {
        tracing::warn!("No database configured, notes are kept in memory only");
        Arc::new(MemoryNoteStore::new())
    };

    // AI gateway
    if cfg.gateway.api_key.is_empty() {
        tracing::warn!("No AI gateway API key configured, chat requests will be rejected upstream");
    }
    let gateway: Arc<dyn AiGateway> =
        Arc::new(OpenRouterGateway::new(&cfg.gateway).unwrap_or_else(|e| {
            tracing::error!("Failed to build AI gateway client: {e}");
            panic!("failed to build AI gateway client: {e}");
        }));

    // Chat history
    let history: Arc<dyn MessageStore> = match cfg.chat.history_path.as_ref() {
        Some(path) => {
            tracing::info!("Chat history is stored in {}", path.display());
            Arc::new(FileMessageStore::new(path))
        }
        None => Arc::new(MemoryMessageStore::new()),
    };

    let notes = NoteService::new(store.clone(), cfg.owner_id.clone(), cfg.page_size);
    let chat = ChatSession::start(gateway, store, history, cfg.chat.summary_note_count).await;

    let state = AppState {
        notes: Arc::new(notes),
        chat: Arc::new(chat),
    };

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", cfg.http_port))
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to bind to port {}: {e}", cfg.http_port);
            panic!("failed to bind to port {}: {e}", cfg.http_port);
        });

    if let Ok(addr) = listener.local_addr() {
        tracing::info!("neuralnote server starting, listening on {}", addr);
    }

    if let Err(e) = axum::serve(listener, app::router(state)).await {
        tracing::error!("HTTP server error: {e}");
        panic!("failed to start HTTP server: {e}");
    }
}
