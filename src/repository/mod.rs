//! Note persistence.
//!
//! Everything above this module talks to notes through [`NoteStore`]; the
//! concrete store is picked once in `main` and passed down as a handle.

mod embedded;
pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::models::{Note, SortOrder};

pub use memory::MemoryNoteStore;
pub use postgres::PgNoteStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] refinery::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// One slice of the notes table together with the exact row count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSlice {
    pub items: Vec<Note>,
    pub total_count: usize,
}

#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Returns at most `limit` notes starting at `offset`, ordered by `updated_at`.
    async fn list_page(
        &self,
        offset: usize,
        limit: usize,
        order: SortOrder,
    ) -> Result<PageSlice, StoreError>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Note>, StoreError>;

    async fn create(&self, content: &str, owner_id: &str) -> Result<Note, StoreError>;

    /// Replaces the content and bumps `updated_at`. `None` if the note does not exist.
    async fn update(&self, id: i64, content: &str) -> Result<Option<Note>, StoreError>;

    /// Returns whether a note was removed.
    async fn delete(&self, id: i64) -> Result<bool, StoreError>;
}
