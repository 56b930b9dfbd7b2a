use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    models::{Note, SortOrder},
    repository::{NoteStore, PageSlice, StoreError},
};

struct StoredNote {
    note: Note,
    owner_id: String,
}

#[derive(Default)]
struct Notes {
    next_id: i64,
    rows: Vec<StoredNote>,
}

/// Process-local note store. Used when no database is configured.
#[derive(Default)]
pub struct MemoryNoteStore {
    notes: RwLock<Notes>,
}

impl MemoryNoteStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.notes.read().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn owner_of(&self, id: i64) -> Option<String> {
        let notes = self.notes.read().await;
        notes
            .rows
            .iter()
            .find(|row| row.note.id == id)
            .map(|row| row.owner_id.clone())
    }
}

#[async_trait]
impl NoteStore for MemoryNoteStore {
    async fn list_page(
        &self,
        offset: usize,
        limit: usize,
        order: SortOrder,
    ) -> Result<PageSlice, StoreError> {
        let notes = self.notes.read().await;

        let mut sorted: Vec<&Note> = notes.rows.iter().map(|row| &row.note).collect();
        sorted.sort_by(|a, b| (a.updated_at, a.id).cmp(&(b.updated_at, b.id)));
        if !order.is_ascending() {
            sorted.reverse();
        }

        Ok(PageSlice {
            items: sorted
                .into_iter()
                .skip(offset)
                .take(limit)
                .cloned()
                .collect(),
            total_count: notes.rows.len(),
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Note>, StoreError> {
        let notes = self.notes.read().await;
        Ok(notes
            .rows
            .iter()
            .find(|row| row.note.id == id)
            .map(|row| row.note.clone()))
    }

    async fn create(&self, content: &str, owner_id: &str) -> Result<Note, StoreError> {
        let mut notes = self.notes.write().await;
        notes.next_id += 1;

        let now = Utc::now();
        let note = Note {
            id: notes.next_id,
            content: content.to_string(),
            created_at: now,
            updated_at: now,
        };
        notes.rows.push(StoredNote {
            note: note.clone(),
            owner_id: owner_id.to_string(),
        });

        Ok(note)
    }

    async fn update(&self, id: i64, content: &str) -> Result<Option<Note>, StoreError> {
        let mut notes = self.notes.write().await;
        let Some(row) = notes.rows.iter_mut().find(|row| row.note.id == id) else {
            return Ok(None);
        };

        row.note.content = content.to_string();
        row.note.updated_at = Utc::now().max(row.note.created_at);

        Ok(Some(row.note.clone()))
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let mut notes = self.notes.write().await;
        let before = notes.rows.len();
        notes.rows.retain(|row| row.note.id != id);

        Ok(notes.rows.len() != before)
    }
}
