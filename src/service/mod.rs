use crate::{
    dto::{
        CreateNoteRequest, FeedResponse, ListNotesQuery, NoteResponse, PageResponse,
        UpdateNoteRequest,
    },
    feed::{FeedError, FeedView, ViewState},
    models::{DraftError, NoteDraft, Page},
    repository::{NoteStore, StoreError},
};

use std::sync::Arc;

/// Largest page a single listing request may ask for.
pub const MAX_PAGE_LIMIT: usize = 100;

/// Largest number of pages a feed snapshot will load.
pub const MAX_FEED_PAGES: usize = 20;

#[derive(Debug, thiserror::Error)]
pub enum NoteServiceError {
    #[error(transparent)]
    Invalid(#[from] DraftError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Note {0} not found")]
    NotFound(i64),
}

impl From<FeedError> for NoteServiceError {
    fn from(e: FeedError) -> Self {
        match e {
            FeedError::Store(e) => Self::Store(e),
            FeedError::Draft(e) => Self::Invalid(e),
            FeedError::NotFound(id) => Self::NotFound(id),
        }
    }
}

#[derive(Clone)]
pub struct NoteService {
    store: Arc<dyn NoteStore>,
    owner_id: String,
    page_size: usize,
}

impl NoteService {
    pub fn new(store: Arc<dyn NoteStore>, owner_id: impl Into<String>, page_size: usize) -> Self {
        Self {
            store,
            owner_id: owner_id.into(),
            page_size: page_size.max(1),
        }
    }

    #[must_use]
    pub fn store(&self) -> Arc<dyn NoteStore> {
        self.store.clone()
    }

    pub async fn create_note(
        &self,
        request: CreateNoteRequest,
    ) -> Result<NoteResponse, NoteServiceError> {
        NoteDraft::new(request.content.as_str()).validate()?;

        let note = self.store.create(&request.content, &self.owner_id).await?;
        tracing::info!("note {} created", note.id);
        Ok(note.into())
    }

    pub async fn update_note(
        &self,
        id: i64,
        request: UpdateNoteRequest,
    ) -> Result<Option<NoteResponse>, NoteServiceError> {
        NoteDraft::new(request.content.as_str()).validate()?;

        Ok(self
            .store
            .update(id, &request.content)
            .await?
            .map(NoteResponse::from))
    }

    pub async fn delete_note(&self, id: i64) -> Result<bool, NoteServiceError> {
        Ok(self.store.delete(id).await?)
    }

    pub async fn get_one_note(&self, id: i64) -> Result<Option<NoteResponse>, NoteServiceError> {
        Ok(self.store.get_by_id(id).await?.map(NoteResponse::from))
    }

    pub async fn list_notes(&self, query: ListNotesQuery) -> Result<PageResponse, NoteServiceError> {
        let limit = query
            .limit
            .unwrap_or(self.page_size)
            .clamp(1, MAX_PAGE_LIMIT);
        let slice = self.store.list_page(query.offset, limit, query.sort).await?;

        Ok(Page::new(slice.items, query.offset, slice.total_count).into())
    }

    /// Renders the feed for `view` after scrolling through `pages` pages.
    pub async fn feed_snapshot(
        &self,
        view: ViewState,
        pages: usize,
    ) -> Result<FeedResponse, NoteServiceError> {
        let feed = FeedView::new(self.store.clone(), self.page_size, view);
        for _ in 0..pages.clamp(1, MAX_FEED_PAGES) {
            if !feed.controller().has_next() {
                break;
            }
            feed.load_more().await?;
        }

        let selected = feed.selected().await?.map(|detail| detail.note);
        Ok(FeedResponse::new(feed.view_state(), feed.render(), selected))
    }
}
