use serde::Serialize;
use url::form_urlencoded;
use utoipa::ToSchema;

use std::sync::Arc;

use crate::{
    feed::{FeedError, FetchOutcome, PaginationController, ScrollTrigger},
    models::{GridView, Note, NoteDraft, SortOrder},
    repository::NoteStore,
};

/// Lines of note content shown on a feed card.
pub const PREVIEW_LINES: usize = 4;

pub const EMPTY_FEED_HINT: &str =
    "no notes currently, why don't you get started by writing how you feel?";

/// The part of the feed that lives in the address bar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct ViewState {
    pub sort: SortOrder,
    pub view: GridView,
    pub note: Option<i64>,
}

impl ViewState {
    /// Reads `sort`, `view` and `note` from a query string. Missing or
    /// unrecognised values fall back to the defaults.
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        let mut state = Self::default();
        for (key, value) in form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
            match key.as_ref() {
                "sort" => state.sort = value.parse().unwrap_or_default(),
                "view" => state.view = value.parse().unwrap_or_default(),
                "note" => state.note = value.parse().ok(),
                _ => {}
            }
        }
        state
    }

    #[must_use]
    pub fn to_query(&self) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        query
            .append_pair("sort", self.sort.as_str())
            .append_pair("view", self.view.as_str());
        if let Some(id) = self.note {
            query.append_pair("note", &id.to_string());
        }
        query.finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FeedCard {
    pub id: i64,
    pub preview: Vec<String>,
    /// Whether lines were cut from the preview.
    pub truncated: bool,
    pub updated_at: String,
}

impl FeedCard {
    fn from_note(note: &Note) -> Self {
        let mut lines = note.content.lines();
        let preview: Vec<String> = lines.by_ref().take(PREVIEW_LINES).map(String::from).collect();

        Self {
            id: note.id,
            preview,
            truncated: lines.next().is_some(),
            updated_at: note.updated_at.format("%b %-d, %-I:%M %p").to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FeedSnapshot {
    pub columns: usize,
    pub cards: Vec<FeedCard>,
    pub has_next: bool,
    pub empty_hint: Option<String>,
}

/// Edit surface for one note, loaded straight from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteDetail {
    pub note: Note,
    pub draft: NoteDraft,
}

impl NoteDetail {
    fn new(note: Note) -> Self {
        let draft = NoteDraft::new(note.content.clone());
        Self { note, draft }
    }

    pub fn edit(&mut self, content: impl Into<String>) {
        self.draft = NoteDraft::new(content);
    }

    /// Save is offered only for a valid draft that differs from the stored text.
    #[must_use]
    pub fn can_save(&self) -> bool {
        self.draft.can_save() && self.draft.content != self.note.content
    }
}

/// Composition of the feed: pagination, density, ordering and the detail surface.
pub struct FeedView {
    store: Arc<dyn NoteStore>,
    controller: Arc<PaginationController>,
    state: ViewState,
}

impl FeedView {
    pub fn new(store: Arc<dyn NoteStore>, page_size: usize, state: ViewState) -> Self {
        let controller = Arc::new(PaginationController::new(
            store.clone(),
            page_size,
            state.sort,
        ));
        Self {
            store,
            controller,
            state,
        }
    }

    #[must_use]
    pub const fn controller(&self) -> &Arc<PaginationController> {
        &self.controller
    }

    #[must_use]
    pub const fn view_state(&self) -> ViewState {
        self.state
    }

    /// Attaches a sentinel observer to this view's pagination.
    #[must_use]
    pub fn scroll_trigger(&self) -> ScrollTrigger {
        ScrollTrigger::observe(&self.controller)
    }

    pub async fn load_more(&self) -> Result<FetchOutcome, FeedError> {
        self.controller.fetch_next().await
    }

    pub fn toggle_sort(&mut self) {
        self.set_sort(self.state.sort.toggled());
    }

    pub fn set_sort(&mut self, sort: SortOrder) {
        self.state.sort = sort;
        self.controller.set_sort_order(sort);
    }

    pub const fn toggle_grid(&mut self) {
        self.state.view = self.state.view.toggled();
    }

    #[must_use]
    pub fn render(&self) -> FeedSnapshot {
        let notes = self.controller.notes();
        let has_next = self.controller.has_next();
        let empty_hint = (notes.is_empty() && !has_next).then(|| EMPTY_FEED_HINT.to_string());

        FeedSnapshot {
            columns: self.state.view.columns(),
            cards: notes.iter().map(FeedCard::from_note).collect(),
            has_next,
            empty_hint,
        }
    }

    /// Opens the detail surface for `id`.
    pub async fn open(&mut self, id: i64) -> Result<NoteDetail, FeedError> {
        let note = self
            .store
            .get_by_id(id)
            .await?
            .ok_or(FeedError::NotFound(id))?;
        self.state.note = Some(id);
        Ok(NoteDetail::new(note))
    }

    /// Loads the detail for the note selected in the view state, if any.
    pub async fn selected(&self) -> Result<Option<NoteDetail>, FeedError> {
        let Some(id) = self.state.note else {
            return Ok(None);
        };
        Ok(self.store.get_by_id(id).await?.map(NoteDetail::new))
    }

    pub const fn close(&mut self) {
        self.state.note = None;
    }

    /// Writes the edited draft and reloads the feed from its first page.
    /// An unchanged draft is not written; the stored note comes back as is.
    pub async fn save(&self, detail: &NoteDetail) -> Result<Note, FeedError> {
        detail.draft.validate()?;
        if !detail.can_save() {
            return Ok(detail.note.clone());
        }

        let note = self
            .store
            .update(detail.note.id, &detail.draft.content)
            .await?
            .ok_or(FeedError::NotFound(detail.note.id))?;
        self.refresh().await?;
        Ok(note)
    }

    /// Deletes the note, closes the detail surface and reloads the feed.
    pub async fn delete(&mut self, id: i64) -> Result<(), FeedError> {
        if !self.store.delete(id).await? {
            return Err(FeedError::NotFound(id));
        }
        if self.state.note == Some(id) {
            self.close();
        }
        self.refresh().await
    }

    async fn refresh(&self) -> Result<(), FeedError> {
        self.controller.invalidate();
        self.controller.fetch_next().await.map(|_| ())
    }
}
