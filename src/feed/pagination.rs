use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::{
    feed::FeedError,
    models::{Note, Page, SortOrder},
    repository::NoteStore,
};

pub const DEFAULT_PAGE_SIZE: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Another fetch for the current ordering is outstanding.
    InFlight,
    /// The store has no rows past the accumulated ones.
    Exhausted,
    /// The ordering changed while the request was out; its rows were dropped.
    Stale,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Fetched(Page),
    Skipped(SkipReason),
}

struct FeedState {
    sort: SortOrder,
    /// Bumped whenever accumulated pages are thrown away.
    generation: u64,
    in_flight: Option<u64>,
    notes: Vec<Note>,
    pages_fetched: usize,
    total_count: Option<usize>,
    has_next: bool,
}

impl FeedState {
    fn reset(&mut self) {
        self.generation += 1;
        self.notes.clear();
        self.pages_fetched = 0;
        self.total_count = None;
        self.has_next = true;
    }
}

/// Accumulates notes from successive pages of one ordering.
pub struct PaginationController {
    store: Arc<dyn NoteStore>,
    page_size: usize,
    state: Mutex<FeedState>,
}

/// Clears the in-flight marker when the owning fetch ends, however it ends.
struct InFlightGuard<'a> {
    state: &'a Mutex<FeedState>,
    generation: u64,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.in_flight == Some(self.generation) {
            state.in_flight = None;
        }
    }
}

impl PaginationController {
    pub fn new(store: Arc<dyn NoteStore>, page_size: usize, sort: SortOrder) -> Self {
        Self {
            store,
            page_size: page_size.max(1),
            state: Mutex::new(FeedState {
                sort,
                generation: 0,
                in_flight: None,
                notes: Vec::new(),
                pages_fetched: 0,
                total_count: None,
                has_next: true,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, FeedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Requests the page after the accumulated ones and appends it.
    ///
    /// A call made while another fetch is outstanding returns
    /// [`SkipReason::InFlight`] without touching the store. On error the
    /// accumulated notes are left exactly as they were, so calling again
    /// retries the same page.
    pub async fn fetch_next(&self) -> Result<FetchOutcome, FeedError> {
        let (offset, sort, generation) = {
            let mut state = self.state();
            if state.in_flight == Some(state.generation) {
                return Ok(FetchOutcome::Skipped(SkipReason::InFlight));
            }
            if !state.has_next {
                return Ok(FetchOutcome::Skipped(SkipReason::Exhausted));
            }
            state.in_flight = Some(state.generation);
            (
                state.pages_fetched * self.page_size,
                state.sort,
                state.generation,
            )
        };
        let _guard = InFlightGuard {
            state: &self.state,
            generation,
        };

        tracing::debug!("fetching notes page at offset {offset} ({sort})");
        let slice = self
            .store
            .list_page(offset, self.page_size, sort)
            .await
            .inspect_err(|e| tracing::warn!("failed to fetch notes page at offset {offset}: {e}"))?;

        let mut state = self.state();
        if state.generation != generation {
            tracing::debug!("dropping notes page fetched for a replaced ordering");
            return Ok(FetchOutcome::Skipped(SkipReason::Stale));
        }

        let page = Page::new(slice.items, offset, slice.total_count);
        state.notes.extend(page.items.iter().cloned());
        state.pages_fetched += 1;
        state.total_count = Some(page.total_count);
        state.has_next = page.next_cursor.is_some();

        Ok(FetchOutcome::Fetched(page))
    }

    /// Switches ordering. Accumulated pages are dropped and pagination restarts at offset zero.
    ///
    /// Returns `false` when `sort` is already the active ordering.
    pub fn set_sort_order(&self, sort: SortOrder) -> bool {
        let mut state = self.state();
        if state.sort == sort {
            return false;
        }
        state.sort = sort;
        state.reset();
        true
    }

    /// Drops accumulated pages, keeping the ordering.
    pub fn invalidate(&self) {
        self.state().reset();
    }

    #[must_use]
    pub fn notes(&self) -> Vec<Note> {
        self.state().notes.clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.state().notes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn has_next(&self) -> bool {
        self.state().has_next
    }

    #[must_use]
    pub fn is_fetching(&self) -> bool {
        let state = self.state();
        state.in_flight == Some(state.generation)
    }

    #[must_use]
    pub fn pages_fetched(&self) -> usize {
        self.state().pages_fetched
    }

    #[must_use]
    pub fn total_count(&self) -> Option<usize> {
        self.state().total_count
    }

    #[must_use]
    pub fn sort_order(&self) -> SortOrder {
        self.state().sort
    }

    #[must_use]
    pub const fn page_size(&self) -> usize {
        self.page_size
    }
}
