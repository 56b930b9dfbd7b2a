//! The paginated note feed: page accumulation, the infinite-scroll sentinel
//! and the view that composes them.

mod pagination;
mod trigger;
mod view;

use crate::{models::DraftError, repository::StoreError};

pub use pagination::{DEFAULT_PAGE_SIZE, FetchOutcome, PaginationController, SkipReason};
pub use trigger::{FULL_VISIBILITY, ScrollTrigger, TriggerOutcome, TriggerState};
pub use view::{
    EMPTY_FEED_HINT, FeedCard, FeedSnapshot, FeedView, NoteDetail, PREVIEW_LINES, ViewState,
};

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Draft(#[from] DraftError),

    #[error("Note {0} not found")]
    NotFound(i64),
}
