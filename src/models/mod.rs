pub mod chat;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use std::{fmt, str::FromStr};

/// Upper bound on note content, counted in characters.
pub const MAX_NOTE_CHARS: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Result of one page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub items: Vec<Note>,
    /// Offset of the following page, if the store reported more rows.
    pub next_cursor: Option<usize>,
    pub total_count: usize,
}

impl Page {
    #[must_use]
    pub fn new(items: Vec<Note>, offset: usize, total_count: usize) -> Self {
        let end = offset + items.len();
        let next_cursor = (!items.is_empty() && end < total_count).then_some(end);
        Self {
            items,
            next_cursor,
            total_count,
        }
    }
}

/// Ordering of the feed over `updated_at`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    #[must_use]
    pub const fn is_ascending(self) -> bool {
        matches!(self, Self::Asc)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(format!("unknown sort order '{other}'")),
        }
    }
}

/// Column density of the feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum GridView {
    Single,
    #[default]
    Double,
}

impl GridView {
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Single => Self::Double,
            Self::Double => Self::Single,
        }
    }

    #[must_use]
    pub const fn columns(self) -> usize {
        match self {
            Self::Single => 1,
            Self::Double => 2,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Double => "double",
        }
    }
}

impl fmt::Display for GridView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GridView {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(Self::Single),
            "double" => Ok(Self::Double),
            other => Err(format!("unknown grid view '{other}'")),
        }
    }
}

/// Unsaved note text, as held by a compose or edit form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NoteDraft {
    pub content: String,
}

impl NoteDraft {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    #[must_use]
    pub fn char_count(&self) -> usize {
        self.content.chars().count()
    }

    #[must_use]
    pub fn is_over_limit(&self) -> bool {
        self.char_count() > MAX_NOTE_CHARS
    }

    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }

    /// Whether the save control would be enabled for this draft.
    #[must_use]
    pub fn can_save(&self) -> bool {
        !self.is_blank() && !self.is_over_limit()
    }

    /// Checks the draft before it is handed to a store.
    pub fn validate(&self) -> Result<(), DraftError> {
        if self.is_blank() {
            return Err(DraftError::Empty);
        }
        let count = self.char_count();
        if count > MAX_NOTE_CHARS {
            return Err(DraftError::TooLong(count));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DraftError {
    #[error("Note content must not be empty")]
    Empty,

    #[error("Note content is {0} characters long, the limit is {max}", max = MAX_NOTE_CHARS)]
    TooLong(usize),
}
