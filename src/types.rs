//! Shared value types for the notekeeper library.
//!
//! These are the small structs and enums passed between the repository,
//! the filter engine and the coordinator.
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Note, NoteError};

/// A specialized Result type for note operations.
pub type Result<T> = std::result::Result<T, NoteError>;

/// Fields that are validated on create and update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteField {
    Title,
    Content,
}

impl NoteField {
    /// Capitalized name used in user-facing messages
    pub fn label(&self) -> &'static str {
        match self {
            NoteField::Title => "Title",
            NoteField::Content => "Content",
        }
    }
}

impl fmt::Display for NoteField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoteField::Title => write!(f, "title"),
            NoteField::Content => write!(f, "content"),
        }
    }
}

/// New title and content for an existing note
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteUpdate {
    pub title: String,
    pub content: String,
}

impl NoteUpdate {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }
}

/// Parameters for deriving the visible note list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewSpec {
    /// Show archived notes instead of active ones
    pub archived: bool,
    /// Only notes carrying this tag (compared case-insensitively)
    pub tag: Option<String>,
    /// Free-text query matched against title, content and tags
    pub query: String,
}

impl ViewSpec {
    pub fn active() -> Self {
        Self::default()
    }

    pub fn archived() -> Self {
        Self {
            archived: true,
            ..Self::default()
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }
}

/// One row of a note list: everything but the full content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteSummary {
    pub id: String,
    pub title: String,
    /// Plain-text excerpt of the markdown content
    pub preview: String,
    pub tags: Vec<String>,
    pub updated_at: DateTime<Utc>,
    pub archived: bool,
}

impl NoteSummary {
    pub fn new(note: &Note, preview_chars: usize) -> Self {
        Self {
            id: note.id.clone(),
            title: note.title.clone(),
            preview: note.preview(preview_chars),
            tags: note.tags.clone(),
            updated_at: note.updated_at,
            archived: note.archived,
        }
    }
}

/// Number of notes in each archive partition
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewCounts {
    pub active: usize,
    pub archived: usize,
}

/// The editor's working copy of the selected note
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
}

/// Partial change to the draft; `None` leaves a field as it is
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftPatch {
    pub title: Option<String>,
    pub content: Option<String>,
}

impl DraftPatch {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            content: None,
        }
    }

    pub fn content(content: impl Into<String>) -> Self {
        Self {
            title: None,
            content: Some(content.into()),
        }
    }
}
