//! Core data structure for the notekeeper library.
//!
//! Notes are persisted as camelCase JSON. Older records may carry the archive
//! flag under `isArchived`; they are normalized when read.
use chrono::{DateTime, Utc};
use pulldown_cmark::{Event, Parser, TagEnd};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents a single note in our system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredNote")]
pub struct Note {
    /// Unique identifier for the note
    pub id: String,
    /// Note title
    pub title: String,
    /// Note content in Markdown format
    pub content: String,
    /// Tags for organization
    pub tags: Vec<String>,
    /// When the note was created
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
    /// Whether the note is in the archived view
    pub archived: bool,
}

impl Note {
    /// Creates a new active note with a fresh id and timestamps
    pub fn new(title: String, content: String, tags: Vec<String>) -> Self {
        let now = Utc::now();

        Note {
            id: Uuid::new_v4().to_string(),
            title,
            content,
            tags,
            created_at: now,
            updated_at: now,
            archived: false,
        }
    }

    /// Bumps `updated_at`. Never moves it backwards.
    pub fn touch(&mut self) {
        let now = Utc::now();
        if now > self.updated_at {
            self.updated_at = now;
        }
    }

    /// Plain-text excerpt of the markdown content for list views.
    pub fn preview(&self, max_chars: usize) -> String {
        let mut text = String::with_capacity(self.content.len());
        for event in Parser::new(&self.content) {
            match event {
                Event::Text(t) | Event::Code(t) => text.push_str(&t),
                Event::SoftBreak | Event::HardBreak => text.push(' '),
                Event::End(TagEnd::Paragraph | TagEnd::Heading(_) | TagEnd::Item) => {
                    text.push(' ')
                }
                _ => {}
            }
        }

        let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if flat.chars().count() <= max_chars {
            return flat;
        }

        let mut cut: String = flat.chars().take(max_chars).collect();
        cut.truncate(cut.trim_end().len());
        cut.push('…');
        cut
    }

    /// Whether any tag matches `key`, which must already be normalized
    pub fn has_tag_key(&self, key: &str) -> bool {
        self.tags.iter().any(|t| crate::normalize_tag(t) == key)
    }
}

/// On-disk shape, accepting both the current and the legacy archive flag
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredNote {
    id: String,
    title: String,
    content: String,
    #[serde(default)]
    tags: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    archived: Option<bool>,
    is_archived: Option<bool>,
}

impl From<StoredNote> for Note {
    fn from(stored: StoredNote) -> Self {
        Note {
            id: stored.id,
            title: stored.title,
            content: stored.content,
            tags: stored.tags,
            created_at: stored.created_at,
            updated_at: stored.updated_at,
            archived: stored.archived.or(stored.is_archived).unwrap_or(false),
        }
    }
}
