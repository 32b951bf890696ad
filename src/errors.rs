//! Error types for the notekeeper library.
//!
//! Every failure a caller can see is one of four kinds. Each variant carries
//! only the data relevant to that kind.

use std::io;

use thiserror::Error;

use crate::NoteField;

/// The main error type for note operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NoteError {
    /// A required field was empty after trimming.
    #[error("Validation failed: {field} cannot be empty")]
    Validation { field: NoteField },

    /// The targeted note is not in the collection.
    #[error("Note not found: {id}")]
    NotFound { id: String },

    /// The persistence medium rejected a read or write.
    #[error("Storage error: {message}")]
    Storage { message: String },

    /// Another note already uses this title (case-insensitive).
    #[error("A note titled '{title}' already exists")]
    Duplicate { title: String },
}

impl NoteError {
    pub fn not_found(id: impl Into<String>) -> Self {
        NoteError::NotFound { id: id.into() }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        NoteError::Storage {
            message: message.into(),
        }
    }

    /// Message suitable for showing to the user.
    ///
    /// Storage failures are not actionable, so their cause is left out.
    pub fn user_message(&self) -> String {
        match self {
            NoteError::Validation { field } => format!("{} cannot be empty.", field.label()),
            NoteError::NotFound { .. } => "This note no longer exists.".to_string(),
            NoteError::Storage { .. } => {
                "Could not save your changes. Please try again.".to_string()
            }
            NoteError::Duplicate { title } => {
                format!("A note titled \"{}\" already exists.", title)
            }
        }
    }
}

impl From<io::Error> for NoteError {
    fn from(e: io::Error) -> Self {
        NoteError::storage(format!("I/O error: {}", e))
    }
}

impl From<serde_json::Error> for NoteError {
    fn from(e: serde_json::Error) -> Self {
        NoteError::storage(format!("Serialization error: {}", e))
    }
}
