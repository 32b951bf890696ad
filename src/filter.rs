//! Derives the visible note list from the full collection.
//!
//! All functions here are pure: they never modify or persist notes.
use std::cmp::Reverse;

use log::trace;

use crate::{normalize_tag, Note, ViewCounts, ViewSpec};

/// Notes matching `view`, newest `updated_at` first.
///
/// Stages run in order: archive flag, selected tag, free-text query. Ties in
/// `updated_at` keep their collection order.
pub fn filter_notes(notes: &[Note], view: &ViewSpec) -> Vec<Note> {
    let tag_key = view
        .tag
        .as_deref()
        .map(normalize_tag)
        .filter(|key| !key.is_empty());
    let query = view.query.trim().to_lowercase();

    let mut matching: Vec<Note> = notes
        .iter()
        .filter(|note| note.archived == view.archived)
        .filter(|note| match &tag_key {
            Some(key) => note.has_tag_key(key),
            None => true,
        })
        .filter(|note| query.is_empty() || matches_query(note, &query))
        .cloned()
        .collect();

    matching.sort_by_key(|note| Reverse(note.updated_at));

    trace!(
        "View archived={} tag={:?} query='{}' matched {} of {} notes",
        view.archived,
        tag_key,
        query,
        matching.len(),
        notes.len()
    );
    matching
}

/// `query` must already be trimmed and lowercased.
fn matches_query(note: &Note, query: &str) -> bool {
    note.title.to_lowercase().contains(query)
        || note.content.to_lowercase().contains(query)
        || note.tags.iter().any(|t| t.to_lowercase().contains(query))
}

pub fn count_views(notes: &[Note]) -> ViewCounts {
    let archived = notes.iter().filter(|n| n.archived).count();
    ViewCounts {
        active: notes.len() - archived,
        archived,
    }
}
