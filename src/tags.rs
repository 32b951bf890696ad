//! Canonical tag list offered to the user.
//!
//! Tags are compared by a normalized key (trimmed, lowercased) and displayed
//! in title case. The list is the default tags, then tags added by the user,
//! then tags found on notes, with later duplicates dropped.
use std::collections::HashSet;

use log::debug;

use crate::Note;

/// Categories that are always offered and cannot be removed
pub const DEFAULT_TAGS: [&str; 8] = [
    "Work", "Personal", "Ideas", "Travel", "Shopping", "Health", "Finance", "Learning",
];

/// Comparison key for a tag
pub fn normalize_tag(tag: &str) -> String {
    tag.trim().to_lowercase()
}

/// Display form: each whitespace-separated word capitalized
pub fn format_tag(tag: &str) -> String {
    tag.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone)]
pub struct TagIndex {
    defaults: Vec<String>,
    custom: Vec<String>,
    in_use: Vec<String>,
}

impl Default for TagIndex {
    fn default() -> Self {
        Self::new(DEFAULT_TAGS)
    }
}

impl TagIndex {
    pub fn new<I, S>(defaults: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            defaults: dedup_formatted(defaults),
            custom: Vec::new(),
            in_use: Vec::new(),
        }
    }

    /// Recomputes the tags found on `notes`.
    pub fn sync(&mut self, notes: &[Note]) {
        self.in_use = dedup_formatted(notes.iter().flat_map(|n| n.tags.iter()));
        debug!("Tag index synced: {} tags in use", self.in_use.len());
    }

    /// Merged display list.
    pub fn tags(&self) -> Vec<String> {
        dedup_formatted(
            self.defaults
                .iter()
                .chain(self.custom.iter())
                .chain(self.in_use.iter()),
        )
    }

    pub fn is_default(&self, tag: &str) -> bool {
        let key = normalize_tag(tag);
        self.defaults.iter().any(|d| normalize_tag(d) == key)
    }

    /// Adds a custom tag. Returns false if it was empty or already known.
    pub fn add_tag(&mut self, tag: &str) -> bool {
        let key = normalize_tag(tag);
        if key.is_empty() || self.tags().iter().any(|t| normalize_tag(t) == key) {
            return false;
        }
        self.custom.push(format_tag(tag));
        true
    }

    /// Removes a custom tag. Default tags are left in place.
    pub fn remove_tag(&mut self, tag: &str) -> bool {
        if self.is_default(tag) {
            debug!("Ignoring removal of default tag '{}'", tag.trim());
            return false;
        }
        let key = normalize_tag(tag);
        let before = self.custom.len();
        self.custom.retain(|t| normalize_tag(t) != key);
        before != self.custom.len()
    }
}

fn dedup_formatted<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for tag in tags {
        let key = normalize_tag(tag.as_ref());
        if key.is_empty() || !seen.insert(key) {
            continue;
        }
        out.push(format_tag(tag.as_ref()));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note_with_tags(tags: &[&str]) -> Note {
        Note::new(
            "t".into(),
            "c".into(),
            tags.iter().map(|t| t.to_string()).collect(),
        )
    }

    #[test]
    fn format_tag_title_cases_each_word() {
        assert_eq!(format_tag("  road TRIP "), "Road Trip");
        assert_eq!(format_tag("work"), "Work");
    }

    #[test]
    fn sync_merges_with_defaults_case_insensitively() {
        let mut index = TagIndex::default();
        index.sync(&[
            note_with_tags(&["work", " recipes "]),
            note_with_tags(&["RECIPES", "garden"]),
        ]);

        let tags = index.tags();
        assert_eq!(tags.len(), DEFAULT_TAGS.len() + 2);
        assert_eq!(&tags[DEFAULT_TAGS.len()..], ["Recipes", "Garden"]);
        assert_eq!(tags.iter().filter(|t| *t == "Work").count(), 1);
    }

    #[test]
    fn default_tags_cannot_be_removed() {
        let mut index = TagIndex::default();
        assert!(!index.remove_tag("work"));
        assert!(index.tags().contains(&"Work".to_string()));
    }

    #[test]
    fn custom_tags_can_be_added_and_removed() {
        let mut index = TagIndex::default();
        assert!(index.add_tag("side project"));
        assert!(!index.add_tag("SIDE PROJECT"));
        assert!(!index.add_tag("   "));
        assert!(index.tags().contains(&"Side Project".to_string()));

        assert!(index.remove_tag(" Side Project"));
        assert!(!index.tags().contains(&"Side Project".to_string()));
    }

    #[test]
    fn sync_replaces_previous_in_use_tags() {
        let mut index = TagIndex::default();
        index.sync(&[note_with_tags(&["garden"])]);
        index.sync(&[]);
        assert_eq!(index.tags().len(), DEFAULT_TAGS.len());
    }
}
