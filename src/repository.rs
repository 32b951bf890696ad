//! Validated note mutations on top of the persistence store.
//!
//! Every mutation reloads the collection, changes it and saves it back while
//! holding one lock, so two writes never interleave.
use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio::sync::Mutex as TokioMutex;

use crate::{
    clean_tags, require_text, Note, NoteError, NoteField, NoteUpdate, PersistenceStore, Result,
    StorageMedium,
};

pub struct NoteRepository {
    store: PersistenceStore,

    /// Serializes read-modify-write cycles on the store
    write_lock: TokioMutex<()>,

    /// Reject titles already used by another note
    reject_duplicate_titles: bool,
}

impl NoteRepository {
    pub fn new(store: PersistenceStore) -> Self {
        Self {
            store,
            write_lock: TokioMutex::new(()),
            reject_duplicate_titles: false,
        }
    }

    /// Repository over `medium` using the given namespace key
    pub fn with_medium(medium: Arc<dyn StorageMedium>, namespace: impl Into<String>) -> Self {
        Self::new(PersistenceStore::new(medium, namespace))
    }

    pub fn reject_duplicate_titles(mut self, reject: bool) -> Self {
        self.reject_duplicate_titles = reject;
        self
    }

    /// Fresh copy of the stored collection, empty if it cannot be read.
    pub async fn list_all(&self) -> Vec<Note> {
        let _guard = self.write_lock.lock().await;
        self.store.load()
    }

    pub async fn get_note(&self, id: &str) -> Result<Note> {
        let _guard = self.write_lock.lock().await;
        self.store
            .try_load()?
            .into_iter()
            .find(|n| n.id == id)
            .ok_or_else(|| NoteError::not_found(id))
    }

    /// Creates a note and stores it at the front of the collection.
    pub async fn create_note(
        &self,
        title: &str,
        content: &str,
        tags: Vec<String>,
    ) -> Result<Note> {
        let title = require_text(NoteField::Title, title)?;
        let content = require_text(NoteField::Content, content)?;

        let _guard = self.write_lock.lock().await;
        let mut notes = self.store.try_load()?;
        self.check_duplicate(&notes, &title, None)?;

        let note = Note::new(title, content, clean_tags(tags));
        notes.insert(0, note.clone());
        self.store.save(&notes)?;

        info!("Created note {}", note.id);
        Ok(note)
    }

    /// Replaces title and content. Tags and archive state are kept.
    pub async fn update_note(&self, id: &str, update: NoteUpdate) -> Result<Note> {
        let title = require_text(NoteField::Title, &update.title)?;
        let content = require_text(NoteField::Content, &update.content)?;

        let _guard = self.write_lock.lock().await;
        let mut notes = self.store.try_load()?;
        let index = find_index(&notes, id)?;
        self.check_duplicate(&notes, &title, Some(id))?;

        let note = &mut notes[index];
        note.title = title;
        note.content = content;
        note.touch();
        let updated = note.clone();

        self.store.save(&notes)?;
        info!("Updated note {}", id);
        Ok(updated)
    }

    /// Replaces the tag list wholesale.
    pub async fn update_note_tags(&self, id: &str, tags: Vec<String>) -> Result<Note> {
        let tags = clean_tags(tags);
        self.mutate(id, move |note| note.tags = tags).await
    }

    pub async fn archive_note(&self, id: &str) -> Result<Note> {
        self.mutate(id, |note| note.archived = true).await
    }

    pub async fn unarchive_note(&self, id: &str) -> Result<Note> {
        self.mutate(id, |note| note.archived = false).await
    }

    /// Removes a note permanently.
    pub async fn delete_note(&self, id: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut notes = self.store.try_load()?;
        let index = find_index(&notes, id)?;

        notes.remove(index);
        self.store.save(&notes)?;

        info!("Note {} successfully deleted", id);
        Ok(())
    }

    async fn mutate<F>(&self, id: &str, change: F) -> Result<Note>
    where
        F: FnOnce(&mut Note),
    {
        let _guard = self.write_lock.lock().await;
        let mut notes = self.store.try_load()?;
        let index = find_index(&notes, id)?;

        let note = &mut notes[index];
        change(note);
        note.touch();
        let updated = note.clone();

        self.store.save(&notes)?;
        debug!("Saved change to note {}", id);
        Ok(updated)
    }

    fn check_duplicate(&self, notes: &[Note], title: &str, except: Option<&str>) -> Result<()> {
        if !self.reject_duplicate_titles {
            return Ok(());
        }

        let key = title.to_lowercase();
        let clash = notes
            .iter()
            .filter(|n| Some(n.id.as_str()) != except)
            .any(|n| n.title.trim().to_lowercase() == key);

        if clash {
            warn!("Rejected duplicate title '{}'", title);
            return Err(NoteError::Duplicate {
                title: title.to_string(),
            });
        }
        Ok(())
    }
}

fn find_index(notes: &[Note], id: &str) -> Result<usize> {
    notes.iter().position(|n| n.id == id).ok_or_else(|| {
        error!("Note not found: {}", id);
        NoteError::not_found(id)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryMedium;
    use std::collections::HashSet;

    const KEY: &str = "test.notes";

    fn repo() -> (MemoryMedium, NoteRepository) {
        let medium = MemoryMedium::new();
        let repo = NoteRepository::with_medium(Arc::new(medium.clone()), KEY);
        (medium, repo)
    }

    fn stored(medium: &MemoryMedium) -> Option<String> {
        medium.read(KEY).unwrap()
    }

    #[tokio::test]
    async fn create_trims_and_prepends() {
        let (_, repo) = repo();
        let first = repo.create_note("First", "one", vec![]).await.unwrap();
        let second = repo
            .create_note("  Second ", " two ", vec![" work ".into(), "".into()])
            .await
            .unwrap();

        assert_eq!(second.title, "Second");
        assert_eq!(second.content, "two");
        assert_eq!(second.tags, vec!["work".to_string()]);
        assert!(!second.archived);

        let ids: Vec<_> = repo.list_all().await.into_iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn empty_fields_fail_without_writing() {
        let (medium, repo) = repo();

        let err = repo.create_note("", "x", vec![]).await.unwrap_err();
        assert_eq!(err, NoteError::Validation { field: NoteField::Title });

        let err = repo.create_note("x", "   ", vec![]).await.unwrap_err();
        assert_eq!(err, NoteError::Validation { field: NoteField::Content });

        assert_eq!(stored(&medium), None);
    }

    #[tokio::test]
    async fn ids_are_unique() {
        let (_, repo) = repo();
        let mut ids = HashSet::new();
        for i in 0..25 {
            let note = repo.create_note(&format!("n{i}"), "c", vec![]).await.unwrap();
            ids.insert(note.id);
        }
        assert_eq!(ids.len(), 25);
    }

    #[tokio::test]
    async fn update_keeps_tags_and_archive_state() {
        let (_, repo) = repo();
        let note = repo.create_note("a", "b", vec!["x".into()]).await.unwrap();
        repo.archive_note(&note.id).await.unwrap();

        let updated = repo
            .update_note(&note.id, NoteUpdate::new("a2", "b2"))
            .await
            .unwrap();
        assert_eq!(updated.title, "a2");
        assert_eq!(updated.tags, vec!["x".to_string()]);
        assert!(updated.archived);
        assert_eq!(updated.created_at, note.created_at);
        assert!(updated.updated_at >= updated.created_at);
    }

    #[tokio::test]
    async fn update_validates_before_lookup() {
        let (_, repo) = repo();
        let err = repo
            .update_note("missing", NoteUpdate::new("", "b"))
            .await
            .unwrap_err();
        assert!(matches!(err, NoteError::Validation { .. }));
    }

    #[tokio::test]
    async fn tags_are_replaced_wholesale() {
        let (_, repo) = repo();
        let note = repo
            .create_note("a", "b", vec!["one".into(), "two".into()])
            .await
            .unwrap();
        let updated = repo
            .update_note_tags(&note.id, vec![" three ".into()])
            .await
            .unwrap();
        assert_eq!(updated.tags, vec!["three".to_string()]);
    }

    #[tokio::test]
    async fn archive_is_idempotent() {
        let (_, repo) = repo();
        let note = repo.create_note("a", "b", vec![]).await.unwrap();
        assert!(repo.archive_note(&note.id).await.unwrap().archived);
        assert!(repo.archive_note(&note.id).await.unwrap().archived);
        assert!(!repo.unarchive_note(&note.id).await.unwrap().archived);
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found_and_change_nothing() {
        let (medium, repo) = repo();
        repo.create_note("a", "b", vec![]).await.unwrap();
        let before = stored(&medium);

        let missing = NoteError::not_found("nonexistent-id");
        assert_eq!(
            repo.update_note("nonexistent-id", NoteUpdate::new("t", "c"))
                .await
                .unwrap_err(),
            missing
        );
        assert_eq!(repo.delete_note("nonexistent-id").await.unwrap_err(), missing);
        assert_eq!(repo.archive_note("nonexistent-id").await.unwrap_err(), missing);
        assert_eq!(
            repo.update_note_tags("nonexistent-id", vec![]).await.unwrap_err(),
            missing
        );

        assert_eq!(stored(&medium), before);
    }

    #[tokio::test]
    async fn delete_removes_permanently() {
        let (_, repo) = repo();
        let note = repo.create_note("a", "b", vec![]).await.unwrap();
        repo.delete_note(&note.id).await.unwrap();
        assert!(repo.list_all().await.is_empty());
        assert!(matches!(
            repo.get_note(&note.id).await,
            Err(NoteError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn failed_write_reports_storage_error() {
        let (medium, repo) = repo();
        let note = repo.create_note("a", "b", vec![]).await.unwrap();

        medium.set_fail_writes(true);
        let err = repo
            .update_note(&note.id, NoteUpdate::new("new", "text"))
            .await
            .unwrap_err();
        assert!(matches!(err, NoteError::Storage { .. }));
        assert_eq!(repo.get_note(&note.id).await.unwrap().title, "a");
    }

    #[tokio::test]
    async fn unreadable_store_is_never_overwritten() {
        let (medium, repo) = repo();
        let mut ids = Vec::new();
        for title in ["one", "two", "three"] {
            ids.push(repo.create_note(title, "body", vec![]).await.unwrap().id);
        }
        let before = stored(&medium);

        medium.set_fail_reads(true);
        let storage = |r: Result<Note>| matches!(r, Err(NoteError::Storage { .. }));
        assert!(storage(repo.create_note("new", "body", vec![]).await));
        assert!(storage(
            repo.update_note(&ids[0], NoteUpdate::new("t", "c")).await
        ));
        assert!(storage(repo.archive_note(&ids[1]).await));
        assert!(storage(repo.update_note_tags(&ids[1], vec!["x".into()]).await));
        assert!(storage(repo.get_note(&ids[2]).await));
        assert!(matches!(
            repo.delete_note(&ids[2]).await,
            Err(NoteError::Storage { .. })
        ));

        medium.set_fail_reads(false);
        assert_eq!(stored(&medium), before);
        assert_eq!(repo.list_all().await.len(), 3);
    }

    #[tokio::test]
    async fn duplicate_titles_rejected_when_enabled() {
        let medium = MemoryMedium::new();
        let repo = NoteRepository::with_medium(Arc::new(medium), KEY).reject_duplicate_titles(true);

        let note = repo.create_note("Trip", "a", vec![]).await.unwrap();
        let err = repo.create_note(" trip ", "b", vec![]).await.unwrap_err();
        assert_eq!(err, NoteError::Duplicate { title: "trip".into() });

        // Renaming a note to its own title is fine
        repo.update_note(&note.id, NoteUpdate::new("TRIP", "a"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn concurrent_creates_are_not_lost() {
        let (_, repo) = repo();
        let repo = Arc::new(repo);

        let handles: Vec<_> = (0..10)
            .map(|i| {
                let repo = Arc::clone(&repo);
                tokio::spawn(async move {
                    repo.create_note(&format!("note {i}"), "body", vec![]).await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(repo.list_all().await.len(), 10);
    }
}
