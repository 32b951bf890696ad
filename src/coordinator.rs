//! In-memory state the UI binds to.
//!
//! The coordinator mirrors the stored collection, tracks the selected note
//! and the editor draft, and applies mutations optimistically: the mirror is
//! changed first, the repository is called, and on failure the mirror is
//! restored from a snapshot taken before the change.
use std::{future::Future, sync::Arc};

use log::{debug, info, warn};
use uuid::Uuid;

use crate::{
    clean_tags, count_views, filter_notes, DraftPatch, Note, NoteDraft, NoteError,
    NoteRepository, NoteSummary, NoteUpdate, Result, TagIndex, ViewCounts, ViewSpec,
};

pub struct NoteCoordinator {
    repository: Arc<NoteRepository>,

    /// Mirror of the stored collection, possibly ahead of it while a write is in flight
    notes: Vec<Note>,

    selected_id: Option<String>,
    draft: NoteDraft,
    loading: bool,
    last_error: Option<NoteError>,
    tag_index: TagIndex,
}

impl NoteCoordinator {
    pub fn new(repository: Arc<NoteRepository>) -> Self {
        Self::with_tag_index(repository, TagIndex::default())
    }

    pub fn with_tag_index(repository: Arc<NoteRepository>, tag_index: TagIndex) -> Self {
        Self {
            repository,
            notes: Vec::new(),
            selected_id: None,
            draft: NoteDraft::default(),
            loading: false,
            last_error: None,
            tag_index,
        }
    }

    /// Replaces the mirror with the stored collection.
    pub async fn load(&mut self) {
        self.loading = true;
        self.notes = self.repository.list_all().await;
        self.loading = false;
        self.tag_index.sync(&self.notes);

        if let Some(id) = self.selected_id.clone() {
            if !self.notes.iter().any(|n| n.id == id) {
                self.select(None);
            }
        }
        info!("Coordinator loaded {} notes", self.notes.len());
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn list_notes(&self, view: &ViewSpec) -> Vec<Note> {
        filter_notes(&self.notes, view)
    }

    /// List rows for `view` with a plain-text preview of each note.
    pub fn list_summaries(&self, view: &ViewSpec, preview_chars: usize) -> Vec<NoteSummary> {
        self.list_notes(view)
            .iter()
            .map(|note| NoteSummary::new(note, preview_chars))
            .collect()
    }

    pub fn view_counts(&self) -> ViewCounts {
        count_views(&self.notes)
    }

    pub fn tags(&self) -> Vec<String> {
        self.tag_index.tags()
    }

    pub fn add_tag(&mut self, tag: &str) -> bool {
        self.tag_index.add_tag(tag)
    }

    pub fn remove_tag(&mut self, tag: &str) -> bool {
        self.tag_index.remove_tag(tag)
    }

    pub fn selected(&self) -> Option<&Note> {
        let id = self.selected_id.as_deref()?;
        self.notes.iter().find(|n| n.id == id)
    }

    pub fn draft(&self) -> &NoteDraft {
        &self.draft
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn last_error(&self) -> Option<&NoteError> {
        self.last_error.as_ref()
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    /// Selects a note and loads it into the draft.
    ///
    /// Any unsaved draft is discarded. An unknown id clears the selection.
    pub fn select(&mut self, id: Option<&str>) {
        match id.and_then(|id| self.notes.iter().find(|n| n.id == id)) {
            Some(note) => {
                self.draft = NoteDraft {
                    title: note.title.clone(),
                    content: note.content.clone(),
                };
                self.selected_id = Some(note.id.clone());
            }
            None => {
                self.draft = NoteDraft::default();
                self.selected_id = None;
            }
        }
    }

    pub fn update_draft(&mut self, patch: DraftPatch) {
        if let Some(title) = patch.title {
            self.draft.title = title;
        }
        if let Some(content) = patch.content {
            self.draft.content = content;
        }
    }

    pub fn is_draft_dirty(&self) -> bool {
        match self.selected() {
            Some(note) => note.title != self.draft.title || note.content != self.draft.content,
            None => !self.draft.title.is_empty() || !self.draft.content.is_empty(),
        }
    }

    /// Saves the draft to the selected note, or creates a note from it.
    pub async fn save_draft(&mut self) -> Result<Note> {
        let draft = self.draft.clone();
        let saved = match self.selected_id.clone() {
            Some(id) => {
                self.update_note(&id, NoteUpdate::new(draft.title, draft.content))
                    .await?
            }
            None => {
                let note = self
                    .create_note(&draft.title, &draft.content, Vec::new())
                    .await?;
                self.selected_id = Some(note.id.clone());
                note
            }
        };

        self.draft = NoteDraft {
            title: saved.title.clone(),
            content: saved.content.clone(),
        };
        Ok(saved)
    }

    pub async fn create_note(
        &mut self,
        title: &str,
        content: &str,
        tags: Vec<String>,
    ) -> Result<Note> {
        let mut provisional = Note::new(
            title.trim().to_string(),
            content.trim().to_string(),
            clean_tags(&tags),
        );
        provisional.id = format!("pending-{}", Uuid::new_v4());
        let provisional_id = provisional.id.clone();

        let (title, content) = (title.to_string(), content.to_string());
        let created = self
            .optimistic(
                move |notes| notes.insert(0, provisional),
                move |repo| async move { repo.create_note(&title, &content, tags).await },
                move |notes, canonical: &Note| {
                    notes.retain(|n| n.id != provisional_id);
                    notes.insert(0, canonical.clone());
                },
            )
            .await?;

        self.tag_index.sync(&self.notes);
        Ok(created)
    }

    pub async fn update_note(&mut self, id: &str, update: NoteUpdate) -> Result<Note> {
        let (title, content) = (update.title.trim().to_string(), update.content.trim().to_string());
        self.mutate(
            id,
            move |note| {
                note.title = title;
                note.content = content;
            },
            move |repo, id| async move { repo.update_note(&id, update).await },
        )
        .await
    }

    pub async fn update_tags(&mut self, id: &str, tags: Vec<String>) -> Result<Note> {
        let local = clean_tags(&tags);
        let updated = self
            .mutate(
                id,
                move |note| note.tags = local,
                move |repo, id| async move { repo.update_note_tags(&id, tags).await },
            )
            .await?;

        self.tag_index.sync(&self.notes);
        Ok(updated)
    }

    pub async fn archive_note(&mut self, id: &str) -> Result<Note> {
        self.mutate(
            id,
            |note| note.archived = true,
            |repo, id| async move { repo.archive_note(&id).await },
        )
        .await
    }

    pub async fn unarchive_note(&mut self, id: &str) -> Result<Note> {
        self.mutate(
            id,
            |note| note.archived = false,
            |repo, id| async move { repo.unarchive_note(&id).await },
        )
        .await
    }

    pub async fn delete_note(&mut self, id: &str) -> Result<()> {
        let target = id.to_string();
        let owned = id.to_string();
        self.optimistic(
            move |notes| notes.retain(|n| n.id != target),
            move |repo| async move { repo.delete_note(&owned).await },
            |_, _| {},
        )
        .await?;

        if self.selected_id.as_deref() == Some(id) {
            self.select(None);
        }
        self.tag_index.sync(&self.notes);
        Ok(())
    }

    /// Optimistic change to one note, reconciled with the stored record.
    async fn mutate<A, Op, Fut>(&mut self, id: &str, apply: A, op: Op) -> Result<Note>
    where
        A: FnOnce(&mut Note),
        Op: FnOnce(Arc<NoteRepository>, String) -> Fut,
        Fut: Future<Output = Result<Note>>,
    {
        let target = id.to_string();
        let owned = id.to_string();
        self.optimistic(
            move |notes| {
                if let Some(note) = notes.iter_mut().find(|n| n.id == target) {
                    apply(note);
                    note.touch();
                }
            },
            move |repo| op(repo, owned),
            |notes, canonical: &Note| {
                if let Some(slot) = notes.iter_mut().find(|n| n.id == canonical.id) {
                    *slot = canonical.clone();
                }
            },
        )
        .await
    }

    /// Drops a note the store no longer has from the mirror.
    fn forget(&mut self, id: &str) {
        if !self.notes.iter().any(|n| n.id == id) {
            return;
        }
        info!("Dropping note {} that is no longer stored", id);
        self.notes.retain(|n| n.id != id);
        if self.selected_id.as_deref() == Some(id) {
            self.select(None);
        }
        self.tag_index.sync(&self.notes);
    }

    /// Snapshot, apply locally, then commit or roll back on the repository's answer.
    async fn optimistic<T, A, Op, Fut, C>(&mut self, apply: A, op: Op, commit: C) -> Result<T>
    where
        A: FnOnce(&mut Vec<Note>),
        Op: FnOnce(Arc<NoteRepository>) -> Fut,
        Fut: Future<Output = Result<T>>,
        C: FnOnce(&mut Vec<Note>, &T),
    {
        let snapshot = self.notes.clone();
        apply(&mut self.notes);

        self.loading = true;
        let outcome = op(Arc::clone(&self.repository)).await;
        self.loading = false;

        match outcome {
            Ok(value) => {
                commit(&mut self.notes, &value);
                self.last_error = None;
                debug!("Optimistic change committed");
                Ok(value)
            }
            Err(e) => {
                warn!("Rolling back optimistic change: {}", e);
                self.notes = snapshot;
                if let NoteError::NotFound { id } = &e {
                    self.forget(id);
                }
                self.last_error = Some(e.clone());
                Err(e)
            }
        }
    }
}
