//! Scripted in-memory remote for tests

use std::sync::Mutex;

use async_trait::async_trait;

use super::client::RemoteAnnotations;
use super::error::{RemoteError, RemoteResult};
use super::wire::{CopyProtection, RemoteAnnotationSet, RemoteLocation};
use crate::models::{Bookmark, Highlight, Location, Note, ReaderPreferences};

#[derive(Default)]
pub struct FakeState {
    pub annotations: RemoteAnnotationSet,
    pub location: Option<RemoteLocation>,
    pub copy_protection: Option<CopyProtection>,
    pub preferences: Option<ReaderPreferences>,
    /// Every call fails with a 503 while set
    pub failing: bool,
    /// Only the named operations fail
    pub failing_ops: Vec<&'static str>,
    pub calls: Vec<String>,
}

#[derive(Default)]
pub struct FakeRemote {
    pub state: Mutex<FakeState>,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let remote = Self::default();
        remote.state.lock().unwrap().failing = true;
        remote
    }

    pub fn with_state(f: impl FnOnce(&mut FakeState)) -> Self {
        let remote = Self::default();
        f(&mut remote.state.lock().unwrap());
        remote
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Record the call and fail if scripted to
    fn enter(
        &self,
        call: String,
        op: &'static str,
    ) -> RemoteResult<std::sync::MutexGuard<'_, FakeState>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        if state.failing || state.failing_ops.contains(&op) {
            return Err(RemoteError::Status {
                status: 503,
                url: format!("fake://{}", op),
            });
        }
        Ok(state)
    }
}

#[async_trait]
impl RemoteAnnotations for FakeRemote {
    async fn fetch_annotations(&self, book_id: &str) -> RemoteResult<RemoteAnnotationSet> {
        let state = self.enter(format!("fetch_annotations {}", book_id), "fetch_annotations")?;
        Ok(state.annotations.clone())
    }

    async fn add_highlight(&self, book_id: &str, highlight: &Highlight) -> RemoteResult<()> {
        let mut state = self.enter(
            format!("add_highlight {} {}", book_id, highlight.cfi),
            "add_highlight",
        )?;
        state.annotations.highlights.push(highlight.clone());
        Ok(())
    }

    async fn add_bookmark(&self, book_id: &str, bookmark: &Bookmark) -> RemoteResult<()> {
        let mut state = self.enter(
            format!("add_bookmark {} {}", book_id, bookmark.cfi),
            "add_bookmark",
        )?;
        state.annotations.bookmarks.push(bookmark.clone());
        Ok(())
    }

    async fn add_note(&self, book_id: &str, note: &Note) -> RemoteResult<()> {
        let mut state = self.enter(format!("add_note {} {}", book_id, note.cfi), "add_note")?;
        state.annotations.notes.push(note.clone());
        Ok(())
    }

    async fn delete_highlight(&self, book_id: &str, remote_id: &str) -> RemoteResult<()> {
        let mut state = self.enter(
            format!("delete_highlight {} {}", book_id, remote_id),
            "delete_highlight",
        )?;
        state
            .annotations
            .highlights
            .retain(|h| h.id.as_deref() != Some(remote_id));
        Ok(())
    }

    async fn delete_bookmark(&self, book_id: &str, remote_id: &str) -> RemoteResult<()> {
        let mut state = self.enter(
            format!("delete_bookmark {} {}", book_id, remote_id),
            "delete_bookmark",
        )?;
        state
            .annotations
            .bookmarks
            .retain(|b| b.id.as_deref() != Some(remote_id));
        Ok(())
    }

    async fn delete_note(&self, book_id: &str, remote_id: &str) -> RemoteResult<()> {
        let mut state = self.enter(
            format!("delete_note {} {}", book_id, remote_id),
            "delete_note",
        )?;
        state
            .annotations
            .notes
            .retain(|n| n.id.as_deref() != Some(remote_id));
        Ok(())
    }

    async fn fetch_location(&self, book_id: &str) -> RemoteResult<Option<RemoteLocation>> {
        let state = self.enter(format!("fetch_location {}", book_id), "fetch_location")?;
        Ok(state.location.clone())
    }

    async fn update_location(&self, book_id: &str, location: &Location) -> RemoteResult<()> {
        let mut state = self.enter(
            format!("update_location {} {}", book_id, location.cfi),
            "update_location",
        )?;
        state.location = Some(RemoteLocation::from(location));
        Ok(())
    }

    async fn fetch_copy_protection(&self, book_id: &str) -> RemoteResult<Option<CopyProtection>> {
        let state = self.enter(
            format!("fetch_copy_protection {}", book_id),
            "fetch_copy_protection",
        )?;
        Ok(state.copy_protection.clone())
    }

    async fn update_copied_chars(&self, book_id: &str, copied_chars: u64) -> RemoteResult<()> {
        let mut state = self.enter(
            format!("update_copied_chars {} {}", book_id, copied_chars),
            "update_copied_chars",
        )?;
        state
            .copy_protection
            .get_or_insert_with(CopyProtection::default)
            .copied_chars = Some(copied_chars);
        Ok(())
    }

    async fn fetch_preferences(&self) -> RemoteResult<Option<ReaderPreferences>> {
        let state = self.enter("fetch_preferences".to_string(), "fetch_preferences")?;
        Ok(state.preferences.clone())
    }

    async fn update_preferences(&self, preferences: &ReaderPreferences) -> RemoteResult<()> {
        let mut state = self.enter("update_preferences".to_string(), "update_preferences")?;
        state.preferences = Some(preferences.clone());
        Ok(())
    }
}
