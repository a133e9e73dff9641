//! Hybrid data source
//!
//! Local cache plus remote service. Reads merge the two and write the
//! merged view back to the cache; writes land locally first and are then
//! forwarded to the remote.
//!
//! Local durability is guaranteed; remote sync is best effort. A remote
//! failure is logged and the operation completes on local data alone.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use super::local::LocalDataSource;
use super::merge::{annotate, merge_by_cfi, Fallback, SyncWarning};
use super::{DataSource, SourceKind};
use crate::budget::CopyBudget;
use crate::models::{
    is_valid_cfi, Annotation, Bookmark, Highlight, Location, NewBookmark, NewHighlight, NewNote,
    Note, ReaderPreferences,
};
use crate::remote::{RemoteAnnotationSet, RemoteAnnotations, RemoteResult};
use crate::storage::StorageResult;

/// Progress recorded for a location adopted from the remote
const NEUTRAL_PROGRESS: f64 = 0.0;

/// Data source that syncs a local cache with the remote service
pub struct HybridDataSource {
    local: LocalDataSource,
    remote: Arc<dyn RemoteAnnotations>,
    remote_id: String,
}

impl HybridDataSource {
    /// `remote_id` is the id the remote service knows the book by
    pub fn new(
        local: LocalDataSource,
        remote: Arc<dyn RemoteAnnotations>,
        remote_id: impl Into<String>,
    ) -> Self {
        Self {
            local,
            remote,
            remote_id: remote_id.into(),
        }
    }

    pub fn remote_id(&self) -> &str {
        &self.remote_id
    }

    fn attempt<T>(
        &self,
        operation: &'static str,
        result: RemoteResult<T>,
    ) -> Result<T, SyncWarning> {
        annotate(operation, &self.remote_id, result)
    }

    /// Remote annotation set, or `None` when the remote is unreachable
    async fn remote_annotations(&self) -> Option<RemoteAnnotationSet> {
        let result = self.remote.fetch_annotations(&self.remote_id).await;
        self.attempt("fetch_annotations", result).ok_or_log()
    }

    /// Remote id of the record at `cfi`, looked up through the merged view
    fn find_remote_id<T: Annotation>(records: &[T], cfi: &str) -> Option<String> {
        records
            .iter()
            .find(|r| r.cfi() == cfi)
            .and_then(|r| r.remote_id())
            .map(str::to_string)
    }
}

#[async_trait]
impl DataSource for HybridDataSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Hybrid
    }

    // ==================== Highlights ====================

    async fn get_highlights(&self) -> StorageResult<Vec<Highlight>> {
        let local = self.local.get_highlights().await?;
        let Some(remote) = self.remote_annotations().await else {
            return Ok(local);
        };

        let merged = merge_by_cfi(local, remote.highlights);
        self.local.replace_highlights(&merged)?;
        info!(book = %self.remote_id, count = merged.len(), "Merged highlights");
        Ok(merged)
    }

    async fn add_highlight(&self, highlight: NewHighlight) -> StorageResult<Highlight> {
        let stored = self.local.add_highlight(highlight).await?;
        let result = self.remote.add_highlight(&self.remote_id, &stored).await;
        self.attempt("add_highlight", result).settle();
        Ok(stored)
    }

    async fn remove_highlight(&self, cfi: &str) -> StorageResult<()> {
        let remote_id = Self::find_remote_id(&self.get_highlights().await?, cfi);
        self.local.remove_highlight(cfi).await?;

        if let Some(id) = remote_id {
            let result = self.remote.delete_highlight(&self.remote_id, &id).await;
            self.attempt("delete_highlight", result).settle();
        }
        Ok(())
    }

    async fn update_highlight_color(&self, cfi: &str, color: &str) -> StorageResult<()> {
        self.local.update_highlight_color(cfi, color).await
    }

    // ==================== Bookmarks ====================

    async fn get_bookmarks(&self) -> StorageResult<Vec<Bookmark>> {
        let local = self.local.get_bookmarks().await?;
        let Some(remote) = self.remote_annotations().await else {
            return Ok(local);
        };

        let merged = merge_by_cfi(local, remote.bookmarks);
        self.local.replace_bookmarks(&merged)?;
        info!(book = %self.remote_id, count = merged.len(), "Merged bookmarks");
        Ok(merged)
    }

    async fn add_bookmark(&self, bookmark: NewBookmark) -> StorageResult<Bookmark> {
        let stored = self.local.add_bookmark(bookmark).await?;
        let result = self.remote.add_bookmark(&self.remote_id, &stored).await;
        self.attempt("add_bookmark", result).settle();
        Ok(stored)
    }

    async fn remove_bookmark(&self, cfi: &str) -> StorageResult<()> {
        let remote_id = Self::find_remote_id(&self.get_bookmarks().await?, cfi);
        self.local.remove_bookmark(cfi).await?;

        if let Some(id) = remote_id {
            let result = self.remote.delete_bookmark(&self.remote_id, &id).await;
            self.attempt("delete_bookmark", result).settle();
        }
        Ok(())
    }

    // ==================== Notes ====================

    async fn get_notes(&self) -> StorageResult<Vec<Note>> {
        let local = self.local.get_notes().await?;
        let Some(remote) = self.remote_annotations().await else {
            return Ok(local);
        };

        let merged = merge_by_cfi(local, remote.notes);
        self.local.replace_notes(&merged)?;
        info!(book = %self.remote_id, count = merged.len(), "Merged notes");
        Ok(merged)
    }

    async fn add_note(&self, note: NewNote) -> StorageResult<Note> {
        let stored = self.local.add_note(note).await?;
        let result = self.remote.add_note(&self.remote_id, &stored).await;
        self.attempt("add_note", result).settle();
        Ok(stored)
    }

    async fn remove_note(&self, cfi: &str) -> StorageResult<()> {
        let remote_id = Self::find_remote_id(&self.get_notes().await?, cfi);
        self.local.remove_note(cfi).await?;

        if let Some(id) = remote_id {
            let result = self.remote.delete_note(&self.remote_id, &id).await;
            self.attempt("delete_note", result).settle();
        }
        Ok(())
    }

    // Remote update is not part of the service contract; edits stay local
    // until the record is re-added.
    async fn update_note(&self, cfi: &str, note: &str) -> StorageResult<()> {
        self.local.update_note(cfi, note).await
    }

    // ==================== Location ====================

    async fn get_location(&self) -> StorageResult<Option<Location>> {
        let local = self.local.get_location().await?;
        let result = self.remote.fetch_location(&self.remote_id).await;

        match self.attempt("fetch_location", result).ok_or_log().flatten() {
            Some(remote) if is_valid_cfi(&remote.cfi) => {
                let location = Location::new(remote.cfi, NEUTRAL_PROGRESS);
                self.local.store_location(&location)?;
                Ok(Some(location))
            }
            Some(remote) => {
                warn!(
                    book = %self.remote_id,
                    cfi = %remote.cfi,
                    "Ignoring remote location with unrecognized format"
                );
                Ok(local)
            }
            None => Ok(local),
        }
    }

    async fn update_location(&self, cfi: &str, progress: f64) -> StorageResult<Location> {
        let location = self.local.update_location(cfi, progress).await?;
        let result = self.remote.update_location(&self.remote_id, &location).await;
        self.attempt("update_location", result).settle();
        Ok(location)
    }

    // ==================== Copy protection ====================

    async fn get_total_chars(&self) -> StorageResult<Option<u64>> {
        self.local.get_total_chars().await
    }

    async fn save_total_chars(&self, total_chars: u64) -> StorageResult<()> {
        self.local.save_total_chars(total_chars).await
    }

    async fn get_copied_chars(&self) -> StorageResult<u64> {
        let result = self.remote.fetch_copy_protection(&self.remote_id).await;
        let remote_copied = self
            .attempt("fetch_copy_protection", result)
            .ok_or_log()
            .flatten()
            .and_then(|status| status.copied_chars);

        match remote_copied {
            Some(copied) => {
                self.local.store_copied_chars(copied)?;
                Ok(copied)
            }
            None => self.local.get_copied_chars().await,
        }
    }

    async fn update_copied_chars(&self, copied_chars: u64) -> StorageResult<()> {
        let stored = self.local.raise_copied_chars(copied_chars)?;
        let result = self.remote.update_copied_chars(&self.remote_id, stored).await;
        self.attempt("update_copied_chars", result).settle();
        Ok(())
    }

    async fn copy_budget(&self) -> StorageResult<CopyBudget> {
        let result = self.remote.fetch_copy_protection(&self.remote_id).await;
        let status = self
            .attempt("fetch_copy_protection", result)
            .ok_or_log()
            .flatten()
            .unwrap_or_default();

        let copied = match status.copied_chars {
            Some(copied) => {
                self.local.store_copied_chars(copied)?;
                copied
            }
            None => self.local.get_copied_chars().await?,
        };

        // The total is set once; a remote figure only fills a gap
        let total = match self.local.get_total_chars().await? {
            Some(total) => Some(total),
            None => match status.total_chars {
                Some(total) => {
                    self.local.save_total_chars(total).await?;
                    Some(total)
                }
                None => None,
            },
        };

        let allowance = status
            .allowance_percentage
            .unwrap_or_else(|| self.local.allowance_percentage());

        Ok(CopyBudget::new(total, copied, allowance))
    }

    // ==================== Preferences ====================

    async fn get_reader_preferences(&self) -> StorageResult<Option<ReaderPreferences>> {
        let result = self.remote.fetch_preferences().await;
        match self.attempt("fetch_preferences", result).ok_or_log().flatten() {
            Some(preferences) => {
                self.local.store_preferences(&preferences)?;
                Ok(Some(preferences))
            }
            None => self.local.get_reader_preferences().await,
        }
    }

    async fn update_reader_preferences(
        &self,
        preferences: &ReaderPreferences,
    ) -> StorageResult<()> {
        self.local.update_reader_preferences(preferences).await?;
        let result = self.remote.update_preferences(preferences).await;
        self.attempt("update_preferences", result).settle();
        Ok(())
    }
}
