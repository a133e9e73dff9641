//! Data sources
//!
//! The capability interface the reader UI talks to. Two implementations:
//!
//! - [`LocalDataSource`]: the local cache is the source of truth
//! - [`HybridDataSource`]: local cache plus the remote service, merging on
//!   read and writing through on mutation
//!
//! Both return only [`StorageError`](crate::storage::StorageError); remote
//! failures are absorbed inside the hybrid source.

mod hybrid;
mod local;
mod merge;

use async_trait::async_trait;

use crate::budget::{CopyBudget, CopyOutcome};
use crate::models::{
    Bookmark, Highlight, Location, NewBookmark, NewHighlight, NewNote, Note, ReaderPreferences,
};
use crate::storage::StorageResult;

pub use hybrid::HybridDataSource;
pub use local::LocalDataSource;
pub use merge::{merge_by_cfi, Fallback, SyncWarning};

/// Which implementation backs a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Local,
    Hybrid,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Local => write!(f, "local"),
            SourceKind::Hybrid => write!(f, "hybrid"),
        }
    }
}

/// Reading-state operations for one book
#[async_trait]
pub trait DataSource: Send + Sync {
    fn kind(&self) -> SourceKind;

    // ==================== Highlights ====================

    async fn get_highlights(&self) -> StorageResult<Vec<Highlight>>;
    async fn add_highlight(&self, highlight: NewHighlight) -> StorageResult<Highlight>;
    async fn remove_highlight(&self, cfi: &str) -> StorageResult<()>;
    async fn update_highlight_color(&self, cfi: &str, color: &str) -> StorageResult<()>;

    // ==================== Bookmarks ====================

    async fn get_bookmarks(&self) -> StorageResult<Vec<Bookmark>>;
    async fn add_bookmark(&self, bookmark: NewBookmark) -> StorageResult<Bookmark>;
    async fn remove_bookmark(&self, cfi: &str) -> StorageResult<()>;

    // ==================== Notes ====================

    async fn get_notes(&self) -> StorageResult<Vec<Note>>;
    async fn add_note(&self, note: NewNote) -> StorageResult<Note>;
    async fn remove_note(&self, cfi: &str) -> StorageResult<()>;
    async fn update_note(&self, cfi: &str, note: &str) -> StorageResult<()>;

    // ==================== Location ====================

    async fn get_location(&self) -> StorageResult<Option<Location>>;
    async fn update_location(&self, cfi: &str, progress: f64) -> StorageResult<Location>;

    // ==================== Copy protection ====================

    async fn get_total_chars(&self) -> StorageResult<Option<u64>>;
    async fn save_total_chars(&self, total_chars: u64) -> StorageResult<()>;
    async fn get_copied_chars(&self) -> StorageResult<u64>;
    async fn update_copied_chars(&self, copied_chars: u64) -> StorageResult<()>;

    /// Current copy budget for the book
    async fn copy_budget(&self) -> StorageResult<CopyBudget>;

    /// Count `chars` against the budget if it allows them
    async fn record_copy(&self, chars: u64) -> StorageResult<CopyOutcome> {
        let budget = self.copy_budget().await?;
        if !budget.can_copy(chars) {
            return Ok(CopyOutcome::Denied(budget));
        }

        let updated = budget.after_copy(chars);
        self.update_copied_chars(updated.copied_chars).await?;
        Ok(CopyOutcome::Recorded(updated))
    }

    // ==================== Preferences ====================

    async fn get_reader_preferences(&self) -> StorageResult<Option<ReaderPreferences>>;
    async fn update_reader_preferences(&self, preferences: &ReaderPreferences)
        -> StorageResult<()>;
}
