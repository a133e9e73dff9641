//! Local-only data source
//!
//! Serves every operation from the local cache. Nothing here suspends on
//! I/O beyond a single SQLite statement.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{DataSource, SourceKind};
use crate::budget::CopyBudget;
use crate::models::{
    Annotation, Bookmark, Highlight, Location, NewBookmark, NewHighlight, NewNote, Note,
    ReaderPreferences,
};
use crate::storage::{CacheKey, LocalCache, RecordKind, StorageResult};

/// Data source backed only by the local cache
pub struct LocalDataSource {
    cache: Arc<LocalCache>,
    locator: String,
    allowance_percentage: f64,
}

impl LocalDataSource {
    /// Create a source for the book found at `locator`
    pub fn new(
        cache: Arc<LocalCache>,
        locator: impl Into<String>,
        allowance_percentage: f64,
    ) -> Self {
        Self {
            cache,
            locator: locator.into(),
            allowance_percentage,
        }
    }

    /// The book's resource locator (cache namespace)
    pub fn locator(&self) -> &str {
        &self.locator
    }

    pub fn allowance_percentage(&self) -> f64 {
        self.allowance_percentage
    }

    fn key(&self, kind: RecordKind) -> CacheKey {
        CacheKey::new(&self.locator, kind)
    }

    fn read_list<T: DeserializeOwned>(&self, kind: RecordKind) -> StorageResult<Vec<T>> {
        self.cache.get_list(&self.key(kind))
    }

    fn write_list<T: Serialize>(&self, kind: RecordKind, records: &[T]) -> StorageResult<()> {
        self.cache.set(&self.key(kind), records)
    }

    /// Insert a record, replacing any existing one with the same CFI
    fn upsert<T>(&self, kind: RecordKind, record: T) -> StorageResult<T>
    where
        T: Annotation + Serialize + DeserializeOwned + Clone,
    {
        let mut records: Vec<T> = self.read_list(kind)?;
        match records.iter().position(|r| r.cfi() == record.cfi()) {
            Some(index) => records[index] = record.clone(),
            None => records.push(record.clone()),
        }
        self.write_list(kind, &records)?;
        Ok(record)
    }

    fn remove_by_cfi<T>(&self, kind: RecordKind, cfi: &str) -> StorageResult<()>
    where
        T: Annotation + Serialize + DeserializeOwned,
    {
        let records: Vec<T> = self.read_list(kind)?;
        let kept: Vec<T> = records.into_iter().filter(|r| r.cfi() != cfi).collect();
        self.write_list(kind, &kept)
    }

    fn update_by_cfi<T>(
        &self,
        kind: RecordKind,
        cfi: &str,
        apply: impl Fn(&mut T),
    ) -> StorageResult<()>
    where
        T: Annotation + Serialize + DeserializeOwned,
    {
        let mut records: Vec<T> = self.read_list(kind)?;
        records
            .iter_mut()
            .filter(|r| r.cfi() == cfi)
            .for_each(|r| apply(r));
        self.write_list(kind, &records)
    }

    // Write-back entry points for the hybrid source

    pub(crate) fn replace_highlights(&self, highlights: &[Highlight]) -> StorageResult<()> {
        self.write_list(RecordKind::Highlights, highlights)
    }

    pub(crate) fn replace_bookmarks(&self, bookmarks: &[Bookmark]) -> StorageResult<()> {
        self.write_list(RecordKind::Bookmarks, bookmarks)
    }

    pub(crate) fn replace_notes(&self, notes: &[Note]) -> StorageResult<()> {
        self.write_list(RecordKind::Notes, notes)
    }

    pub(crate) fn store_location(&self, location: &Location) -> StorageResult<()> {
        self.cache.set(&self.key(RecordKind::Location), location)
    }

    pub(crate) fn store_preferences(&self, preferences: &ReaderPreferences) -> StorageResult<()> {
        self.cache.set(&self.key(RecordKind::Preferences), preferences)
    }

    /// Overwrite the copied counter, even downwards
    pub(crate) fn store_copied_chars(&self, copied_chars: u64) -> StorageResult<()> {
        self.cache.set(&self.key(RecordKind::CopiedChars), &copied_chars)
    }

    fn read_total_chars(&self) -> StorageResult<Option<u64>> {
        self.cache.get(&self.key(RecordKind::TotalChars))
    }

    fn read_copied_chars(&self) -> StorageResult<u64> {
        Ok(self
            .cache
            .get(&self.key(RecordKind::CopiedChars))?
            .unwrap_or(0))
    }

    /// Raise the copied counter to `copied_chars`; never lowers it
    ///
    /// Returns the stored value.
    pub(crate) fn raise_copied_chars(&self, copied_chars: u64) -> StorageResult<u64> {
        let stored = self.read_copied_chars()?.max(copied_chars);
        self.store_copied_chars(stored)?;
        Ok(stored)
    }
}

#[async_trait]
impl DataSource for LocalDataSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Local
    }

    async fn get_highlights(&self) -> StorageResult<Vec<Highlight>> {
        self.read_list(RecordKind::Highlights)
    }

    async fn add_highlight(&self, highlight: NewHighlight) -> StorageResult<Highlight> {
        self.upsert(RecordKind::Highlights, highlight.into_record(Utc::now()))
    }

    async fn remove_highlight(&self, cfi: &str) -> StorageResult<()> {
        self.remove_by_cfi::<Highlight>(RecordKind::Highlights, cfi)
    }

    async fn update_highlight_color(&self, cfi: &str, color: &str) -> StorageResult<()> {
        self.update_by_cfi(RecordKind::Highlights, cfi, |h: &mut Highlight| {
            h.color = Some(color.to_string());
        })
    }

    async fn get_bookmarks(&self) -> StorageResult<Vec<Bookmark>> {
        self.read_list(RecordKind::Bookmarks)
    }

    async fn add_bookmark(&self, bookmark: NewBookmark) -> StorageResult<Bookmark> {
        self.upsert(RecordKind::Bookmarks, bookmark.into_record(Utc::now()))
    }

    async fn remove_bookmark(&self, cfi: &str) -> StorageResult<()> {
        self.remove_by_cfi::<Bookmark>(RecordKind::Bookmarks, cfi)
    }

    async fn get_notes(&self) -> StorageResult<Vec<Note>> {
        self.read_list(RecordKind::Notes)
    }

    async fn add_note(&self, note: NewNote) -> StorageResult<Note> {
        self.upsert(RecordKind::Notes, note.into_record(Utc::now()))
    }

    async fn remove_note(&self, cfi: &str) -> StorageResult<()> {
        self.remove_by_cfi::<Note>(RecordKind::Notes, cfi)
    }

    async fn update_note(&self, cfi: &str, note: &str) -> StorageResult<()> {
        self.update_by_cfi(RecordKind::Notes, cfi, |n: &mut Note| {
            n.note = note.to_string();
        })
    }

    async fn get_location(&self) -> StorageResult<Option<Location>> {
        self.cache.get(&self.key(RecordKind::Location))
    }

    async fn update_location(&self, cfi: &str, progress: f64) -> StorageResult<Location> {
        let location = Location::new(cfi, progress);
        self.store_location(&location)?;
        Ok(location)
    }

    async fn get_total_chars(&self) -> StorageResult<Option<u64>> {
        self.read_total_chars()
    }

    async fn save_total_chars(&self, total_chars: u64) -> StorageResult<()> {
        self.cache.set(&self.key(RecordKind::TotalChars), &total_chars)
    }

    async fn get_copied_chars(&self) -> StorageResult<u64> {
        self.read_copied_chars()
    }

    async fn update_copied_chars(&self, copied_chars: u64) -> StorageResult<()> {
        self.raise_copied_chars(copied_chars).map(|_| ())
    }

    async fn copy_budget(&self) -> StorageResult<CopyBudget> {
        Ok(CopyBudget::new(
            self.read_total_chars()?,
            self.read_copied_chars()?,
            self.allowance_percentage,
        ))
    }

    async fn get_reader_preferences(&self) -> StorageResult<Option<ReaderPreferences>> {
        self.cache.get(&self.key(RecordKind::Preferences))
    }

    async fn update_reader_preferences(
        &self,
        preferences: &ReaderPreferences,
    ) -> StorageResult<()> {
        self.store_preferences(preferences)
    }
}
