//! Bookmark command handlers

use anyhow::{bail, Context, Result};

use folio_core::{DataSource, NewBookmark};

use super::require_cfi;
use crate::editor::confirm;
use crate::output::Output;

/// List bookmarks for the book
pub async fn list(source: &dyn DataSource, output: &Output) -> Result<()> {
    let bookmarks = source
        .get_bookmarks()
        .await
        .context("Failed to load bookmarks")?;
    output.print_bookmarks(&bookmarks);
    Ok(())
}

/// Bookmark a position
pub async fn add(
    source: &dyn DataSource,
    cfi: String,
    label: Option<String>,
    chapter: Option<String>,
    page: Option<u32>,
    output: &Output,
) -> Result<()> {
    require_cfi(&cfi)?;

    let bookmark = NewBookmark {
        label,
        chapter,
        page,
        ..NewBookmark::new(cfi)
    };
    let stored = source
        .add_bookmark(bookmark)
        .await
        .context("Failed to add bookmark")?;

    output.success(&format!("Bookmarked {}", stored.cfi));
    Ok(())
}

/// Remove a bookmark
pub async fn remove(source: &dyn DataSource, cfi: String, output: &Output) -> Result<()> {
    let bookmarks = source.get_bookmarks().await?;
    let Some(bookmark) = bookmarks.iter().find(|b| b.cfi == cfi) else {
        bail!("No bookmark at: {}", cfi);
    };

    if output.should_prompt() {
        println!(
            "Remove bookmark: {}",
            bookmark.label.as_deref().unwrap_or(&bookmark.cfi)
        );
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    source
        .remove_bookmark(&cfi)
        .await
        .context("Failed to remove bookmark")?;

    output.success(&format!("Removed bookmark at {}", cfi));
    Ok(())
}
