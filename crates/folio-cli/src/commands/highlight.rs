//! Highlight command handlers

use anyhow::{bail, Context, Result};

use folio_core::{DataSource, Highlight, NewHighlight};

use super::require_cfi;
use crate::editor::confirm;
use crate::output::Output;

/// List highlights for the book
pub async fn list(source: &dyn DataSource, output: &Output) -> Result<()> {
    let highlights = source
        .get_highlights()
        .await
        .context("Failed to load highlights")?;
    output.print_highlights(&highlights);
    Ok(())
}

/// Highlight or underline a passage
pub async fn add(
    source: &dyn DataSource,
    cfi: String,
    text: String,
    color: Option<String>,
    underline: bool,
    output: &Output,
) -> Result<()> {
    require_cfi(&cfi)?;

    let mut highlight = NewHighlight::new(cfi, text);
    if let Some(color) = color {
        highlight = highlight.with_color(color);
    }
    if underline {
        highlight = highlight.underline();
    }

    let stored = source
        .add_highlight(highlight)
        .await
        .context("Failed to add highlight")?;

    output.success(&format!("Added {} at {}", stored.kind, stored.cfi));
    Ok(())
}

/// Change a highlight's color
pub async fn color(
    source: &dyn DataSource,
    cfi: String,
    color: String,
    output: &Output,
) -> Result<()> {
    find(source, &cfi).await?;

    source
        .update_highlight_color(&cfi, &color)
        .await
        .context("Failed to update highlight")?;

    output.success(&format!("Set color of {} to {}", cfi, color));
    Ok(())
}

/// Remove a highlight
pub async fn remove(source: &dyn DataSource, cfi: String, output: &Output) -> Result<()> {
    let highlight = find(source, &cfi).await?;

    if output.should_prompt() {
        println!("Remove highlight: {}", highlight.text);
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    source
        .remove_highlight(&cfi)
        .await
        .context("Failed to remove highlight")?;

    output.success(&format!("Removed highlight at {}", cfi));
    Ok(())
}

async fn find(source: &dyn DataSource, cfi: &str) -> Result<Highlight> {
    let highlights = source.get_highlights().await?;
    match highlights.into_iter().find(|h| h.cfi == cfi) {
        Some(highlight) => Ok(highlight),
        None => bail!("No highlight at: {}", cfi),
    }
}
