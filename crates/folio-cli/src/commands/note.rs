//! Note command handlers
//!
//! Notes attach the reader's own text to a passage. Without `--note` the
//! content is written in $EDITOR.

use anyhow::{bail, Context, Result};

use folio_core::{DataSource, NewNote, Note};

use super::require_cfi;
use crate::editor::{confirm, edit_text, strip_comments, template};
use crate::output::Output;

/// List notes for the book
pub async fn list(source: &dyn DataSource, output: &Output) -> Result<()> {
    let notes = source.get_notes().await.context("Failed to load notes")?;
    output.print_notes(&notes);
    Ok(())
}

/// Add a note to a passage
pub async fn add(
    source: &dyn DataSource,
    cfi: String,
    text: String,
    note: Option<String>,
    output: &Output,
) -> Result<()> {
    require_cfi(&cfi)?;

    let content = match note {
        Some(note) => note,
        None => {
            let initial = template(&[format!("Adding note at {}", cfi), format!("> {}", text)], "");
            strip_comments(&edit_text(&initial).context("Failed to edit note")?)
        }
    };

    if content.trim().is_empty() {
        bail!("Note cannot be empty");
    }

    let stored = source
        .add_note(NewNote::new(cfi, text, content))
        .await
        .context("Failed to add note")?;

    output.success(&format!("Added note at {}", stored.cfi));
    Ok(())
}

/// Replace a note's content
pub async fn edit(
    source: &dyn DataSource,
    cfi: String,
    note: Option<String>,
    output: &Output,
) -> Result<()> {
    let existing = find(source, &cfi).await?;

    let content = match note {
        Some(note) => note,
        None => {
            let initial = template(
                &[format!("Editing note at {}", cfi), format!("> {}", existing.text)],
                &existing.note,
            );
            strip_comments(&edit_text(&initial).context("Failed to edit note")?)
        }
    };

    if content.trim().is_empty() {
        bail!("Note cannot be empty");
    }
    if content == existing.note {
        output.message("No changes made.");
        return Ok(());
    }

    source
        .update_note(&cfi, &content)
        .await
        .context("Failed to update note")?;

    output.success(&format!("Updated note at {}", cfi));
    Ok(())
}

/// Remove a note
pub async fn remove(source: &dyn DataSource, cfi: String, output: &Output) -> Result<()> {
    let note = find(source, &cfi).await?;

    if output.should_prompt() {
        println!("Remove note: {}", note.note.lines().next().unwrap_or(""));
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    source
        .remove_note(&cfi)
        .await
        .context("Failed to remove note")?;

    output.success(&format!("Removed note at {}", cfi));
    Ok(())
}

async fn find(source: &dyn DataSource, cfi: &str) -> Result<Note> {
    let notes = source.get_notes().await?;
    match notes.into_iter().find(|n| n.cfi == cfi) {
        Some(note) => Ok(note),
        None => bail!("No note at: {}", cfi),
    }
}
