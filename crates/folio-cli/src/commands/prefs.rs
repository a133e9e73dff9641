//! Reader preference command handlers

use anyhow::{Context, Result};

use folio_core::{DataSource, ReaderPreferences};

use crate::output::Output;

/// Show saved preferences
pub async fn show(source: &dyn DataSource, output: &Output) -> Result<()> {
    let preferences = source
        .get_reader_preferences()
        .await
        .context("Failed to load preferences")?;
    output.print_preferences(preferences.as_ref());
    Ok(())
}

/// Change some preferences
///
/// Fields left out of `changes` keep their saved value; the merged set is
/// then saved as a whole.
pub async fn set(
    source: &dyn DataSource,
    changes: ReaderPreferences,
    output: &Output,
) -> Result<()> {
    let current = source
        .get_reader_preferences()
        .await
        .context("Failed to load preferences")?
        .unwrap_or_default();

    let updated = apply(current, changes);
    source
        .update_reader_preferences(&updated)
        .await
        .context("Failed to save preferences")?;

    output.success("Saved preferences");
    output.print_preferences(Some(&updated));
    Ok(())
}

fn apply(current: ReaderPreferences, changes: ReaderPreferences) -> ReaderPreferences {
    ReaderPreferences {
        theme: changes.theme.or(current.theme),
        font_family: changes.font_family.or(current.font_family),
        font_size: changes.font_size.or(current.font_size),
        line_height: changes.line_height.or(current.line_height),
        margin: changes.margin.or(current.margin),
        flow: changes.flow.or(current.flow),
    }
}
