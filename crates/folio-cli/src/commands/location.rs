//! Reading position command handlers

use anyhow::{bail, Context, Result};

use folio_core::DataSource;

use super::require_cfi;
use crate::output::Output;

/// Show the saved reading position
pub async fn show(source: &dyn DataSource, output: &Output) -> Result<()> {
    let location = source
        .get_location()
        .await
        .context("Failed to load location")?;
    output.print_location(location.as_ref());
    Ok(())
}

/// Save the reading position
pub async fn set(
    source: &dyn DataSource,
    cfi: String,
    progress: f64,
    output: &Output,
) -> Result<()> {
    require_cfi(&cfi)?;
    if !(0.0..=1.0).contains(&progress) {
        bail!("Progress must be between 0 and 1, got {}", progress);
    }

    let location = source
        .update_location(&cfi, progress)
        .await
        .context("Failed to save location")?;

    output.success(&format!(
        "Saved position {} ({:.0}%)",
        location.cfi,
        location.progress * 100.0
    ));
    Ok(())
}
