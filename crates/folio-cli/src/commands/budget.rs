//! Copy-protection command handlers

use anyhow::{bail, Context, Result};

use folio_core::{CopyOutcome, DataSource};

use crate::output::Output;

/// Show the copy budget
pub async fn show(source: &dyn DataSource, output: &Output) -> Result<()> {
    let budget = source
        .copy_budget()
        .await
        .context("Failed to load copy budget")?;
    output.print_budget(&budget);
    Ok(())
}

/// Record the book's total character count
pub async fn total(source: &dyn DataSource, total_chars: u64, output: &Output) -> Result<()> {
    if total_chars == 0 {
        bail!("Total character count must be greater than zero");
    }

    source
        .save_total_chars(total_chars)
        .await
        .context("Failed to save total characters")?;

    output.success(&format!("Set total characters to {}", total_chars));
    Ok(())
}

/// Count a copy against the budget
///
/// Fails when the budget does not cover `chars` more characters.
pub async fn copy(source: &dyn DataSource, chars: u64, output: &Output) -> Result<()> {
    let outcome = source
        .record_copy(chars)
        .await
        .context("Failed to record copy")?;

    match outcome {
        CopyOutcome::Recorded(budget) => {
            output.success(&format!("Copied {} characters", chars));
            output.print_budget(&budget);
            Ok(())
        }
        CopyOutcome::Denied(budget) => match budget.remaining_chars() {
            Some(remaining) => bail!(
                "Copy limit reached: {} characters requested, {} remaining",
                chars,
                remaining
            ),
            None => bail!(
                "Copying is disabled until the book's length is known.\n\
                 Set it with: folio budget total <chars>"
            ),
        },
    }
}
