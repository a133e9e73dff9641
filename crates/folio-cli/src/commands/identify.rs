//! Identify command handler

use anyhow::Result;

use folio_core::{BookIdentity, Config, IdentityResolver};

use crate::output::{Output, OutputFormat};

/// Show how a book identifier is classified
pub fn show(config: &Config, book_id: &str, output: &Output) -> Result<()> {
    let identity = IdentityResolver::from_config(config).classify(book_id);

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "book": book_id.trim(),
                    "remote": identity.is_remote(),
                    "resolved_id": identity.remote_id(),
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", identity.remote_id().unwrap_or(""));
        }
        OutputFormat::Human => {
            println!("Book:     {}", book_id.trim());
            println!("Identity: {}", identity);
            if let BookIdentity::LocalBook = identity {
                println!();
                println!("Annotations for this book stay in the local cache.");
            } else if config.active_remote().is_none() {
                println!();
                println!("Remote sync is not configured; annotations stay local for now.");
            }
        }
    }

    Ok(())
}
