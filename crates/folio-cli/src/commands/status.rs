//! Status command handler

use anyhow::{Context, Result};

use folio_core::{Config, LocalCache, ReaderSession};

use crate::output::{Output, OutputFormat};

/// Show status information
///
/// With a book selected, also shows how that book is synced.
pub fn show(
    config: &Config,
    book: Option<&str>,
    locator: Option<&str>,
    output: &Output,
) -> Result<()> {
    let cache_path = config.cache_path();
    let cache = LocalCache::open(&cache_path).context("Failed to open local cache")?;
    let entries = cache.entry_count().context("Failed to read local cache")?;
    let remote = config.active_remote();

    let session = match book.filter(|b| !b.trim().is_empty()) {
        Some(book) => Some(ReaderSession::open_with_cache(
            config,
            std::sync::Arc::new(cache),
            book,
            locator,
        )?),
        None => None,
    };

    match output.format {
        OutputFormat::Json => {
            let book = session.as_ref().map(|s| {
                serde_json::json!({
                    "id": s.book_id(),
                    "locator": s.locator(),
                    "remote": s.identity().is_remote(),
                    "resolved_id": s.identity().remote_id(),
                    "source": s.source_kind().to_string(),
                })
            });
            println!(
                "{}",
                serde_json::json!({
                    "sync_enabled": config.sync_enabled,
                    "remote_url": remote.map(|r| r.base_url.as_str()),
                    "cache": {
                        "path": cache_path,
                        "entries": entries
                    },
                    "book": book
                })
            );
        }
        OutputFormat::Quiet => {
            let source = session.as_ref().map(|s| s.source_kind().to_string());
            println!("{}", source.unwrap_or_else(|| entries.to_string()));
        }
        OutputFormat::Human => {
            println!("Folio Status");
            println!("============");
            println!();
            println!("Sync:");
            println!(
                "  Status: {}",
                if remote.is_some() { "enabled" } else { "disabled" }
            );
            if let Some(remote) = remote {
                println!("  Server: {}", remote.base_url);
            }
            println!();
            println!("Cache:");
            println!("  Location: {}", cache_path.display());
            println!("  Entries:  {}", entries);

            if let Some(session) = &session {
                println!();
                println!("Book:");
                println!("  ID:       {}", session.book_id());
                println!("  Locator:  {}", session.locator());
                println!("  Identity: {}", session.identity());
                println!("  Source:   {}", session.source_kind());
            }
        }
    }

    Ok(())
}
