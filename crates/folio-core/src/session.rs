//! Reading session
//!
//! Wires one open book to its data source. The book identifier is
//! classified once here; the result picks the local-only or hybrid source
//! and is carried for the rest of the session.
//!
//! ## Usage
//!
//! ```ignore
//! let config = Config::load()?;
//! let session = ReaderSession::open(&config, "9780142437247", Some("books/moby-dick.epub"))?;
//!
//! let highlights = session.source().get_highlights().await?;
//! ```

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::config::Config;
use crate::identity::{BookIdentity, IdentityResolver};
use crate::remote::{HttpRemoteClient, RemoteAnnotations};
use crate::source::{DataSource, HybridDataSource, LocalDataSource, SourceKind};
use crate::storage::LocalCache;

/// One book opened for reading
pub struct ReaderSession {
    book_id: String,
    locator: String,
    identity: BookIdentity,
    source: Arc<dyn DataSource>,
}

impl ReaderSession {
    /// Open a session using the cache at the configured path
    ///
    /// `locator` names the book's cache namespace; it defaults to the book
    /// identifier.
    pub fn open(config: &Config, book_id: &str, locator: Option<&str>) -> Result<Self> {
        config.ensure_data_dir()?;
        let cache = LocalCache::open(&config.cache_path()).context("Failed to open local cache")?;
        Self::open_with_cache(config, Arc::new(cache), book_id, locator)
    }

    /// Open a session on an existing cache
    ///
    /// Builds an HTTP client when remote sync is configured and the book is
    /// known to the remote. A client that cannot be built leaves the session
    /// local-only.
    pub fn open_with_cache(
        config: &Config,
        cache: Arc<LocalCache>,
        book_id: &str,
        locator: Option<&str>,
    ) -> Result<Self> {
        let remote: Option<Arc<dyn RemoteAnnotations>> = match config.active_remote() {
            Some(remote_config) => match HttpRemoteClient::new(remote_config) {
                Ok(client) => Some(Arc::new(client)),
                Err(e) => {
                    warn!(error = %e, "Remote client unavailable, using local cache only");
                    None
                }
            },
            None => None,
        };

        Ok(Self::with_remote(config, cache, book_id, locator, remote))
    }

    /// Open a session with an explicit remote (or none)
    pub fn with_remote(
        config: &Config,
        cache: Arc<LocalCache>,
        book_id: &str,
        locator: Option<&str>,
        remote: Option<Arc<dyn RemoteAnnotations>>,
    ) -> Self {
        let book_id = book_id.trim().to_string();
        let locator = locator
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(book_id.as_str())
            .to_string();

        let identity = IdentityResolver::from_config(config).classify(&book_id);
        let local = LocalDataSource::new(cache, locator.clone(), config.copy_allowance_percentage);

        let source: Arc<dyn DataSource> = match (identity.remote_id(), remote) {
            (Some(remote_id), Some(remote)) => {
                Arc::new(HybridDataSource::new(local, remote, remote_id))
            }
            _ => Arc::new(local),
        };

        debug!(
            book = %book_id,
            locator = %locator,
            identity = %identity,
            source = %source.kind(),
            "Opened reading session"
        );

        Self {
            book_id,
            locator,
            identity,
            source,
        }
    }

    pub fn book_id(&self) -> &str {
        &self.book_id
    }

    pub fn locator(&self) -> &str {
        &self.locator
    }

    pub fn identity(&self) -> &BookIdentity {
        &self.identity
    }

    /// The data source for this book
    pub fn source(&self) -> &dyn DataSource {
        self.source.as_ref()
    }

    pub fn source_kind(&self) -> SourceKind {
        self.source.kind()
    }
}
