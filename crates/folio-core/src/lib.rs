//! Folio Core Library
//!
//! Reading-state synchronization for an e-book reader: bookmarks,
//! highlights, notes, current location, copy-protection budget and reader
//! preferences, reconciled between a durable local cache and a remote
//! annotation service that may be unreachable at any time.
//!
//! # Architecture
//!
//! - **Local cache**: SQLite key-value store, the durable copy
//! - **Remote service**: authoritative on conflicts, best effort on writes
//!
//! Reads merge both sides and write the result back to the cache. Writes
//! land locally first. Remote failures are logged and never reach callers.
//!
//! # Quick Start
//!
//! ```text
//! let config = Config::load()?;
//! let session = ReaderSession::open(&config, "9780142437247", None)?;
//!
//! // Add a highlight
//! session
//!     .source()
//!     .add_highlight(NewHighlight::new("epubcfi(/6/4!/4/2)", "Call me Ishmael"))
//!     .await?;
//!
//! // Query highlights (merged with the remote when reachable)
//! let highlights = session.source().get_highlights().await?;
//! ```
//!
//! # Modules
//!
//! - `session`: Opens a book and picks its data source (main entry point)
//! - `source`: The `DataSource` interface and its two implementations
//! - `models`: Highlights, bookmarks, notes, location and preferences
//! - `identity`: Book identifier classification
//! - `budget`: Copy-protection arithmetic
//! - `remote`: Remote annotation service client
//! - `storage`: SQLite-backed local cache
//! - `config`: Application configuration

pub mod budget;
pub mod config;
pub mod identity;
pub mod models;
pub mod remote;
pub mod session;
pub mod source;
pub mod storage;

pub use budget::{CopyBudget, CopyOutcome};
pub use config::{Config, RemoteConfig};
pub use identity::{BookIdentity, IdentityResolver};
pub use models::{
    Bookmark, Highlight, HighlightKind, Location, NewBookmark, NewHighlight, NewNote, Note,
    ReaderPreferences,
};
pub use remote::{HttpRemoteClient, RemoteAnnotations, RemoteError};
pub use session::ReaderSession;
pub use source::{DataSource, HybridDataSource, LocalDataSource, SourceKind, SyncWarning};
pub use storage::{LocalCache, StorageError};
