//! Remote annotation service
//!
//! HTTP client for the book-annotation service that holds the
//! authoritative copy of a reader's notes, highlights, bookmarks, location,
//! copy-protection counters and preferences.
//!
//! ## Protocol
//!
//! 1. `POST /auth/login` with username and password, receive a bearer token
//! 2. Call the per-book endpoint (`/books/{id}/highlights`, `/location`, ...)
//!    with that token
//!
//! Steps 1 and 2 repeat for every logical operation.
//!
//! ## Usage
//!
//! ```ignore
//! let client = HttpRemoteClient::new(&remote_config)?;
//! let set = client.fetch_annotations("9780142437247").await?;
//! ```

mod client;
mod error;
mod wire;

#[cfg(test)]
pub(crate) mod fake;

pub use client::{HttpRemoteClient, RemoteAnnotations};
pub use error::{RemoteError, RemoteResult};
pub use wire::{CopyProtection, RemoteAnnotationSet, RemoteLocation};
