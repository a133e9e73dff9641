//! Book identity resolution
//!
//! Decides whether a book identifier belongs to the remote annotation
//! service, and if so which id the service knows it by. The answer picks
//! the data source for a reading session, so it is computed once when the
//! session opens and carried from there.
//!
//! Classification order:
//! 1. static mapping table (configured `book_ids`)
//! 2. 13 digits starting with a recognized publisher prefix (ISBN)
//! 3. any ASCII-alphanumeric string of 10 or more characters
//! 4. everything else is a local-only book

use std::collections::BTreeMap;
use std::fmt;

use crate::config::Config;

/// Length of an ISBN-13
const ISBN_LENGTH: usize = 13;

/// Shortest identifier accepted as a remote id by shape alone
const MIN_REMOTE_ID_LENGTH: usize = 10;

/// Where a book's annotations live
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookIdentity {
    /// Only the local cache knows this book
    LocalBook,
    /// The remote service knows this book as `resolved_id`
    RemoteBook { resolved_id: String },
}

impl BookIdentity {
    pub fn is_remote(&self) -> bool {
        matches!(self, BookIdentity::RemoteBook { .. })
    }

    pub fn remote_id(&self) -> Option<&str> {
        match self {
            BookIdentity::LocalBook => None,
            BookIdentity::RemoteBook { resolved_id } => Some(resolved_id),
        }
    }
}

impl fmt::Display for BookIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookIdentity::LocalBook => write!(f, "local"),
            BookIdentity::RemoteBook { resolved_id } => write!(f, "remote ({})", resolved_id),
        }
    }
}

/// Classifies book identifiers
#[derive(Debug, Clone, Default)]
pub struct IdentityResolver {
    mapping: BTreeMap<String, String>,
    isbn_prefixes: Vec<String>,
}

impl IdentityResolver {
    pub fn new(mapping: BTreeMap<String, String>, isbn_prefixes: Vec<String>) -> Self {
        Self {
            mapping,
            isbn_prefixes,
        }
    }

    /// Build a resolver from the configured mapping table and prefixes
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.book_ids.clone(), config.isbn_prefixes.clone())
    }

    /// Classify a book identifier
    pub fn classify(&self, book_id: &str) -> BookIdentity {
        let book_id = book_id.trim();

        if let Some(mapped) = self.mapping.get(book_id) {
            return BookIdentity::RemoteBook {
                resolved_id: mapped.clone(),
            };
        }

        if self.is_isbn(book_id) || looks_like_remote_id(book_id) {
            return BookIdentity::RemoteBook {
                resolved_id: book_id.to_string(),
            };
        }

        BookIdentity::LocalBook
    }

    fn is_isbn(&self, book_id: &str) -> bool {
        book_id.len() == ISBN_LENGTH
            && book_id.bytes().all(|b| b.is_ascii_digit())
            && self
                .isbn_prefixes
                .iter()
                .any(|prefix| book_id.starts_with(prefix.as_str()))
    }
}

fn looks_like_remote_id(book_id: &str) -> bool {
    book_id.len() >= MIN_REMOTE_ID_LENGTH && book_id.bytes().all(|b| b.is_ascii_alphanumeric())
}
