//! Merge and fallback helpers for the hybrid source
//!
//! `merge_by_cfi` reconciles a local and a remote list. `SyncWarning` and
//! [`Fallback`] turn every remote failure into "use the local value" in one
//! place instead of at each call site.

use std::collections::HashMap;

use thiserror::Error;
use tracing::{debug, warn};

use crate::models::Annotation;
use crate::remote::RemoteError;

/// Concatenate `local` then `remote` and keep one record per CFI
///
/// When a CFI appears more than once the later record wins, so remote
/// records replace local ones. The result keeps the position of each CFI's
/// first appearance. Timestamps play no part.
pub fn merge_by_cfi<T: Annotation>(local: Vec<T>, remote: Vec<T>) -> Vec<T> {
    let mut merged: Vec<T> = Vec::with_capacity(local.len() + remote.len());
    let mut positions: HashMap<String, usize> = HashMap::new();

    for record in local.into_iter().chain(remote) {
        match positions.get(record.cfi()) {
            Some(&index) => merged[index] = record,
            None => {
                positions.insert(record.cfi().to_string(), merged.len());
                merged.push(record);
            }
        }
    }

    merged
}

/// A remote call that failed and was absorbed
#[derive(Debug, Error)]
#[error("remote {operation} failed for book '{book}': {source}")]
pub struct SyncWarning {
    pub operation: &'static str,
    pub book: String,
    #[source]
    pub source: RemoteError,
}

/// Turn the outcome of a remote call into a local decision
pub trait Fallback<T> {
    /// The remote value, or `None` after logging the failure
    fn ok_or_log(self) -> Option<T>;

    /// The remote value, or `local` after logging the failure
    fn or_local(self, local: T) -> T
    where
        Self: Sized,
    {
        self.ok_or_log().unwrap_or(local)
    }

    /// For write-through calls whose result is not needed
    fn settle(self)
    where
        Self: Sized,
    {
        let _ = self.ok_or_log();
    }
}

impl<T> Fallback<T> for Result<T, SyncWarning> {
    fn ok_or_log(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(warning) => {
                warn!(
                    book = %warning.book,
                    operation = warning.operation,
                    error = %warning.source,
                    "Remote sync failed, using local data"
                );
                None
            }
        }
    }
}

/// Attach operation context to a remote result
pub(crate) fn annotate<T>(
    operation: &'static str,
    book: &str,
    result: Result<T, RemoteError>,
) -> Result<T, SyncWarning> {
    match result {
        Ok(value) => {
            debug!(book, operation, "Remote call succeeded");
            Ok(value)
        }
        Err(source) => Err(SyncWarning {
            operation,
            book: book.to_string(),
            source,
        }),
    }
}
