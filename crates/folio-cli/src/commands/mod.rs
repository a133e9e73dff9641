//! Command handlers

pub mod bookmark;
pub mod budget;
pub mod config;
pub mod highlight;
pub mod identify;
pub mod location;
pub mod note;
pub mod prefs;
pub mod status;

use anyhow::{bail, Result};

use folio_core::models::is_valid_cfi;

/// Reject positions that are not `epubcfi(...)` expressions
pub(crate) fn require_cfi(cfi: &str) -> Result<()> {
    if !is_valid_cfi(cfi) {
        bail!(
            "Not a valid position: '{}'\n\
             Positions look like: epubcfi(/6/4!/4/2/1:0)",
            cfi
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_cfi() {
        assert!(require_cfi("epubcfi(/6/4!/4/2)").is_ok());
        assert!(require_cfi("page 12").is_err());
        assert!(require_cfi("epubcfi()").is_err());
    }
}
