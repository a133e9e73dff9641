//! Data models for Folio
//!
//! Per-book reading state: highlights, bookmarks, notes, the current
//! location and reader preferences. Every annotation is keyed by its CFI,
//! the position reference handed out by the rendering engine.
//!
//! Records serialize with camelCase field names so the cached JSON and the
//! remote wire format share one shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Prefix every well-formed position reference starts with
const CFI_PREFIX: &str = "epubcfi(";

/// Check whether a string looks like a usable position reference
///
/// Accepts `epubcfi(...)` with a non-empty body. Anything else (empty
/// strings, page numbers, bare paths) is rejected.
pub fn is_valid_cfi(cfi: &str) -> bool {
    let cfi = cfi.trim();
    cfi.len() > CFI_PREFIX.len() + 1 && cfi.starts_with(CFI_PREFIX) && cfi.ends_with(')')
}

/// Any annotation record that is keyed by a CFI
pub trait Annotation {
    fn cfi(&self) -> &str;
    fn remote_id(&self) -> Option<&str>;
}

/// How a highlight is painted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightKind {
    #[default]
    Highlight,
    Underline,
}

impl std::fmt::Display for HighlightKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HighlightKind::Highlight => write!(f, "highlight"),
            HighlightKind::Underline => write!(f, "underline"),
        }
    }
}

/// A highlighted passage
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Highlight {
    pub cfi: String,
    /// Captured excerpt
    pub text: String,
    /// Present when `kind` is a color highlight
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: HighlightKind,
    pub created_at: DateTime<Utc>,
    /// Identifier assigned by the remote service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// A saved position
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    pub cfi: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// A user note anchored to a passage
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub cfi: String,
    /// Anchor excerpt
    pub text: String,
    /// User-authored content
    pub note: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

macro_rules! impl_annotation {
    ($($ty:ty),*) => {
        $(impl Annotation for $ty {
            fn cfi(&self) -> &str {
                &self.cfi
            }

            fn remote_id(&self) -> Option<&str> {
                self.id.as_deref()
            }
        })*
    };
}

impl_annotation!(Highlight, Bookmark, Note);

/// Input for creating a highlight (no timestamp, no remote id)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewHighlight {
    pub cfi: String,
    pub text: String,
    pub color: Option<String>,
    pub kind: HighlightKind,
}

impl NewHighlight {
    pub fn new(cfi: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            cfi: cfi.into(),
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn underline(mut self) -> Self {
        self.kind = HighlightKind::Underline;
        self
    }

    /// Stamp the record with its creation time
    pub fn into_record(self, created_at: DateTime<Utc>) -> Highlight {
        Highlight {
            cfi: self.cfi,
            text: self.text,
            color: self.color,
            kind: self.kind,
            created_at,
            id: None,
        }
    }
}

/// Input for creating a bookmark
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewBookmark {
    pub cfi: String,
    pub label: Option<String>,
    pub chapter: Option<String>,
    pub page: Option<u32>,
}

impl NewBookmark {
    pub fn new(cfi: impl Into<String>) -> Self {
        Self {
            cfi: cfi.into(),
            ..Self::default()
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn into_record(self, created_at: DateTime<Utc>) -> Bookmark {
        Bookmark {
            cfi: self.cfi,
            label: self.label,
            chapter: self.chapter,
            page: self.page,
            created_at,
            id: None,
        }
    }
}

/// Input for creating a note
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewNote {
    pub cfi: String,
    pub text: String,
    pub note: String,
}

impl NewNote {
    pub fn new(cfi: impl Into<String>, text: impl Into<String>, note: impl Into<String>) -> Self {
        Self {
            cfi: cfi.into(),
            text: text.into(),
            note: note.into(),
        }
    }

    pub fn into_record(self, created_at: DateTime<Utc>) -> Note {
        Note {
            cfi: self.cfi,
            text: self.text,
            note: self.note,
            created_at,
            id: None,
        }
    }
}

/// Current reading position; superseded on every navigation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub cfi: String,
    /// Fraction of the book read, 0.0..=1.0
    #[serde(default)]
    pub progress: f64,
}

impl Location {
    /// Progress is clamped to 0.0..=1.0; a non-finite value becomes 0.0
    pub fn new(cfi: impl Into<String>, progress: f64) -> Self {
        let progress = if progress.is_finite() {
            progress.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            cfi: cfi.into(),
            progress,
        }
    }
}

/// Theme and typography configuration
///
/// Saved wholesale; there is no field-level merge between copies.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ReaderPreferences {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_height: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_cfi() {
        assert!(is_valid_cfi("epubcfi(/6/4[chap01ref]!/4/2/1:0)"));
        assert!(is_valid_cfi("  epubcfi(/6/2)  "));
        assert!(!is_valid_cfi("epubcfi()"));
        assert!(!is_valid_cfi("/6/4!/4/2"));
        assert!(!is_valid_cfi("page-12"));
        assert!(!is_valid_cfi(""));
        assert!(!is_valid_cfi("epubcfi(/6/4"));
    }

    #[test]
    fn test_new_highlight_into_record() {
        let now = Utc::now();
        let highlight = NewHighlight::new("c1", "some text")
            .with_color("yellow")
            .into_record(now);

        assert_eq!(highlight.cfi, "c1");
        assert_eq!(highlight.color.as_deref(), Some("yellow"));
        assert_eq!(highlight.kind, HighlightKind::Highlight);
        assert_eq!(highlight.created_at, now);
        assert!(highlight.id.is_none());
    }

    #[test]
    fn test_underline_kind() {
        let highlight = NewHighlight::new("c1", "t").underline().into_record(Utc::now());
        assert_eq!(highlight.kind, HighlightKind::Underline);
        assert_eq!(highlight.kind.to_string(), "underline");
    }

    #[test]
    fn test_highlight_wire_shape() {
        let highlight = NewHighlight::new("c1", "t")
            .with_color("blue")
            .into_record(Utc::now());
        let json = serde_json::to_value(&highlight).unwrap();

        assert_eq!(json["type"], "highlight");
        assert_eq!(json["color"], "blue");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("id").is_none());
    }

    #[test]
    fn test_highlight_missing_type_defaults() {
        let json = r#"{"cfi":"c1","text":"t","createdAt":"2024-01-01T00:00:00Z"}"#;
        let highlight: Highlight = serde_json::from_str(json).unwrap();
        assert_eq!(highlight.kind, HighlightKind::Highlight);
        assert!(highlight.color.is_none());
    }

    #[test]
    fn test_annotation_trait() {
        let mut note = NewNote::new("c3", "t", "n").into_record(Utc::now());
        assert_eq!(note.cfi(), "c3");
        assert!(note.remote_id().is_none());

        note.id = Some("r-9".to_string());
        assert_eq!(note.remote_id(), Some("r-9"));
    }

    #[test]
    fn test_location_clamps_progress() {
        assert_eq!(Location::new("epubcfi(/6/2)", 1.7).progress, 1.0);
        assert_eq!(Location::new("epubcfi(/6/2)", -0.2).progress, 0.0);
    }

    #[test]
    fn test_location_non_finite_progress_is_zero() {
        assert_eq!(Location::new("epubcfi(/6/2)", f64::NAN).progress, 0.0);
        assert_eq!(Location::new("epubcfi(/6/2)", f64::INFINITY).progress, 0.0);

        let json = serde_json::to_string(&Location::new("epubcfi(/6/2)", f64::NAN)).unwrap();
        let parsed: Location = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.progress, 0.0);
    }

    #[test]
    fn test_preferences_partial_json() {
        let prefs: ReaderPreferences =
            serde_json::from_str(r#"{"theme":"sepia","fontSize":18}"#).unwrap();
        assert_eq!(prefs.theme.as_deref(), Some("sepia"));
        assert_eq!(prefs.font_size, Some(18));
        assert!(prefs.font_family.is_none());
    }
}
