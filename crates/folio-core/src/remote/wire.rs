//! Wire shapes of the remote annotation service
//!
//! Remote records are looser than the domain models: ids may be numbers,
//! timestamps and excerpts may be missing. `normalize` turns them into
//! domain records, generating `createdAt` where the service left it out.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::models::{Bookmark, Highlight, HighlightKind, Location, Note};

/// Accept ids sent either as strings or as numbers
fn flexible_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Accept known highlight types; anything else falls back to the default
fn lenient_kind<'de, D>(deserializer: D) -> Result<Option<HighlightKind>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(value) => match HighlightKind::deserialize(&value) {
            Ok(kind) => Some(kind),
            Err(_) => {
                debug!(kind = %value, "Unknown remote highlight type");
                None
            }
        },
        None => None,
    })
}

/// Accept page numbers sent as numbers or numeric strings
fn lenient_page<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    #[serde(alias = "accessToken", alias = "access_token")]
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteHighlight {
    #[serde(default, deserialize_with = "flexible_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub cfi: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "lenient_kind")]
    pub kind: Option<HighlightKind>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl RemoteHighlight {
    pub fn normalize(self, now: DateTime<Utc>) -> Option<Highlight> {
        let cfi = self.cfi.filter(|c| !c.is_empty())?;
        Some(Highlight {
            cfi,
            text: self.text,
            color: self.color,
            kind: self.kind.unwrap_or_default(),
            created_at: self.created_at.unwrap_or(now),
            id: self.id,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteBookmark {
    #[serde(default, deserialize_with = "flexible_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub cfi: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub chapter: Option<String>,
    #[serde(default, deserialize_with = "lenient_page")]
    pub page: Option<u32>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl RemoteBookmark {
    pub fn normalize(self, now: DateTime<Utc>) -> Option<Bookmark> {
        let cfi = self.cfi.filter(|c| !c.is_empty())?;
        Some(Bookmark {
            cfi,
            label: self.label,
            chapter: self.chapter,
            page: self.page,
            created_at: self.created_at.unwrap_or(now),
            id: self.id,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteNote {
    #[serde(default, deserialize_with = "flexible_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub cfi: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl RemoteNote {
    pub fn normalize(self, now: DateTime<Utc>) -> Option<Note> {
        let cfi = self.cfi.filter(|c| !c.is_empty())?;
        Some(Note {
            cfi,
            text: self.text,
            note: self.note,
            created_at: self.created_at.unwrap_or(now),
            id: self.id,
        })
    }
}

/// Normalize a batch, dropping records without a CFI
pub(crate) fn normalize_all<R, T>(
    records: Vec<R>,
    now: DateTime<Utc>,
    normalize: impl Fn(R, DateTime<Utc>) -> Option<T>,
) -> Vec<T> {
    let total = records.len();
    let normalized: Vec<T> = records
        .into_iter()
        .filter_map(|record| normalize(record, now))
        .collect();
    if normalized.len() < total {
        debug!(
            dropped = total - normalized.len(),
            "Dropped remote records without a cfi"
        );
    }
    normalized
}

/// All annotation categories for one book, already normalized
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteAnnotationSet {
    pub highlights: Vec<Highlight>,
    pub bookmarks: Vec<Bookmark>,
    pub notes: Vec<Note>,
}

/// Location as stored remotely; not yet checked for validity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteLocation {
    #[serde(default)]
    pub cfi: String,
    #[serde(default)]
    pub progress: Option<f64>,
}

impl From<&Location> for RemoteLocation {
    fn from(location: &Location) -> Self {
        Self {
            cfi: location.cfi.clone(),
            progress: Some(location.progress),
        }
    }
}

/// Copy-protection counters held by the remote
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyProtection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_chars: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copied_chars: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowance_percentage: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_ids_become_strings() {
        let json = r#"{"id": 42, "cfi": "c1", "text": "t"}"#;
        let remote: RemoteHighlight = serde_json::from_str(json).unwrap();
        assert_eq!(remote.id.as_deref(), Some("42"));
    }

    #[test]
    fn test_missing_created_at_is_generated() {
        let now = Utc::now();
        let json = r#"{"id": "n1", "cfi": "c3", "text": "t", "note": "n"}"#;
        let remote: RemoteNote = serde_json::from_str(json).unwrap();

        let note = remote.normalize(now).unwrap();
        assert_eq!(note.created_at, now);
        assert_eq!(note.id.as_deref(), Some("n1"));
    }

    #[test]
    fn test_existing_created_at_is_kept() {
        let json = r#"{"cfi": "c1", "createdAt": "2023-05-01T12:00:00Z"}"#;
        let remote: RemoteBookmark = serde_json::from_str(json).unwrap();

        let bookmark = remote.normalize(Utc::now()).unwrap();
        assert_eq!(bookmark.created_at.to_rfc3339(), "2023-05-01T12:00:00+00:00");
        assert!(bookmark.id.is_none());
    }

    #[test]
    fn test_records_without_cfi_are_dropped() {
        let json = r#"[{"cfi": "c1", "text": "a"}, {"text": "b"}, {"cfi": "", "text": "c"}]"#;
        let remote: Vec<RemoteHighlight> = serde_json::from_str(json).unwrap();

        let highlights = normalize_all(remote, Utc::now(), RemoteHighlight::normalize);
        assert_eq!(highlights.len(), 1);
        assert_eq!(highlights[0].cfi, "c1");
    }

    #[test]
    fn test_underline_type_parsed() {
        let json = r#"{"cfi": "c1", "text": "t", "type": "underline"}"#;
        let remote: RemoteHighlight = serde_json::from_str(json).unwrap();
        let highlight = remote.normalize(Utc::now()).unwrap();
        assert_eq!(highlight.kind, HighlightKind::Underline);
    }

    #[test]
    fn test_unknown_type_does_not_reject_batch() {
        let json = r#"[
            {"cfi": "c1", "text": "a", "type": "strikethrough"},
            {"cfi": "c2", "text": "b", "type": "underline"}
        ]"#;
        let remote: Vec<RemoteHighlight> = serde_json::from_str(json).unwrap();

        let highlights = normalize_all(remote, Utc::now(), RemoteHighlight::normalize);
        assert_eq!(highlights.len(), 2);
        assert_eq!(highlights[0].kind, HighlightKind::Highlight);
        assert_eq!(highlights[1].kind, HighlightKind::Underline);
    }

    #[test]
    fn test_page_accepts_strings() {
        let json = r#"[
            {"cfi": "c1", "page": "12"},
            {"cfi": "c2", "page": 7},
            {"cfi": "c3", "page": "xii"},
            {"cfi": "c4", "page": null}
        ]"#;
        let remote: Vec<RemoteBookmark> = serde_json::from_str(json).unwrap();

        let pages: Vec<Option<u32>> = remote.into_iter().map(|b| b.page).collect();
        assert_eq!(pages, vec![Some(12), Some(7), None, None]);
    }

    #[test]
    fn test_login_response_aliases() {
        let a: LoginResponse = serde_json::from_str(r#"{"token": "t1"}"#).unwrap();
        let b: LoginResponse = serde_json::from_str(r#"{"accessToken": "t2"}"#).unwrap();
        assert_eq!(a.token.as_deref(), Some("t1"));
        assert_eq!(b.token.as_deref(), Some("t2"));
    }

    #[test]
    fn test_copy_protection_partial() {
        let status: CopyProtection = serde_json::from_str(r#"{"copiedChars": 120}"#).unwrap();
        assert_eq!(status.copied_chars, Some(120));
        assert!(status.total_chars.is_none());
        assert!(status.allowance_percentage.is_none());
    }
}
