//! Remote annotation client
//!
//! Stateless wrapper around the remote book-annotation service. Every
//! logical operation logs in first and uses the fresh bearer token for its
//! requests; tokens are never cached between operations.
//!
//! Any failure is raised as a [`RemoteError`]. There are no retries and no
//! fallback here, and no timeout beyond the transport's own defaults.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::error::{RemoteError, RemoteResult};
use super::wire::{
    normalize_all, CopyProtection, LoginRequest, LoginResponse, RemoteAnnotationSet,
    RemoteBookmark, RemoteHighlight, RemoteLocation, RemoteNote,
};
use crate::config::RemoteConfig;
use crate::models::{Bookmark, Highlight, Location, Note, ReaderPreferences};

/// Operations the remote annotation service supports
///
/// `book_id` is always the id the remote knows the book by (see
/// [`crate::identity::BookIdentity`]).
#[async_trait]
pub trait RemoteAnnotations: Send + Sync {
    /// Fetch highlights, bookmarks and notes for a book in one go
    async fn fetch_annotations(&self, book_id: &str) -> RemoteResult<RemoteAnnotationSet>;

    async fn add_highlight(&self, book_id: &str, highlight: &Highlight) -> RemoteResult<()>;
    async fn add_bookmark(&self, book_id: &str, bookmark: &Bookmark) -> RemoteResult<()>;
    async fn add_note(&self, book_id: &str, note: &Note) -> RemoteResult<()>;

    async fn delete_highlight(&self, book_id: &str, remote_id: &str) -> RemoteResult<()>;
    async fn delete_bookmark(&self, book_id: &str, remote_id: &str) -> RemoteResult<()>;
    async fn delete_note(&self, book_id: &str, remote_id: &str) -> RemoteResult<()>;

    async fn fetch_location(&self, book_id: &str) -> RemoteResult<Option<RemoteLocation>>;
    async fn update_location(&self, book_id: &str, location: &Location) -> RemoteResult<()>;

    async fn fetch_copy_protection(&self, book_id: &str) -> RemoteResult<Option<CopyProtection>>;
    async fn update_copied_chars(&self, book_id: &str, copied_chars: u64) -> RemoteResult<()>;

    async fn fetch_preferences(&self) -> RemoteResult<Option<ReaderPreferences>>;
    async fn update_preferences(&self, preferences: &ReaderPreferences) -> RemoteResult<()>;
}

/// HTTP implementation of [`RemoteAnnotations`]
pub struct HttpRemoteClient {
    http: reqwest::Client,
    base_url: Url,
    username: String,
    password: String,
}

impl HttpRemoteClient {
    /// Create a client for the configured service
    pub fn new(config: &RemoteConfig) -> RemoteResult<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| RemoteError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(RemoteError::InvalidUrl(config.base_url.clone()));
        }

        let http = reqwest::Client::builder()
            .user_agent(concat!("folio/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(RemoteError::Network)?;

        Ok(Self {
            http,
            base_url,
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    /// The service base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build an endpoint URL from path segments (each segment is escaped)
    pub fn endpoint(&self, segments: &[&str]) -> RemoteResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| RemoteError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Obtain a fresh bearer token
    async fn login(&self) -> RemoteResult<String> {
        let url = self.endpoint(&["auth", "login"])?;
        let response = self
            .http
            .post(url)
            .json(&LoginRequest {
                username: &self.username,
                password: &self.password,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RemoteError::Auth(format!(
                "login returned {}",
                response.status()
            )));
        }

        let body: LoginResponse = response.json().await?;
        body.token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| RemoteError::Auth("login response carried no token".to_string()))
    }

    /// Start an authenticated request against an endpoint
    fn request(
        &self,
        method: Method,
        token: &str,
        segments: &[&str],
    ) -> RemoteResult<reqwest::RequestBuilder> {
        let url = self.endpoint(segments)?;
        debug!(%method, %url, "Remote request");
        Ok(self.http.request(method, url).bearer_auth(token))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        token: &str,
        segments: &[&str],
    ) -> RemoteResult<T> {
        let response = self.request(Method::GET, token, segments)?.send().await?;
        Ok(check_status(response)?.json().await?)
    }

    /// GET a single-value resource; 404 or an empty body means nothing is stored yet
    async fn get_optional<T: DeserializeOwned>(
        &self,
        token: &str,
        segments: &[&str],
    ) -> RemoteResult<Option<T>> {
        let response = self.request(Method::GET, token, segments)?.send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let bytes = check_status(response)?.bytes().await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Log in, then send a JSON body
    async fn write<B: Serialize + ?Sized + Sync>(
        &self,
        method: Method,
        segments: &[&str],
        body: &B,
    ) -> RemoteResult<()> {
        let token = self.login().await?;
        let response = self
            .request(method, &token, segments)?
            .json(body)
            .send()
            .await?;
        check_status(response)?;
        Ok(())
    }

    async fn delete(&self, segments: &[&str]) -> RemoteResult<()> {
        let token = self.login().await?;
        let response = self
            .request(Method::DELETE, &token, segments)?
            .send()
            .await?;
        check_status(response)?;
        Ok(())
    }
}

fn check_status(response: reqwest::Response) -> RemoteResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(RemoteError::Status {
            status: status.as_u16(),
            url: response.url().to_string(),
        })
    }
}

#[async_trait]
impl RemoteAnnotations for HttpRemoteClient {
    async fn fetch_annotations(&self, book_id: &str) -> RemoteResult<RemoteAnnotationSet> {
        let token = self.login().await?;

        let highlights_path = ["books", book_id, "highlights"];
        let bookmarks_path = ["books", book_id, "bookmarks"];
        let notes_path = ["books", book_id, "notes"];

        let (highlights, bookmarks, notes) = tokio::try_join!(
            self.get_json::<Vec<RemoteHighlight>>(&token, &highlights_path),
            self.get_json::<Vec<RemoteBookmark>>(&token, &bookmarks_path),
            self.get_json::<Vec<RemoteNote>>(&token, &notes_path),
        )?;

        let now = Utc::now();
        Ok(RemoteAnnotationSet {
            highlights: normalize_all(highlights, now, RemoteHighlight::normalize),
            bookmarks: normalize_all(bookmarks, now, RemoteBookmark::normalize),
            notes: normalize_all(notes, now, RemoteNote::normalize),
        })
    }

    async fn add_highlight(&self, book_id: &str, highlight: &Highlight) -> RemoteResult<()> {
        self.write(Method::POST, &["books", book_id, "highlights"], highlight)
            .await
    }

    async fn add_bookmark(&self, book_id: &str, bookmark: &Bookmark) -> RemoteResult<()> {
        self.write(Method::POST, &["books", book_id, "bookmarks"], bookmark)
            .await
    }

    async fn add_note(&self, book_id: &str, note: &Note) -> RemoteResult<()> {
        self.write(Method::POST, &["books", book_id, "notes"], note)
            .await
    }

    async fn delete_highlight(&self, book_id: &str, remote_id: &str) -> RemoteResult<()> {
        self.delete(&["books", book_id, "highlights", remote_id]).await
    }

    async fn delete_bookmark(&self, book_id: &str, remote_id: &str) -> RemoteResult<()> {
        self.delete(&["books", book_id, "bookmarks", remote_id]).await
    }

    async fn delete_note(&self, book_id: &str, remote_id: &str) -> RemoteResult<()> {
        self.delete(&["books", book_id, "notes", remote_id]).await
    }

    async fn fetch_location(&self, book_id: &str) -> RemoteResult<Option<RemoteLocation>> {
        let token = self.login().await?;
        self.get_optional(&token, &["books", book_id, "location"])
            .await
    }

    async fn update_location(&self, book_id: &str, location: &Location) -> RemoteResult<()> {
        self.write(
            Method::PUT,
            &["books", book_id, "location"],
            &RemoteLocation::from(location),
        )
        .await
    }

    async fn fetch_copy_protection(&self, book_id: &str) -> RemoteResult<Option<CopyProtection>> {
        let token = self.login().await?;
        self.get_optional(&token, &["books", book_id, "copy-protection"])
            .await
    }

    async fn update_copied_chars(&self, book_id: &str, copied_chars: u64) -> RemoteResult<()> {
        let body = CopyProtection {
            copied_chars: Some(copied_chars),
            ..CopyProtection::default()
        };
        self.write(Method::PUT, &["books", book_id, "copy-protection"], &body)
            .await
    }

    async fn fetch_preferences(&self) -> RemoteResult<Option<ReaderPreferences>> {
        let token = self.login().await?;
        self.get_optional(&token, &["users", "me", "preferences"])
            .await
    }

    async fn update_preferences(&self, preferences: &ReaderPreferences) -> RemoteResult<()> {
        self.write(Method::PUT, &["users", "me", "preferences"], preferences)
            .await
    }
}
