//! HTTP remote client integration tests
//!
//! Starts a small axum server that speaks the annotation service protocol
//! and drives it through `HttpRemoteClient` and a hybrid reading session.

use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use folio_core::remote::RemoteError;
use folio_core::{
    Config, HttpRemoteClient, LocalCache, Location, NewNote, ReaderSession,
    RemoteAnnotations, RemoteConfig, SourceKind,
};

const TOKEN: &str = "token-7f3a";
const BOOK: &str = "9780142437247";

#[derive(Default)]
struct ServerState {
    logins: usize,
    requests: Vec<String>,
    bodies: Vec<Value>,
    location: Option<Value>,
}

type Shared = Arc<Mutex<ServerState>>;

/// Record the request and check its bearer token
fn authorize(
    state: &Shared,
    method: &Method,
    uri: &Uri,
    headers: &HeaderMap,
) -> Result<(), StatusCode> {
    state
        .lock()
        .unwrap()
        .requests
        .push(format!("{} {}", method, uri.path()));

    let expected = format!("Bearer {}", TOKEN);
    match headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some(value) if value == expected => Ok(()),
        _ => Err(StatusCode::UNAUTHORIZED),
    }
}

async fn login(
    State(state): State<Shared>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    state.lock().unwrap().logins += 1;
    if body["username"] == "reader" && body["password"] == "secret" {
        Ok(Json(json!({ "accessToken": TOKEN })))
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}

async fn list_highlights(
    State(state): State<Shared>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Json<Value>, StatusCode> {
    authorize(&state, &method, &uri, &headers)?;
    Ok(Json(json!([
        {
            "id": 17,
            "cfi": "epubcfi(/6/4!/4/2)",
            "text": "Call me Ishmael.",
            "color": "blue",
            "type": "highlight",
            "createdAt": "2024-03-01T10:00:00Z"
        },
        { "id": 18, "text": "no anchor" },
        {
            "id": "u-1",
            "cfi": "epubcfi(/6/8!/4/2)",
            "text": "Some years ago",
            "type": "underline"
        }
    ])))
}

async fn list_bookmarks(
    State(state): State<Shared>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Json<Value>, StatusCode> {
    authorize(&state, &method, &uri, &headers)?;
    Ok(Json(json!([
        { "id": "b-1", "cfi": "epubcfi(/6/12)", "label": "Chapter 3", "page": 41 }
    ])))
}

async fn list_notes(
    State(state): State<Shared>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Json<Value>, StatusCode> {
    authorize(&state, &method, &uri, &headers)?;
    Ok(Json(json!([])))
}

async fn get_location(
    State(state): State<Shared>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Json<Value>, StatusCode> {
    authorize(&state, &method, &uri, &headers)?;
    let location = state.lock().unwrap().location.clone();
    location.map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn get_copy_protection(
    State(state): State<Shared>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> StatusCode {
    match authorize(&state, &method, &uri, &headers) {
        Ok(()) => StatusCode::INTERNAL_SERVER_ERROR,
        Err(status) => status,
    }
}

async fn get_preferences(
    State(state): State<Shared>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> StatusCode {
    match authorize(&state, &method, &uri, &headers) {
        Ok(()) => StatusCode::OK,
        Err(status) => status,
    }
}

/// Accept any write, keeping its body
async fn write(
    State(state): State<Shared>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Option<Json<Value>>,
) -> StatusCode {
    if let Err(status) = authorize(&state, &method, &uri, &headers) {
        return status;
    }

    let mut state = state.lock().unwrap();
    if let Some(Json(body)) = body {
        if uri.path().ends_with("/location") {
            state.location = Some(body.clone());
        }
        state.bodies.push(body);
    }

    if method == Method::POST {
        StatusCode::CREATED
    } else {
        StatusCode::NO_CONTENT
    }
}

/// Bind to port 0 and return the base URL
async fn start_server(state: Shared) -> String {
    let app = Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/books/:book/highlights", get(list_highlights).post(write))
        .route("/api/books/:book/bookmarks", get(list_bookmarks).post(write))
        .route("/api/books/:book/notes", get(list_notes).post(write))
        .route("/api/books/:book/highlights/:id", delete(write))
        .route("/api/books/:book/bookmarks/:id", delete(write))
        .route("/api/books/:book/notes/:id", delete(write))
        .route("/api/books/:book/location", get(get_location).put(write))
        .route(
            "/api/books/:book/copy-protection",
            get(get_copy_protection).put(write),
        )
        .route("/api/users/me/preferences", get(get_preferences).put(write))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/api")
}

fn remote_config(base_url: &str, password: &str) -> RemoteConfig {
    RemoteConfig {
        base_url: base_url.to_string(),
        username: "reader".to_string(),
        password: password.to_string(),
    }
}

async fn client() -> (HttpRemoteClient, Shared) {
    let state = Shared::default();
    let base = start_server(state.clone()).await;
    let client = HttpRemoteClient::new(&remote_config(&base, "secret")).unwrap();
    (client, state)
}

#[tokio::test]
async fn fetch_annotations_logs_in_once_and_normalizes() {
    let (client, state) = client().await;

    let set = client.fetch_annotations(BOOK).await.unwrap();

    assert_eq!(set.highlights.len(), 2);
    assert_eq!(set.highlights[0].id.as_deref(), Some("17"));
    assert_eq!(set.highlights[0].color.as_deref(), Some("blue"));
    assert_eq!(set.highlights[1].cfi, "epubcfi(/6/8!/4/2)");
    assert_eq!(set.highlights[1].kind.to_string(), "underline");
    assert_eq!(set.bookmarks[0].page, Some(41));
    assert!(set.notes.is_empty());

    let state = state.lock().unwrap();
    assert_eq!(state.logins, 1);
    assert_eq!(state.requests.len(), 3);
}

#[tokio::test]
async fn add_note_posts_camel_case_record() {
    let (client, state) = client().await;
    let note = NewNote::new("epubcfi(/6/14)", "Whenever it is a damp", "November in my soul")
        .into_record(chrono::Utc::now());

    client.add_note(BOOK, &note).await.unwrap();

    let state = state.lock().unwrap();
    assert_eq!(state.logins, 1);
    assert_eq!(state.requests, vec![format!("POST /api/books/{}/notes", BOOK)]);
    assert_eq!(state.bodies[0]["note"], "November in my soul");
    assert!(state.bodies[0].get("createdAt").is_some());
}

#[tokio::test]
async fn delete_targets_remote_id() {
    let (client, state) = client().await;

    client.delete_highlight(BOOK, "17").await.unwrap();

    assert_eq!(
        state.lock().unwrap().requests,
        vec![format!("DELETE /api/books/{}/highlights/17", BOOK)]
    );
}

#[tokio::test]
async fn each_operation_logs_in_again() {
    let (client, state) = client().await;

    client.delete_bookmark(BOOK, "b-1").await.unwrap();
    client.delete_note(BOOK, "n-1").await.unwrap();

    assert_eq!(state.lock().unwrap().logins, 2);
}

#[tokio::test]
async fn missing_location_is_none_until_written() {
    let (client, _state) = client().await;

    assert!(client.fetch_location(BOOK).await.unwrap().is_none());

    client
        .update_location(BOOK, &Location::new("epubcfi(/6/20)", 0.4))
        .await
        .unwrap();
    let location = client.fetch_location(BOOK).await.unwrap().unwrap();
    assert_eq!(location.cfi, "epubcfi(/6/20)");
    assert_eq!(location.progress, Some(0.4));
}

#[tokio::test]
async fn empty_preferences_body_is_none() {
    let (client, _state) = client().await;
    assert!(client.fetch_preferences().await.unwrap().is_none());
}

#[tokio::test]
async fn server_error_is_status_error() {
    let (client, _state) = client().await;

    let err = client.fetch_copy_protection(BOOK).await.unwrap_err();
    assert!(matches!(err, RemoteError::Status { status: 500, .. }));
}

#[tokio::test]
async fn rejected_login_is_auth_error() {
    let state = Shared::default();
    let base = start_server(state.clone()).await;
    let client = HttpRemoteClient::new(&remote_config(&base, "wrong")).unwrap();

    let err = client.fetch_annotations(BOOK).await.unwrap_err();
    assert!(matches!(err, RemoteError::Auth(_)));
    assert!(state.lock().unwrap().requests.is_empty());
}

#[tokio::test]
async fn hybrid_session_merges_over_http() {
    let state = Shared::default();
    let base = start_server(state.clone()).await;
    let config = Config {
        sync_enabled: true,
        remote: Some(remote_config(&base, "secret")),
        ..Config::default()
    };
    let cache = Arc::new(LocalCache::open_in_memory().unwrap());

    let session =
        ReaderSession::open_with_cache(&config, cache.clone(), BOOK, Some("books/moby-dick.epub"))
            .unwrap();
    assert_eq!(session.source_kind(), SourceKind::Hybrid);

    let highlights = session.source().get_highlights().await.unwrap();
    assert_eq!(highlights.len(), 2);

    // The merged view was written back to the cache
    let offline =
        ReaderSession::with_remote(&config, cache, BOOK, Some("books/moby-dick.epub"), None);
    assert_eq!(offline.source_kind(), SourceKind::Local);
    assert_eq!(offline.source().get_highlights().await.unwrap(), highlights);

    // A server error on the copy counters falls back to the cache
    assert_eq!(session.source().get_copied_chars().await.unwrap(), 0);
}
