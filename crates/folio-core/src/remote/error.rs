//! Remote client errors

use thiserror::Error;

/// Failures talking to the remote annotation service
///
/// The client raises these and never retries; the data sources decide what
/// to do about them.
#[derive(Error, Debug)]
pub enum RemoteError {
    /// Base URL could not be parsed or extended
    #[error("Invalid remote URL: {0}")]
    InvalidUrl(String),

    /// Login was rejected or returned no token
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Connection refused, DNS failure, reset, timeout from the transport
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// Server answered with a non-success status
    #[error("Remote returned {status} for {url}")]
    Status { status: u16, url: String },

    /// Response body did not have the expected shape
    #[error("Malformed response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for RemoteError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            return RemoteError::Decode(error.to_string());
        }
        if let Some(status) = error.status() {
            return RemoteError::Status {
                status: status.as_u16(),
                url: error.url().map(|u| u.to_string()).unwrap_or_default(),
            };
        }
        RemoteError::Network(error)
    }
}

impl From<serde_json::Error> for RemoteError {
    fn from(error: serde_json::Error) -> Self {
        RemoteError::Decode(error.to_string())
    }
}

/// Result type for remote operations
pub type RemoteResult<T> = Result<T, RemoteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display() {
        let err = RemoteError::Status {
            status: 503,
            url: "https://books.example.com/books/1/notes".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("503"));
        assert!(msg.contains("/books/1/notes"));
    }

    #[test]
    fn test_json_error_is_decode() {
        let json_err = serde_json::from_str::<u64>("nope").unwrap_err();
        assert!(matches!(RemoteError::from(json_err), RemoteError::Decode(_)));
    }
}
