//! Error types for TeamCity API calls.
//!
//! Every operation returns [`Result`]. Errors fall into four groups:
//! transport failures (the request never produced a response), HTTP
//! rejections (the server answered with a non-2xx status), decode failures
//! (the body did not match the expected shape) and domain absence (the
//! server answered but the entity is not there).

use http::StatusCode;

/// Number of payload characters kept in [`Error::DeserializationFailed`].
pub const MAX_SNIPPET_CHARS: usize = 1000;

/// The main error type for TeamCity API calls.
///
/// # Examples
///
/// ```no_run
/// use teamcity_client::{Client, Error};
///
/// # async fn example() -> Result<(), Error> {
/// let client = Client::builder()
///     .host("teamcity.example.com")
///     .credentials("user", "secret")
///     .build()?;
///
/// match client.get_build("42").await {
///     Ok(build) => println!("{} is {}", build.id, build.state),
///     Err(Error::NotFound(what)) => eprintln!("{}", what),
///     Err(Error::DeserializationFailed { raw_response, serde_error }) => {
///         eprintln!("Unexpected payload ({}): {}", serde_error, raw_response);
///     }
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A network-level error reported by `reqwest` (connection refused, DNS,
    /// body read failure).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The request exceeded the transport's timeout.
    #[error("Request timed out")]
    Timeout,

    /// A transport-level failure from a custom [`Transport`](crate::Transport).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The server returned a non-2xx HTTP status code.
    #[error("HTTP error {status}: {raw_response}")]
    HttpError {
        /// The HTTP status code
        status: StatusCode,
        /// The raw response body
        raw_response: String,
    },

    /// The response body did not decode into the expected shape.
    ///
    /// `raw_response` holds at most [`MAX_SNIPPET_CHARS`] characters of
    /// the payload.
    #[error("json unmarshal: {serde_error} ({raw_response:?})")]
    DeserializationFailed {
        /// The serde error message
        serde_error: String,
        /// Leading part of the offending payload
        raw_response: String,
    },

    /// The request body could not be encoded as JSON.
    #[error("Failed to serialize request: {0}")]
    SerializationFailed(String),

    /// A well-formed response did not contain the requested entity.
    #[error("{0}")]
    NotFound(String),

    /// The client was configured incorrectly.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The resolved request URL could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl Error {
    /// Builds a [`Error::DeserializationFailed`] from a serde error and the
    /// payload that caused it.
    pub(crate) fn deserialization(err: &serde_json::Error, payload: &[u8]) -> Self {
        Error::DeserializationFailed {
            serde_error: err.to_string(),
            raw_response: truncate(&String::from_utf8_lossy(payload), MAX_SNIPPET_CHARS),
        }
    }

    /// Returns `true` if this error is potentially transient.
    ///
    /// Network errors, timeouts, custom transport failures, 5xx and 429
    /// responses are retryable. Other HTTP errors, decode failures and
    /// domain absence are permanent.
    ///
    /// # Examples
    ///
    /// ```
    /// use teamcity_client::Error;
    /// use http::StatusCode;
    ///
    /// let err = Error::HttpError {
    ///     status: StatusCode::BAD_GATEWAY,
    ///     raw_response: "upstream down".to_string(),
    /// };
    /// assert!(err.is_retryable());
    ///
    /// let err = Error::HttpError {
    ///     status: StatusCode::UNAUTHORIZED,
    ///     raw_response: "Incorrect username or password".to_string(),
    /// };
    /// assert!(!err.is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Network(_) => true,
            Error::Timeout => true,
            Error::Transport(_) => true,
            Error::HttpError { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            Error::DeserializationFailed { .. } => false,
            Error::SerializationFailed(_) => false,
            Error::NotFound(_) => false,
            Error::ConfigurationError(_) => false,
            Error::InvalidUrl(_) => false,
        }
    }

    /// Returns the HTTP status code for [`Error::HttpError`].
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::HttpError { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the (possibly truncated) response body carried by the error.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Error::HttpError { raw_response, .. } => Some(raw_response),
            Error::DeserializationFailed { raw_response, .. } => Some(raw_response),
            _ => None,
        }
    }
}

/// Keeps the first `max` characters of `s`.
pub(crate) fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

/// A specialized `Result` type for TeamCity API calls.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_keeps_short_strings() {
        assert_eq!(truncate("abc", 10), "abc");
        assert_eq!(truncate("", 10), "");
    }

    #[test]
    fn test_truncate_counts_chars_not_bytes() {
        assert_eq!(truncate("ééééé", 3), "ééé");
        assert_eq!(truncate(&"x".repeat(1500), MAX_SNIPPET_CHARS).len(), 1000);
    }

    #[test]
    fn test_deserialization_snippet_is_bounded() {
        let payload = format!("{{\"build\": [{}", "1,".repeat(2000));
        let serde_err = serde_json::from_str::<serde_json::Value>(&payload).unwrap_err();
        let err = Error::deserialization(&serde_err, payload.as_bytes());

        let raw = err.raw_response().unwrap();
        assert_eq!(raw.chars().count(), MAX_SNIPPET_CHARS);
        assert!(payload.starts_with(raw));
        assert!(err.to_string().starts_with("json unmarshal: "));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(Error::Timeout.is_retryable());
        assert!(Error::Transport("connection reset".into()).is_retryable());
        assert!(Error::HttpError {
            status: StatusCode::TOO_MANY_REQUESTS,
            raw_response: String::new(),
        }
        .is_retryable());
        assert!(!Error::HttpError {
            status: StatusCode::NOT_FOUND,
            raw_response: String::new(),
        }
        .is_retryable());
        assert!(!Error::NotFound("build not found".into()).is_retryable());
        assert!(!Error::DeserializationFailed {
            serde_error: "expected value".into(),
            raw_response: "<html>".into(),
        }
        .is_retryable());
    }

    #[test]
    fn test_status_accessor() {
        let err = Error::HttpError {
            status: StatusCode::FORBIDDEN,
            raw_response: "nope".into(),
        };
        assert_eq!(err.status(), Some(StatusCode::FORBIDDEN));
        assert_eq!(err.raw_response(), Some("nope"));
        assert_eq!(Error::Timeout.status(), None);
    }
}
