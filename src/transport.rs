//! HTTP transport layer.
//!
//! The [`Client`](crate::Client) builds a fully resolved
//! [`TransportRequest`] (URL, auth and content headers, body) and hands it
//! to a [`Transport`]. The default transport is [`ReqwestTransport`]; tests
//! and callers with their own network policy plug in another implementation
//! through [`ClientBuilder::transport`](crate::ClientBuilder::transport).

use crate::{Error, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue, Method, StatusCode};
use std::time::Duration;
use url::Url;

const APPLICATION_JSON: &str = "application/json";

/// A single request, ready to be sent.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// The HTTP method.
    pub method: Method,
    /// The fully qualified URL.
    pub url: Url,
    /// Authentication and content negotiation headers.
    pub headers: HeaderMap,
    /// The JSON payload, if any.
    pub body: Option<Vec<u8>>,
}

/// What came back from the server: status and raw body.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The raw response body.
    pub body: Vec<u8>,
}

impl TransportResponse {
    /// Creates a response with the given status and body.
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Executes requests on behalf of the client.
///
/// Implementations surface connection and body-read failures as errors and
/// must not retry; retries belong to the [`RetryPolicy`](crate::RetryPolicy).
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use teamcity_client::{Result, Transport, TransportRequest, TransportResponse};
/// use http::StatusCode;
///
/// struct Canned;
///
/// #[async_trait]
/// impl Transport for Canned {
///     async fn send(&self, _request: TransportRequest) -> Result<TransportResponse> {
///         Ok(TransportResponse::new(StatusCode::OK, r#"{"count":0}"#))
///     }
/// }
/// ```
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends the request and returns the status and raw body.
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse>;
}

/// [`Transport`] backed by a pooled `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http_client: reqwest::Client,
    timeout: Option<Duration>,
}

impl ReqwestTransport {
    /// Creates a transport with a fresh connection pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let http_client = reqwest::Client::builder().build().map_err(|e| {
            Error::ConfigurationError(format!("Failed to build HTTP client: {}", e))
        })?;
        Ok(Self::with_client(http_client, timeout))
    }

    /// Wraps an existing `reqwest::Client`.
    pub fn with_client(http_client: reqwest::Client, timeout: Option<Duration>) -> Self {
        Self {
            http_client,
            timeout,
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse> {
        let mut builder = self
            .http_client
            .request(request.method, request.url)
            .headers(request.headers);

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_reqwest_error)?;

        Ok(TransportResponse {
            status,
            body: body.to_vec(),
        })
    }
}

fn map_reqwest_error(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::Timeout
    } else {
        Error::Network(err)
    }
}

/// Joins the configured host and a request path into a URL string.
///
/// A trailing slash on the host is dropped. Hosts that mention `http` (in
/// any case) already carry their scheme; every other host gets `https://`.
///
/// # Examples
///
/// ```
/// use teamcity_client::transport::resolve_url;
///
/// assert_eq!(
///     resolve_url("ci.example.com/", "/httpAuth/app/rest/buildQueue"),
///     "https://ci.example.com/httpAuth/app/rest/buildQueue"
/// );
/// assert_eq!(
///     resolve_url("http://localhost:8111", "/httpAuth/app/rest/buildQueue"),
///     "http://localhost:8111/httpAuth/app/rest/buildQueue"
/// );
/// ```
pub fn resolve_url(host: &str, path: &str) -> String {
    let host = host.strip_suffix('/').unwrap_or(host);
    let prefix = if host.to_lowercase().contains("http") {
        ""
    } else {
        "https://"
    };
    format!("{}{}{}", prefix, host, path)
}

/// Value of the `Authorization` header for HTTP Basic auth.
pub(crate) fn basic_auth_header(username: &str, password: &str) -> Result<HeaderValue> {
    let encoded = STANDARD.encode(format!("{}:{}", username, password));
    let mut value = HeaderValue::try_from(format!("Basic {}", encoded))
        .map_err(|e| Error::ConfigurationError(format!("Invalid credentials: {}", e)))?;
    value.set_sensitive(true);
    Ok(value)
}

/// Headers every request carries; `Content-Type` only when there is a body.
pub(crate) fn request_headers(auth: &HeaderValue, has_body: bool) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, auth.clone());
    headers.insert(ACCEPT, HeaderValue::from_static(APPLICATION_JSON));
    if has_body {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_without_scheme_gets_https() {
        assert_eq!(
            resolve_url("teamcity.example.com", "/httpAuth/app/rest/builds/id:1"),
            "https://teamcity.example.com/httpAuth/app/rest/builds/id:1"
        );
    }

    #[test]
    fn test_trailing_slash_is_stripped() {
        assert_eq!(
            resolve_url("teamcity.example.com/", "/a"),
            "https://teamcity.example.com/a"
        );
        assert_eq!(
            resolve_url("https://teamcity.example.com/", "/a"),
            "https://teamcity.example.com/a"
        );
    }

    #[test]
    fn test_scheme_detection_is_case_insensitive() {
        assert_eq!(resolve_url("HTTP://CI.LOCAL", "/a"), "HTTP://CI.LOCAL/a");
        assert_eq!(resolve_url("Https://ci.local/", "/a"), "Https://ci.local/a");
    }

    #[test]
    fn test_any_http_substring_counts_as_scheme() {
        // Matches on the substring, not a proper scheme check.
        assert_eq!(resolve_url("httpbin.local", "/a"), "httpbin.local/a");
    }

    #[test]
    fn test_basic_auth_header() {
        let value = basic_auth_header("username", "password").unwrap();
        assert_eq!(value.to_str().unwrap(), "Basic dXNlcm5hbWU6cGFzc3dvcmQ=");
        assert!(value.is_sensitive());
    }

    #[test]
    fn test_content_type_only_with_body() {
        let auth = basic_auth_header("u", "p").unwrap();

        let without = request_headers(&auth, false);
        assert_eq!(without.get(ACCEPT).unwrap(), APPLICATION_JSON);
        assert!(without.get(CONTENT_TYPE).is_none());
        assert!(without.get(AUTHORIZATION).is_some());

        let with = request_headers(&auth, true);
        assert_eq!(with.get(CONTENT_TYPE).unwrap(), APPLICATION_JSON);
    }
}
