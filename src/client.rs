//! TeamCity client and its configuration.
//!
//! The [`Client`] type owns the connection settings and runs every request
//! through the same pipeline: resolve the URL, attach credentials, send via
//! the [`Transport`], decode, all inside the [`RetryPolicy`]. The named
//! operations live in [`api`](crate::api).

use crate::{
    decode::{decode, Normalize},
    metadata::RequestMetadata,
    retry::RetryPolicy,
    sink::ResponseSink,
    transport::{basic_auth_header, request_headers, resolve_url, ReqwestTransport},
    Error, Result, Transport, TransportRequest,
};
use http::HeaderValue;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// A TeamCity REST API client.
///
/// Cheap to clone; clones share the transport (and its connection pool).
///
/// # Examples
///
/// ```no_run
/// use std::collections::HashMap;
/// use teamcity_client::Client;
///
/// # async fn example() -> Result<(), teamcity_client::Error> {
/// let client = Client::builder()
///     .host("teamcity.example.com")
///     .credentials("user", "secret")
///     .build()?;
///
/// let queued = client
///     .queue_build("Proj_Build", "feature/x", &HashMap::new())
///     .await?;
/// println!("queued build {}", queued.id);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    transport: Arc<dyn Transport>,
    host: String,
    auth: HeaderValue,
    debug: bool,
    retry_policy: RetryPolicy,
    response_sink: Option<Arc<dyn ResponseSink>>,
}

impl Client {
    /// Creates a new `ClientBuilder` for configuring a client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// The configured host, as given to the builder.
    pub fn host(&self) -> &str {
        &self.inner.host
    }

    /// Whether request URLs are logged at `info` level.
    pub fn debug(&self) -> bool {
        self.inner.debug
    }

    /// The retry policy applied to every request.
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.inner.retry_policy
    }

    /// Sends a JSON request, retrying per the client's policy, and decodes
    /// the response into `W`'s canonical form.
    ///
    /// Every operation on the client is built on this; use it directly for
    /// endpoints the client has no method for.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use teamcity_client::{wire::BuildsWire, Client, RequestMetadata};
    ///
    /// # async fn example(client: Client) -> Result<(), teamcity_client::Error> {
    /// let running = client
    ///     .call_json::<BuildsWire>(RequestMetadata::get(
    ///         "/httpAuth/app/rest/builds?locator=running:true",
    ///     ))
    ///     .await?;
    /// println!("{} running builds", running.len());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn call_json<W: Normalize>(&self, metadata: RequestMetadata) -> Result<W::Output> {
        let this = self;
        let metadata = &metadata;

        let wire = self
            .inner
            .retry_policy
            .run(move || async move {
                let body = this.execute(metadata).await?;
                let wire = decode::<W>(&body)?;
                this.record(metadata, &body);
                Ok(wire)
            })
            .await?;

        Ok(wire.normalize())
    }

    /// Sends a request and returns the body as text, retrying per the
    /// client's policy. Invalid UTF-8 is replaced.
    pub async fn call_text(&self, metadata: RequestMetadata) -> Result<String> {
        let this = self;
        let metadata = &metadata;

        let body = self
            .inner
            .retry_policy
            .run(move || async move { this.execute(metadata).await })
            .await?;

        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    /// Sends a request whose response body is of no interest.
    pub async fn call_unit(&self, metadata: RequestMetadata) -> Result<()> {
        let this = self;
        let metadata = &metadata;

        self.inner
            .retry_policy
            .run(move || async move { this.execute(metadata).await.map(|_| ()) })
            .await
    }

    /// Executes a single request attempt and returns the raw body of a 2xx
    /// response.
    async fn execute(&self, metadata: &RequestMetadata) -> Result<Vec<u8>> {
        let url = resolve_url(&self.inner.host, &metadata.path);

        if self.inner.debug {
            tracing::info!(method = %metadata.method, url = %url, "Sending request");
        } else {
            tracing::debug!(method = %metadata.method, url = %url, "Executing HTTP request");
        }

        let request = TransportRequest {
            method: metadata.method.clone(),
            url: Url::parse(&url)?,
            headers: request_headers(&self.inner.auth, metadata.has_body()),
            body: metadata.body.clone(),
        };

        let response = self.inner.transport.send(request).await?;
        let status = response.status;

        tracing::debug!(
            status = status.as_u16(),
            bytes = response.body.len(),
            "Received HTTP response"
        );

        if !status.is_success() {
            let raw_response = crate::error::truncate(
                &String::from_utf8_lossy(&response.body),
                crate::error::MAX_SNIPPET_CHARS,
            );

            if status.is_client_error() {
                tracing::error!(
                    status = status.as_u16(),
                    response = %raw_response,
                    "Client error (4xx)"
                );
            } else {
                tracing::warn!(status = status.as_u16(), response = %raw_response, "Server error");
            }

            return Err(Error::HttpError {
                status,
                raw_response,
            });
        }

        Ok(response.body)
    }

    fn record(&self, metadata: &RequestMetadata, body: &[u8]) {
        if let Some(sink) = &self.inner.response_sink {
            if let Err(e) = sink.record(&metadata.path, body) {
                tracing::warn!(error = %e, path = %metadata.path, "Failed to record response body");
            }
        }
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("host", &self.inner.host)
            .field("debug", &self.inner.debug)
            .field("retry_policy", &self.inner.retry_policy)
            .finish_non_exhaustive()
    }
}

/// Builder for configuring and creating a [`Client`].
///
/// Host and credentials are required. Everything else has a default: a
/// `reqwest` transport without timeout, [`RetryPolicy::default`] (8
/// immediate attempts, every error retried), debug off and no response
/// sink.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use std::time::Duration;
/// use teamcity_client::{
///     retry::RetryOnRetryable, sink::DirectorySink, Client, RetryPolicy, RetryStrategy,
/// };
///
/// # fn example() -> Result<(), teamcity_client::Error> {
/// let client = Client::builder()
///     .host("http://localhost:8111")
///     .credentials("admin", "admin")
///     .timeout(Duration::from_secs(30))
///     .retry_policy(
///         RetryPolicy::new(5)
///             .with_strategy(RetryStrategy::Linear { delay: Duration::from_millis(500) })
///             .with_predicate(Box::new(RetryOnRetryable)),
///     )
///     .debug(true)
///     .response_sink(Arc::new(DirectorySink::new(std::env::temp_dir())))
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    host: Option<String>,
    credentials: Option<(String, String)>,
    transport: Option<Arc<dyn Transport>>,
    timeout: Option<Duration>,
    debug: bool,
    retry_policy: RetryPolicy,
    response_sink: Option<Arc<dyn ResponseSink>>,
}

impl ClientBuilder {
    /// Creates a new `ClientBuilder` with default settings.
    pub fn new() -> Self {
        Self {
            host: None,
            credentials: None,
            transport: None,
            timeout: None,
            debug: false,
            retry_policy: RetryPolicy::default(),
            response_sink: None,
        }
    }

    /// Sets the server host. `https://` is assumed unless the host already
    /// names a scheme.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Sets the HTTP Basic credentials.
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some((username.into(), password.into()));
        self
    }

    /// Replaces the default `reqwest` transport.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Sets the per-request timeout of the default transport. Ignored when a
    /// custom transport is set.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Logs every request URL at `info` instead of `debug` level.
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Sets the retry policy.
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Hands every decoded JSON response body to `sink`.
    pub fn response_sink(mut self, sink: Arc<dyn ResponseSink>) -> Self {
        self.response_sink = Some(sink);
        self
    }

    /// Builds the configured `Client`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigurationError`] if host or credentials are
    /// missing, the credentials cannot form a header, or the default
    /// transport cannot be created.
    pub fn build(self) -> Result<Client> {
        let host = self
            .host
            .filter(|h| !h.trim().is_empty())
            .ok_or_else(|| Error::ConfigurationError("Host is required".to_string()))?;

        let (username, password) = self
            .credentials
            .ok_or_else(|| Error::ConfigurationError("Credentials are required".to_string()))?;
        let auth = basic_auth_header(&username, &password)?;

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(self.timeout)?),
        };

        Ok(Client {
            inner: Arc::new(ClientInner {
                transport,
                host,
                auth,
                debug: self.debug,
                retry_policy: self.retry_policy,
                response_sink: self.response_sink,
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_is_required() {
        let err = Client::builder().credentials("u", "p").build().unwrap_err();
        assert!(matches!(err, Error::ConfigurationError(_)));

        let err = Client::builder()
            .host("  ")
            .credentials("u", "p")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::ConfigurationError(_)));
    }

    #[test]
    fn test_credentials_are_required() {
        let err = Client::builder().host("ci.local").build().unwrap_err();
        assert!(matches!(err, Error::ConfigurationError(_)));
    }

    #[test]
    fn test_defaults() {
        let client = Client::builder()
            .host("ci.local")
            .credentials("u", "p")
            .build()
            .unwrap();

        assert_eq!(client.host(), "ci.local");
        assert!(!client.debug());
        assert_eq!(
            client.retry_policy().max_attempts(),
            crate::retry::DEFAULT_MAX_ATTEMPTS
        );
    }
}
