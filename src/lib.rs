//! # teamcity-client - A TeamCity REST API client
//!
//! Queues builds, polls build and queue state, and fetches logs, test and
//! problem occurrences and change sets. Responses are decoded into a
//! stable typed model even where the server is inconsistent about JSON
//! types or leaves empty lists out.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::collections::HashMap;
//! use teamcity_client::Client;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), teamcity_client::Error> {
//!     let client = Client::builder()
//!         .host("teamcity.example.com")
//!         .credentials("user", "secret")
//!         .build()?;
//!
//!     let mut params = HashMap::new();
//!     params.insert("env.TARGET".to_string(), "staging".to_string());
//!     let queued = client.queue_build("Proj_Deploy", "main", &params).await?;
//!
//!     let build = client.get_build(&queued.id.to_string()).await?;
//!     println!("{} #{}: {}", build.build_type_id, build.number, build.state);
//!
//!     let tests_path = format!(
//!         "/httpAuth/app/rest/testOccurrences?locator=build:(id:{})",
//!         build.id
//!     );
//!     for test in client.get_tests(&tests_path, 100, true, true).await? {
//!         println!("failed: {:?}", test.name);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Pipeline
//!
//! Every operation builds a path ([`locator`]), then runs
//! transport ([`Transport`]) and decode ([`decode`]) inside the
//! [`RetryPolicy`]. Decoding first maps the body onto a wire type
//! ([`wire`]) and then normalizes it into the [`model`].
//!
//! ## Retries
//!
//! By default every request is attempted up to 8 times with no delay, and
//! every error is retried, including 4xx responses and decode failures.
//! Use [`retry::RetryOnRetryable`] to give up on permanent errors straight
//! away:
//!
//! ```no_run
//! use teamcity_client::{retry::RetryOnRetryable, Client, RetryPolicy};
//!
//! # fn example() -> Result<(), teamcity_client::Error> {
//! let client = Client::builder()
//!     .host("teamcity.example.com")
//!     .credentials("user", "secret")
//!     .retry_policy(RetryPolicy::default().with_predicate(Box::new(RetryOnRetryable)))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

mod api;
mod client;
pub mod decode;
mod error;
pub mod locator;
pub mod metadata;
pub mod model;
pub mod retry;
pub mod sink;
pub mod transport;
pub mod wire;

pub use client::{Client, ClientBuilder};
pub use error::{Error, Result, MAX_SNIPPET_CHARS};
pub use metadata::RequestMetadata;
pub use model::{Build, Change, ProblemOccurrence, Property, Tag, TestOccurrence, Triggered};
pub use retry::{RetryPolicy, RetryPredicate, RetryStrategy};
pub use sink::ResponseSink;
pub use transport::{ReqwestTransport, Transport, TransportRequest, TransportResponse};
