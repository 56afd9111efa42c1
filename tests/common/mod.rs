#![allow(dead_code)]

use async_trait::async_trait;
use http::StatusCode;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use teamcity_client::{
    Client, Error, Result, RetryPolicy, Transport, TransportRequest, TransportResponse,
};
use tracing_subscriber::EnvFilter;

/// Installs a test-friendly subscriber once; `RUST_LOG` controls the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Transport that replays canned results in order and records every
/// request it receives.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<TransportResponse>>>,
    requests: Mutex<Vec<TransportRequest>>,
}

impl ScriptedTransport {
    pub fn new(responses: Vec<Result<TransportResponse>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Error::Transport("script exhausted".to_string())))
    }
}

pub fn ok(body: &str) -> Result<TransportResponse> {
    Ok(TransportResponse::new(StatusCode::OK, body))
}

pub fn status(status: StatusCode, body: &str) -> Result<TransportResponse> {
    Ok(TransportResponse::new(status, body))
}

pub fn connection_refused() -> Result<TransportResponse> {
    Err(Error::Transport("connection refused".to_string()))
}

pub fn scripted_client(transport: Arc<ScriptedTransport>) -> Client {
    scripted_client_with_policy(transport, RetryPolicy::default())
}

pub fn scripted_client_with_policy(
    transport: Arc<ScriptedTransport>,
    policy: RetryPolicy,
) -> Client {
    init_tracing();
    Client::builder()
        .host("host.example.com")
        .credentials("username", "password")
        .transport(transport)
        .retry_policy(policy)
        .build()
        .unwrap()
}
