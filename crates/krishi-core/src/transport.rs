//! One outbound call per triggered request.
//!
//! No retries, no backoff, no timeout beyond the client default, and no
//! cancellation. Non-2xx statuses come back as a [`RawResponse`]; only a
//! failure to complete the round trip is an error.

use std::path::PathBuf;

use async_trait::async_trait;
use reqwest::{multipart, Client};
use tracing::debug;

use crate::error::FetchError;

#[derive(Debug, Clone, PartialEq)]
pub enum TransportRequest {
    Get {
        url: String,
        query: Vec<(String, String)>,
    },
    PostJson {
        url: String,
        body: serde_json::Value,
    },
    PostMultipart {
        url: String,
        field: String,
        file_name: String,
        mime: String,
        path: PathBuf,
    },
}

impl TransportRequest {
    pub fn url(&self) -> &str {
        match self {
            TransportRequest::Get { url, .. }
            | TransportRequest::PostJson { url, .. }
            | TransportRequest::PostMultipart { url, .. } => url,
        }
    }

    fn method(&self) -> &'static str {
        match self {
            TransportRequest::Get { .. } => "GET",
            _ => "POST",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: TransportRequest) -> Result<RawResponse, FetchError>;
}

#[derive(Clone, Default)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: TransportRequest) -> Result<RawResponse, FetchError> {
        debug!(method = request.method(), url = %redact(request.url()), "sending request");

        let builder = match request {
            TransportRequest::Get { url, query } => self.client.get(&url).query(&query),
            TransportRequest::PostJson { url, body } => self.client.post(&url).json(&body),
            TransportRequest::PostMultipart {
                url,
                field,
                file_name,
                mime,
                path,
            } => {
                let bytes = tokio::fs::read(&path).await.map_err(|e| {
                    FetchError::Validation(format!(
                        "Could not read image {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                let part = multipart::Part::bytes(bytes)
                    .file_name(file_name)
                    .mime_str(&mime)
                    .map_err(|e| {
                        FetchError::Validation(format!("Unsupported image type {}: {}", mime, e))
                    })?;
                let form = multipart::Form::new().part(field, part);
                self.client.post(&url).multipart(form)
            }
        };

        let response = builder
            .send()
            .await
            .map_err(|e| FetchError::Network(e.without_url().to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Network(e.without_url().to_string()))?;

        debug!(status, bytes = body.len(), "response received");
        Ok(RawResponse { status, body })
    }
}

// ============================================================================
// Mock Transport (for running screens without a network)
// ============================================================================

/// Replays scripted responses in order and records every request it was given.
///
/// When the script runs out it answers with a network fault, which is also
/// what an unreachable host looks like.
#[derive(Default)]
pub struct MockTransport {
    script: std::sync::Mutex<std::collections::VecDeque<Result<RawResponse, FetchError>>>,
    seen: std::sync::Mutex<Vec<TransportRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, status: u16, body: impl Into<String>) -> Self {
        self.push(Ok(RawResponse::new(status, body)));
        self
    }

    pub fn fail(self, message: &str) -> Self {
        self.push(Err(FetchError::Network(message.to_string())));
        self
    }

    fn push(&self, result: Result<RawResponse, FetchError>) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(result);
        }
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.seen.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.seen.lock().map(|s| s.len()).unwrap_or(0)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: TransportRequest) -> Result<RawResponse, FetchError> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(request);
        }
        let next = self.script.lock().ok().and_then(|mut s| s.pop_front());
        next.unwrap_or_else(|| Err(FetchError::Network("network unreachable".to_string())))
    }
}

/// Strip the query string so API keys never reach the logs.
pub(crate) fn redact(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}
