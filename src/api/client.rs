// HTTP executor for the Meme Market API: a thin reqwest wrapper.
//
// Every request goes to `{base_url}{endpoint}`. The body is read fully and
// parsed as JSON here; shape validation happens later in the endpoint
// decoders.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::request::{Method, RequestDescriptor};
use super::traits::{FetchExecutor, FetchFailure, FetchOutcome};

/// Default request timeout, matching the 30s the API itself allows its
/// upstream calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetch executor backed by a real HTTP client.
pub struct HttpExecutor {
    client: reqwest::Client,
    base_url: String,
    timeout: Option<Duration>,
}

impl HttpExecutor {
    /// Create an executor for the API at `base_url`.
    ///
    /// `timeout` bounds each request end to end; `None` waits indefinitely
    /// (cancellation still applies).
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("meme-market/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send(&self, request: &RequestDescriptor) -> FetchOutcome {
        let url = request.url(&self.base_url);

        let mut builder = match request.method() {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
        };
        if !request.query().is_empty() {
            builder = builder.query(request.query());
        }
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }

        debug!(request = %request, "API request");

        let response = match builder.send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(request = %request, error = %e, "API request failed");
                return FetchOutcome::Failure(FetchFailure::NetworkUnreachable(e.to_string()));
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!(request = %request, status = status.as_u16(), "API returned error status");
            return FetchOutcome::Failure(FetchFailure::NonSuccessStatus(status.as_u16()));
        }

        let bytes = match response.bytes().await {
            Ok(b) => b,
            Err(e) => {
                return FetchOutcome::Failure(FetchFailure::NetworkUnreachable(format!(
                    "failed reading response body: {e}"
                )))
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(json) => FetchOutcome::Success {
                status: status.as_u16(),
                json,
            },
            Err(e) => FetchOutcome::Failure(FetchFailure::MalformedBody(e.to_string())),
        }
    }

    async fn send_with_timeout(&self, request: &RequestDescriptor) -> FetchOutcome {
        match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, self.send(request)).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    warn!(request = %request, timeout_ms = limit.as_millis() as u64, "API request timed out");
                    FetchOutcome::Failure(FetchFailure::NetworkUnreachable(format!(
                        "request timed out after {}ms",
                        limit.as_millis()
                    )))
                }
            },
            None => self.send(request).await,
        }
    }
}

#[async_trait]
impl FetchExecutor for HttpExecutor {
    async fn execute(
        &self,
        request: &RequestDescriptor,
        cancel: &CancellationToken,
    ) -> FetchOutcome {
        if cancel.is_cancelled() {
            return FetchOutcome::Failure(FetchFailure::Cancelled);
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(request = %request, "API request cancelled");
                FetchOutcome::Failure(FetchFailure::Cancelled)
            }
            outcome = self.send_with_timeout(request) => outcome,
        }
    }
}
