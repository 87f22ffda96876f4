// Fetch executor trait: the seam between view state and the network.
//
// The HTTP implementation talks to the real API; the demo backend and test
// doubles implement the same trait. Executors never fail past this boundary:
// every outcome, including transport errors, comes back as a value.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use super::request::RequestDescriptor;

/// Why a request did not produce usable data.
///
/// The `Display` text is what a view shows to the user.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchFailure {
    /// Transport-level failure (DNS, refused connection, timeout).
    #[error("Network unreachable: {0}")]
    NetworkUnreachable(String),

    /// The server answered outside 200–299.
    #[error("Server returned HTTP {0}")]
    NonSuccessStatus(u16),

    /// The body wasn't JSON, or didn't match the expected shape.
    #[error("Malformed response: {0}")]
    MalformedBody(String),

    /// The caller withdrew interest before the request completed.
    #[error("Request cancelled")]
    Cancelled,

    /// HTTP 200 but the API reported `success: false`. Carries the server's
    /// message verbatim.
    #[error("{0}")]
    ApplicationRejected(String),
}

/// Classified result of executing one request.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Success { status: u16, json: Value },
    Failure(FetchFailure),
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success { .. })
    }
}

/// Performs exactly one request per call. No retries: callers layer that on
/// top if they want it.
#[async_trait]
pub trait FetchExecutor: Send + Sync {
    /// Execute `request`, returning `Failure(Cancelled)` if `cancel` fires
    /// before the response is complete.
    async fn execute(
        &self,
        request: &RequestDescriptor,
        cancel: &CancellationToken,
    ) -> FetchOutcome;
}
