// Shared test doubles.
//
// ScriptedExecutor hands every request to the test through a channel and
// waits for the test to answer it, so replies can be released in any
// order. RecordingExecutor answers instantly and notes when it was called.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use meme_market::api::request::RequestDescriptor;
use meme_market::api::traits::{FetchExecutor, FetchFailure, FetchOutcome};

/// A request the test hasn't answered yet.
pub struct Pending {
    pub request: RequestDescriptor,
    reply: oneshot::Sender<FetchOutcome>,
}

impl Pending {
    pub fn respond(self, outcome: FetchOutcome) {
        let _ = self.reply.send(outcome);
    }

    pub fn respond_json(self, json: Value) {
        self.respond(FetchOutcome::Success { status: 200, json });
    }

    pub fn fail(self, reason: FetchFailure) {
        self.respond(FetchOutcome::Failure(reason));
    }
}

pub struct ScriptedExecutor {
    requests: mpsc::UnboundedSender<Pending>,
    honor_cancel: bool,
}

/// Executor that returns Cancelled as soon as the token fires.
pub fn scripted() -> (Arc<ScriptedExecutor>, mpsc::UnboundedReceiver<Pending>) {
    build(true)
}

/// Executor that ignores the token and always waits for the scripted reply,
/// like a transport that can't be interrupted.
pub fn scripted_ignoring_cancel() -> (Arc<ScriptedExecutor>, mpsc::UnboundedReceiver<Pending>) {
    build(false)
}

fn build(honor_cancel: bool) -> (Arc<ScriptedExecutor>, mpsc::UnboundedReceiver<Pending>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        Arc::new(ScriptedExecutor {
            requests: tx,
            honor_cancel,
        }),
        rx,
    )
}

#[async_trait]
impl FetchExecutor for ScriptedExecutor {
    async fn execute(
        &self,
        request: &RequestDescriptor,
        cancel: &CancellationToken,
    ) -> FetchOutcome {
        let (tx, rx) = oneshot::channel();
        let pending = Pending {
            request: request.clone(),
            reply: tx,
        };
        if self.requests.send(pending).is_err() {
            return FetchOutcome::Failure(FetchFailure::NetworkUnreachable(
                "script closed".to_string(),
            ));
        }

        let dropped =
            || FetchOutcome::Failure(FetchFailure::NetworkUnreachable("reply dropped".to_string()));

        if self.honor_cancel {
            tokio::select! {
                _ = cancel.cancelled() => FetchOutcome::Failure(FetchFailure::Cancelled),
                reply = rx => reply.unwrap_or_else(|_| dropped()),
            }
        } else {
            rx.await.unwrap_or_else(|_| dropped())
        }
    }
}

/// Answers every request with an empty prediction list and records the
/// (tokio) time of each call.
#[derive(Default)]
pub struct RecordingExecutor {
    calls: Mutex<Vec<Instant>>,
}

impl RecordingExecutor {
    pub fn calls(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl FetchExecutor for RecordingExecutor {
    async fn execute(
        &self,
        _request: &RequestDescriptor,
        _cancel: &CancellationToken,
    ) -> FetchOutcome {
        self.calls.lock().unwrap().push(Instant::now());
        FetchOutcome::Success {
            status: 200,
            json: json!({"success": true, "count": 0, "predictions": []}),
        }
    }
}

/// A valid prediction as the API serializes it.
pub fn prediction_json(id: &str, virality: f64) -> Value {
    json!({
        "reddit_id": id,
        "title": format!("Post {id}"),
        "subreddit": "memes",
        "score": 1200,
        "virality_score": virality,
        "num_comments": 85,
        "upvote_ratio": 0.94,
        "created_utc": "2025-06-01T10:15:00+00:00",
        "permalink": format!("/r/memes/comments/{id}/post/"),
    })
}

/// `/predictions/top` body with one prediction per id.
pub fn top_body(ids: &[&str]) -> Value {
    let predictions: Vec<Value> = ids.iter().map(|id| prediction_json(id, 75.0)).collect();
    json!({"success": true, "count": predictions.len(), "predictions": predictions})
}
