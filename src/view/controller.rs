// View controller: trigger a request, hold its ViewState, drop stale replies.
//
// Every trigger bumps a generation counter stored alongside the state. The
// spawned request task only applies its outcome if the generation is still
// the one it was issued under, so a slow reply can never overwrite state set
// by a later, faster one. The check and the write happen inside the same
// watch-channel update, which makes them atomic with respect to triggers.

use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::state::ViewState;
use crate::api::request::RequestDescriptor;
use crate::api::traits::{FetchExecutor, FetchFailure, FetchOutcome};

/// Turns a successful JSON body into view data, or explains why it can't.
pub type Decoder<T> = fn(Value) -> Result<T, FetchFailure>;

/// ViewState tagged with the trigger generation it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<T> {
    /// Number of triggers issued so far. 0 means never triggered.
    pub generation: u64,
    pub state: ViewState<T>,
}

/// Owns one view's state and issues its requests.
///
/// Cheap to clone; clones share the same state.
pub struct ViewController<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for ViewController<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

struct Shared<T> {
    executor: Arc<dyn FetchExecutor>,
    decode: Decoder<T>,
    state: watch::Sender<Snapshot<T>>,
    /// Parent of every request token; cancelled on teardown.
    session: CancellationToken,
    /// Token of the most recent trigger.
    latest: Mutex<Option<CancellationToken>>,
}

impl<T> ViewController<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a controller in the Idle state.
    pub fn new(executor: Arc<dyn FetchExecutor>, decode: Decoder<T>) -> Self {
        let (state, _) = watch::channel(Snapshot {
            generation: 0,
            state: ViewState::Idle,
        });
        Self {
            shared: Arc::new(Shared {
                executor,
                decode,
                state,
                session: CancellationToken::new(),
                latest: Mutex::new(None),
            }),
        }
    }

    /// Move to Loading and issue `request` in a background task.
    ///
    /// Must be called from within a tokio runtime. After `teardown` this
    /// does nothing.
    pub fn trigger(&self, request: RequestDescriptor) -> TriggerHandle {
        let shared = &self.shared;

        if shared.session.is_cancelled() {
            warn!(request = %request, "Trigger after teardown ignored");
            return TriggerHandle {
                generation: self.generation(),
                task: None,
            };
        }

        // Hold the token slot while bumping the generation so the stored
        // token always belongs to the newest trigger.
        let mut latest = shared.latest.lock().unwrap_or_else(PoisonError::into_inner);
        let mut generation = 0;
        shared.state.send_modify(|snap| {
            snap.generation += 1;
            generation = snap.generation;
            snap.state = ViewState::Loading;
        });
        let token = shared.session.child_token();
        *latest = Some(token.clone());
        drop(latest);

        let shared = Arc::clone(shared);
        let task = tokio::spawn(async move { shared.run(generation, request, token).await });

        TriggerHandle {
            generation,
            task: Some(task),
        }
    }

    /// Withdraw interest in the most recent request. Its reply, whenever it
    /// arrives, is dropped and the state stays as it is.
    pub fn cancel(&self) {
        let latest = self
            .shared
            .latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(token) = latest {
            // Cancel under the state lock so a reply can't slip in between
            // its cancellation check and its write.
            self.shared.state.send_if_modified(|_| {
                token.cancel();
                false
            });
        }
    }

    /// Cancel everything in flight and refuse further triggers. Called when
    /// the owning view goes away.
    pub fn teardown(&self) {
        let session = &self.shared.session;
        self.shared.state.send_if_modified(|_| {
            session.cancel();
            false
        });
    }

    /// Current state.
    pub fn state(&self) -> ViewState<T> {
        self.shared.state.borrow().state.clone()
    }

    /// Current state along with its generation.
    pub fn snapshot(&self) -> Snapshot<T> {
        self.shared.state.borrow().clone()
    }

    /// Generation of the most recent trigger.
    pub fn generation(&self) -> u64 {
        self.shared.state.borrow().generation
    }

    /// Receive every state change. Renderers await `changed()` on this.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot<T>> {
        self.shared.state.subscribe()
    }
}

impl<T> Shared<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Execute one request and apply it if it's still the latest. Returns
    /// whether the state changed.
    async fn run(
        &self,
        generation: u64,
        request: RequestDescriptor,
        token: CancellationToken,
    ) -> bool {
        let outcome = self.executor.execute(&request, &token).await;

        if token.is_cancelled() {
            debug!(request = %request, generation, "Dropping reply to cancelled request");
            return false;
        }

        let next = match outcome {
            FetchOutcome::Success { json, .. } => match (self.decode)(json) {
                Ok(data) => ViewState::Success { data },
                Err(reason) => ViewState::Failure { reason },
            },
            FetchOutcome::Failure(FetchFailure::Cancelled) => {
                debug!(request = %request, generation, "Request reported cancelled");
                return false;
            }
            FetchOutcome::Failure(reason) => ViewState::Failure { reason },
        };

        if let ViewState::Failure { reason } = &next {
            warn!(request = %request, error = %reason, "Request failed");
        }

        let applied = self.state.send_if_modified(|snap| {
            if snap.generation == generation && !token.is_cancelled() {
                snap.state = next;
                true
            } else {
                false
            }
        });

        if !applied {
            debug!(request = %request, generation, "Discarding stale reply");
        }
        applied
    }
}

/// Handle to one issued trigger.
pub struct TriggerHandle {
    generation: u64,
    task: Option<JoinHandle<bool>>,
}

impl TriggerHandle {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Wait for the request to finish. Returns true if its reply was applied
    /// to the view, false if it was stale, cancelled or never issued.
    pub async fn settled(self) -> bool {
        match self.task {
            Some(task) => match task.await {
                Ok(applied) => applied,
                Err(e) => {
                    warn!(generation = self.generation, error = %e, "Request task failed");
                    false
                }
            },
            None => false,
        }
    }
}
