// Fixed-interval polling scheduler.
//
// Issues one trigger immediately, then one every `interval` until stopped.
// Polls aren't serialized: if a reply takes longer than the interval, the
// next poll goes out anyway and the controller's last-trigger-wins rule
// drops the slow one.

use std::time::Duration;

use anyhow::Result;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::api::request::RequestDescriptor;
use crate::view::controller::ViewController;

/// Default dashboard refresh period.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(120_000);

/// Periodically re-triggers a ViewController with a fresh descriptor.
pub struct PollingScheduler<T> {
    controller: ViewController<T>,
    interval: Duration,
}

impl<T> PollingScheduler<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(controller: ViewController<T>, interval: Duration) -> Result<Self> {
        if interval.is_zero() {
            anyhow::bail!("Polling interval must be greater than zero");
        }
        Ok(Self {
            controller,
            interval,
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Start polling. `descriptor_factory` is called once per tick so every
    /// poll gets its own descriptor.
    pub fn start<F>(self, descriptor_factory: F) -> PollingHandle
    where
        F: Fn() -> RequestDescriptor + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let stop = cancel.clone();
        let Self {
            controller,
            interval,
        } = self;

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            info!(
                interval_ms = interval.as_millis() as u64,
                "Polling started"
            );

            loop {
                tokio::select! {
                    biased;
                    _ = stop.cancelled() => break,
                    _ = ticker.tick() => {
                        let handle = controller.trigger(descriptor_factory());
                        debug!(generation = handle.generation(), "Poll issued");
                    }
                }
            }

            // Whatever is still in flight belongs to a view nobody is
            // polling any more.
            controller.cancel();
            info!("Polling stopped");
        });

        PollingHandle {
            cancel,
            task: Some(task),
        }
    }
}

/// Owns a running polling loop. Dropping it stops the loop.
pub struct PollingHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl PollingHandle {
    /// Stop polling and wait for the loop to exit. Once this returns no
    /// further triggers are issued and no pending reply will touch the view.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled()
    }
}

impl Drop for PollingHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
