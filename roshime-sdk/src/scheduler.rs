//! Cancelable delayed tasks
//!
//! Timers that mutate view state are owned by the component that created
//! them. Dropping or canceling the handle aborts the pending work, so a timer
//! can never fire against state that has already been torn down.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::trace;

/// Handle to work scheduled to run once after a delay
#[derive(Debug)]
pub struct DelayedTask {
    handle: JoinHandle<()>,
}

impl DelayedTask {
    /// Run `work` after `delay` on the current tokio runtime
    pub fn schedule<F>(delay: Duration, work: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            work.await;
        });
        Self { handle }
    }

    /// Abort the task if it has not run yet
    pub fn cancel(&self) {
        if !self.handle.is_finished() {
            trace!("Canceling pending delayed task");
            self.handle.abort();
        }
    }

    /// Whether the work ran or the task was aborted
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for DelayedTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
