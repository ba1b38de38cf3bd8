//! Deferred scheduler on top of the tokio runtime

use reveille_host_api::{DeferredScheduler, DeferredTask, HostError, HostResult};
use reveille_util::TaskId;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{debug, error, trace};

/// Runs each submitted task on the blocking pool once its delay elapses.
///
/// Tasks cannot be cancelled. A task whose work panics only affects that
/// task.
pub struct TokioScheduler {
    handle: Handle,
    closed: AtomicBool,
    pending: Arc<AtomicUsize>,
}

impl TokioScheduler {
    pub fn new(handle: Handle) -> Self {
        Self {
            handle,
            closed: AtomicBool::new(false),
            pending: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Scheduler on the runtime of the calling context
    pub fn current() -> HostResult<Self> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|_| HostError::NoRuntime)
    }

    /// Number of tasks submitted but not yet started
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Reject further submissions. Tasks already submitted still run.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            debug!(pending = self.pending(), "Scheduler closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl DeferredScheduler for TokioScheduler {
    fn submit(&self, task: DeferredTask, delay: Duration) -> HostResult<TaskId> {
        if self.is_closed() {
            return Err(HostError::Rejected("scheduler is closed".into()));
        }

        let task_id = TaskId::new();
        let pending = self.pending.clone();
        pending.fetch_add(1, Ordering::SeqCst);

        self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            pending.fetch_sub(1, Ordering::SeqCst);

            trace!(task_id = %task_id, "Running deferred task");
            if let Err(e) = tokio::task::spawn_blocking(task).await {
                error!(task_id = %task_id, error = %e, "Deferred task panicked");
            }
        });

        Ok(task_id)
    }
}
