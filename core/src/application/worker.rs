//! Queue-draining scan worker.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::queue::TaskQueue;
use super::registry::AdapterRegistry;
use crate::domain::{Completion, ScanResult};

/// Worker state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkerState {
    /// Popping and executing tasks.
    Draining,
    /// Not running (before start, or after the loop exited).
    #[default]
    Idle,
}

/// Pulls tasks off the queue one at a time and runs them.
///
/// Adapter failures are recorded in the emitted result and never stop the
/// loop; only cancellation ends the drain early.
pub struct ScanWorker {
    queue: Arc<TaskQueue>,
    adapters: AdapterRegistry,
    cancel: CancellationToken,
    state: WorkerState,
}

impl ScanWorker {
    pub fn new(queue: Arc<TaskQueue>, adapters: AdapterRegistry, cancel: CancellationToken) -> Self {
        Self {
            queue,
            adapters,
            cancel,
            state: WorkerState::Idle,
        }
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Drain the queue, passing each result to `emit` in dequeue order.
    ///
    /// Returns [`Completion::Finished`] when the queue ran dry and
    /// [`Completion::Cancelled`] when the cancel token stopped the loop.
    pub async fn drain<F>(&mut self, mut emit: F) -> Completion
    where
        F: FnMut(ScanResult),
    {
        self.state = WorkerState::Draining;

        let completion = loop {
            if self.cancel.is_cancelled() {
                break Completion::Cancelled;
            }
            let Some(task) = self.queue.pop() else {
                break Completion::Finished;
            };

            debug!(task = task.id, kind = %task.kind, target = %task.target, "Dequeued task");
            let result = match self.adapters.get(task.kind) {
                Some(adapter) => adapter.execute(&task, &self.cancel).await,
                None => ScanResult::process_error(
                    task.clone(),
                    format!("no scanner registered for {}", task.kind),
                    Duration::ZERO,
                ),
            };
            info!(
                task = result.task.id,
                kind = %result.task.kind,
                target = %result.task.target,
                outcome = ?result.outcome,
                elapsed_ms = result.elapsed.as_millis() as u64,
                "Task finished"
            );
            emit(result);
        };

        self.state = WorkerState::Idle;
        debug!(completion = ?completion, "Worker stopped");
        completion
    }
}
