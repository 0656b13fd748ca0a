//! Scan session - one orchestrated run from start to completion.
//!
//! The session is a synchronous, poll-friendly facade: `start` and `cancel`
//! return immediately, the worker runs on its own OS thread with a
//! single-threaded runtime, and front ends call `poll_completion` on a timer
//! instead of joining.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::{Mutex, RwLock};
use tokio::runtime::Builder;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::queue::TaskQueue;
use super::registry::AdapterRegistry;
use super::worker::ScanWorker;
use crate::adapters::ToolDiscovery;
use crate::config::ScanConfig;
use crate::domain::{
    expand_tasks, normalize_kinds, validate_target, Completion, KindSelection, ScanKind,
    ScanResult, ScanTask, SessionEvent, SessionState, SessionStats,
};
use crate::error::{Error, Result};
use crate::ports::ScanListener;

/// State shared between the session handle and its worker thread.
struct Shared {
    id: Uuid,
    queue: Arc<TaskQueue>,
    state: RwLock<SessionState>,
    cancel: Mutex<CancellationToken>,
    results: RwLock<Vec<ScanResult>>,
    events: Mutex<Vec<SessionEvent>>,
    listener: RwLock<Option<Arc<dyn ScanListener>>>,
    stats: Mutex<SessionStats>,
    /// Set by the worker thread after its final event; true when no worker exists.
    worker_done: AtomicBool,
}

impl Shared {
    fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            queue: Arc::new(TaskQueue::new()),
            state: RwLock::new(SessionState::Idle),
            cancel: Mutex::new(CancellationToken::new()),
            results: RwLock::new(Vec::new()),
            events: Mutex::new(Vec::new()),
            listener: RwLock::new(None),
            stats: Mutex::new(SessionStats::default()),
            worker_done: AtomicBool::new(true),
        }
    }

    /// Record a result and notify consumers. Called only from the worker.
    fn deliver(&self, result: ScanResult) {
        self.results.write().push(result.clone());
        self.stats.lock().delivered += 1;
        self.emit(SessionEvent::Result(result));
    }

    fn emit(&self, event: SessionEvent) {
        self.events.lock().push(event.clone());
        let listener = self.listener.read().clone();
        if let Some(listener) = listener {
            listener.on_event(&event);
        }
    }

    /// Move an active run to Completed and emit the final event.
    ///
    /// Returns false if the run was already completed.
    fn finish(&self, completion: Completion) -> bool {
        let completion = {
            let mut state = self.state.write();
            if !state.is_active() {
                return false;
            }
            let completion = match (&*state, completion) {
                // A cancel accepted while the last task was finishing wins.
                (SessionState::Cancelling, Completion::Finished) => Completion::Cancelled,
                (_, completion) => completion,
            };
            if let Completion::Failed(reason) = &completion {
                let cleared = self.queue.clear();
                self.stats.lock().cleared += cleared as u64;
                warn!(session = %self.id, reason = %reason, cleared, "Scan failed");
            }
            *state = SessionState::Completed(completion.clone());
            completion
        };

        info!(session = %self.id, completion = ?completion, "Scan session completed");
        self.emit(SessionEvent::Finished { completion });
        true
    }
}

/// Orchestrates one scan run at a time.
///
/// All methods take `&self`; a session can be shared across threads (e.g.
/// behind an `Arc`) so that a UI timer polls while another thread cancels.
pub struct ScanSession {
    adapters: AdapterRegistry,
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl ScanSession {
    /// Create an idle session dispatching to `adapters`.
    pub fn new(adapters: AdapterRegistry) -> Self {
        Self {
            adapters,
            shared: Arc::new(Shared::new()),
            worker: Mutex::new(None),
        }
    }

    /// Session using the configured tools and limits.
    pub fn from_config(config: &ScanConfig) -> Self {
        Self::new(config.adapters(&ToolDiscovery::new()))
    }

    /// Register the listener that receives every event on the worker thread.
    pub fn with_listener(self, listener: impl ScanListener + 'static) -> Self {
        self.set_listener(listener);
        self
    }

    pub fn set_listener(&self, listener: impl ScanListener + 'static) {
        *self.shared.listener.write() = Some(Arc::new(listener));
    }

    pub fn clear_listener(&self) {
        *self.shared.listener.write() = None;
    }

    /// Unique id of this session, used in log records.
    pub fn id(&self) -> Uuid {
        self.shared.id
    }

    // =========================================================================
    // Control
    // =========================================================================

    /// Start scanning `targets` with every kind in `kinds`.
    ///
    /// Tasks are enqueued per target, per kind (port scan first). Blank
    /// targets are ignored; an empty list is rejected.
    pub fn start(&self, targets: &[String], kinds: &[ScanKind]) -> Result<()> {
        let targets: Vec<String> = targets
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        if targets.is_empty() {
            return Err(Error::InvalidInput(
                "at least one target is required".to_string(),
            ));
        }
        for target in &targets {
            validate_target(target)?;
        }
        let kinds = normalize_kinds(kinds);
        if kinds.is_empty() {
            return Err(Error::InvalidInput(
                "at least one scan kind is required".to_string(),
            ));
        }

        let mut state = self.shared.state.write();
        if state.is_active() || !self.shared.worker_done.load(Ordering::Acquire) {
            return Err(Error::AlreadyRunning);
        }

        // The previous worker has emitted its last event; reap the thread.
        if let Some(previous) = self.worker.lock().take() {
            if previous.join().is_err() {
                debug!(session = %self.shared.id, "Previous worker had panicked");
            }
        }

        let cancel = CancellationToken::new();
        *self.shared.cancel.lock() = cancel.clone();
        self.shared.results.write().clear();
        self.shared.events.lock().clear();

        let tasks = expand_tasks(&targets, &kinds);
        let enqueued = tasks.len() as u64;
        *self.shared.stats.lock() = SessionStats {
            enqueued,
            ..SessionStats::default()
        };
        self.shared.queue.clear();
        self.shared.queue.push_all(tasks);

        let worker = ScanWorker::new(
            Arc::clone(&self.shared.queue),
            self.adapters.clone(),
            cancel,
        );
        self.shared.worker_done.store(false, Ordering::Release);

        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name("webscan-worker".to_string())
            .spawn(move || run_worker(shared, worker));

        match spawned {
            Ok(handle) => {
                *self.worker.lock() = Some(handle);
                *state = SessionState::Running;
                info!(
                    session = %self.shared.id,
                    targets = targets.len(),
                    kinds = ?kinds,
                    tasks = enqueued,
                    "Scan session started"
                );
                Ok(())
            }
            Err(e) => {
                self.shared.queue.clear();
                *self.shared.stats.lock() = SessionStats::default();
                self.shared.worker_done.store(true, Ordering::Release);
                Err(Error::Worker(format!("failed to spawn worker thread: {}", e)))
            }
        }
    }

    /// Start with a front-end style selection.
    pub fn start_selection(&self, targets: &[String], selection: KindSelection) -> Result<()> {
        self.start(targets, &selection.kinds())
    }

    /// Request cancellation of the running scan.
    ///
    /// Pending tasks are dropped at once; a task already executing has its
    /// process terminated. The session reaches `Completed(Cancelled)` once the
    /// worker exits.
    pub fn cancel(&self) -> Result<()> {
        let mut state = self.shared.state.write();
        if *state != SessionState::Running {
            return Err(Error::NotRunning);
        }

        self.shared.cancel.lock().cancel();
        let cleared = self.shared.queue.clear();
        self.shared.stats.lock().cleared += cleared as u64;
        *state = SessionState::Cancelling;

        info!(session = %self.shared.id, cleared, "Scan cancellation requested");
        Ok(())
    }

    /// Non-blocking completion check.
    ///
    /// True once the worker thread has exited and the queue is empty. By then
    /// every result and the final `Finished` event have been delivered. Stays
    /// true until the next `start`.
    pub fn poll_completion(&self) -> bool {
        let handle = {
            let mut worker = self.worker.lock();
            if !worker.as_ref().map_or(true, JoinHandle::is_finished) {
                return false;
            }
            worker.take()
        };

        if let Some(handle) = handle {
            if let Err(panic) = handle.join() {
                let reason = panic_message(panic.as_ref());
                warn!(session = %self.shared.id, reason = %reason, "Worker thread panicked");
                self.shared
                    .finish(Completion::Failed(format!("worker panicked: {}", reason)));
                self.shared.worker_done.store(true, Ordering::Release);
            }
        }

        self.shared.worker_done.load(Ordering::Acquire)
            && self.shared.queue.is_empty()
            && self.shared.state.read().completion().is_some()
    }

    // =========================================================================
    // State Access
    // =========================================================================

    pub fn state(&self) -> SessionState {
        self.shared.state.read().clone()
    }

    /// Completion marker of the last run, once it is over.
    pub fn completion(&self) -> Option<Completion> {
        self.shared.state.read().completion().cloned()
    }

    pub fn is_running(&self) -> bool {
        self.shared.state.read().is_active()
    }

    /// Results of the current run, in delivery order.
    pub fn results(&self) -> Vec<ScanResult> {
        self.shared.results.read().clone()
    }

    /// Get and clear buffered events.
    pub fn take_events(&self) -> Vec<SessionEvent> {
        std::mem::take(&mut *self.shared.events.lock())
    }

    /// Check if there are buffered events.
    pub fn has_pending_events(&self) -> bool {
        !self.shared.events.lock().is_empty()
    }

    /// Tasks still waiting in the queue.
    pub fn pending_tasks(&self) -> Vec<ScanTask> {
        self.shared.queue.snapshot()
    }

    pub fn stats(&self) -> SessionStats {
        let stats = *self.shared.stats.lock();
        SessionStats {
            pending: stats
                .enqueued
                .saturating_sub(stats.delivered + stats.cleared),
            ..stats
        }
    }
}

impl Default for ScanSession {
    fn default() -> Self {
        Self::new(AdapterRegistry::from_discovery(&ToolDiscovery::new()))
    }
}

impl Drop for ScanSession {
    fn drop(&mut self) {
        let _ = self.cancel();
        if let Some(handle) = self.worker.get_mut().take() {
            // A listener holding the last reference may drop us on the worker itself.
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            }
        }
    }
}

/// Worker thread body.
fn run_worker(shared: Arc<Shared>, mut worker: ScanWorker) {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| format!("failed to build worker runtime: {}", e))?;
        Ok::<_, String>(runtime.block_on(worker.drain(|result| shared.deliver(result))))
    }));

    let completion = match outcome {
        Ok(Ok(completion)) => completion,
        Ok(Err(reason)) => Completion::Failed(reason),
        Err(panic) => Completion::Failed(format!(
            "worker panicked: {}",
            panic_message(panic.as_ref())
        )),
    };

    shared.finish(completion);
    shared.worker_done.store(true, Ordering::Release);
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_idle() {
        let session = ScanSession::new(AdapterRegistry::new());
        assert_eq!(session.state(), SessionState::Idle);
        assert!(!session.poll_completion());
        assert!(session.results().is_empty());
        assert_eq!(session.stats(), SessionStats::default());
    }

    #[test]
    fn test_cancel_when_idle() {
        let session = ScanSession::new(AdapterRegistry::new());
        assert!(matches!(session.cancel(), Err(Error::NotRunning)));
    }

    #[test]
    fn test_start_rejects_empty_targets() {
        let session = ScanSession::new(AdapterRegistry::new());
        let err = session.start(&[], &ScanKind::ALL).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));

        let blanks = vec!["  ".to_string(), String::new()];
        let err = session.start(&blanks, &ScanKind::ALL).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_start_rejects_empty_kinds_and_option_like_targets() {
        let session = ScanSession::new(AdapterRegistry::new());
        let targets = vec!["example.com".to_string()];
        assert!(matches!(
            session.start(&targets, &[]),
            Err(Error::InvalidInput(_))
        ));
        let targets = vec!["--script=evil".to_string()];
        assert!(matches!(
            session.start(&targets, &ScanKind::ALL),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_panic_message() {
        let boxed: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(boxed.as_ref()), "boom");
        let boxed: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(boxed.as_ref()), "bang");
        let boxed: Box<dyn std::any::Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(boxed.as_ref()), "unknown panic");
    }
}
