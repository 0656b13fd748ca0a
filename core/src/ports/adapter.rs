//! Scanner adapter port (interface).

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::domain::{ScanKind, ScanResult, ScanTask};

/// Boxed future returned by [`ScannerAdapter::execute`].
pub type ExecuteFuture<'a> = Pin<Box<dyn Future<Output = ScanResult> + Send + 'a>>;

/// Port for running one external scanner against one target.
///
/// The worker resolves adapters by [`ScanKind`] at runtime, so the trait is
/// object safe and `execute` returns a boxed future.
///
/// Implementations must:
/// - return [`ScanOutcome::Skipped`](crate::ScanOutcome::Skipped) without
///   spawning anything when `cancel` is already cancelled;
/// - terminate and reap the external process on timeout or cancellation;
/// - report every failure through the returned result, never by panicking.
pub trait ScannerAdapter: Send + Sync {
    /// Kind of task this adapter handles.
    fn kind(&self) -> ScanKind;

    /// Time limit for one invocation.
    fn timeout(&self) -> Duration;

    /// Run the scanner for `task.target`.
    fn execute<'a>(&'a self, task: &'a ScanTask, cancel: &'a CancellationToken)
        -> ExecuteFuture<'a>;
}
