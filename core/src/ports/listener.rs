//! Session listener port (interface).

use crate::domain::SessionEvent;

/// Receives session events as they happen.
///
/// Called on the worker thread, in delivery order. Implementations should
/// return quickly; a slow listener delays the next task.
pub trait ScanListener: Send + Sync {
    fn on_event(&self, event: &SessionEvent);
}

impl<F> ScanListener for F
where
    F: Fn(&SessionEvent) + Send + Sync,
{
    fn on_event(&self, event: &SessionEvent) {
        self(event)
    }
}
