//! FIFO task queue shared by the session and its worker.

use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::domain::ScanTask;

/// Ordered, thread-safe queue of scan tasks.
///
/// One producer (the session), one consumer (the worker) and an asynchronous
/// canceller. Every operation takes the same lock, so a `pop` that follows a
/// `clear` never sees a stale task.
#[derive(Debug, Default)]
pub struct TaskQueue {
    tasks: Mutex<VecDeque<ScanTask>>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, task: ScanTask) {
        self.tasks.lock().push_back(task);
    }

    /// Enqueue several tasks under one lock, preserving their order.
    pub fn push_all(&self, tasks: impl IntoIterator<Item = ScanTask>) {
        self.tasks.lock().extend(tasks);
    }

    pub fn pop(&self) -> Option<ScanTask> {
        self.tasks.lock().pop_front()
    }

    /// Remove every pending task; returns how many were removed.
    pub fn clear(&self) -> usize {
        let mut tasks = self.tasks.lock();
        let cleared = tasks.len();
        tasks.clear();
        cleared
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.lock().is_empty()
    }

    pub fn len(&self) -> usize {
        self.tasks.lock().len()
    }

    /// Copy of the pending tasks, front first.
    pub fn snapshot(&self) -> Vec<ScanTask> {
        self.tasks.lock().iter().cloned().collect()
    }
}
