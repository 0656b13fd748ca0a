//! Application layer - Use case services.
//!
//! Orchestration of scan runs: the task queue, the worker that drains it
//! and the session that owns both.

mod queue;
mod registry;
mod session;
mod worker;

pub use queue::TaskQueue;
pub use registry::AdapterRegistry;
pub use session::ScanSession;
pub use worker::{ScanWorker, WorkerState};
