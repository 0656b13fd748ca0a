//! Domain layer - Pure data models for scan orchestration.
//!
//! These types have no I/O dependencies and can be tested in isolation.

mod result;
mod session;
mod task;

pub use result::{human_duration, ScanOutcome, ScanResult};
pub use session::{Completion, SessionEvent, SessionState, SessionStats};
pub use task::{
    expand_tasks, normalize_kinds, parse_targets, validate_target, KindSelection, ScanKind,
    ScanTask,
};
