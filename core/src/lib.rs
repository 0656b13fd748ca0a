//! webscan core library
//!
//! Orchestrates external security scanners against user-supplied targets.
//! Provides functionality to:
//! - Expand targets and scan kinds into an ordered task queue
//! - Run nmap (port scan) and sqlmap (injection test) with time limits
//! - Drain the queue on a background worker with cooperative cancellation
//! - Manage user configuration (tool paths, time limits, extra arguments)
//!
//! # Architecture
//! This library follows hexagonal architecture (ports & adapters):
//! - `domain`: Pure data models (tasks, results, session lifecycle)
//! - `ports`: Trait definitions (scanner adapter, listener)
//! - `adapters`: Process-backed scanner implementations
//! - `application`: Queue, worker and session
//!
//! # Example
//! ```no_run
//! use webscan_core::{KindSelection, ScanSession};
//!
//! let session = ScanSession::default()
//!     .with_listener(|event: &webscan_core::SessionEvent| print!("{}", event.render()));
//! session
//!     .start_selection(&["scanme.nmap.org".to_string()], KindSelection::Both)
//!     .unwrap();
//! while !session.poll_completion() {
//!     std::thread::sleep(std::time::Duration::from_secs(1));
//! }
//! ```

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;

// Re-export domain types (primary API)
pub use domain::{
    expand_tasks, parse_targets, validate_target, Completion, KindSelection, ScanKind,
    ScanOutcome, ScanResult, ScanTask, SessionEvent, SessionState, SessionStats,
};

// Re-export other commonly used types
pub use adapters::{InjectionTestAdapter, PortScanAdapter, ToolDiscovery};
pub use application::{AdapterRegistry, ScanSession, TaskQueue};
pub use config::{ConfigStore, ScanConfig, ToolConfig};
pub use error::{Error, Result};
pub use ports::{ScanListener, ScannerAdapter};
pub use tokio_util::sync::CancellationToken;
