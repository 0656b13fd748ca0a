//! Adapters layer - External system implementations.
//!
//! Process-backed implementations of [`ScannerAdapter`](crate::ports::ScannerAdapter)
//! plus discovery of the scanner executables.

pub mod discovery;
pub mod port_scan;
pub mod process;

// Re-export main types for convenience
pub use discovery::{locate_program, ToolDiscovery};
pub use injection_test::{InjectionTestAdapter, INJECTION_TEST_TIMEOUT};
pub use port_scan::{PortScanAdapter, PORT_SCAN_TIMEOUT};
pub use process::ToolProcess;
