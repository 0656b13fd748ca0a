//! Ports layer - Trait definitions (interfaces).
//!
//! The application layer talks to scanners and consumers only through these
//! traits. Process-backed implementations live in `adapters`.

mod adapter;
mod listener;

pub use adapter::{ExecuteFuture, ScannerAdapter};
pub use listener::ScanListener;
