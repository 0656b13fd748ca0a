//! Adapter lookup by scan kind.

use std::collections::HashMap;
use std::sync::Arc;

use crate::adapters::{InjectionTestAdapter, PortScanAdapter, ToolDiscovery};
use crate::domain::ScanKind;
use crate::ports::ScannerAdapter;

/// The set of adapters a worker dispatches to. Cheap to clone.
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: HashMap<ScanKind, Arc<dyn ScannerAdapter>>,
}

impl AdapterRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// nmap and sqlmap adapters with default limits, resolved via `discovery`.
    pub fn from_discovery(discovery: &ToolDiscovery) -> Self {
        Self::new()
            .with(PortScanAdapter::new(discovery.resolve(ScanKind::PortScan)))
            .with(InjectionTestAdapter::new(
                discovery.resolve(ScanKind::InjectionTest),
            ))
    }

    /// Register an adapter under its own kind, replacing any previous one.
    pub fn with(mut self, adapter: impl ScannerAdapter + 'static) -> Self {
        self.register(Arc::new(adapter));
        self
    }

    pub fn register(&mut self, adapter: Arc<dyn ScannerAdapter>) {
        self.adapters.insert(adapter.kind(), adapter);
    }

    pub fn get(&self, kind: ScanKind) -> Option<&Arc<dyn ScannerAdapter>> {
        self.adapters.get(&kind)
    }

    pub fn contains(&self, kind: ScanKind) -> bool {
        self.adapters.contains_key(&kind)
    }

    /// Registered kinds in adapter-selection order.
    pub fn kinds(&self) -> Vec<ScanKind> {
        ScanKind::ALL
            .iter()
            .copied()
            .filter(|k| self.contains(*k))
            .collect()
    }
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}
