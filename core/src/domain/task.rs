//! Scan kinds, tasks and task expansion.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ============================================================================
// ScanKind
// ============================================================================

/// The kind of external scanner a task runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScanKind {
    /// Network port scan (nmap).
    PortScan,
    /// SQL-injection test (sqlmap).
    InjectionTest,
}

impl ScanKind {
    /// All kinds in adapter-selection order.
    pub const ALL: [ScanKind; 2] = [ScanKind::PortScan, ScanKind::InjectionTest];

    /// Label of the tool backing this kind, as shown in notifications.
    pub fn tool_label(&self) -> &'static str {
        match self {
            ScanKind::PortScan => "Nmap",
            ScanKind::InjectionTest => "SQLMap",
        }
    }

    /// Default program name of the backing tool.
    pub fn program_name(&self) -> &'static str {
        match self {
            ScanKind::PortScan => "nmap",
            ScanKind::InjectionTest => "sqlmap",
        }
    }

    /// Verb used in error notifications ("scanning" / "testing").
    pub fn verb(&self) -> &'static str {
        match self {
            ScanKind::PortScan => "scanning",
            ScanKind::InjectionTest => "testing",
        }
    }
}

impl std::fmt::Display for ScanKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.program_name())
    }
}

// ============================================================================
// KindSelection
// ============================================================================

/// Which scanners a front end asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum KindSelection {
    /// Port scan only.
    #[default]
    PortScan,
    /// Injection test only.
    InjectionTest,
    /// Port scan followed by injection test for every target.
    Both,
}

impl KindSelection {
    /// Expand into the ordered list of kinds.
    pub fn kinds(&self) -> Vec<ScanKind> {
        match self {
            KindSelection::PortScan => vec![ScanKind::PortScan],
            KindSelection::InjectionTest => vec![ScanKind::InjectionTest],
            KindSelection::Both => ScanKind::ALL.to_vec(),
        }
    }
}

impl std::str::FromStr for KindSelection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "port" | "portscan" | "nmap" => Ok(KindSelection::PortScan),
            "injection" | "injectiontest" | "sqlmap" => Ok(KindSelection::InjectionTest),
            "both" | "all" => Ok(KindSelection::Both),
            other => Err(Error::InvalidInput(format!("unknown scan kind: {}", other))),
        }
    }
}

// ============================================================================
// ScanTask
// ============================================================================

/// One (kind, target) unit of work. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScanTask {
    /// Sequence number within the session, in enqueue order.
    pub id: u64,
    /// Scanner to run.
    pub kind: ScanKind,
    /// Host name, address or URL handed to the scanner.
    pub target: String,
}

impl ScanTask {
    /// Create a new task.
    pub fn new(id: u64, kind: ScanKind, target: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            target: target.into(),
        }
    }
}

impl std::fmt::Display for ScanTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{} {} {}", self.id, self.kind, self.target)
    }
}

/// Normalize a kind list: drop duplicates and order by adapter-selection order.
pub fn normalize_kinds(kinds: &[ScanKind]) -> Vec<ScanKind> {
    ScanKind::ALL
        .iter()
        .copied()
        .filter(|k| kinds.contains(k))
        .collect()
}

/// Expand targets × kinds into tasks: for each target, for each kind.
///
/// Task ids start at zero and follow enqueue order.
pub fn expand_tasks(targets: &[String], kinds: &[ScanKind]) -> Vec<ScanTask> {
    let kinds = normalize_kinds(kinds);
    targets
        .iter()
        .flat_map(|target| kinds.iter().map(move |kind| (*kind, target)))
        .enumerate()
        .map(|(i, (kind, target))| ScanTask::new(i as u64, kind, target.clone()))
        .collect()
}

/// Split a free-text input field into targets (whitespace separated).
pub fn parse_targets(input: &str) -> Vec<String> {
    input.split_whitespace().map(str::to_string).collect()
}

/// Reject targets the external tools would misread.
///
/// A leading `-` would be parsed as an option by both nmap and sqlmap.
pub fn validate_target(target: &str) -> Result<()> {
    if target.is_empty() {
        return Err(Error::InvalidInput("empty target".to_string()));
    }
    if target.starts_with('-') {
        return Err(Error::InvalidInput(format!(
            "target must not start with '-': {}",
            target
        )));
    }
    if target.chars().any(|c| c.is_control() || c.is_whitespace()) {
        return Err(Error::InvalidInput(format!(
            "target contains whitespace or control characters: {:?}",
            target
        )));
    }
    Ok(())
}
