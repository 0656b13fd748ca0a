//! nmap-backed port scan adapter.
//!
//! Runs `nmap -v <target>` with a five minute limit.

use std::path::PathBuf;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::process::ToolProcess;
use crate::domain::{ScanKind, ScanTask};
use crate::ports::{ExecuteFuture, ScannerAdapter};

/// Default time limit for one port scan.
pub const PORT_SCAN_TIMEOUT: Duration = Duration::from_secs(300);

/// Port scan adapter.
#[derive(Debug, Clone)]
pub struct PortScanAdapter {
    program: PathBuf,
    timeout: Duration,
    extra_args: Vec<String>,
}

impl PortScanAdapter {
    /// Adapter launching `program` with the default time limit.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            timeout: PORT_SCAN_TIMEOUT,
            extra_args: Vec::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Arguments appended after `-v <target>`.
    pub fn with_extra_args(mut self, extra_args: Vec<String>) -> Self {
        self.extra_args = extra_args;
        self
    }

    /// Build the process for a target.
    pub fn process(&self, target: &str) -> ToolProcess {
        let mut args = vec!["-v".to_string(), target.to_string()];
        args.extend(self.extra_args.iter().cloned());
        ToolProcess::new(self.program.clone(), args, self.timeout)
    }
}

impl ScannerAdapter for PortScanAdapter {
    fn kind(&self) -> ScanKind {
        ScanKind::PortScan
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    fn execute<'a>(
        &'a self,
        task: &'a ScanTask,
        cancel: &'a CancellationToken,
    ) -> ExecuteFuture<'a> {
        Box::pin(async move { self.process(&task.target).run(task, cancel).await })
    }
}
