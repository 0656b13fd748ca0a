//! Bounded execution of one scanner process.
//!
//! A run ends in one of three ways: the process exits, the time limit
//! passes, or the cancel token fires. In the last two cases the process is
//! terminated (SIGTERM, a short grace period, then SIGKILL) and reaped before
//! the result is returned. On Unix each scanner runs in its own process
//! group and signals go to the whole group. The group is swept with SIGKILL
//! on every exit path, including a normal exit, so no helper the scanner
//! forked outlives the run.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::domain::{ScanResult, ScanTask};

/// Grace period between SIGTERM and SIGKILL.
const KILL_GRACE_PERIOD: Duration = Duration::from_millis(300);

/// A fully built scanner command line plus its time limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolProcess {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

enum Waited {
    Exited(std::io::Result<ExitStatus>, std::io::Result<String>, std::io::Result<String>),
    TimedOut,
    Cancelled,
}

impl ToolProcess {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Printable command line, for logs.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.display().to_string())
            .chain(self.args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run the process for `task` and classify how it ended.
    pub async fn run(&self, task: &ScanTask, cancel: &CancellationToken) -> ScanResult {
        if cancel.is_cancelled() {
            debug!(task = task.id, "Cancelled before spawn, skipping");
            return ScanResult::skipped(task.clone());
        }

        let started = Instant::now();
        debug!(task = task.id, command = %self.command_line(), "Spawning scanner");

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Backstop only: every normal path terminates and reaps explicitly.
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!(task = task.id, program = %self.program.display(), error = %e, "Failed to launch scanner");
                return ScanResult::process_error(
                    task.clone(),
                    launch_error_message(&self.program, &e),
                    started.elapsed(),
                );
            }
        };

        let pid = child.id();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let waited = tokio::select! {
            (status, out, err) = async {
                tokio::join!(child.wait(), read_pipe(stdout), read_pipe(stderr))
            } => Waited::Exited(status, out, err),
            _ = tokio::time::sleep(self.timeout) => Waited::TimedOut,
            _ = cancel.cancelled() => Waited::Cancelled,
        };

        match waited {
            Waited::Exited(status, stdout, stderr) => {
                let elapsed = started.elapsed();
                sweep_group(pid);
                match (status, stdout, stderr) {
                    (Ok(status), Ok(stdout), Ok(stderr)) => {
                        debug!(task = task.id, status = %status, "Scanner exited");
                        if status.success() {
                            ScanResult::success(task.clone(), stdout, elapsed)
                        } else {
                            ScanResult::tool_error(task.clone(), stderr, elapsed)
                        }
                    }
                    (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => {
                        warn!(task = task.id, error = %e, "I/O failure while running scanner");
                        terminate(&mut child, pid).await;
                        ScanResult::process_error(task.clone(), e.to_string(), elapsed)
                    }
                }
            }
            Waited::TimedOut => {
                warn!(task = task.id, timeout_secs = self.timeout.as_secs(), "Scanner timed out");
                terminate(&mut child, pid).await;
                ScanResult::timeout(task.clone(), self.timeout, started.elapsed())
            }
            Waited::Cancelled => {
                debug!(task = task.id, "Cancelled while running, terminating scanner");
                terminate(&mut child, pid).await;
                ScanResult::cancelled(task.clone(), started.elapsed())
            }
        }
    }
}

/// Read a child pipe to the end as lossy UTF-8.
async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>) -> std::io::Result<String> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf).await?;
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Terminate a child gracefully, force-kill after the grace period, and reap it.
async fn terminate(child: &mut Child, pid: Option<u32>) {
    if stop_group(child, pid).await {
        return;
    }

    debug!(pid = ?pid, "Force killing scanner");
    if let Err(e) = child.kill().await {
        warn!(error = %e, "Failed to kill scanner process");
    }
}

/// SIGTERM the process group, wait out the grace period, then SIGKILL the
/// group. Returns true if the leader exited and was reaped.
#[cfg(unix)]
async fn stop_group(child: &mut Child, pid: Option<u32>) -> bool {
    use nix::sys::signal::Signal;

    let Some(pid) = pid else {
        return false;
    };

    signal_group(pid, Signal::SIGTERM);
    let exited = tokio::time::timeout(KILL_GRACE_PERIOD, child.wait())
        .await
        .is_ok();
    // Sweep anything left in the group, leader included.
    signal_group(pid, Signal::SIGKILL);
    exited
}

/// Kill whatever is left in the group after the leader exited on its own.
#[cfg(unix)]
fn sweep_group(pid: Option<u32>) {
    if let Some(pid) = pid {
        signal_group(pid, nix::sys::signal::Signal::SIGKILL);
    }
}

#[cfg(not(unix))]
fn sweep_group(_pid: Option<u32>) {}

#[cfg(not(unix))]
async fn stop_group(_child: &mut Child, _pid: Option<u32>) -> bool {
    false
}

#[cfg(unix)]
fn signal_group(pid: u32, signal: nix::sys::signal::Signal) {
    use nix::sys::signal::killpg;
    use nix::unistd::Pid;

    match killpg(Pid::from_raw(pid as i32), signal) {
        Ok(()) => debug!(pgid = pid, signal = ?signal, "Signalled scanner process group"),
        // ESRCH: the group is already gone.
        Err(e) => debug!(pgid = pid, signal = ?signal, error = %e, "Could not signal process group"),
    }
}

fn launch_error_message(program: &Path, e: &std::io::Error) -> String {
    if e.kind() == std::io::ErrorKind::NotFound {
        format!("{} not found: {}", program.display(), e)
    } else {
        format!("failed to launch {}: {}", program.display(), e)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::domain::{ScanKind, ScanOutcome};

    fn task() -> ScanTask {
        ScanTask::new(7, ScanKind::PortScan, "localhost")
    }

    fn sh(script: &str, timeout: Duration) -> ToolProcess {
        ToolProcess::new("/bin/sh", vec!["-c".to_string(), script.to_string()], timeout)
    }

    #[tokio::test]
    async fn test_success_captures_stdout() {
        let process = sh("echo open; echo noise >&2", Duration::from_secs(5));
        let result = process.run(&task(), &CancellationToken::new()).await;
        assert_eq!(result.outcome, ScanOutcome::Success);
        assert_eq!(result.output, "open\n");
        assert!(result.error_detail.is_none());
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_tool_error() {
        let process = sh("echo partial; echo 'bad target' >&2; exit 3", Duration::from_secs(5));
        let result = process.run(&task(), &CancellationToken::new()).await;
        assert_eq!(result.outcome, ScanOutcome::ToolError);
        assert_eq!(result.error_detail.as_deref(), Some("bad target\n"));
        assert!(result.output.is_empty());
    }

    #[tokio::test]
    async fn test_missing_binary_is_process_error() {
        let process = ToolProcess::new("/nonexistent/nmap", vec![], Duration::from_secs(5));
        let result = process.run(&task(), &CancellationToken::new()).await;
        assert_eq!(result.outcome, ScanOutcome::ProcessError);
        assert!(result.error_detail.unwrap().contains("not found"));
    }

    #[tokio::test]
    async fn test_timeout_terminates_process() {
        let process = sh("sleep 30", Duration::from_millis(200));
        let started = Instant::now();
        let result = process.run(&task(), &CancellationToken::new()).await;
        assert_eq!(result.outcome, ScanOutcome::Timeout);
        assert!(result.output.is_empty());
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_cancel_before_spawn_skips() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let process = ToolProcess::new("/nonexistent/never-run", vec![], Duration::from_secs(5));
        let result = process.run(&task(), &cancel).await;
        assert_eq!(result.outcome, ScanOutcome::Skipped);
    }

    #[tokio::test]
    async fn test_cancel_while_running() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });
        let process = sh("sleep 30", Duration::from_secs(60));
        let started = Instant::now();
        let result = process.run(&task(), &cancel).await;
        assert_eq!(result.outcome, ScanOutcome::Cancelled);
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    /// Script that backgrounds a detached `sleep`, records its pid in
    /// `pid_file`, then runs `rest`.
    #[cfg(target_os = "linux")]
    fn forking_script(pid_file: &Path, rest: &str) -> String {
        format!(
            "sleep 30 >/dev/null 2>&1 </dev/null & echo $! > '{}'; {}",
            pid_file.display(),
            rest
        )
    }

    /// True once `pid` no longer runs: gone, or a zombie awaiting its reaper.
    #[cfg(target_os = "linux")]
    fn helper_stopped(pid_file: &Path) -> bool {
        let pid = std::fs::read_to_string(pid_file).unwrap();
        let pid = pid.trim();
        let deadline = Instant::now() + Duration::from_secs(2);
        loop {
            let state = std::fs::read_to_string(format!("/proc/{}/stat", pid))
                .ok()
                .and_then(|stat| {
                    stat.rsplit_once(')')
                        .and_then(|(_, rest)| rest.split_whitespace().next().map(str::to_string))
                });
            match state.as_deref() {
                None | Some("Z") | Some("X") => return true,
                _ if Instant::now() >= deadline => return false,
                _ => std::thread::sleep(Duration::from_millis(20)),
            }
        }
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_helpers_killed_after_normal_exit() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = dir.path().join("helper.pid");
        let process = sh(&forking_script(&pid_file, "echo ok"), Duration::from_secs(5));

        let result = process.run(&task(), &CancellationToken::new()).await;
        assert_eq!(result.outcome, ScanOutcome::Success);
        assert_eq!(result.output, "ok\n");
        assert!(helper_stopped(&pid_file));
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_helpers_killed_on_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = dir.path().join("helper.pid");
        let process = sh(&forking_script(&pid_file, "sleep 30"), Duration::from_millis(300));

        let result = process.run(&task(), &CancellationToken::new()).await;
        assert_eq!(result.outcome, ScanOutcome::Timeout);
        assert!(helper_stopped(&pid_file));
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_helpers_killed_on_cancel() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = dir.path().join("helper.pid");
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            trigger.cancel();
        });
        let process = sh(&forking_script(&pid_file, "sleep 30"), Duration::from_secs(60));

        let result = process.run(&task(), &cancel).await;
        assert_eq!(result.outcome, ScanOutcome::Cancelled);
        assert!(helper_stopped(&pid_file));
    }

    #[test]
    fn test_command_line() {
        let process = ToolProcess::new(
            "/usr/bin/nmap",
            vec!["-v".to_string(), "example.com".to_string()],
            Duration::from_secs(1),
        );
        assert_eq!(process.command_line(), "/usr/bin/nmap -v example.com");
    }
}
