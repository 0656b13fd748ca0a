//! Scanner executable discovery.

use std::path::{Path, PathBuf};

use crate::domain::ScanKind;

/// Default paths to search for nmap.
const NMAP_PATHS: &[&str] = &[
    "/opt/homebrew/bin/nmap", // Apple Silicon
    "/usr/local/bin/nmap",    // Intel Mac / Homebrew / source installs
    "/usr/bin/nmap",          // System
];

/// Default paths to search for sqlmap.
const SQLMAP_PATHS: &[&str] = &[
    "/opt/homebrew/bin/sqlmap",
    "/usr/local/bin/sqlmap",
    "/usr/bin/sqlmap",
    "/usr/share/sqlmap/sqlmap.py", // Kali package layout
];

/// Resolves the program path of each scanner.
#[derive(Debug, Clone)]
pub struct ToolDiscovery {
    nmap_path: Option<PathBuf>,
    sqlmap_path: Option<PathBuf>,
}

impl ToolDiscovery {
    /// Searches well-known locations, then `PATH`, for nmap and sqlmap.
    pub fn new() -> Self {
        Self {
            nmap_path: find_executable(NMAP_PATHS)
                .or_else(|| find_in_path(ScanKind::PortScan.program_name())),
            sqlmap_path: find_executable(SQLMAP_PATHS)
                .or_else(|| find_in_path(ScanKind::InjectionTest.program_name())),
        }
    }

    /// Creates a discovery with explicit paths (no filesystem search).
    pub fn with_paths(nmap_path: Option<PathBuf>, sqlmap_path: Option<PathBuf>) -> Self {
        Self {
            nmap_path,
            sqlmap_path,
        }
    }

    /// Returns the discovered path for a scanner, if any.
    pub fn path(&self, kind: ScanKind) -> Option<&PathBuf> {
        match kind {
            ScanKind::PortScan => self.nmap_path.as_ref(),
            ScanKind::InjectionTest => self.sqlmap_path.as_ref(),
        }
    }

    /// Returns true if the scanner was found.
    pub fn is_available(&self, kind: ScanKind) -> bool {
        self.path(kind).is_some()
    }

    /// Program to launch: the discovered path, or the bare program name so
    /// that a missing tool surfaces as a launch failure.
    pub fn resolve(&self, kind: ScanKind) -> PathBuf {
        self.path(kind)
            .cloned()
            .unwrap_or_else(|| PathBuf::from(kind.program_name()))
    }
}

impl Default for ToolDiscovery {
    fn default() -> Self {
        Self::new()
    }
}

/// Finds an executable in the given paths.
fn find_executable(paths: &[&str]) -> Option<PathBuf> {
    paths
        .iter()
        .map(PathBuf::from)
        .find(|path| is_executable_file(path))
}

/// Finds `name` in the directories listed by `PATH`.
pub fn find_in_path(name: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable_file(candidate))
}

/// Where `program` would be launched from, if it can be.
///
/// A bare name like `nmap` is looked up on `PATH` the way the OS would;
/// anything with a directory part must itself be an executable file.
pub fn locate_program(program: &Path) -> Option<PathBuf> {
    let is_bare = program.parent().map_or(true, |p| p.as_os_str().is_empty());
    if is_bare {
        find_in_path(program.to_str()?)
    } else if is_executable_file(program) {
        Some(program.to_path_buf())
    } else {
        None
    }
}

#[cfg(unix)]
fn is_executable_file(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable_file(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_discovery_creation() {
        let discovery = ToolDiscovery::new();
        // Just test that it doesn't panic
        let _ = discovery.is_available(ScanKind::PortScan);
        let _ = discovery.is_available(ScanKind::InjectionTest);
    }

    #[cfg(unix)]
    #[test]
    fn test_find_executable() {
        let result = find_executable(&["/nonexistent/path", "/bin/sh"]);
        assert_eq!(result, Some(PathBuf::from("/bin/sh")));

        let result = find_executable(&["/nonexistent/path"]);
        assert!(result.is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_find_in_path() {
        assert!(find_in_path("sh").is_some());
        assert!(find_in_path("definitely-not-a-real-tool-xyz").is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_locate_program() {
        assert!(locate_program(Path::new("sh")).is_some());
        assert_eq!(
            locate_program(Path::new("/bin/sh")),
            Some(PathBuf::from("/bin/sh"))
        );
        assert!(locate_program(Path::new("definitely-not-a-real-tool-xyz")).is_none());
        assert!(locate_program(Path::new("/nonexistent/nmap")).is_none());
    }

    #[test]
    fn test_resolve_falls_back_to_program_name() {
        let discovery = ToolDiscovery::with_paths(None, Some(PathBuf::from("/opt/sqlmap")));
        assert_eq!(discovery.resolve(ScanKind::PortScan), PathBuf::from("nmap"));
        assert_eq!(
            discovery.resolve(ScanKind::InjectionTest),
            PathBuf::from("/opt/sqlmap")
        );
        assert!(!discovery.is_available(ScanKind::PortScan));
    }
}
