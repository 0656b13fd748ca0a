//! Configuration management for scanner tools and session defaults.
//!
//! Stores configuration in JSON format at `~/.webscan/config.json`.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::adapters::{
    InjectionTestAdapter, PortScanAdapter, ToolDiscovery, INJECTION_TEST_TIMEOUT,
    PORT_SCAN_TIMEOUT,
};
use crate::application::AdapterRegistry;
use crate::domain::ScanKind;
use crate::error::{Error, Result};

/// Settings for one external scanner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolConfig {
    /// Explicit program path; discovered when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program: Option<PathBuf>,

    /// Time limit for one invocation, in seconds.
    pub timeout_secs: u64,

    /// Arguments appended after the fixed ones.
    #[serde(default)]
    pub extra_args: Vec<String>,
}

impl ToolConfig {
    fn with_timeout(timeout: Duration) -> Self {
        Self {
            program: None,
            timeout_secs: timeout.as_secs(),
            extra_args: Vec::new(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The configured program, else whatever discovery resolves for `kind`.
    pub fn resolve_program(&self, kind: ScanKind, discovery: &ToolDiscovery) -> PathBuf {
        self.program
            .clone()
            .unwrap_or_else(|| discovery.resolve(kind))
    }
}

fn default_port_scan() -> ToolConfig {
    ToolConfig::with_timeout(PORT_SCAN_TIMEOUT)
}

fn default_injection_test() -> ToolConfig {
    ToolConfig::with_timeout(INJECTION_TEST_TIMEOUT)
}

fn default_poll_interval_ms() -> u64 {
    1000
}

/// Configuration data stored in JSON format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanConfig {
    /// nmap settings.
    #[serde(default = "default_port_scan")]
    pub port_scan: ToolConfig,

    /// sqlmap settings.
    #[serde(default = "default_injection_test")]
    pub injection_test: ToolConfig,

    /// How often front ends poll for completion, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            port_scan: default_port_scan(),
            injection_test: default_injection_test(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl ScanConfig {
    pub fn tool(&self, kind: ScanKind) -> &ToolConfig {
        match kind {
            ScanKind::PortScan => &self.port_scan,
            ScanKind::InjectionTest => &self.injection_test,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    /// Build the adapter set from these settings.
    pub fn adapters(&self, discovery: &ToolDiscovery) -> AdapterRegistry {
        let port_scan = &self.port_scan;
        let injection_test = &self.injection_test;

        AdapterRegistry::new()
            .with(
                PortScanAdapter::new(port_scan.resolve_program(ScanKind::PortScan, discovery))
                    .with_timeout(port_scan.timeout())
                    .with_extra_args(port_scan.extra_args.clone()),
            )
            .with(
                InjectionTestAdapter::new(
                    injection_test.resolve_program(ScanKind::InjectionTest, discovery),
                )
                .with_timeout(injection_test.timeout())
                .with_extra_args(injection_test.extra_args.clone()),
            )
    }
}

/// Configuration store.
///
/// Handles reading and writing configuration to `~/.webscan/config.json`.
pub struct ConfigStore {
    config_path: PathBuf,
}

impl ConfigStore {
    /// Create a new config store with the default path.
    pub fn new() -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;

        Ok(Self {
            config_path: home.join(".webscan").join("config.json"),
        })
    }

    /// Create a config store with a custom path (for testing).
    pub fn with_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Load configuration from disk.
    ///
    /// Returns default config if the file doesn't exist.
    pub async fn load(&self) -> Result<ScanConfig> {
        if !fs::try_exists(&self.config_path).await.unwrap_or(false) {
            return Ok(ScanConfig::default());
        }

        let content = fs::read_to_string(&self.config_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?;

        serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Save configuration to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub async fn save(&self, config: &ScanConfig) -> Result<()> {
        if let Some(config_dir) = self.config_path.parent() {
            fs::create_dir_all(config_dir)
                .await
                .map_err(|e| Error::Config(format!("Failed to create config directory: {}", e)))?;
        }

        let content = serde_json::to_string_pretty(config)?;

        // Write to a sibling temp file, then rename over the real one
        let temp_path = self.config_path.with_extension("json.tmp");

        let mut file = fs::File::create(&temp_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to create temp config file: {}", e)))?;

        file.write_all(content.as_bytes())
            .await
            .map_err(|e| Error::Config(format!("Failed to write config: {}", e)))?;

        file.sync_all()
            .await
            .map_err(|e| Error::Config(format!("Failed to sync config: {}", e)))?;

        fs::rename(&temp_path, &self.config_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to rename config file: {}", e)))?;

        Ok(())
    }

    /// Set the time limit for one scanner.
    pub async fn set_timeout(&self, kind: ScanKind, timeout: Duration) -> Result<()> {
        let mut config = self.load().await?;
        match kind {
            ScanKind::PortScan => config.port_scan.timeout_secs = timeout.as_secs(),
            ScanKind::InjectionTest => config.injection_test.timeout_secs = timeout.as_secs(),
        }
        self.save(&config).await
    }

    /// Set (or clear) the explicit program path for one scanner.
    pub async fn set_program(&self, kind: ScanKind, program: Option<PathBuf>) -> Result<()> {
        let mut config = self.load().await?;
        match kind {
            ScanKind::PortScan => config.port_scan.program = program,
            ScanKind::InjectionTest => config.injection_test.program = program,
        }
        self.save(&config).await
    }
}
