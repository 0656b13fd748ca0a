//! Tools command - show the resolved scanner executables.

use anyhow::Result;
use serde::Serialize;
use webscan_core::adapters::locate_program;
use webscan_core::{ConfigStore, ScanKind, ToolDiscovery};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ToolStatus {
    kind: ScanKind,
    program: String,
    available: bool,
    configured: bool,
    timeout_secs: u64,
}

pub async fn show(json: bool) -> Result<()> {
    let config = ConfigStore::new()?.load().await?;
    let discovery = ToolDiscovery::new();

    let tools: Vec<ToolStatus> = ScanKind::ALL
        .iter()
        .map(|&kind| {
            let tool = config.tool(kind);
            let program = tool.resolve_program(kind, &discovery);
            ToolStatus {
                kind,
                available: locate_program(&program).is_some(),
                configured: tool.program.is_some(),
                program: program.display().to_string(),
                timeout_secs: tool.timeout_secs,
            }
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&tools)?);
        return Ok(());
    }

    println!("{:<8} {:<10} {:<9} PROGRAM", "TOOL", "STATUS", "TIMEOUT");
    println!("{}", "-".repeat(60));
    for (kind, tool) in ScanKind::ALL.iter().zip(&tools) {
        let status = if tool.available { "found" } else { "missing" };
        let source = if tool.configured { " (configured)" } else { "" };
        println!(
            "{:<8} {:<10} {:<9} {}{}",
            kind.tool_label(),
            status,
            format!("{}s", tool.timeout_secs),
            tool.program,
            source
        );
    }
    Ok(())
}
