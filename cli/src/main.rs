//! webscan CLI - Run nmap and sqlmap against a list of targets
//!
//! A command-line front end for the scan session: start a scan, stream its
//! results, cancel with Ctrl-C, and inspect tools and configuration.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use webscan_core::KindSelection;

#[derive(Parser)]
#[command(name = "webscan")]
#[command(author, version, about = "Run port scans and SQL injection tests against targets")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan one or more targets
    Scan {
        /// Hosts, addresses or URLs (whitespace-separated lists are split)
        #[arg(required = true)]
        targets: Vec<String>,

        /// Which scanners to run: port, injection or both
        #[arg(short, long, default_value = "port")]
        kind: KindSelection,

        /// Completion poll interval in milliseconds (defaults to the config value)
        #[arg(long)]
        poll_ms: Option<u64>,
    },

    /// Show where each scanner was found
    Tools,

    /// Show current configuration
    Config,
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Scan {
            targets,
            kind,
            poll_ms,
        } => {
            commands::scan::run(targets, kind, poll_ms, cli.json).await?;
        }
        Commands::Tools => {
            commands::tools::show(cli.json).await?;
        }
        Commands::Config => {
            commands::config::show(cli.json).await?;
        }
    }

    Ok(())
}
