//! Example: Run a session against the targets given on the command line.
//!
//! ```sh
//! cargo run -p webscan-core --example run_session -- scanme.nmap.org
//! ```

use std::time::Duration;

use webscan_core::{KindSelection, ScanSession, SessionEvent, ToolDiscovery};

fn main() {
    let targets: Vec<String> = std::env::args().skip(1).collect();
    if targets.is_empty() {
        eprintln!("usage: run_session <target>...");
        std::process::exit(2);
    }

    let discovery = ToolDiscovery::new();
    for kind in webscan_core::ScanKind::ALL {
        println!("{:<8} {}", kind.tool_label(), discovery.resolve(kind).display());
    }
    println!();

    let session = ScanSession::default()
        .with_listener(|event: &SessionEvent| print!("{}", event.render()));

    if let Err(e) = session.start_selection(&targets, KindSelection::Both) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    while !session.poll_completion() {
        std::thread::sleep(Duration::from_secs(1));
    }

    let stats = session.stats();
    println!(
        "{} of {} tasks reported, {} cleared",
        stats.delivered, stats.enqueued, stats.cleared
    );
}
