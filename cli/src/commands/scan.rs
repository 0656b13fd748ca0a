//! Scan command - run a session and stream its results.

use std::time::Duration;

use anyhow::{bail, Result};
use chrono::Local;
use tokio::time::{interval, MissedTickBehavior};
use webscan_core::{
    parse_targets, Completion, ConfigStore, KindSelection, ScanSession, SessionEvent,
};

pub async fn run(
    targets: Vec<String>,
    kind: KindSelection,
    poll_ms: Option<u64>,
    json: bool,
) -> Result<()> {
    let config = ConfigStore::new()?.load().await?;
    let poll = poll_ms
        .map(|ms| Duration::from_millis(ms.max(1)))
        .unwrap_or_else(|| config.poll_interval());

    let targets: Vec<String> = targets.iter().flat_map(|t| parse_targets(t)).collect();

    let session = ScanSession::from_config(&config);
    session.start_selection(&targets, kind)?;
    tracing::debug!(session = %session.id(), "Started");

    if !json {
        println!(
            "[{}] Scanning {} target(s), {} task(s)\n",
            Local::now().format("%H:%M:%S"),
            targets.len(),
            session.stats().enqueued
        );
    }

    let mut ticker = interval(poll);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut cancel_requested = false;

    let completion = loop {
        tokio::select! {
            _ = ticker.tick() => {}
            signal = &mut ctrl_c, if !cancel_requested => {
                signal?;
                cancel_requested = true;
                match session.cancel() {
                    Ok(()) => eprintln!("Cancelling..."),
                    Err(e) if e.is_state_error() => {}
                    Err(e) => return Err(e.into()),
                }
            }
        }

        // Check before draining so the final event is never left behind.
        let done = session.poll_completion();
        for event in session.take_events() {
            print_event(&event, json)?;
        }
        if done {
            break session.completion();
        }
    };

    match completion {
        Some(Completion::Failed(reason)) => bail!("scan failed: {}", reason),
        _ => Ok(()),
    }
}

fn print_event(event: &SessionEvent, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(event)?);
        return Ok(());
    }

    match event {
        SessionEvent::Result(result) => {
            println!(
                "[{}] {} ({} ms)",
                result.finished_at.with_timezone(&Local).format("%H:%M:%S"),
                result.task,
                result.elapsed.as_millis()
            );
            print!("{}", event.render());
        }
        SessionEvent::Finished { .. } => print!("{}", event.render()),
    }
    Ok(())
}
