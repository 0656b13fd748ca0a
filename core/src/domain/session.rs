//! Session lifecycle types and consumer events.

use serde::{Deserialize, Serialize};

use super::ScanResult;

/// How a session run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "message")]
pub enum Completion {
    /// Queue drained naturally.
    Finished,
    /// Stopped by an explicit cancel.
    Cancelled,
    /// The worker hit an internal fault.
    Failed(String),
}

impl Completion {
    /// Final line shown to users.
    pub fn message(&self) -> String {
        match self {
            Completion::Finished => "Scan complete.".to_string(),
            Completion::Cancelled => "Scan cancelled.".to_string(),
            Completion::Failed(reason) => format!("Scan failed: {}", reason),
        }
    }
}

/// Lifecycle: Idle → Running → {Completed, Cancelling → Completed}.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", tag = "state", content = "completion")]
pub enum SessionState {
    #[default]
    Idle,
    Running,
    Cancelling,
    Completed(Completion),
}

impl SessionState {
    /// True while a worker may still be active.
    pub fn is_active(&self) -> bool {
        matches!(self, SessionState::Running | SessionState::Cancelling)
    }

    /// The completion marker, once the run is over.
    pub fn completion(&self) -> Option<&Completion> {
        match self {
            SessionState::Completed(c) => Some(c),
            _ => None,
        }
    }
}

/// Item delivered to consumers, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "event")]
pub enum SessionEvent {
    /// One task finished.
    Result(ScanResult),
    /// The run is over; always the last event of a run.
    Finished { completion: Completion },
}

impl SessionEvent {
    /// Text notification for this event.
    pub fn render(&self) -> String {
        match self {
            SessionEvent::Result(r) => r.render(),
            SessionEvent::Finished { completion } => format!("{}\n", completion.message()),
        }
    }
}

/// Task counters for one run.
///
/// `enqueued == pending + delivered + cleared` holds at every observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SessionStats {
    pub enqueued: u64,
    pub delivered: u64,
    pub cleared: u64,
    /// Tasks still queued or currently being executed.
    pub pending: u64,
}

impl SessionStats {
    pub fn is_conserved(&self) -> bool {
        self.enqueued == self.pending + self.delivered + self.cleared
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_messages() {
        assert_eq!(Completion::Finished.message(), "Scan complete.");
        assert_eq!(Completion::Cancelled.message(), "Scan cancelled.");
        assert_eq!(
            Completion::Failed("boom".into()).message(),
            "Scan failed: boom"
        );
    }

    #[test]
    fn test_state_helpers() {
        assert!(!SessionState::Idle.is_active());
        assert!(SessionState::Running.is_active());
        assert!(SessionState::Cancelling.is_active());
        let done = SessionState::Completed(Completion::Cancelled);
        assert!(!done.is_active());
        assert_eq!(done.completion(), Some(&Completion::Cancelled));
    }

    #[test]
    fn test_finished_event_json() {
        let event = SessionEvent::Finished {
            completion: Completion::Failed("x".into()),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "finished");
        assert_eq!(json["completion"]["kind"], "failed");
        assert_eq!(json["completion"]["message"], "x");
    }
}
