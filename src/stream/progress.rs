use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::stream::events::{EventKind, StreamEvent};

/// Step label shown between submit and the first stream event.
pub const CONNECTING_STEP: &str = "Contacting the travel agent...";

// ============================================================================
// Phase
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum Phase {
    Idle,
    Connecting,
    Streaming,
    Completed,
    Errored,
}

impl Phase {
    /// Terminal phases accept no further mutation.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Errored)
    }
}

// ============================================================================
// Progress State
// ============================================================================

/// One line of the visible progress log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub kind: EventKind,
    pub message: String,
}

/// Percent-bar tuning: how far each non-terminal event advances the bar and
/// where it tops out.
#[derive(Debug, Clone)]
pub struct ProgressSettings {
    pub increment: u8,
    pub cap: u8,
}

impl Default for ProgressSettings {
    fn default() -> Self {
        Self {
            increment: 20,
            cap: 100,
        }
    }
}

/// The state one stream session folds its events into.
///
/// Owned exclusively by the session task, so every mutation is observably
/// atomic. The percent is monotonic and saturates at the cap; the log is
/// append-only in arrival order.
#[derive(Debug, Clone)]
pub struct ProgressState {
    current_step: String,
    percent: u8,
    log: Vec<LogEntry>,
    phase: Phase,
    payload: Option<String>,
}

impl Default for ProgressState {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressState {
    pub fn new() -> Self {
        Self {
            current_step: CONNECTING_STEP.to_string(),
            percent: 0,
            log: Vec::new(),
            phase: Phase::Idle,
            payload: None,
        }
    }

    pub fn current_step(&self) -> &str {
        &self.current_step
    }

    pub fn percent(&self) -> u8 {
        self.percent
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn log(&self) -> &[LogEntry] {
        &self.log
    }

    pub fn last_entry(&self) -> Option<&LogEntry> {
        self.log.last()
    }

    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Mark the session as dialing out. No-op once terminal.
    pub fn connect(&mut self) {
        if !self.phase.is_terminal() {
            self.phase = Phase::Connecting;
        }
    }

    /// Fold one stream event in. Applying anything to a terminal state is
    /// the identity, which makes duplicate terminal delivery a no-op.
    pub fn apply(&mut self, event: StreamEvent, settings: &ProgressSettings) {
        if self.phase.is_terminal() {
            return;
        }
        match event {
            StreamEvent::Complete { html } => {
                self.phase = Phase::Completed;
                self.payload = Some(html);
            }
            other => {
                let kind = other.kind();
                let message = other.message().unwrap_or_default().to_string();
                self.phase = Phase::Streaming;
                self.current_step = message.clone();
                self.percent = self
                    .percent
                    .saturating_add(settings.increment)
                    .min(settings.cap);
                self.log.push(LogEntry { kind, message });
            }
        }
    }

    /// Record a transport failure. The step label stays as it was so the
    /// loading surface does not go blank; the log gets the marked entry.
    /// No-op once terminal.
    pub fn fail(&mut self, reason: &str) {
        if self.phase.is_terminal() {
            return;
        }
        self.phase = Phase::Errored;
        self.log.push(LogEntry {
            kind: EventKind::Error,
            message: format!("stream failed: {reason}"),
        });
    }

    /// Hand the completion payload off. Only ever `Some` after a `Complete`
    /// was applied.
    pub fn take_payload(&mut self) -> Option<String> {
        self.payload.take()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn log(message: &str) -> StreamEvent {
        StreamEvent::Log {
            message: message.to_string(),
        }
    }

    #[test]
    fn test_percent_saturates_at_cap() {
        let settings = ProgressSettings::default();
        let mut state = ProgressState::new();
        state.connect();

        let mut seen = Vec::new();
        for i in 0..6 {
            state.apply(log(&format!("step {i}")), &settings);
            seen.push(state.percent());
        }
        assert_eq!(seen, vec![20, 40, 60, 80, 100, 100]);
        assert_eq!(state.phase(), Phase::Streaming);
    }

    #[test]
    fn test_percent_monotonic_with_small_cap() {
        let settings = ProgressSettings {
            increment: 30,
            cap: 80,
        };
        let mut state = ProgressState::new();

        let mut previous = 0;
        for i in 0..5 {
            state.apply(log(&format!("step {i}")), &settings);
            assert!(state.percent() >= previous);
            assert!(state.percent() <= settings.cap);
            previous = state.percent();
        }
        assert_eq!(state.percent(), 80);
    }

    #[test]
    fn test_apply_updates_step_and_log_order() {
        let settings = ProgressSettings::default();
        let mut state = ProgressState::new();
        assert_eq!(state.current_step(), CONNECTING_STEP);

        state.apply(log("first"), &settings);
        state.apply(
            StreamEvent::Tool {
                message: "search_flights".to_string(),
            },
            &settings,
        );
        state.apply(
            StreamEvent::Error {
                message: "retrying a carrier".to_string(),
            },
            &settings,
        );

        assert_eq!(state.current_step(), "retrying a carrier");
        let kinds: Vec<EventKind> = state.log().iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![EventKind::Log, EventKind::Tool, EventKind::Error]
        );
        let messages: Vec<&str> = state.log().iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["first", "search_flights", "retrying a carrier"]);
    }

    #[test]
    fn test_complete_is_terminal_and_stores_payload() {
        let settings = ProgressSettings::default();
        let mut state = ProgressState::new();
        state.apply(log("searching"), &settings);
        state.apply(
            StreamEvent::Complete {
                html: "<p>offers</p>".to_string(),
            },
            &settings,
        );

        assert_eq!(state.phase(), Phase::Completed);
        assert!(state.is_terminal());
        // Percent and log are the last pre-terminal frame, untouched.
        assert_eq!(state.percent(), 20);
        assert_eq!(state.log().len(), 1);
        assert_eq!(state.take_payload(), Some("<p>offers</p>".to_string()));
    }

    #[test]
    fn test_duplicate_complete_is_identity() {
        let settings = ProgressSettings::default();
        let mut state = ProgressState::new();
        state.apply(log("searching"), &settings);
        state.apply(
            StreamEvent::Complete {
                html: "first".to_string(),
            },
            &settings,
        );

        let percent = state.percent();
        let log_len = state.log().len();

        state.apply(
            StreamEvent::Complete {
                html: "second".to_string(),
            },
            &settings,
        );
        state.apply(log("late straggler"), &settings);

        assert_eq!(state.phase(), Phase::Completed);
        assert_eq!(state.percent(), percent);
        assert_eq!(state.log().len(), log_len);
        assert_eq!(state.take_payload(), Some("first".to_string()));
    }

    #[test]
    fn test_fail_appends_marked_entry() {
        let settings = ProgressSettings::default();
        let mut state = ProgressState::new();
        state.connect();
        state.apply(log("searching"), &settings);
        let step = state.current_step().to_string();

        state.fail("connection refused");

        assert_eq!(state.phase(), Phase::Errored);
        let entry = state.last_entry().unwrap();
        assert_eq!(entry.kind, EventKind::Error);
        assert!(entry.message.contains("connection refused"));
        // Loading surface keeps its last label rather than going blank.
        assert_eq!(state.current_step(), step);
        assert_eq!(state.take_payload(), None);
    }

    #[test]
    fn test_fail_after_terminal_is_identity() {
        let settings = ProgressSettings::default();
        let mut state = ProgressState::new();
        state.apply(
            StreamEvent::Complete {
                html: "done".to_string(),
            },
            &settings,
        );

        state.fail("late transport error");
        assert_eq!(state.phase(), Phase::Completed);
        assert!(state.log().is_empty());

        let mut errored = ProgressState::new();
        errored.fail("first");
        let log_len = errored.log().len();
        errored.fail("second");
        assert_eq!(errored.log().len(), log_len);
    }
}
