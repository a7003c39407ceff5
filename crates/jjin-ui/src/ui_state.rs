//! Per-screen async projection and the attempt bookkeeping behind it.
//!
//! Every fetch a screen issues is an *attempt* tagged with a monotonically
//! increasing sequence number and its own cancellation token. Only the
//! completion carrying the current sequence number may move the screen out
//! of `Loading`; anything older is dropped.

use tokio_util::sync::CancellationToken;

/// What a screen shows for its one upstream call.
#[derive(Debug, Clone, PartialEq)]
pub enum UiState<T> {
    Loading,
    Success(T),
    Error(String),
}

impl<T> UiState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn success(&self) -> Option<&T> {
        match self {
            Self::Success(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Error(message) => Some(message),
            _ => None,
        }
    }

    /// Project the success value, keeping `Loading`/`Error` as they are.
    pub fn map<U>(&self, f: impl FnOnce(&T) -> U) -> UiState<U> {
        match self {
            Self::Loading => UiState::Loading,
            Self::Success(value) => UiState::Success(f(value)),
            Self::Error(message) => UiState::Error(message.clone()),
        }
    }
}

/// Handle for one issued attempt.
#[derive(Debug, Clone)]
pub struct Attempt {
    pub seq: u64,
    pub cancel: CancellationToken,
}

/// `UiState` plus the sequence/cancellation rules for re-entry.
#[derive(Debug)]
pub struct ScreenMachine<T> {
    state: UiState<T>,
    seq: u64,
    in_flight: Option<CancellationToken>,
}

impl<T> Default for ScreenMachine<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ScreenMachine<T> {
    pub fn new() -> Self {
        Self {
            state: UiState::Loading,
            seq: 0,
            in_flight: None,
        }
    }

    pub fn state(&self) -> &UiState<T> {
        &self.state
    }

    /// Sequence number of the most recent attempt (0 before the first).
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Screen became active or the user asked to retry. A no-op while an
    /// attempt is already loading.
    pub fn trigger(&mut self) -> Option<Attempt> {
        if self.state.is_loading() && self.in_flight.is_some() {
            tracing::debug!(seq = self.seq, "Trigger ignored, attempt in flight");
            return None;
        }
        Some(self.begin())
    }

    /// A dependency changed (permission granted, navigation re-entry, new
    /// query). Aborts whatever is in flight and starts over.
    pub fn restart(&mut self) -> Attempt {
        if let Some(token) = self.in_flight.take() {
            token.cancel();
            tracing::debug!(seq = self.seq, "Cancelled superseded attempt");
        }
        self.begin()
    }

    fn begin(&mut self) -> Attempt {
        self.seq += 1;
        let cancel = CancellationToken::new();
        self.in_flight = Some(cancel.clone());
        self.state = UiState::Loading;
        Attempt {
            seq: self.seq,
            cancel,
        }
    }

    /// Apply a finished attempt. Returns `false` when `seq` is stale and the
    /// result was discarded.
    pub fn complete(&mut self, seq: u64, result: Result<T, String>) -> bool {
        if seq != self.seq || self.in_flight.is_none() {
            tracing::debug!(seq, current = self.seq, "Discarding stale attempt result");
            return false;
        }

        self.in_flight = None;
        self.state = match result {
            Ok(value) => UiState::Success(value),
            Err(message) => UiState::Error(message),
        };
        true
    }

    /// Abort the in-flight attempt, if any, keeping the current state.
    pub fn cancel(&mut self) {
        if let Some(token) = self.in_flight.take() {
            token.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    #[test]
    fn test_starts_loading_without_attempt() {
        let machine: ScreenMachine<i32> = ScreenMachine::new();
        assert!(machine.state().is_loading());
        assert_eq!(machine.seq(), 0);
        assert!(!machine.is_in_flight());
    }

    #[test]
    fn test_trigger_then_complete() {
        let mut machine = ScreenMachine::new();
        let attempt = machine.trigger().unwrap();
        assert_eq!(attempt.seq, 1);

        assert!(machine.complete(attempt.seq, Ok(21)));
        assert_eq!(machine.state(), &UiState::Success(21));
        assert!(!machine.is_in_flight());
    }

    #[test]
    fn test_trigger_while_loading_is_noop() {
        let mut machine: ScreenMachine<i32> = ScreenMachine::new();
        let first = machine.trigger().unwrap();
        assert!(machine.trigger().is_none());
        assert_eq!(machine.seq(), first.seq);
        assert!(!first.cancel.is_cancelled());
    }

    #[test]
    fn test_trigger_after_error_retries() {
        let mut machine: ScreenMachine<i32> = ScreenMachine::new();
        let first = machine.trigger().unwrap();
        machine.complete(first.seq, Err("offline".into()));
        assert_eq!(machine.state().error(), Some("offline"));

        let retry = machine.trigger().unwrap();
        assert_eq!(retry.seq, 2);
        assert!(machine.state().is_loading());
    }

    #[test]
    fn test_later_attempt_wins_when_earlier_finishes_last() {
        let mut machine = ScreenMachine::new();
        let first = machine.trigger().unwrap();
        let second = machine.restart();

        assert!(first.cancel.is_cancelled());
        assert!(!second.cancel.is_cancelled());

        assert!(machine.complete(second.seq, Ok("attempt 2")));
        assert!(!machine.complete(first.seq, Ok("attempt 1")));

        assert_eq!(machine.state(), &UiState::Success("attempt 2"));
    }

    #[test]
    fn test_stale_result_does_not_end_loading() {
        let mut machine = ScreenMachine::new();
        let first = machine.trigger().unwrap();
        let _second = machine.restart();

        assert!(!machine.complete(first.seq, Err::<i32, _>("late".into())));
        assert!(machine.state().is_loading());
        assert!(machine.is_in_flight());
    }

    #[test]
    fn test_duplicate_completion_ignored() {
        let mut machine = ScreenMachine::new();
        let attempt = machine.trigger().unwrap();
        assert!(machine.complete(attempt.seq, Ok(1)));
        assert!(!machine.complete(attempt.seq, Ok(2)));
        assert_eq!(machine.state(), &UiState::Success(1));
    }

    #[test]
    fn test_cancel_keeps_state() {
        let mut machine: ScreenMachine<i32> = ScreenMachine::new();
        let attempt = machine.trigger().unwrap();
        machine.cancel();
        assert!(attempt.cancel.is_cancelled());
        assert!(!machine.complete(attempt.seq, Ok(5)));
        assert!(machine.state().is_loading());
    }
}
