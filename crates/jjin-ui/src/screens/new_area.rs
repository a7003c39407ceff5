use jjin_weather::Place;

use super::Command;
use crate::ui_state::{ScreenMachine, UiState};

#[derive(Debug, Clone, PartialEq)]
pub struct NewAreaView {
    pub query: String,
    /// `None` until the first search is issued
    pub results: Option<UiState<Vec<Place>>>,
}

/// Place search. Picking a result hands it back to the forecast screen.
#[derive(Debug, Default)]
pub struct NewAreaScreen {
    query: String,
    machine: ScreenMachine<Vec<Place>>,
    searched: bool,
}

impl NewAreaScreen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_in_flight(&self) -> bool {
        self.machine.is_in_flight()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Every new query supersedes the one in flight.
    pub fn search(&mut self, query: &str) -> Option<Command> {
        let query = query.trim();
        self.query = query.to_string();

        if query.is_empty() {
            self.machine.cancel();
            self.searched = false;
            return None;
        }

        self.searched = true;
        Some(Command::SearchPlaces(
            self.machine.restart(),
            self.query.clone(),
        ))
    }

    pub fn retry(&mut self) -> Option<Command> {
        if !self.searched {
            return None;
        }
        let attempt = self.machine.trigger()?;
        Some(Command::SearchPlaces(attempt, self.query.clone()))
    }

    pub fn on_loaded(&mut self, seq: u64, result: Result<Vec<Place>, String>) -> bool {
        if let Err(message) = &result {
            tracing::warn!(seq, "Place search failed: {}", message);
        }
        self.machine.complete(seq, result)
    }

    /// The result at `index`, if results are showing.
    pub fn select(&self, index: usize) -> Option<Place> {
        self.machine.state().success()?.get(index).cloned()
    }

    pub fn cancel(&mut self) {
        self.machine.cancel();
    }

    pub fn view(&self) -> NewAreaView {
        NewAreaView {
            query: self.query.clone(),
            results: self.searched.then(|| self.machine.state().clone()),
        }
    }
}
