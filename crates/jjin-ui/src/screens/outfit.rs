use jjin_core::UiConfig;
use jjin_outfit::OutfitResult;

use super::Command;
use crate::graph::HourlyGraph;
use crate::navigation::OutfitRequest;
use crate::ui_state::{ScreenMachine, UiState};

#[derive(Debug, Clone, PartialEq)]
pub struct OutfitView {
    pub temperature: i32,
    pub summary: String,
    pub hourly_graph: Option<HourlyGraph>,
    pub outfit: UiState<OutfitResult>,
}

#[derive(Debug)]
pub struct OutfitScreen {
    request: OutfitRequest,
    machine: ScreenMachine<OutfitResult>,
}

impl OutfitScreen {
    pub fn new(request: OutfitRequest) -> Self {
        Self {
            request,
            machine: ScreenMachine::new(),
        }
    }

    pub fn request(&self) -> &OutfitRequest {
        &self.request
    }

    pub fn is_in_flight(&self) -> bool {
        self.machine.is_in_flight()
    }

    pub fn state(&self) -> &UiState<OutfitResult> {
        self.machine.state()
    }

    pub fn enter(&mut self) -> Command {
        Command::FetchOutfit(self.machine.restart(), self.request.clone())
    }

    pub fn retry(&mut self) -> Option<Command> {
        let attempt = self.machine.trigger()?;
        Some(Command::FetchOutfit(attempt, self.request.clone()))
    }

    pub fn on_loaded(&mut self, seq: u64, result: Result<OutfitResult, String>) -> bool {
        if let Err(message) = &result {
            tracing::error!(seq, "Outfit attempt failed: {}", message);
        }
        self.machine.complete(seq, result)
    }

    /// Leaving the screen; a late result has nowhere to go.
    pub fn cancel(&mut self) {
        self.machine.cancel();
    }

    pub fn view(&self, ui: &UiConfig) -> OutfitView {
        OutfitView {
            temperature: self.request.temperature,
            summary: self.request.summary.clone(),
            hourly_graph: HourlyGraph::build(
                &self.request.hourly_temperatures,
                &self.request.hourly_hours,
                self.request.feels_like,
                ui.graph_step,
                ui.min_bar_fraction,
            ),
            outfit: self.machine.state().clone(),
        }
    }
}
