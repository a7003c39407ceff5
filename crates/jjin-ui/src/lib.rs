//! Screen models for JJin Weather
//!
//! Framework-free: screens are plain state machines driven by messages, and
//! everything a renderer needs comes out as view structs (graph bars, colors,
//! labels) computed here.

pub mod app;
pub mod graph;
pub mod navigation;
pub mod runner;
pub mod screens;
pub mod theme;
pub mod ui_state;

#[cfg(test)]
mod testing;

pub use app::{App, Msg, Services};
pub use navigation::{Navigator, OutfitRequest, Route};
pub use ui_state::{Attempt, ScreenMachine, UiState};
