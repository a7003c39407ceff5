//! Per-screen models.
//!
//! Screens never perform I/O. Each reacts to an event by mutating its own
//! state and handing back [`Command`]s for the app to execute.

mod new_area;
mod onboarding;
mod outfit;
mod temperature;

pub use new_area::{NewAreaScreen, NewAreaView};
pub use onboarding::{OnboardingScreen, OnboardingView, PermissionState};
pub use outfit::{OutfitScreen, OutfitView};
pub use temperature::{TemperatureScreen, TemperatureView, WeatherTarget};

use crate::navigation::{OutfitRequest, Route};
use crate::ui_state::Attempt;

/// Side effects requested by a screen.
#[derive(Debug)]
pub enum Command {
    FetchWeather(Attempt, WeatherTarget),
    FetchOutfit(Attempt, OutfitRequest),
    SearchPlaces(Attempt, String),
    CompleteFirstLaunch,
    Navigate(Route),
    ResetTo(Route),
    Back,
}
