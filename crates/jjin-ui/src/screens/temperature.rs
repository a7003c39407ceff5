use chrono::{DateTime, NaiveDateTime, NaiveTime, Utc};
use jjin_core::UiConfig;
use jjin_weather::{CityWeather, Freshness, Place};

use super::Command;
use crate::graph::{daily_range_bars, DailyRangeBar, HourlyGraph};
use crate::navigation::{OutfitRequest, Route};
use crate::theme::{palette, Palette};
use crate::ui_state::{ScreenMachine, UiState};

/// Where the forecast screen gets its coordinate from.
#[derive(Debug, Clone, PartialEq)]
pub enum WeatherTarget {
    CurrentLocation,
    Place(Place),
}

/// Everything the forecast screen draws.
#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureView {
    pub city_name: String,
    pub unit_symbol: &'static str,
    pub temperature: i32,
    pub feels_like: i32,
    pub description: String,
    pub icon_name: &'static str,
    pub humidity: u8,
    pub wind_speed: f64,
    pub is_night: bool,
    pub palette: Palette,
    /// Today's (min, max)
    pub today_range: Option<(i32, i32)>,
    pub hourly_graph: Option<HourlyGraph>,
    pub daily_bars: Vec<DailyRangeBar>,
    pub sunrise: NaiveTime,
    pub sunset: NaiveTime,
    pub next_sunrise: NaiveTime,
    pub moon_phase: Option<&'static str>,
    /// Set when the provider failed and the cache answered
    pub stale_since: Option<DateTime<Utc>>,
}

impl TemperatureView {
    pub fn build(weather: &CityWeather, now: NaiveDateTime, ui: &UiConfig) -> Self {
        let current = &weather.current;
        let is_night = current.sun_cycle.is_night(now.time());
        let today = weather.today();

        let hourly_graph = HourlyGraph::build(
            &weather.hourly_temperatures(ui.hourly_graph_hours),
            &weather.hourly_hours(ui.hourly_graph_hours),
            current.feels_like as i32,
            ui.graph_step,
            ui.min_bar_fraction,
        );

        let stale_since = match weather.freshness {
            Freshness::Stale { fetched_at } => Some(fetched_at),
            Freshness::Fresh => None,
        };

        Self {
            city_name: weather.city_name.clone(),
            unit_symbol: weather.units.temperature_symbol(),
            temperature: current.temperature as i32,
            feels_like: current.feels_like as i32,
            description: current.description.clone(),
            icon_name: current.condition.icon_name(is_night),
            humidity: current.humidity,
            wind_speed: current.wind_speed,
            is_night,
            palette: palette(is_night),
            today_range: today.map(|d| {
                (
                    d.temperature_range.min as i32,
                    d.temperature_range.max as i32,
                )
            }),
            hourly_graph,
            daily_bars: daily_range_bars(&weather.daily, now.date()),
            sunrise: current.sun_cycle.sunrise,
            sunset: current.sun_cycle.sunset,
            next_sunrise: weather.next_sunrise(),
            moon_phase: today.map(|d| d.moon_phase.description()),
            stale_since,
        }
    }
}

#[derive(Debug)]
pub struct TemperatureScreen {
    machine: ScreenMachine<CityWeather>,
    target: WeatherTarget,
}

impl Default for TemperatureScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl TemperatureScreen {
    pub fn new() -> Self {
        Self {
            machine: ScreenMachine::new(),
            target: WeatherTarget::CurrentLocation,
        }
    }

    pub fn target(&self) -> &WeatherTarget {
        &self.target
    }

    pub fn is_in_flight(&self) -> bool {
        self.machine.is_in_flight()
    }

    pub fn state(&self) -> &UiState<CityWeather> {
        self.machine.state()
    }

    /// Screen became active or its permission dependency changed.
    pub fn enter(&mut self) -> Command {
        let attempt = self.machine.restart();
        Command::FetchWeather(attempt, self.target.clone())
    }

    pub fn show_place(&mut self, place: Place) -> Command {
        tracing::info!("Showing weather for {}", place.name);
        self.target = WeatherTarget::Place(place);
        self.enter()
    }

    pub fn use_current_location(&mut self) -> Command {
        self.target = WeatherTarget::CurrentLocation;
        self.enter()
    }

    pub fn retry(&mut self) -> Option<Command> {
        let attempt = self.machine.trigger()?;
        Some(Command::FetchWeather(attempt, self.target.clone()))
    }

    pub fn on_loaded(&mut self, seq: u64, result: Result<CityWeather, String>) -> bool {
        if let Err(message) = &result {
            tracing::error!(seq, "Weather attempt failed: {}", message);
        }
        self.machine.complete(seq, result)
    }

    pub fn cancel(&mut self) {
        self.machine.cancel();
    }

    /// Route to the outfit screen for the loaded forecast.
    pub fn open_outfit(&self, hours: usize) -> Option<Command> {
        let weather = self.machine.state().success()?;
        let request = OutfitRequest {
            temperature: weather.current.temperature as i32,
            summary: weather.summary(),
            feels_like: weather.current.feels_like as i32,
            hourly_temperatures: weather.hourly_temperatures(hours),
            hourly_hours: weather.hourly_hours(hours),
        };
        Some(Command::Navigate(Route::Outfit(request)))
    }

    pub fn view(&self, now: NaiveDateTime, ui: &UiConfig) -> UiState<TemperatureView> {
        self.machine
            .state()
            .map(|weather| TemperatureView::build(weather, now, ui))
    }
}
