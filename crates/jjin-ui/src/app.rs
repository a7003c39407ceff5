//! Application model: routes messages to screens and executes the commands
//! they return.
//!
//! All state changes go through [`App::update`]. Network work is spawned by
//! the effect runner and comes back as `*Loaded` messages on the app's
//! channel, drained with [`App::poll`] or awaited with [`App::next_message`].

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;
use jjin_core::{DatabaseError, UiConfig};
use jjin_outfit::{OutfitRepository, OutfitResult};
use jjin_weather::{CityWeather, LocationPermission, Place, WeatherRepository};
use tokio::sync::mpsc;

use crate::navigation::{Navigator, Route};
use crate::runner::EffectRunner;
use crate::screens::{
    Command, NewAreaScreen, NewAreaView, OnboardingScreen, OnboardingView, OutfitScreen,
    OutfitView, TemperatureScreen, TemperatureView, WeatherTarget,
};
use crate::ui_state::UiState;

/// Repositories the screens fetch through.
#[derive(Clone)]
pub struct Services {
    pub weather: Arc<WeatherRepository>,
    pub outfit: Arc<OutfitRepository>,
    pub permission: LocationPermission,
}

#[derive(Debug)]
pub enum Msg {
    PermissionResult(bool),
    Retry,
    OpenOutfit,
    OpenNewArea,
    Search(String),
    SelectPlace(usize),
    UseCurrentLocation,
    Back,
    WeatherLoaded {
        seq: u64,
        result: Result<CityWeather, String>,
    },
    OutfitLoaded {
        seq: u64,
        result: Result<OutfitResult, String>,
    },
    PlacesLoaded {
        seq: u64,
        result: Result<Vec<Place>, String>,
    },
}

pub struct App {
    services: Services,
    ui: UiConfig,
    runner: EffectRunner<Msg>,
    outfit_deadline: Duration,
    rx: mpsc::UnboundedReceiver<Msg>,
    navigator: Navigator,
    onboarding: OnboardingScreen,
    temperature: TemperatureScreen,
    outfit: Option<OutfitScreen>,
    new_area: NewAreaScreen,
}

impl App {
    /// Weather and place attempts share the repository's attempt deadline.
    pub fn new(services: Services, ui: UiConfig) -> Result<Self, DatabaseError> {
        let deadline = services.weather.attempt_deadline();
        let first_launch = services.weather.cache().is_first_launch()?;
        let onboarding = OnboardingScreen::new(first_launch, services.permission.is_granted());
        let (tx, rx) = mpsc::unbounded_channel();

        Ok(Self {
            services,
            ui,
            runner: EffectRunner::new(tx, deadline),
            outfit_deadline: deadline,
            rx,
            navigator: Navigator::new(Route::Onboarding),
            onboarding,
            temperature: TemperatureScreen::new(),
            outfit: None,
            new_area: NewAreaScreen::new(),
        })
    }

    /// Outfit attempts make two model calls and usually need longer than a
    /// forecast.
    pub fn with_outfit_deadline(mut self, deadline: Duration) -> Self {
        self.outfit_deadline = deadline;
        self
    }

    /// Pick the first screen. Must run inside a tokio runtime.
    pub fn start(&mut self) {
        if self.onboarding.should_skip() {
            tracing::info!("Returning user, skipping onboarding");
            self.run(vec![Command::ResetTo(Route::Temperature)]);
        }
    }

    pub fn route(&self) -> &Route {
        self.navigator.current()
    }

    pub fn permission_granted(&self) -> bool {
        self.services.permission.is_granted()
    }

    /// Any screen still waiting on an attempt.
    pub fn is_busy(&self) -> bool {
        self.temperature.is_in_flight()
            || self.new_area.is_in_flight()
            || self.outfit.as_ref().is_some_and(OutfitScreen::is_in_flight)
    }

    pub fn update(&mut self, msg: Msg) {
        tracing::debug!("update: {:?}", msg);
        let commands = match msg {
            Msg::PermissionResult(granted) => self.on_permission_result(granted),
            Msg::Retry => self.retry().into_iter().collect(),
            Msg::OpenOutfit => match self.route() {
                Route::Temperature => self
                    .temperature
                    .open_outfit(self.ui.hourly_graph_hours)
                    .into_iter()
                    .collect(),
                _ => Vec::new(),
            },
            Msg::OpenNewArea => match self.route() {
                Route::Temperature => vec![Command::Navigate(Route::NewArea)],
                _ => Vec::new(),
            },
            Msg::Search(query) => self.new_area.search(&query).into_iter().collect(),
            Msg::SelectPlace(index) => match self.new_area.select(index) {
                Some(place) => {
                    self.leave_new_area();
                    vec![self.temperature.show_place(place)]
                }
                None => {
                    tracing::warn!(index, "No search result at index");
                    Vec::new()
                }
            },
            Msg::UseCurrentLocation => {
                if matches!(self.route(), Route::NewArea) {
                    self.leave_new_area();
                }
                vec![self.temperature.use_current_location()]
            }
            Msg::Back => vec![Command::Back],
            Msg::WeatherLoaded { seq, result } => {
                self.temperature.on_loaded(seq, result);
                Vec::new()
            }
            Msg::OutfitLoaded { seq, result } => {
                match self.outfit.as_mut() {
                    Some(screen) => {
                        screen.on_loaded(seq, result);
                    }
                    None => tracing::debug!(seq, "Outfit result with no outfit screen"),
                }
                Vec::new()
            }
            Msg::PlacesLoaded { seq, result } => {
                self.new_area.on_loaded(seq, result);
                Vec::new()
            }
        };
        self.run(commands);
    }

    /// Apply every message already waiting. Returns how many were handled.
    pub fn poll(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(msg) = self.rx.try_recv() {
            self.update(msg);
            handled += 1;
        }
        handled
    }

    pub async fn next_message(&mut self) -> Option<Msg> {
        self.rx.recv().await
    }

    /// Apply results until no screen has an attempt in flight.
    pub async fn settle(&mut self) {
        while self.is_busy() {
            match self.rx.recv().await {
                Some(msg) => self.update(msg),
                None => break,
            }
        }
    }

    pub fn onboarding_view(&self) -> OnboardingView {
        self.onboarding.view()
    }

    pub fn temperature_view(&self, now: NaiveDateTime) -> UiState<TemperatureView> {
        self.temperature.view(now, &self.ui)
    }

    pub fn outfit_view(&self) -> Option<OutfitView> {
        self.outfit.as_ref().map(|screen| screen.view(&self.ui))
    }

    pub fn new_area_view(&self) -> NewAreaView {
        self.new_area.view()
    }

    fn on_permission_result(&mut self, granted: bool) -> Vec<Command> {
        if granted {
            self.services.permission.grant();
        } else {
            self.services.permission.revoke();
        }

        match self.navigator.current() {
            Route::Onboarding => self.onboarding.on_permission_result(granted),
            // Granted from elsewhere: the forecast depends on it, so start over
            Route::Temperature if granted => vec![self.temperature.enter()],
            _ => Vec::new(),
        }
    }

    fn retry(&mut self) -> Option<Command> {
        match self.navigator.current() {
            Route::Onboarding => None,
            Route::Temperature => self.temperature.retry(),
            Route::Outfit(_) => self.outfit.as_mut()?.retry(),
            Route::NewArea => self.new_area.retry(),
        }
    }

    fn leave_new_area(&mut self) {
        self.new_area.cancel();
        if matches!(self.route(), Route::NewArea) {
            self.navigator.back();
        }
    }

    fn run(&mut self, commands: Vec<Command>) {
        let mut queue: VecDeque<Command> = commands.into();

        while let Some(command) = queue.pop_front() {
            match command {
                Command::FetchWeather(attempt, target) => {
                    let repo = self.services.weather.clone();
                    self.runner.spawn(
                        attempt,
                        async move {
                            let result = match target {
                                WeatherTarget::CurrentLocation => {
                                    repo.current_location_weather().await
                                }
                                WeatherTarget::Place(place) => {
                                    repo.weather_at(place.coordinate, Some(place.name)).await
                                }
                            };
                            result.map_err(|e| e.user_message())
                        },
                        |seq, result| Msg::WeatherLoaded { seq, result },
                    );
                }
                Command::FetchOutfit(attempt, request) => {
                    let repo = self.services.outfit.clone();
                    self.runner.spawn_with_deadline(
                        attempt,
                        self.outfit_deadline,
                        async move {
                            repo.get_outfit(request.temperature, &request.summary)
                                .await
                                .map_err(|e| e.user_message())
                        },
                        |seq, result| Msg::OutfitLoaded { seq, result },
                    );
                }
                Command::SearchPlaces(attempt, query) => {
                    let repo = self.services.weather.clone();
                    self.runner.spawn(
                        attempt,
                        async move { repo.search_places(&query).await.map_err(|e| e.user_message()) },
                        |seq, result| Msg::PlacesLoaded { seq, result },
                    );
                }
                Command::CompleteFirstLaunch => {
                    if let Err(e) = self.services.weather.cache().complete_first_launch() {
                        tracing::warn!("Failed to persist first launch: {}", e);
                    }
                }
                Command::Navigate(route) => {
                    self.navigator.push(route.clone());
                    queue.extend(self.activate(route));
                }
                Command::ResetTo(route) => {
                    self.navigator.reset_to(route.clone());
                    queue.extend(self.activate(route));
                }
                Command::Back => {
                    match self.navigator.current() {
                        Route::Outfit(_) => {
                            if let Some(mut screen) = self.outfit.take() {
                                screen.cancel();
                            }
                        }
                        Route::NewArea => self.new_area.cancel(),
                        Route::Onboarding | Route::Temperature => {}
                    }

                    if self.navigator.back() {
                        if matches!(self.route(), Route::Temperature) {
                            // Coming back re-triggers; a no-op if still loading
                            queue.extend(self.temperature.retry());
                        }
                    } else {
                        tracing::debug!("Back at root, ignoring");
                    }
                }
            }
        }
    }

    /// A route just became current.
    fn activate(&mut self, route: Route) -> Option<Command> {
        match route {
            Route::Onboarding | Route::NewArea => None,
            Route::Temperature => Some(self.temperature.enter()),
            Route::Outfit(request) => {
                let screen = self.outfit.insert(OutfitScreen::new(request));
                Some(screen.enter())
            }
        }
    }
}
