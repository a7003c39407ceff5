use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Local;
use jjin_core::{AppError, Config};
use jjin_outfit::{OpenAiClient, OutfitRepository};
use jjin_ui::graph::DayLabel;
use jjin_ui::screens::{NewAreaView, OutfitView, TemperatureView};
use jjin_ui::{App, Msg, Route, Services, UiState};
use jjin_weather::{
    ConfiguredLocationProvider, Coordinate, LocationPermission, NominatimGeoCoder,
    OpenWeatherClient, TrackedLocationProvider, Units, WeatherCache, WeatherRepository,
};

const PERMISSION_PREFERENCE: &str = "location_permission";

#[derive(Debug, Default)]
struct Options {
    grant: bool,
    outfit: bool,
    search: Option<String>,
}

impl Options {
    fn parse(mut args: impl Iterator<Item = String>) -> Self {
        let mut options = Self::default();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--grant" => options.grant = true,
                "--outfit" => options.outfit = true,
                "--search" => options.search = args.next(),
                other => tracing::warn!("Ignoring unknown argument {}", other),
            }
        }
        options
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    jjin_core::init()?;

    let (config, _) = Config::load_validated()?;
    let options = Options::parse(std::env::args().skip(1));

    let (services, cache) = match build_services(&config) {
        Ok(built) => built,
        Err(e) => {
            eprintln!("{}", e.user_message());
            return Err(e).context("Failed to start JJin Weather");
        }
    };

    let mut app = App::new(services, config.ui.clone())?
        .with_outfit_deadline(config.outfit.attempt_deadline());

    tracing::info!("JJin Weather started");
    app.start();

    if app.route() == &Route::Onboarding {
        println!("{}", app.onboarding_view().message);
        let granted = options.grant || ask("Allow JJin Weather to use your location? [y/N] ")?;
        app.update(Msg::PermissionResult(granted));

        if !granted {
            println!("{}", app.onboarding_view().message);
            return Ok(());
        }
    }

    if app.permission_granted() {
        if let Err(e) = cache.set_preference(PERMISSION_PREFERENCE, "granted") {
            tracing::warn!("Failed to remember location permission: {}", e);
        }
    }

    app.settle().await;

    if let Some(query) = options.search {
        app.update(Msg::OpenNewArea);
        app.update(Msg::Search(query));
        app.settle().await;

        let view = app.new_area_view();
        print_new_area(&view);
        let found = view
            .results
            .as_ref()
            .and_then(UiState::success)
            .is_some_and(|places| !places.is_empty());
        if found {
            app.update(Msg::SelectPlace(0));
            app.settle().await;
        } else {
            app.update(Msg::Back);
            app.settle().await;
        }
    }

    match app.temperature_view(Local::now().naive_local()) {
        UiState::Success(view) => print_temperature(&view),
        UiState::Error(message) => println!("Error: {}", message),
        UiState::Loading => println!("Loading..."),
    }

    if options.outfit {
        app.update(Msg::OpenOutfit);
        app.settle().await;
        if let Some(view) = app.outfit_view() {
            print_outfit(&view);
        }
    }

    Ok(())
}

fn build_services(config: &Config) -> Result<(Services, Arc<WeatherCache>), AppError> {
    let cache = Arc::new(WeatherCache::new(config.database_path())?);

    let remembered = cache.get_preference(PERMISSION_PREFERENCE)?.as_deref() == Some("granted");
    let permission = LocationPermission::new(config.location.permission_granted || remembered);

    let configured = config
        .location
        .coordinate()
        .map(|(latitude, longitude)| Coordinate::new(latitude, longitude))
        .transpose()
        .map_err(|e| AppError::Service(e.user_message()))?;
    let location = TrackedLocationProvider::new(
        Arc::new(ConfiguredLocationProvider::new(configured, permission.clone())),
        cache.clone(),
        permission.clone(),
    );
    let geocoder = NominatimGeoCoder::new(&config.geocoding)
        .map_err(|e| AppError::Service(e.user_message()))?;

    let weather = WeatherRepository::new(
        Arc::new(location),
        Arc::new(geocoder),
        Arc::new(OpenWeatherClient::new(&config.weather)?),
        cache.clone(),
        &config.weather,
    );
    let units = Units::from(config.weather.temperature_unit);
    let outfit = OutfitRepository::new(
        Arc::new(OpenAiClient::new(&config.outfit)?),
        units.temperature_symbol(),
    );

    let services = Services {
        weather: Arc::new(weather),
        outfit: Arc::new(outfit),
        permission,
    };
    Ok((services, cache))
}

fn ask(question: &str) -> Result<bool> {
    print!("{}", question);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

fn print_temperature(view: &TemperatureView) {
    let unit = view.unit_symbol;

    println!();
    println!("{}", view.city_name);
    if let Some(since) = view.stale_since {
        println!(
            "  (offline, showing forecast from {})",
            since.with_timezone(&Local).format("%b %-d %H:%M")
        );
    }
    println!(
        "  {}{}  feels like {}{}  {}",
        view.temperature, unit, view.feels_like, unit, view.description
    );
    if let Some((min, max)) = view.today_range {
        println!("  L {}{}  H {}{}", min, unit, max, unit);
    }
    println!(
        "  humidity {}%  wind {:.1}  {}",
        view.humidity,
        view.wind_speed,
        if view.is_night { "night" } else { "day" }
    );
    println!(
        "  sunrise {}  sunset {}  next sunrise {}",
        view.sunrise.format("%H:%M"),
        view.sunset.format("%H:%M"),
        view.next_sunrise.format("%H:%M")
    );
    if let Some(moon) = view.moon_phase {
        println!("  moon {}", moon);
    }
    println!(
        "  background {} -> {}",
        view.palette.background_top, view.palette.background_bottom
    );

    if let Some(graph) = &view.hourly_graph {
        println!();
        let labels: Vec<String> = graph.scale.labels.iter().map(i32::to_string).collect();
        println!("  Hourly ({})", labels.join(" / "));
        for bar in &graph.bars {
            let width = (bar.fraction * 30.0).round() as usize;
            let marker = bar
                .feels_like_marker
                .map(|p| format!("  feels {}", (p * 30.0).round() as usize))
                .unwrap_or_default();
            println!(
                "  {:>2}  {:<30} {:>3}{} {}{}",
                bar.hour_label,
                "#".repeat(width),
                bar.temperature,
                unit,
                bar.top_color,
                marker
            );
        }
        println!(
            "  legend max {}  min {}  feels like {}",
            graph.legend.max_color, graph.legend.min_color, graph.legend.feels_like_color
        );
    }

    if !view.daily_bars.is_empty() {
        println!();
        println!("  Daily");
        for day in &view.daily_bars {
            let label = match &day.label {
                DayLabel::Today => "Today".to_string(),
                DayLabel::Date {
                    weekday,
                    month,
                    day: date,
                } => format!("{} {}/{}", weekday, month, date),
            };
            let start = (day.start * 20.0).round() as usize;
            let end = ((day.end * 20.0).round() as usize).max(start);
            println!(
                "  {:<10} {:>3}{} {}{}{} {:>3}{}",
                label,
                day.min,
                unit,
                " ".repeat(start),
                "=".repeat(end - start),
                " ".repeat(20 - end.min(20)),
                day.max,
                unit
            );
        }
    }
}

fn print_outfit(view: &OutfitView) {
    println!();
    println!("Outfit for {} ({})", view.temperature, view.summary);
    match &view.outfit {
        UiState::Success(outfit) => {
            println!("  {}", outfit.recommendation);
            println!("  {}", outfit.image_url);
        }
        UiState::Error(message) => println!("  Error: {}", message),
        UiState::Loading => println!("  Loading..."),
    }
}

fn print_new_area(view: &NewAreaView) {
    println!("Search: {}", view.query);
    match &view.results {
        Some(UiState::Success(places)) if places.is_empty() => println!("  No matches"),
        Some(UiState::Success(places)) => {
            for place in places {
                println!("  {}", place.name);
            }
        }
        Some(UiState::Error(message)) => println!("  Error: {}", message),
        Some(UiState::Loading) | None => {}
    }
}
