//! Weather service for JJin Weather
//!
//! Resolves the device location, names it via Nominatim, fetches forecasts
//! from the OpenWeather One Call API and keeps the last forecast per place in
//! a SQLite cache for offline fallback.

pub mod cache;
pub mod client;
pub mod dto;
pub mod error;
pub mod geocode;
pub mod location;
pub mod repository;
pub mod types;

pub use cache::{CachedForecast, TrackedLocation, WeatherCache};
pub use client::{OpenWeatherClient, WeatherClient};
pub use error::WeatherError;
pub use geocode::{GeoCoder, NominatimGeoCoder};
pub use location::{
    ConfiguredLocationProvider, LocationPermission, LocationProvider, TrackedLocationProvider,
};
pub use repository::WeatherRepository;
pub use types::*;
