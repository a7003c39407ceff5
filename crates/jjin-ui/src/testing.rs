//! Fixtures and fakes shared by the screen and app tests.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, Utc};
use jjin_core::{NetworkError, WeatherConfig};
use jjin_outfit::{OutfitClient, OutfitRepository};
use jjin_weather::dto::OneCallDto;
use jjin_weather::{
    CityWeather, ConfiguredLocationProvider, Coordinate, GeoCoder, LocationPermission, Place,
    TrackedLocationProvider, Units, WeatherCache, WeatherClient, WeatherError, WeatherRepository,
};

use crate::app::Services;

const ONE_CALL_FIXTURE: &str = include_str!("../../jjin-weather/tests/fixtures/onecall.json");

pub fn seoul() -> Coordinate {
    Coordinate::new(37.5, 127.03).unwrap()
}

pub fn busan() -> Place {
    Place {
        name: "Busan".into(),
        coordinate: Coordinate::new(35.18, 129.08).unwrap(),
    }
}

fn fixture_dto() -> OneCallDto {
    serde_json::from_str(ONE_CALL_FIXTURE).unwrap()
}

pub fn seoul_weather() -> CityWeather {
    fixture_dto()
        .into_city_weather("Seoul".into(), seoul(), Units::Metric, Utc::now())
        .unwrap()
}

/// A wall-clock time on the fixture's forecast day.
pub fn local(hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 10, 16)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

#[derive(Default)]
pub struct FakeGeoCoder {
    pub delay: Duration,
}

#[async_trait]
impl GeoCoder for FakeGeoCoder {
    async fn reverse(&self, _coordinate: &Coordinate) -> Result<String, WeatherError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok("Seoul".into())
    }

    async fn search(&self, query: &str) -> Result<Vec<Place>, WeatherError> {
        if query == "nowhere" {
            return Err(WeatherError::GeocodeFailed("no match".into()));
        }
        Ok(vec![busan()])
    }
}

#[derive(Default)]
pub struct FakeWeatherClient {
    pub offline: AtomicBool,
    pub delay: Duration,
    pub calls: AtomicUsize,
}

impl FakeWeatherClient {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WeatherClient for FakeWeatherClient {
    async fn fetch_forecast(
        &self,
        _coordinate: &Coordinate,
        _units: Units,
    ) -> Result<OneCallDto, NetworkError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.offline.load(Ordering::SeqCst) {
            return Err(NetworkError::ConnectionFailed("offline".into()));
        }
        Ok(fixture_dto())
    }
}

pub struct FakeOutfitClient {
    pub fail_chat: bool,
}

#[async_trait]
impl OutfitClient for FakeOutfitClient {
    async fn complete(&self, _system: &str, _prompt: &str) -> Result<String, NetworkError> {
        if self.fail_chat {
            return Err(NetworkError::ServerError {
                status: 500,
                message: "boom".into(),
            });
        }
        Ok("A light jacket over a tee".into())
    }

    async fn generate_image(&self, _prompt: &str) -> Result<String, NetworkError> {
        Ok("https://img.example/outfit.png".into())
    }
}

pub struct Fixture {
    pub services: Services,
    pub client: Arc<FakeWeatherClient>,
    pub cache: Arc<WeatherCache>,
}

pub fn fixture(permission_granted: bool, client: FakeWeatherClient, fail_chat: bool) -> Fixture {
    fixture_with_geocoder(permission_granted, client, fail_chat, FakeGeoCoder::default())
}

pub fn fixture_with_geocoder(
    permission_granted: bool,
    client: FakeWeatherClient,
    fail_chat: bool,
    geocoder: FakeGeoCoder,
) -> Fixture {
    let cache = Arc::new(WeatherCache::in_memory().unwrap());
    let permission = LocationPermission::new(permission_granted);
    let client = Arc::new(client);

    let location = TrackedLocationProvider::new(
        Arc::new(ConfiguredLocationProvider::new(
            Some(seoul()),
            permission.clone(),
        )),
        cache.clone(),
        permission.clone(),
    );

    let config = WeatherConfig {
        reuse_minutes: 0,
        ..WeatherConfig::default()
    };

    let weather = WeatherRepository::new(
        Arc::new(location),
        Arc::new(geocoder),
        client.clone(),
        cache.clone(),
        &config,
    );
    let outfit = OutfitRepository::new(Arc::new(FakeOutfitClient { fail_chat }), "°C");

    Fixture {
        services: Services {
            weather: Arc::new(weather),
            outfit: Arc::new(outfit),
            permission,
        },
        client,
        cache,
    }
}
