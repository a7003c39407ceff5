//! Weather for the device's location: location, geocoding, network and cache
//! composed into a single call.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use jjin_core::{NetworkError, WeatherConfig};
use tracing::instrument;

use crate::cache::WeatherCache;
use crate::client::WeatherClient;
use crate::error::WeatherError;
use crate::geocode::{self, GeoCoder};
use crate::location::LocationProvider;
use crate::types::{CityWeather, Coordinate, Freshness, Place, Units};

pub struct WeatherRepository {
    location: Arc<dyn LocationProvider>,
    geocoder: Arc<dyn GeoCoder>,
    client: Arc<dyn WeatherClient>,
    cache: Arc<WeatherCache>,
    units: Units,
    precision: u32,
    reuse_window: Duration,
    fetch_timeout: StdDuration,
    geocode_timeout: StdDuration,
}

/// Slack on top of the geocode and fetch budgets for the cache fallback.
const FALLBACK_MARGIN: StdDuration = StdDuration::from_secs(2);

impl WeatherRepository {
    pub fn new(
        location: Arc<dyn LocationProvider>,
        geocoder: Arc<dyn GeoCoder>,
        client: Arc<dyn WeatherClient>,
        cache: Arc<WeatherCache>,
        config: &WeatherConfig,
    ) -> Self {
        Self {
            location,
            geocoder,
            client,
            cache,
            units: config.temperature_unit.into(),
            precision: config.cache_precision,
            reuse_window: Duration::minutes(i64::from(config.reuse_minutes)),
            fetch_timeout: StdDuration::from_secs(config.request_timeout_secs),
            geocode_timeout: geocode::REQUEST_TIMEOUT,
        }
    }

    /// Deadline for a whole weather attempt. Outlasts reverse geocoding plus
    /// the forecast fetch, so a hung provider still ends in the cache fallback.
    pub fn attempt_deadline(&self) -> StdDuration {
        self.geocode_timeout
            .saturating_add(self.fetch_timeout)
            .saturating_add(FALLBACK_MARGIN)
    }

    pub fn units(&self) -> Units {
        self.units
    }

    pub fn cache(&self) -> &Arc<WeatherCache> {
        &self.cache
    }

    /// Forecast for wherever the device currently is.
    #[instrument(skip(self), level = "info")]
    pub async fn current_location_weather(&self) -> Result<CityWeather, WeatherError> {
        let coordinate = self
            .location
            .current_location()
            .await
            .ok_or(WeatherError::LocationUnavailable)?;

        self.weather_at(coordinate, None).await
    }

    /// Forecast for an explicit coordinate. A `label` skips reverse geocoding.
    #[instrument(skip(self), level = "info")]
    pub async fn weather_at(
        &self,
        coordinate: Coordinate,
        label: Option<String>,
    ) -> Result<CityWeather, WeatherError> {
        let city_name = match label {
            Some(label) => label,
            None => self.resolve_label(&coordinate).await,
        };

        let key = coordinate.cache_key(self.precision);

        if let Some(reused) = self.reusable(&key, &city_name) {
            return Ok(reused);
        }

        let fetched = tokio::time::timeout(
            self.fetch_timeout,
            self.client.fetch_forecast(&coordinate, self.units),
        )
        .await
        .unwrap_or(Err(NetworkError::Timeout))
        .and_then(|dto| {
            dto.into_city_weather(city_name.clone(), coordinate, self.units, Utc::now())
        });

        match fetched {
            Ok(weather) => {
                if let Err(e) = self.cache.store_forecast(&key, &weather) {
                    tracing::warn!("Failed to cache forecast for {}: {}", key, e);
                }
                if let Err(e) = self.cache.record_location(&coordinate, Some(&city_name)) {
                    tracing::warn!("Failed to record tracked location: {}", e);
                }
                tracing::info!("Fetched weather for {}", city_name);
                Ok(weather)
            }
            Err(fetch_error) => match self.cache.get_forecast(&key) {
                Ok(Some(cached)) => {
                    tracing::warn!(
                        "Weather fetch failed ({}), serving cached forecast from {}",
                        fetch_error,
                        cached.fetched_at
                    );
                    let mut weather = cached.weather.converted_to(self.units);
                    weather.city_name = city_name;
                    weather.freshness = Freshness::Stale {
                        fetched_at: cached.fetched_at,
                    };
                    Ok(weather)
                }
                Ok(None) => {
                    tracing::error!("Weather fetch failed with no cached forecast: {}", fetch_error);
                    Err(WeatherError::WeatherFetchFailed(fetch_error))
                }
                Err(cache_error) => {
                    tracing::error!(
                        "Weather fetch failed ({}) and cache read failed ({})",
                        fetch_error,
                        cache_error
                    );
                    Err(WeatherError::WeatherFetchFailed(fetch_error))
                }
            },
        }
    }

    /// Forward-geocode a free-text place query.
    pub async fn search_places(&self, query: &str) -> Result<Vec<Place>, WeatherError> {
        self.geocoder.search(query).await
    }

    async fn resolve_label(&self, coordinate: &Coordinate) -> String {
        match tokio::time::timeout(self.geocode_timeout, self.geocoder.reverse(coordinate)).await {
            Ok(Ok(name)) => name,
            Ok(Err(e)) => {
                tracing::warn!("Reverse geocode failed, using coordinates: {}", e);
                coordinate.label()
            }
            Err(_) => {
                tracing::warn!("Reverse geocode timed out, using coordinates");
                coordinate.label()
            }
        }
    }

    /// A cached forecast young enough to skip the network, if reuse is enabled.
    fn reusable(&self, key: &str, city_name: &str) -> Option<CityWeather> {
        if self.reuse_window <= Duration::zero() {
            return None;
        }

        let cached = match self.cache.get_forecast(key) {
            Ok(cached) => cached?,
            Err(e) => {
                tracing::warn!("Cache read failed for {}: {}", key, e);
                return None;
            }
        };

        if Utc::now() - cached.fetched_at >= self.reuse_window {
            return None;
        }

        tracing::debug!(key, "Reusing cached forecast");
        let mut weather = cached.weather.converted_to(self.units);
        weather.city_name = city_name.to_string();
        weather.freshness = Freshness::Fresh;
        Some(weather)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use crate::dto::tests::fixture_dto;
    use crate::dto::OneCallDto;
    use async_trait::async_trait;
    use jjin_core::TemperatureUnit;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedLocation(Option<Coordinate>);

    #[async_trait]
    impl LocationProvider for FixedLocation {
        async fn current_location(&self) -> Option<Coordinate> {
            self.0
        }
    }

    struct FakeGeoCoder {
        name: Option<&'static str>,
    }

    #[async_trait]
    impl GeoCoder for FakeGeoCoder {
        async fn reverse(&self, _coordinate: &Coordinate) -> Result<String, WeatherError> {
            self.name
                .map(str::to_string)
                .ok_or_else(|| WeatherError::GeocodeFailed("offline".into()))
        }

        async fn search(&self, query: &str) -> Result<Vec<Place>, WeatherError> {
            Ok(vec![Place {
                name: query.to_string(),
                coordinate: busan(),
            }])
        }
    }

    struct FakeClient {
        online: bool,
        hang: bool,
        calls: AtomicUsize,
    }

    impl FakeClient {
        fn new(online: bool) -> Arc<Self> {
            Arc::new(Self {
                online,
                hang: false,
                calls: AtomicUsize::new(0),
            })
        }

        /// Never answers within any reasonable budget.
        fn hanging() -> Arc<Self> {
            Arc::new(Self {
                online: true,
                hang: true,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl WeatherClient for FakeClient {
        async fn fetch_forecast(
            &self,
            _coordinate: &Coordinate,
            _units: Units,
        ) -> Result<OneCallDto, NetworkError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.hang {
                tokio::time::sleep(StdDuration::from_secs(3600)).await;
            }
            if self.online {
                Ok(fixture_dto())
            } else {
                Err(NetworkError::ConnectionFailed("offline".into()))
            }
        }
    }

    fn seoul() -> Coordinate {
        Coordinate::new(37.4979, 127.0276).unwrap()
    }

    fn busan() -> Coordinate {
        Coordinate::new(35.1796, 129.0756).unwrap()
    }

    fn no_reuse() -> WeatherConfig {
        WeatherConfig {
            reuse_minutes: 0,
            ..WeatherConfig::default()
        }
    }

    fn repository(
        location: Option<Coordinate>,
        geocoded: Option<&'static str>,
        client: Arc<FakeClient>,
        cache: Arc<WeatherCache>,
        config: &WeatherConfig,
    ) -> WeatherRepository {
        WeatherRepository::new(
            Arc::new(FixedLocation(location)),
            Arc::new(FakeGeoCoder { name: geocoded }),
            client,
            cache,
            config,
        )
    }

    fn cached_weather(fetched_at: chrono::DateTime<Utc>, units: Units) -> CityWeather {
        fixture_dto()
            .into_city_weather("Seoul".into(), seoul(), units, fetched_at)
            .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_success_writes_through() {
        let cache = Arc::new(WeatherCache::in_memory().unwrap());
        let repo = repository(
            Some(seoul()),
            Some("Gangnam-gu, Seoul"),
            FakeClient::new(true),
            cache.clone(),
            &no_reuse(),
        );

        let weather = repo.current_location_weather().await.unwrap();
        assert_eq!(weather.city_name, "Gangnam-gu, Seoul");
        assert_eq!(weather.freshness, Freshness::Fresh);

        let cached = cache.get_forecast(&seoul().cache_key(2)).unwrap().unwrap();
        assert_eq!(cached.weather, weather);
        assert_eq!(
            cached.fetched_at.timestamp_millis(),
            weather.fetched_at.timestamp_millis()
        );

        let tracked = cache.last_location().unwrap().unwrap();
        assert_eq!(tracked.city_name.as_deref(), Some("Gangnam-gu, Seoul"));
    }

    #[tokio::test]
    async fn test_overwrites_previous_row() {
        let cache = Arc::new(WeatherCache::in_memory().unwrap());
        let key = seoul().cache_key(2);
        let old = cached_weather(Utc::now() - Duration::days(1), Units::Metric);
        cache.store_forecast(&key, &old).unwrap();

        let repo = repository(Some(seoul()), Some("Seoul"), FakeClient::new(true), cache.clone(), &no_reuse());
        let weather = repo.current_location_weather().await.unwrap();

        let cached = cache.get_forecast(&key).unwrap().unwrap();
        assert_eq!(
            cached.fetched_at.timestamp_millis(),
            weather.fetched_at.timestamp_millis()
        );
        assert!(cached.fetched_at > old.fetched_at);
    }

    #[tokio::test]
    async fn test_missing_location_is_error() {
        let cache = Arc::new(WeatherCache::in_memory().unwrap());
        let client = FakeClient::new(true);
        let repo = repository(None, Some("Seoul"), client.clone(), cache, &no_reuse());

        let err = repo.current_location_weather().await.unwrap_err();
        assert!(matches!(err, WeatherError::LocationUnavailable));
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_geocode_failure_falls_back_to_coordinates() {
        let cache = Arc::new(WeatherCache::in_memory().unwrap());
        let repo = repository(Some(seoul()), None, FakeClient::new(true), cache, &no_reuse());

        let weather = repo.current_location_weather().await.unwrap();
        assert_eq!(weather.city_name, "37.50, 127.03");
    }

    #[tokio::test]
    async fn test_network_failure_serves_stale_cache() {
        let cache = Arc::new(WeatherCache::in_memory().unwrap());
        let two_hours_ago = Utc::now() - Duration::hours(2);
        // Jittered coordinate that rounds to the same key
        let nearby = Coordinate::new(37.5012, 127.0288).unwrap();
        cache
            .store_forecast(&nearby.cache_key(2), &cached_weather(two_hours_ago, Units::Metric))
            .unwrap();

        let repo = repository(Some(seoul()), Some("Seoul"), FakeClient::new(false), cache, &WeatherConfig::default());
        let weather = repo.current_location_weather().await.unwrap();

        assert!(weather.is_stale());
        match weather.freshness {
            Freshness::Stale { fetched_at } => {
                assert_eq!(fetched_at.timestamp_millis(), two_hours_ago.timestamp_millis());
            }
            Freshness::Fresh => panic!("expected stale forecast"),
        }
    }

    #[tokio::test]
    async fn test_stale_cache_takes_current_label() {
        let cache = Arc::new(WeatherCache::in_memory().unwrap());
        cache
            .store_forecast(
                &seoul().cache_key(2),
                &cached_weather(Utc::now() - Duration::hours(2), Units::Metric),
            )
            .unwrap();

        let repo = repository(
            Some(seoul()),
            Some("Gangnam-gu, Seoul"),
            FakeClient::new(false),
            cache,
            &no_reuse(),
        );
        let weather = repo.current_location_weather().await.unwrap();

        assert!(weather.is_stale());
        assert_eq!(weather.city_name, "Gangnam-gu, Seoul");
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_fetch_falls_back_to_cache_within_attempt_deadline() {
        let cache = Arc::new(WeatherCache::in_memory().unwrap());
        cache
            .store_forecast(
                &seoul().cache_key(2),
                &cached_weather(Utc::now() - Duration::hours(2), Units::Metric),
            )
            .unwrap();

        let client = FakeClient::hanging();
        let repo = repository(Some(seoul()), Some("Seoul"), client.clone(), cache, &no_reuse());

        let weather = tokio::time::timeout(repo.attempt_deadline(), repo.current_location_weather())
            .await
            .expect("repository gave up before the attempt deadline")
            .unwrap();

        assert!(weather.is_stale());
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_fetch_without_cache_is_timeout() {
        let cache = Arc::new(WeatherCache::in_memory().unwrap());
        let repo = repository(Some(seoul()), Some("Seoul"), FakeClient::hanging(), cache, &no_reuse());

        let err = repo.current_location_weather().await.unwrap_err();
        assert!(matches!(
            err,
            WeatherError::WeatherFetchFailed(NetworkError::Timeout)
        ));
    }

    #[test]
    fn test_attempt_deadline_outlasts_inner_budgets() {
        let cache = Arc::new(WeatherCache::in_memory().unwrap());
        let config = WeatherConfig::default();
        let repo = repository(Some(seoul()), Some("Seoul"), FakeClient::new(true), cache, &config);

        let inner = geocode::REQUEST_TIMEOUT + StdDuration::from_secs(config.request_timeout_secs);
        assert!(repo.attempt_deadline() > inner);
    }

    #[tokio::test]
    async fn test_network_failure_without_cache_is_error() {
        let cache = Arc::new(WeatherCache::in_memory().unwrap());
        let repo = repository(Some(seoul()), Some("Seoul"), FakeClient::new(false), cache, &no_reuse());

        let err = repo.current_location_weather().await.unwrap_err();
        assert!(matches!(
            err,
            WeatherError::WeatherFetchFailed(NetworkError::ConnectionFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_stale_cache_converted_to_requested_units() {
        let cache = Arc::new(WeatherCache::in_memory().unwrap());
        cache
            .store_forecast(
                &seoul().cache_key(2),
                &cached_weather(Utc::now() - Duration::hours(2), Units::Metric),
            )
            .unwrap();

        let config = WeatherConfig {
            temperature_unit: TemperatureUnit::Fahrenheit,
            reuse_minutes: 0,
            ..WeatherConfig::default()
        };
        let repo = repository(Some(seoul()), Some("Seoul"), FakeClient::new(false), cache, &config);
        let weather = repo.current_location_weather().await.unwrap();

        assert_eq!(weather.units, Units::Imperial);
        // 18.4 °C
        assert!((weather.current.temperature - 65.12).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_recent_cache_reused_without_network() {
        let cache = Arc::new(WeatherCache::in_memory().unwrap());
        cache
            .store_forecast(
                &seoul().cache_key(2),
                &cached_weather(Utc::now() - Duration::minutes(1), Units::Metric),
            )
            .unwrap();

        let client = FakeClient::new(true);
        let repo = repository(Some(seoul()), Some("Seoul"), client.clone(), cache, &WeatherConfig::default());
        let weather = repo.current_location_weather().await.unwrap();

        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
        assert_eq!(weather.freshness, Freshness::Fresh);
    }

    #[tokio::test]
    async fn test_zero_reuse_window_always_fetches() {
        let cache = Arc::new(WeatherCache::in_memory().unwrap());
        cache
            .store_forecast(
                &seoul().cache_key(2),
                &cached_weather(Utc::now(), Units::Metric),
            )
            .unwrap();

        let client = FakeClient::new(true);
        let repo = repository(Some(seoul()), Some("Seoul"), client.clone(), cache, &no_reuse());
        repo.current_location_weather().await.unwrap();

        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_explicit_label_skips_geocoding() {
        let cache = Arc::new(WeatherCache::in_memory().unwrap());
        let repo = repository(None, None, FakeClient::new(true), cache, &no_reuse());

        let weather = repo.weather_at(busan(), Some("Busan".into())).await.unwrap();
        assert_eq!(weather.city_name, "Busan");
        assert_eq!(weather.coordinate, busan());
    }

    #[tokio::test]
    async fn test_search_places_delegates() {
        let cache = Arc::new(WeatherCache::in_memory().unwrap());
        let repo = repository(None, None, FakeClient::new(true), cache, &no_reuse());

        let places = repo.search_places("Busan").await.unwrap();
        assert_eq!(places.len(), 1);
        assert_eq!(places[0].coordinate, busan());
    }
}
