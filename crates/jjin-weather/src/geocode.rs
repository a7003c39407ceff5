//! Geocoding: coordinates to place names and back.
//! Uses Nominatim (OpenStreetMap) - free, no API key required.

use std::time::Duration;

use async_trait::async_trait;
use jjin_core::GeocodingConfig;
use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;

use crate::error::WeatherError;
use crate::types::{Coordinate, Place};

/// Budget for a single Nominatim request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const SEARCH_LIMIT: usize = 5;

#[async_trait]
pub trait GeoCoder: Send + Sync {
    /// Human-readable name for a coordinate (e.g. "Gangnam-gu, Seoul").
    async fn reverse(&self, coordinate: &Coordinate) -> Result<String, WeatherError>;

    /// Places matching a free-text query, best match first.
    async fn search(&self, query: &str) -> Result<Vec<Place>, WeatherError>;
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    address: Option<NominatimAddress>,
}

#[derive(Debug, Deserialize)]
struct NominatimAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    municipality: Option<String>,
    city_district: Option<String>,
    borough: Option<String>,
    suburb: Option<String>,
    state_district: Option<String>,
    state: Option<String>,
    county: Option<String>,
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    lat: String,
    lon: String,
    display_name: String,
    #[serde(default)]
    name: Option<String>,
}

impl NominatimAddress {
    /// "district, place" when a district is known, otherwise "place, state"
    /// (or "place, country") for disambiguation.
    fn display_name(self) -> Option<String> {
        let district = self.city_district.or(self.borough).or(self.suburb);
        let state = self.state.clone();
        let country = self.country.clone();

        let place = self
            .city
            .or(self.town)
            .or(self.village)
            .or(self.municipality)
            .or(self.state_district)
            .or(self.county)
            .or(self.state)
            .or(self.country)?;

        if let Some(d) = district.filter(|d| !d.is_empty() && d != &place) {
            return Some(format!("{}, {}", d, place));
        }

        let suffix = state
            .filter(|s| !s.is_empty() && s != &place)
            .or_else(|| country.filter(|c| !c.is_empty() && c != &place));

        Some(match suffix {
            Some(s) => format!("{}, {}", place, s),
            None => place,
        })
    }
}

/// Nominatim-backed geocoder.
pub struct NominatimGeoCoder {
    client: Client,
    base_url: String,
}

impl NominatimGeoCoder {
    pub fn new(config: &GeocodingConfig) -> Result<Self, WeatherError> {
        Self::with_base_url(&config.base_url, &config.user_agent)
    }

    pub fn with_base_url(base_url: &str, user_agent: &str) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(user_agent)
            .build()
            .map_err(|e| WeatherError::GeocodeFailed(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T, WeatherError> {
        let url = format!("{}/{}", self.base_url, endpoint);

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| WeatherError::GeocodeFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!("Geocode {} returned status {}", endpoint, status);
            return Err(WeatherError::GeocodeFailed(format!("status {}", status)));
        }

        response
            .json()
            .await
            .map_err(|e| WeatherError::GeocodeFailed(format!("parse error: {}", e)))
    }
}

#[async_trait]
impl GeoCoder for NominatimGeoCoder {
    #[instrument(skip(self), level = "debug")]
    async fn reverse(&self, coordinate: &Coordinate) -> Result<String, WeatherError> {
        let body: ReverseResponse = self
            .get_json(
                "reverse",
                &[
                    ("lat", coordinate.latitude().to_string()),
                    ("lon", coordinate.longitude().to_string()),
                    ("format", "json".to_string()),
                    ("addressdetails", "1".to_string()),
                    ("zoom", "14".to_string()),
                ],
            )
            .await?;

        let name = body
            .address
            .and_then(NominatimAddress::display_name)
            .ok_or_else(|| WeatherError::GeocodeFailed("no address for coordinate".into()))?;

        tracing::info!("Reverse geocoded to: {}", name);
        Ok(name)
    }

    #[instrument(skip(self), level = "debug")]
    async fn search(&self, query: &str) -> Result<Vec<Place>, WeatherError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let results: Vec<SearchResult> = self
            .get_json(
                "search",
                &[
                    ("q", query.to_string()),
                    ("format", "json".to_string()),
                    ("limit", SEARCH_LIMIT.to_string()),
                ],
            )
            .await?;

        let places = results
            .into_iter()
            .filter_map(|r| {
                let lat = r.lat.parse::<f64>().ok()?;
                let lon = r.lon.parse::<f64>().ok()?;
                let coordinate = Coordinate::new(lat, lon).ok()?;
                let name = r.name.filter(|n| !n.is_empty()).unwrap_or(r.display_name);
                Some(Place { name, coordinate })
            })
            .collect::<Vec<_>>();

        tracing::debug!("Search '{}' matched {} places", query, places.len());
        Ok(places)
    }
}
