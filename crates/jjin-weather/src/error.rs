//! Weather-specific error types.

use jjin_core::{DatabaseError, NetworkError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WeatherError {
    #[error("Location unavailable")]
    LocationUnavailable,

    #[error("Invalid coordinate: {latitude}, {longitude}")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    #[error("Geocoding failed: {0}")]
    GeocodeFailed(String),

    #[error("Weather fetch failed: {0}")]
    WeatherFetchFailed(#[from] NetworkError),

    #[error("Cache error: {0}")]
    Cache(#[from] DatabaseError),
}

impl WeatherError {
    /// User-friendly error message for UI display.
    pub fn user_message(&self) -> String {
        match self {
            Self::LocationUnavailable => {
                "Unable to determine your location. Check location permission.".to_string()
            }
            Self::InvalidCoordinate { .. } => "The selected location is invalid.".to_string(),
            Self::GeocodeFailed(_) => "Unable to find that place.".to_string(),
            Self::WeatherFetchFailed(e) => e.user_message().to_string(),
            Self::Cache(e) => e.user_message().to_string(),
        }
    }
}
