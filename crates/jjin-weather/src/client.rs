//! OpenWeather One Call API client.

use std::time::Duration;

use async_trait::async_trait;
use jjin_core::{NetworkError, ReqwestErrorExt, WeatherConfig};
use tracing::instrument;

use crate::dto::OneCallDto;
use crate::types::{Coordinate, Units};

const ONE_CALL_PATH: &str = "/data/3.0/onecall";

#[async_trait]
pub trait WeatherClient: Send + Sync {
    /// Fetch current, hourly and daily forecast for a coordinate.
    async fn fetch_forecast(
        &self,
        coordinate: &Coordinate,
        units: Units,
    ) -> Result<OneCallDto, NetworkError>;
}

pub struct OpenWeatherClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenWeatherClient {
    pub fn new(config: &WeatherConfig) -> Result<Self, NetworkError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(ReqwestErrorExt::into_network_error)?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    #[cfg(test)]
    pub fn new_with_base_url(api_key: &str, base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.to_string(),
            base_url: base_url.to_string(),
        }
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, NetworkError> {
        let status = response.status();

        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| NetworkError::InvalidResponse(format!("JSON parse error: {}", e)))
        } else {
            let text = response.text().await.unwrap_or_default();
            tracing::warn!("OpenWeather returned {}", status);
            Err(NetworkError::from_status(status, text))
        }
    }
}

#[async_trait]
impl WeatherClient for OpenWeatherClient {
    #[instrument(skip(self), level = "info")]
    async fn fetch_forecast(
        &self,
        coordinate: &Coordinate,
        units: Units,
    ) -> Result<OneCallDto, NetworkError> {
        let url = format!("{}{}", self.base_url, ONE_CALL_PATH);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("lat", coordinate.latitude().to_string()),
                ("lon", coordinate.longitude().to_string()),
                ("units", units.as_query().to_string()),
                ("exclude", "minutely,alerts".to_string()),
                ("appid", self.api_key.clone()),
            ])
            .send()
            .await
            .map_err(ReqwestErrorExt::into_network_error)?;

        self.handle_response(response).await
    }
}
