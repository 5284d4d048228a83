//! Weather API client for fetching weather data
//!
//! Fetches current conditions and forecasts by coordinates or by city name.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use shared::{ForecastSeries, Location, Timestep, WeatherObservation};

use super::{http_client, read_envelope, WeatherProvider};
use crate::error::{AppError, AppResult};

const SERVICE_NAME: &str = "weather service";

/// Weather API client
#[derive(Clone)]
pub struct WeatherClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl WeatherClient {
    /// Create a new WeatherClient
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        let client = http_client(timeout)
            .map_err(|e| AppError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: None,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Attach an API key sent with every request
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|key| !key.is_empty());
        self
    }

    fn get(&self, path: &str) -> RequestBuilder {
        let request = self.client.get(format!("{}{}", self.base_url, path));
        match &self.api_key {
            Some(key) => request.header("x-api-key", key),
            None => request,
        }
    }
}

#[async_trait]
impl WeatherProvider for WeatherClient {
    async fn health_check(&self) -> AppResult<()> {
        let response = self
            .get("/health")
            .send()
            .await
            .map_err(|e| AppError::unavailable(SERVICE_NAME, e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::unavailable(
                SERVICE_NAME,
                format!("health check returned {}", response.status()),
            ));
        }

        Ok(())
    }

    /// Fetch current weather conditions for a location
    async fn current_weather(&self, location: &Location) -> AppResult<WeatherObservation> {
        let response = self
            .get("/weather/current")
            .query(&location.query_pairs())
            .send()
            .await
            .map_err(|e| AppError::WeatherFetch(format!("Weather API request failed: {}", e)))?;

        read_envelope(response).await.map_err(|e| {
            AppError::WeatherFetch(format!("Current weather for {} failed: {}", location, e))
        })
    }

    /// Fetch the forecast for a location at the given resolution
    async fn forecast(
        &self,
        location: &Location,
        timestep: Timestep,
    ) -> AppResult<ForecastSeries> {
        let mut query = location.query_pairs();
        query.push(("timestep", timestep.as_str().to_string()));

        let response = self
            .get("/weather/forecast")
            .query(&query)
            .send()
            .await
            .map_err(|e| AppError::WeatherFetch(format!("Weather API request failed: {}", e)))?;

        read_envelope(response).await.map_err(|e| {
            AppError::WeatherFetch(format!(
                "{} forecast for {} failed: {}",
                timestep, location, e
            ))
        })
    }
}
