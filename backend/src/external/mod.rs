//! External API integrations
//!
//! Both remote services answer with the `{success, data?, message?}`
//! envelope. The evaluation cycle only talks to them through the
//! [`AlertStore`] and [`WeatherProvider`] traits.

pub mod alert_store;
pub mod weather;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use shared::{Alert, ApiResponse, ForecastSeries, Location, Timestep, WeatherObservation};

use crate::error::AppResult;

pub use alert_store::{AlertQuery, AlertStoreClient, BulkUpdateResult, SortOrder, StateUpdate};
pub use weather::WeatherClient;

/// Remote store owning alert definitions and their state
#[async_trait]
pub trait AlertStore: Send + Sync {
    /// Succeeds when the store answers its health endpoint
    async fn health_check(&self) -> AppResult<()>;

    async fn fetch_alerts(&self, query: &AlertQuery) -> AppResult<Vec<Alert>>;

    /// Write one alert's state
    async fn update_state(&self, id: &str, update: &StateUpdate) -> AppResult<()>;

    /// Write the same state to many alerts in one call
    async fn bulk_update_state(
        &self,
        ids: &[String],
        update: &StateUpdate,
    ) -> AppResult<BulkUpdateResult>;
}

/// Remote source of current conditions and forecasts
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Succeeds when the weather service answers its health endpoint
    async fn health_check(&self) -> AppResult<()>;

    async fn current_weather(&self, location: &Location) -> AppResult<WeatherObservation>;

    async fn forecast(&self, location: &Location, timestep: Timestep)
        -> AppResult<ForecastSeries>;
}

/// Decode an enveloped response body, returning the service message on failure
pub(crate) async fn read_envelope<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, String> {
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiResponse<serde_json::Value>>(&body)
            .ok()
            .and_then(|envelope| envelope.message)
            .unwrap_or(body);
        return Err(format!("{} - {}", status, message));
    }

    let envelope: ApiResponse<T> = response
        .json()
        .await
        .map_err(|e| format!("failed to parse response: {}", e))?;

    envelope.into_data()
}

/// Check an enveloped acknowledgement that may carry no payload
pub(crate) async fn read_ack(response: reqwest::Response) -> Result<(), String> {
    let status = response.status();
    let envelope = response
        .json::<ApiResponse<serde_json::Value>>()
        .await
        .map_err(|e| format!("{} - failed to parse response: {}", status, e))?;

    if status.is_success() && envelope.success {
        Ok(())
    } else {
        Err(format!(
            "{} - {}",
            status,
            envelope.message.unwrap_or_else(|| "request was not successful".to_string())
        ))
    }
}

/// Build a reqwest client with a bounded per-request timeout
pub(crate) fn http_client(timeout: std::time::Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder().timeout(timeout).build()
}
