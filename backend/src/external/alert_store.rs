//! Alert store API client
//!
//! Reads pending alerts and writes evaluated states back, either one alert
//! at a time or as a bulk update filtered by id.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use shared::{Alert, AlertKind, AlertState, Parameter};

use super::{http_client, read_ack, read_envelope, AlertStore};
use crate::error::{AppError, AppResult};

const SERVICE_NAME: &str = "alert store";

/// Alert store API client
#[derive(Clone)]
pub struct AlertStoreClient {
    client: Client,
    base_url: String,
}

/// Filter and ordering for alert listings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlertQuery {
    pub state: Option<AlertState>,
    pub kind: Option<AlertKind>,
    pub parameter: Option<Parameter>,
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        }
    }
}

impl AlertQuery {
    /// Alerts that have not fired yet, oldest first
    pub fn pending() -> Self {
        Self {
            state: Some(AlertState::NotTriggered),
            sort_by: Some("createdAt".to_string()),
            sort_order: Some(SortOrder::Ascending),
            ..Default::default()
        }
    }

    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(state) = self.state {
            pairs.push(("state", state.as_str().to_string()));
        }
        if let Some(kind) = self.kind {
            pairs.push(("type", kind.to_string()));
        }
        if let Some(parameter) = &self.parameter {
            pairs.push(("parameter", parameter.as_str().to_string()));
        }
        if let Some(sort_by) = &self.sort_by {
            pairs.push(("sortBy", sort_by.clone()));
        }
        if let Some(order) = self.sort_order {
            pairs.push(("sortOrder", order.as_str().to_string()));
        }
        pairs
    }
}

/// State change recorded on an alert
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StateUpdate {
    pub state: AlertState,
    pub evaluated_at: DateTime<Utc>,
    pub evaluated_by: String,
}

/// Bulk update request body
#[derive(Debug, Serialize, Deserialize)]
pub struct BulkUpdateRequest {
    pub filter: BulkFilter,
    pub update: StateUpdate,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BulkFilter {
    pub ids: Vec<String>,
}

/// Counts reported by the store for a bulk update
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct BulkUpdateResult {
    pub modified_count: u64,
    pub matched_count: u64,
}

impl AlertStoreClient {
    /// Create a new AlertStoreClient
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        let client = http_client(timeout)
            .map_err(|e| AppError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl AlertStore for AlertStoreClient {
    async fn health_check(&self) -> AppResult<()> {
        let response = self
            .client
            .get(self.url("/health"))
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

    async fn fetch_alerts(&self, query: &AlertQuery) -> AppResult<Vec<Alert>> {
        let response = self
            .client
            .get(self.url("/alerts"))
            .query(&query.query_pairs())
            .send()
            .await
            .map_err(|e| AppError::AlertStore(format!("Alert listing request failed: {}", e)))?;

        let records: Vec<serde_json::Value> = read_envelope(response)
            .await
            .map_err(|e| AppError::AlertStore(format!("Alert listing failed: {}", e)))?;

        // One undecodable document must not hide every other alert
        let alerts = records
            .into_iter()
            .filter_map(|record| match serde_json::from_value::<Alert>(record) {
                Ok(alert) => Some(alert),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping malformed alert record");
                    None
                }
            })
            .collect();

        Ok(alerts)
    }

    async fn update_state(&self, id: &str, update: &StateUpdate) -> AppResult<()> {
        let response = self
            .client
            .put(self.url(&format!("/alerts/{}/state", id)))
            .json(update)
            .send()
            .await
            .map_err(|e| AppError::WriteBackTransport(format!("Update of {} failed: {}", id, e)))?;

        read_ack(response)
            .await
            .map_err(|e| AppError::WriteBackTransport(format!("Update of {} failed: {}", id, e)))
    }

    async fn bulk_update_state(
        &self,
        ids: &[String],
        update: &StateUpdate,
    ) -> AppResult<BulkUpdateResult> {
        let request = BulkUpdateRequest {
            filter: BulkFilter { ids: ids.to_vec() },
            update: update.clone(),
        };

        let response = self
            .client
            .patch(self.url("/alerts/bulk"))
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::WriteBackTransport(format!("Bulk update request failed: {}", e)))?;

        read_envelope(response)
            .await
            .map_err(|e| AppError::WriteBackTransport(format!("Bulk update failed: {}", e)))
    }
}
