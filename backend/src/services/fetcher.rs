//! Weather fetch planning and concurrent fan-out
//!
//! One fetch is issued per distinct `(location, kind[, timestep])`. All
//! fetches run concurrently and settle independently: a failure leaves its
//! key absent and never affects the other locations.

use std::collections::BTreeSet;

use dashmap::{mapref::entry::Entry, mapref::one::Ref, DashMap};
use futures::future::join_all;
use shared::{Alert, AlertKind, Location, LocationKey, WeatherData, WeatherDataKey};

use super::grouping::LocationGroups;
use crate::error::AppResult;
use crate::external::WeatherProvider;

/// One remote weather lookup
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub key: WeatherDataKey,
    pub location: Location,
}

/// The weather data an alert needs, or `None` for a forecast alert that
/// names no timestep
pub fn data_key(alert: &Alert, location_key: &LocationKey) -> Option<WeatherDataKey> {
    match alert.kind {
        AlertKind::Instantaneous => Some(WeatherDataKey::Instantaneous(location_key.clone())),
        AlertKind::Forecast => alert
            .timestep
            .map(|timestep| WeatherDataKey::Forecast(location_key.clone(), timestep)),
    }
}

/// Fetches required by a grouped batch of alerts.
///
/// Per group: one instantaneous fetch if any alert is instantaneous, plus one
/// forecast fetch per distinct timestep.
pub fn plan_fetches(groups: &LocationGroups) -> Vec<FetchRequest> {
    let mut requests = Vec::new();

    for group in groups.iter() {
        let keys: BTreeSet<WeatherDataKey> = group
            .alerts
            .iter()
            .filter_map(|alert| {
                let key = data_key(alert, &group.key);
                if key.is_none() {
                    tracing::warn!(alert_id = %alert.id, "Forecast alert has no timestep");
                }
                key
            })
            .collect();

        requests.extend(keys.into_iter().map(|key| FetchRequest {
            key,
            location: group.location.clone(),
        }));
    }

    requests
}

/// Weather data fetched during one cycle, written at most once per key
#[derive(Debug, Default)]
pub struct WeatherCache {
    entries: DashMap<WeatherDataKey, WeatherData>,
}

impl WeatherCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `data` unless the key already holds a value.
    ///
    /// Returns `false` and keeps the existing value for a duplicate key.
    pub fn insert_once(&self, key: WeatherDataKey, data: WeatherData) -> bool {
        match self.entries.entry(key) {
            Entry::Occupied(entry) => {
                tracing::warn!(key = %entry.key(), "Discarding duplicate weather data");
                false
            }
            Entry::Vacant(entry) => {
                entry.insert(data);
                true
            }
        }
    }

    pub fn get(&self, key: &WeatherDataKey) -> Option<Ref<'_, WeatherDataKey, WeatherData>> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &WeatherDataKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Settled result of a fan-out
#[derive(Debug, Default)]
pub struct FetchOutcome {
    pub cache: WeatherCache,
    pub attempted: usize,
    pub failed: Vec<WeatherDataKey>,
}

async fn fetch_one(provider: &dyn WeatherProvider, request: &FetchRequest) -> AppResult<WeatherData> {
    match &request.key {
        WeatherDataKey::Instantaneous(_) => provider
            .current_weather(&request.location)
            .await
            .map(WeatherData::Instantaneous),
        WeatherDataKey::Forecast(_, timestep) => provider
            .forecast(&request.location, *timestep)
            .await
            .map(WeatherData::Forecast),
    }
}

/// Run every request concurrently and wait for all of them to settle
pub async fn fetch_all(provider: &dyn WeatherProvider, requests: Vec<FetchRequest>) -> FetchOutcome {
    let cache = WeatherCache::new();

    let settled = join_all(requests.iter().map(|request| {
        let cache = &cache;
        async move {
            match fetch_one(provider, request).await {
                Ok(data) => {
                    tracing::debug!(key = %request.key, "Fetched weather data");
                    cache.insert_once(request.key.clone(), data);
                    None
                }
                Err(e) => {
                    tracing::warn!(key = %request.key, error = %e, "Weather fetch failed");
                    Some(request.key.clone())
                }
            }
        }
    }))
    .await;

    FetchOutcome {
        attempted: requests.len(),
        failed: settled.into_iter().flatten().collect(),
        cache,
    }
}
