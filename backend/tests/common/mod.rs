//! In-memory stand-ins for the alert store and weather service

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use alert_evaluator::error::{AppError, AppResult};
use alert_evaluator::external::{
    AlertQuery, AlertStore, BulkUpdateResult, StateUpdate, WeatherProvider,
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use shared::{
    Alert, AlertKind, AlertLocation, AlertState, ForecastInterval, ForecastSeries, Location,
    LocationKey, Operator, Parameter, Precipitation, Timestep, WeatherDataKey,
    WeatherLocation, WeatherObservation,
};
use tokio::sync::Notify;

// ============================================================================
// Builders
// ============================================================================

pub fn instantaneous(
    id: &str,
    location: AlertLocation,
    parameter: Parameter,
    operator: Operator,
    threshold: f64,
) -> Alert {
    Alert {
        id: id.to_string(),
        name: None,
        description: None,
        kind: AlertKind::Instantaneous,
        parameter,
        operator,
        threshold,
        location,
        timestep: None,
        state: AlertState::NotTriggered,
        created_at: None,
        updated_at: None,
        last_evaluated_at: None,
    }
}

pub fn forecast(
    id: &str,
    location: AlertLocation,
    timestep: Timestep,
    parameter: Parameter,
    operator: Operator,
    threshold: f64,
) -> Alert {
    Alert {
        kind: AlertKind::Forecast,
        timestep: Some(timestep),
        ..instantaneous(id, location, parameter, operator, threshold)
    }
}

pub fn coords(lat: i64, lon: i64) -> AlertLocation {
    AlertLocation::coordinates(Decimal::from(lat), Decimal::from(lon))
}

pub fn observation(temperature: f64, humidity: f64, uv_index: f64) -> WeatherObservation {
    WeatherObservation {
        location: WeatherLocation::default(),
        timestamp: "2024-06-01T12:00:00Z".parse().unwrap(),
        temperature,
        humidity,
        wind_speed: 3.0,
        wind_direction: 180.0,
        precipitation: Precipitation {
            intensity: 0.0,
            probability: 10.0,
        },
        visibility: 10.0,
        uv_index: Some(uv_index),
        cloud_cover: Some(20.0),
        pressure: Some(1012.0),
        weather_code: Some(1000.0),
    }
}

pub fn forecast_series(timestep: Timestep, humidities: &[f64]) -> ForecastSeries {
    ForecastSeries {
        location: WeatherLocation::default(),
        timestep,
        intervals: humidities
            .iter()
            .map(|humidity| ForecastInterval {
                time: "2024-06-01T13:00:00Z".parse().unwrap(),
                temperature: 28.0,
                humidity: *humidity,
                wind_speed: 5.0,
                precipitation_chance: 40.0,
                uv_index: Some(6.0),
                cloud_cover: Some(30.0),
                weather_code: Some(1100.0),
            })
            .collect(),
    }
}

/// Resolve an alert location to its canonical key
pub fn key_of(location: &AlertLocation) -> LocationKey {
    location.resolve().unwrap().key()
}

// ============================================================================
// Fake alert store
// ============================================================================

/// How the fake answers bulk updates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BulkMode {
    /// Every requested id is modified
    Ok,
    /// Report this many modifications regardless of the request
    Partial(u64),
    /// Fail before any response is received
    TransportError,
}

pub struct FakeAlertStore {
    alerts: Vec<Alert>,
    healthy: AtomicBool,
    bulk_mode: Mutex<BulkMode>,
    failing_ids: Mutex<HashSet<String>>,
    gate: Option<Arc<Notify>>,
    pub fetch_calls: AtomicUsize,
    pub bulk_calls: Mutex<Vec<(Vec<String>, StateUpdate)>>,
    pub single_calls: Mutex<Vec<(String, StateUpdate)>>,
}

impl FakeAlertStore {
    pub fn new(alerts: Vec<Alert>) -> Self {
        Self {
            alerts,
            healthy: AtomicBool::new(true),
            bulk_mode: Mutex::new(BulkMode::Ok),
            failing_ids: Mutex::new(HashSet::new()),
            gate: None,
            fetch_calls: AtomicUsize::new(0),
            bulk_calls: Mutex::new(Vec::new()),
            single_calls: Mutex::new(Vec::new()),
        }
    }

    /// Hold `fetch_alerts` until the returned handle is notified
    pub fn gated(mut self) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        self.gate = Some(gate.clone());
        (self, gate)
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    pub fn set_bulk_mode(&self, mode: BulkMode) {
        *self.bulk_mode.lock().unwrap() = mode;
    }

    pub fn fail_update(&self, id: &str) {
        self.failing_ids.lock().unwrap().insert(id.to_string());
    }

    pub fn bulk_call_count(&self) -> usize {
        self.bulk_calls.lock().unwrap().len()
    }

    pub fn single_call_count(&self) -> usize {
        self.single_calls.lock().unwrap().len()
    }

    pub fn write_call_count(&self) -> usize {
        self.bulk_call_count() + self.single_call_count()
    }
}

#[async_trait]
impl AlertStore for FakeAlertStore {
    async fn health_check(&self) -> AppResult<()> {
        if self.healthy.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(AppError::unavailable("alert store", "health check returned 503"))
        }
    }

    async fn fetch_alerts(&self, query: &AlertQuery) -> AppResult<Vec<Alert>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        Ok(self
            .alerts
            .iter()
            .filter(|alert| query.state.map_or(true, |state| alert.state == state))
            .cloned()
            .collect())
    }

    async fn update_state(&self, id: &str, update: &StateUpdate) -> AppResult<()> {
        self.single_calls
            .lock()
            .unwrap()
            .push((id.to_string(), update.clone()));

        if self.failing_ids.lock().unwrap().contains(id) {
            return Err(AppError::WriteBackTransport(format!("update of {} refused", id)));
        }
        Ok(())
    }

    async fn bulk_update_state(
        &self,
        ids: &[String],
        update: &StateUpdate,
    ) -> AppResult<BulkUpdateResult> {
        self.bulk_calls
            .lock()
            .unwrap()
            .push((ids.to_vec(), update.clone()));

        let mode = *self.bulk_mode.lock().unwrap();
        match mode {
            BulkMode::Ok => Ok(BulkUpdateResult {
                modified_count: ids.len() as u64,
                matched_count: ids.len() as u64,
            }),
            BulkMode::Partial(modified) => Ok(BulkUpdateResult {
                modified_count: modified,
                matched_count: ids.len() as u64,
            }),
            BulkMode::TransportError => {
                Err(AppError::WriteBackTransport("connection reset".to_string()))
            }
        }
    }
}

// ============================================================================
// Fake weather service
// ============================================================================

#[derive(Default)]
pub struct FakeWeather {
    current: HashMap<LocationKey, WeatherObservation>,
    forecasts: HashMap<(LocationKey, Timestep), ForecastSeries>,
    failing: HashSet<LocationKey>,
    failing_fetches: HashSet<WeatherDataKey>,
    unhealthy: AtomicBool,
    pub calls: Mutex<Vec<String>>,
}

impl FakeWeather {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_current(mut self, location: &AlertLocation, data: WeatherObservation) -> Self {
        self.current.insert(key_of(location), data);
        self
    }

    pub fn with_forecast(
        mut self,
        location: &AlertLocation,
        timestep: Timestep,
        data: ForecastSeries,
    ) -> Self {
        self.forecasts.insert((key_of(location), timestep), data);
        self
    }

    /// Every request for this location fails
    pub fn failing_at(mut self, location: &AlertLocation) -> Self {
        self.failing.insert(key_of(location));
        self
    }

    /// Only this one fetch fails; other data at the same location still loads
    pub fn failing_fetch(mut self, location: &AlertLocation, timestep: Option<Timestep>) -> Self {
        let key = key_of(location);
        self.failing_fetches.insert(match timestep {
            Some(timestep) => WeatherDataKey::Forecast(key, timestep),
            None => WeatherDataKey::Instantaneous(key),
        });
        self
    }

    fn fails(&self, key: &WeatherDataKey) -> bool {
        self.failing.contains(key.location_key()) || self.failing_fetches.contains(key)
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.unhealthy.store(!healthy, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl WeatherProvider for FakeWeather {
    async fn health_check(&self) -> AppResult<()> {
        if self.unhealthy.load(Ordering::SeqCst) {
            Err(AppError::unavailable("weather service", "connection refused"))
        } else {
            Ok(())
        }
    }

    async fn current_weather(&self, location: &Location) -> AppResult<WeatherObservation> {
        let key = location.key();
        self.record(format!("current:{}", key));

        if self.fails(&WeatherDataKey::Instantaneous(key.clone())) {
            return Err(AppError::WeatherFetch(format!("{} timed out", key)));
        }
        self.current
            .get(&key)
            .cloned()
            .ok_or_else(|| AppError::WeatherFetch(format!("no current weather for {}", key)))
    }

    async fn forecast(&self, location: &Location, timestep: Timestep) -> AppResult<ForecastSeries> {
        let key = location.key();
        self.record(format!("forecast:{}:{}", timestep, key));

        if self.fails(&WeatherDataKey::Forecast(key.clone(), timestep)) {
            return Err(AppError::WeatherFetch(format!("{} timed out", key)));
        }
        self.forecasts
            .get(&(key.clone(), timestep))
            .cloned()
            .ok_or_else(|| AppError::WeatherFetch(format!("no {} forecast for {}", timestep, key)))
    }
}
