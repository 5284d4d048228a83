//! Evaluation cycle orchestration
//!
//! One cycle runs strictly in order:
//! health check → fetch pending alerts → group → fetch weather → evaluate →
//! write back. Only the first two stages can fail the cycle.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::AlertState;
use tokio::sync::Mutex;
use tracing::Instrument;
use uuid::Uuid;

use super::evaluator::evaluate_groups;
use super::fetcher::{fetch_all, plan_fetches};
use super::grouping::group_by_location;
use super::write_back::{write_back, WriteBackReport};
use crate::error::{AppError, AppResult};
use crate::external::{AlertQuery, AlertStore, WeatherProvider};

/// Statistics emitted at the end of a successful cycle
#[derive(Debug, Clone, Serialize)]
pub struct CycleSummary {
    pub cycle_id: Uuid,
    pub started_at: DateTime<Utc>,
    /// Pending alerts retrieved from the store
    pub alerts: usize,
    /// Alerts dropped for lacking a usable location
    pub rejected: usize,
    pub locations: usize,
    pub fetches: usize,
    pub fetch_failures: usize,
    pub triggered: usize,
    pub write_back: WriteBackReport,
    pub duration_ms: u64,
}

impl CycleSummary {
    fn empty(cycle_id: Uuid, started_at: DateTime<Utc>, started: Instant) -> Self {
        Self {
            cycle_id,
            started_at,
            alerts: 0,
            rejected: 0,
            locations: 0,
            fetches: 0,
            fetch_failures: 0,
            triggered: 0,
            write_back: WriteBackReport::default(),
            duration_ms: elapsed_ms(started),
        }
    }
}

/// Reachability of both remote dependencies
#[derive(Debug, Clone, Serialize)]
pub struct DependencyHealth {
    pub alert_store: DependencyStatus,
    pub weather: DependencyStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct DependencyStatus {
    pub healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<AppResult<()>> for DependencyStatus {
    fn from(result: AppResult<()>) -> Self {
        match result {
            Ok(()) => Self {
                healthy: true,
                error: None,
            },
            Err(e) => Self {
                healthy: false,
                error: Some(e.to_string()),
            },
        }
    }
}

impl DependencyHealth {
    pub fn is_healthy(&self) -> bool {
        self.alert_store.healthy && self.weather.healthy
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Runs evaluation cycles against the alert store and the weather service
pub struct AlertEvaluationService {
    store: Arc<dyn AlertStore>,
    weather: Arc<dyn WeatherProvider>,
    evaluated_by: String,
    running: Mutex<()>,
}

impl AlertEvaluationService {
    pub fn new(
        store: Arc<dyn AlertStore>,
        weather: Arc<dyn WeatherProvider>,
        evaluated_by: impl Into<String>,
    ) -> Self {
        Self {
            store,
            weather,
            evaluated_by: evaluated_by.into(),
            running: Mutex::new(()),
        }
    }

    /// Check both dependencies concurrently
    pub async fn dependency_health(&self) -> DependencyHealth {
        let (alert_store, weather) =
            tokio::join!(self.store.health_check(), self.weather.health_check());

        DependencyHealth {
            alert_store: alert_store.into(),
            weather: weather.into(),
        }
    }

    /// Run one cycle.
    ///
    /// Fails with `CycleInProgress` when another cycle holds the guard.
    pub async fn run_cycle(&self) -> AppResult<CycleSummary> {
        let _guard = self.running.try_lock().map_err(|_| AppError::CycleInProgress)?;

        let cycle_id = Uuid::new_v4();
        let span = tracing::info_span!("evaluation_cycle", %cycle_id);

        let result = self.execute(cycle_id).instrument(span.clone()).await;
        if let Err(e) = &result {
            span.in_scope(|| tracing::error!(error = %e, "Evaluation cycle failed"));
        }
        result
    }

    async fn execute(&self, cycle_id: Uuid) -> AppResult<CycleSummary> {
        let started = Instant::now();
        let started_at = Utc::now();
        tracing::info!("Starting evaluation cycle");

        // Health check: no partial evaluation against a degraded dependency
        let (store_health, weather_health) =
            tokio::join!(self.store.health_check(), self.weather.health_check());
        store_health?;
        weather_health?;

        // Fetch pending
        let mut alerts = self.store.fetch_alerts(&AlertQuery::pending()).await?;
        alerts.retain(|alert| {
            let pending = alert.state == AlertState::NotTriggered;
            if !pending {
                tracing::debug!(alert_id = %alert.id, "Ignoring alert that already triggered");
            }
            pending
        });

        if alerts.is_empty() {
            tracing::info!("No pending alerts");
            return Ok(CycleSummary::empty(cycle_id, started_at, started));
        }

        // Group
        let groups = group_by_location(&alerts);
        tracing::info!(
            alerts = alerts.len(),
            locations = groups.len(),
            rejected = groups.rejected.len(),
            "Grouped pending alerts"
        );

        // Fetch weather
        let requests = plan_fetches(&groups);
        let outcome = fetch_all(self.weather.as_ref(), requests).await;
        if !outcome.failed.is_empty() {
            tracing::warn!(
                failed = outcome.failed.len(),
                attempted = outcome.attempted,
                "Some weather fetches failed; dependent alerts stay not triggered"
            );
        }

        // Evaluate
        let states = evaluate_groups(&groups, &outcome.cache);
        let triggered = states
            .values()
            .filter(|state| **state == AlertState::Triggered)
            .count();

        // Write back
        let report = write_back(self.store.as_ref(), &states, &self.evaluated_by).await;

        let summary = CycleSummary {
            cycle_id,
            started_at,
            alerts: alerts.len(),
            rejected: groups.rejected.len(),
            locations: groups.len(),
            fetches: outcome.attempted,
            fetch_failures: outcome.failed.len(),
            triggered,
            write_back: report,
            duration_ms: elapsed_ms(started),
        };

        tracing::info!(
            alerts = summary.alerts,
            locations = summary.locations,
            triggered = summary.triggered,
            written = summary.write_back.success_count(),
            write_failures = summary.write_back.failure_count(),
            duration_ms = summary.duration_ms,
            "Evaluation cycle completed"
        );

        Ok(summary)
    }
}
