//! Periodic evaluation trigger

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::cycle::AlertEvaluationService;
use crate::error::AppError;

/// Runs a cycle every `interval`, skipping ticks while a cycle is running
pub struct Scheduler {
    service: Arc<AlertEvaluationService>,
    interval: Duration,
    run_on_startup: bool,
}

impl Scheduler {
    pub fn new(service: Arc<AlertEvaluationService>, interval: Duration, run_on_startup: bool) -> Self {
        Self {
            service,
            interval,
            run_on_startup,
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        // The first tick completes immediately
        if !self.run_on_startup {
            ticker.tick().await;
        }

        tracing::info!(interval_secs = self.interval.as_secs(), "Scheduler started");

        loop {
            ticker.tick().await;
            // Other failures are logged inside the cycle span
            if let Err(AppError::CycleInProgress) = self.service.run_cycle().await {
                tracing::info!("Previous cycle still running, skipping tick");
            }
        }
    }
}
