//! Alert condition evaluation
//!
//! Evaluation is fail-safe: any fault while evaluating an alert resolves it
//! to `not_triggered`, so an alert is never marked triggered on bad data.

use std::collections::BTreeMap;

use shared::{
    validate_comparable, Alert, AlertKind, AlertState, EvaluationFault, Operator, WeatherData,
};
use thiserror::Error;

use super::fetcher::{data_key, WeatherCache};
use super::grouping::LocationGroups;

/// Why an alert could not be evaluated
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationSkip {
    #[error("no weather data available")]
    NoData,

    #[error("alert expects {expected} data but received {actual}")]
    ShapeMismatch { expected: AlertKind, actual: AlertKind },

    #[error("parameter '{parameter}' is not supported for {kind} alerts")]
    UnsupportedParameter { parameter: String, kind: AlertKind },

    #[error("unknown operator '{0}'")]
    UnknownOperator(String),

    #[error("{0}")]
    InvalidNumber(&'static str),

    #[error(transparent)]
    Fault(#[from] EvaluationFault),
}

/// Whether the alert's condition holds against `data`
pub fn condition_holds(alert: &Alert, data: Option<&WeatherData>) -> Result<bool, EvaluationSkip> {
    let data = data.ok_or(EvaluationSkip::NoData)?;

    if data.kind() != alert.kind {
        return Err(EvaluationSkip::ShapeMismatch {
            expected: alert.kind,
            actual: data.kind(),
        });
    }

    if !alert.parameter.is_supported_for(alert.kind) {
        return Err(EvaluationSkip::UnsupportedParameter {
            parameter: alert.parameter.to_string(),
            kind: alert.kind,
        });
    }

    if let Operator::Unrecognized(op) = &alert.operator {
        return Err(EvaluationSkip::UnknownOperator(op.clone()));
    }

    validate_comparable(alert.threshold).map_err(EvaluationSkip::InvalidNumber)?;
    let value = data.extract(&alert.parameter)?;
    validate_comparable(value).map_err(EvaluationSkip::InvalidNumber)?;

    Ok(alert.operator.apply(value, alert.threshold))
}

/// Evaluate one alert, resolving every fault to `NotTriggered`
pub fn evaluate_alert(alert: &Alert, data: Option<&WeatherData>) -> AlertState {
    match condition_holds(alert, data) {
        Ok(true) => AlertState::Triggered,
        Ok(false) => AlertState::NotTriggered,
        Err(EvaluationSkip::NoData) => {
            tracing::debug!(alert_id = %alert.id, "No weather data for alert");
            AlertState::NotTriggered
        }
        Err(reason) => {
            tracing::warn!(alert_id = %alert.id, %reason, "Alert could not be evaluated");
            AlertState::NotTriggered
        }
    }
}

/// Evaluate every grouped alert against the fetched data
pub fn evaluate_groups(groups: &LocationGroups, cache: &WeatherCache) -> BTreeMap<String, AlertState> {
    let mut states = BTreeMap::new();

    for group in groups.iter() {
        for alert in &group.alerts {
            let data = data_key(alert, &group.key).and_then(|key| cache.get(&key));
            let state = evaluate_alert(alert, data.as_deref());
            states.insert(alert.id.clone(), state);
        }
    }

    states
}
