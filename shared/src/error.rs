//! Evaluation-time data faults
//!
//! These never leave alert evaluation: every fault resolves the alert to
//! `not_triggered`.

use thiserror::Error;

use crate::models::AlertKind;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationFault {
    #[error("parameter '{parameter}' is not supported for {kind} data")]
    UnsupportedParameter { parameter: String, kind: AlertKind },

    #[error("forecast contains no intervals")]
    NoForecastData,
}
