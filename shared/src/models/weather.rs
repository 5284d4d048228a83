//! Weather data models and parameter extraction

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EvaluationFault;
use crate::models::alert::{AlertKind, Parameter, Timestep};
use crate::types::LocationKey;

/// Visibility reported for forecasts, which do not carry one
pub const FORECAST_VISIBILITY_SENTINEL: f64 = 10_000.0;

/// Location echoed back by the weather service
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WeatherLocation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Current conditions at a location
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeatherObservation {
    #[serde(default)]
    pub location: WeatherLocation,
    pub timestamp: DateTime<Utc>,
    pub temperature: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub wind_direction: f64,
    #[serde(default)]
    pub precipitation: Precipitation,
    pub visibility: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uv_index: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_cover: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pressure: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather_code: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Precipitation {
    #[serde(default)]
    pub intensity: f64,
    #[serde(default)]
    pub probability: f64,
}

impl WeatherObservation {
    /// Read one parameter; optional fields read as `0` when absent
    pub fn extract(&self, parameter: &Parameter) -> Result<f64, EvaluationFault> {
        let value = match parameter {
            Parameter::Temperature => self.temperature,
            Parameter::Humidity => self.humidity,
            Parameter::WindSpeed => self.wind_speed,
            Parameter::WindDirection => self.wind_direction,
            Parameter::PrecipitationIntensity => self.precipitation.intensity,
            Parameter::PrecipitationProbability => self.precipitation.probability,
            Parameter::Visibility => self.visibility,
            Parameter::UvIndex => self.uv_index.unwrap_or(0.0),
            Parameter::CloudCover => self.cloud_cover.unwrap_or(0.0),
            Parameter::Pressure => self.pressure.unwrap_or(0.0),
            Parameter::WeatherCode => self.weather_code.unwrap_or(0.0),
            Parameter::Unrecognized(name) => {
                return Err(EvaluationFault::UnsupportedParameter {
                    parameter: name.clone(),
                    kind: AlertKind::Instantaneous,
                })
            }
        };
        Ok(value)
    }
}

/// Forecast for one location at one resolution
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForecastSeries {
    #[serde(default)]
    pub location: WeatherLocation,
    pub timestep: Timestep,
    /// Nearest-future interval first
    #[serde(default)]
    pub intervals: Vec<ForecastInterval>,
}

/// One forecast interval
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ForecastInterval {
    pub time: DateTime<Utc>,
    pub temperature: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    /// Stands in for both precipitation parameters
    pub precipitation_chance: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uv_index: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_cover: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather_code: Option<f64>,
}

impl ForecastSeries {
    /// Read one parameter from the nearest interval
    pub fn extract(&self, parameter: &Parameter) -> Result<f64, EvaluationFault> {
        let interval = self.intervals.first().ok_or(EvaluationFault::NoForecastData)?;

        let value = match parameter {
            Parameter::Temperature => interval.temperature,
            Parameter::Humidity => interval.humidity,
            Parameter::WindSpeed => interval.wind_speed,
            Parameter::WindDirection | Parameter::Pressure => 0.0,
            Parameter::PrecipitationIntensity | Parameter::PrecipitationProbability => {
                interval.precipitation_chance
            }
            Parameter::Visibility => FORECAST_VISIBILITY_SENTINEL,
            Parameter::UvIndex => interval.uv_index.unwrap_or(0.0),
            Parameter::CloudCover => interval.cloud_cover.unwrap_or(0.0),
            Parameter::WeatherCode => interval.weather_code.unwrap_or(0.0),
            Parameter::Unrecognized(name) => {
                return Err(EvaluationFault::UnsupportedParameter {
                    parameter: name.clone(),
                    kind: AlertKind::Forecast,
                })
            }
        };
        Ok(value)
    }
}

/// Either data shape an alert can be evaluated against
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum WeatherData {
    Instantaneous(WeatherObservation),
    Forecast(ForecastSeries),
}

impl WeatherData {
    pub fn kind(&self) -> AlertKind {
        match self {
            WeatherData::Instantaneous(_) => AlertKind::Instantaneous,
            WeatherData::Forecast(_) => AlertKind::Forecast,
        }
    }

    pub fn extract(&self, parameter: &Parameter) -> Result<f64, EvaluationFault> {
        match self {
            WeatherData::Instantaneous(observation) => observation.extract(parameter),
            WeatherData::Forecast(series) => series.extract(parameter),
        }
    }
}

/// Identifies one weather fetch within a cycle
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WeatherDataKey {
    Instantaneous(LocationKey),
    Forecast(LocationKey, Timestep),
}

impl WeatherDataKey {
    pub fn location_key(&self) -> &LocationKey {
        match self {
            WeatherDataKey::Instantaneous(key) | WeatherDataKey::Forecast(key, _) => key,
        }
    }
}

impl std::fmt::Display for WeatherDataKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WeatherDataKey::Instantaneous(key) => write!(f, "instantaneous:{}", key),
            WeatherDataKey::Forecast(key, timestep) => write!(f, "forecast:{}:{}", timestep, key),
        }
    }
}
