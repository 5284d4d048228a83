//! Alert definitions as stored by the alert store

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Coordinates, Location};
use crate::validation::canonical_city;

/// Tolerance applied by `==` and `!=` to absorb measurement noise
pub const EQUALITY_TOLERANCE: f64 = 0.01;

/// A user-defined condition over one weather parameter at one location
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub parameter: Parameter,
    pub operator: Operator,
    pub threshold: f64,
    #[serde(default)]
    pub location: AlertLocation,
    /// Required when `kind` is `Forecast`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestep: Option<Timestep>,
    pub state: AlertState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_evaluated_at: Option<DateTime<Utc>>,
}

impl Alert {
    /// The usable location of this alert, if it has one
    pub fn location(&self) -> Option<Location> {
        self.location.resolve()
    }
}

/// Location as it appears on the wire: coordinates, a city, or both
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AlertLocation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

impl AlertLocation {
    pub fn coordinates(lat: Decimal, lon: Decimal) -> Self {
        Self {
            lat: Some(lat),
            lon: Some(lon),
            city: None,
        }
    }

    pub fn city(city: impl Into<String>) -> Self {
        Self {
            lat: None,
            lon: None,
            city: Some(city.into()),
        }
    }

    /// Resolve to a single representation.
    ///
    /// A valid coordinate pair wins over a city; out-of-range or half-present
    /// coordinates fall through to the city; a blank city resolves to nothing.
    pub fn resolve(&self) -> Option<Location> {
        if let (Some(lat), Some(lon)) = (self.lat, self.lon) {
            let coordinates = Coordinates::new(lat, lon);
            if coordinates.is_valid() {
                return Some(Location::Coordinates(coordinates));
            }
        }

        let city = self.city.as_deref()?;
        canonical_city(city).map(|_| Location::City(city.trim().to_string()))
    }
}

/// Which data shape an alert is evaluated against
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Instantaneous,
    Forecast,
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertKind::Instantaneous => write!(f, "instantaneous"),
            AlertKind::Forecast => write!(f, "forecast"),
        }
    }
}

/// Forecast resolution
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Timestep {
    Hourly,
    Daily,
}

impl Timestep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Timestep::Hourly => "hourly",
            Timestep::Daily => "daily",
        }
    }
}

impl std::fmt::Display for Timestep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Alert state. Evaluation only ever moves `NotTriggered` to `Triggered`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum AlertState {
    Triggered,
    NotTriggered,
}

impl AlertState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertState::Triggered => "triggered",
            AlertState::NotTriggered => "not_triggered",
        }
    }
}

impl std::fmt::Display for AlertState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Weather parameter an alert watches.
///
/// Names outside the known set are kept verbatim in `Unrecognized` so that a
/// single bad alert never fails decoding of the whole batch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Parameter {
    #[serde(rename = "temperature")]
    Temperature,
    #[serde(rename = "humidity")]
    Humidity,
    #[serde(rename = "windSpeed")]
    WindSpeed,
    #[serde(rename = "windDirection")]
    WindDirection,
    #[serde(rename = "precipitation.intensity")]
    PrecipitationIntensity,
    #[serde(rename = "precipitation.probability")]
    PrecipitationProbability,
    #[serde(rename = "visibility")]
    Visibility,
    #[serde(rename = "uvIndex")]
    UvIndex,
    #[serde(rename = "cloudCover")]
    CloudCover,
    #[serde(rename = "pressure")]
    Pressure,
    #[serde(rename = "weatherCode")]
    WeatherCode,
    #[serde(untagged)]
    Unrecognized(String),
}

impl Parameter {
    /// Every recognised parameter
    pub const ALL: [Parameter; 11] = [
        Parameter::Temperature,
        Parameter::Humidity,
        Parameter::WindSpeed,
        Parameter::WindDirection,
        Parameter::PrecipitationIntensity,
        Parameter::PrecipitationProbability,
        Parameter::Visibility,
        Parameter::UvIndex,
        Parameter::CloudCover,
        Parameter::Pressure,
        Parameter::WeatherCode,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Parameter::Temperature => "temperature",
            Parameter::Humidity => "humidity",
            Parameter::WindSpeed => "windSpeed",
            Parameter::WindDirection => "windDirection",
            Parameter::PrecipitationIntensity => "precipitation.intensity",
            Parameter::PrecipitationProbability => "precipitation.probability",
            Parameter::Visibility => "visibility",
            Parameter::UvIndex => "uvIndex",
            Parameter::CloudCover => "cloudCover",
            Parameter::Pressure => "pressure",
            Parameter::WeatherCode => "weatherCode",
            Parameter::Unrecognized(name) => name,
        }
    }

    /// Whether alerts of `kind` may be evaluated against this parameter.
    ///
    /// Forecasts do not model wind direction or pressure; extraction yields a
    /// `0` placeholder for them, which must never decide a trigger.
    pub fn is_supported_for(&self, kind: AlertKind) -> bool {
        match (self, kind) {
            (Parameter::Unrecognized(_), _) => false,
            (_, AlertKind::Instantaneous) => true,
            (Parameter::WindDirection | Parameter::Pressure, AlertKind::Forecast) => false,
            (_, AlertKind::Forecast) => true,
        }
    }
}

impl std::fmt::Display for Parameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparison between an observed value and the alert threshold
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Operator {
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = ">=")]
    GreaterOrEqual,
    #[serde(rename = "<=")]
    LessOrEqual,
    #[serde(rename = "==")]
    Equal,
    #[serde(rename = "!=")]
    NotEqual,
    #[serde(untagged)]
    Unrecognized(String),
}

impl Operator {
    pub const ALL: [Operator; 6] = [
        Operator::GreaterThan,
        Operator::LessThan,
        Operator::GreaterOrEqual,
        Operator::LessOrEqual,
        Operator::Equal,
        Operator::NotEqual,
    ];

    /// Apply the comparison. Unrecognised operators never hold.
    pub fn apply(&self, value: f64, threshold: f64) -> bool {
        match self {
            Operator::GreaterThan => value > threshold,
            Operator::LessThan => value < threshold,
            Operator::GreaterOrEqual => value >= threshold,
            Operator::LessOrEqual => value <= threshold,
            Operator::Equal => (value - threshold).abs() < EQUALITY_TOLERANCE,
            Operator::NotEqual => (value - threshold).abs() >= EQUALITY_TOLERANCE,
            Operator::Unrecognized(_) => false,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Operator::GreaterThan => ">",
            Operator::LessThan => "<",
            Operator::GreaterOrEqual => ">=",
            Operator::LessOrEqual => "<=",
            Operator::Equal => "==",
            Operator::NotEqual => "!=",
            Operator::Unrecognized(op) => op,
        }
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_alert_deserializes_store_document() {
        let json = r#"{
            "_id": "665f1c2a9b1e8a0012345678",
            "name": "Cairo heat",
            "type": "forecast",
            "parameter": "precipitation.probability",
            "operator": ">=",
            "threshold": 70,
            "location": {"lat": 30.0444, "lon": 31.2357},
            "timestep": "daily",
            "state": "not_triggered",
            "createdAt": "2024-06-01T10:00:00Z"
        }"#;

        let alert: Alert = serde_json::from_str(json).unwrap();
        assert_eq!(alert.id, "665f1c2a9b1e8a0012345678");
        assert_eq!(alert.kind, AlertKind::Forecast);
        assert_eq!(alert.parameter, Parameter::PrecipitationProbability);
        assert_eq!(alert.operator, Operator::GreaterOrEqual);
        assert_eq!(alert.timestep, Some(Timestep::Daily));
        assert_eq!(alert.state, AlertState::NotTriggered);
        assert_eq!(alert.location.lat, Some(dec("30.0444")));
    }

    #[test]
    fn test_unknown_parameter_and_operator_are_preserved() {
        let json = r#"{
            "id": "a1",
            "type": "instantaneous",
            "parameter": "dewPoint",
            "operator": "~=",
            "threshold": 1.5,
            "location": {"city": "Oslo"},
            "state": "not_triggered"
        }"#;

        let alert: Alert = serde_json::from_str(json).unwrap();
        assert_eq!(alert.parameter, Parameter::Unrecognized("dewPoint".to_string()));
        assert_eq!(alert.operator, Operator::Unrecognized("~=".to_string()));
    }

    #[test]
    fn test_parameter_names_round_trip_through_as_str() {
        for parameter in Parameter::ALL {
            let json = serde_json::to_string(&parameter).unwrap();
            assert_eq!(json, format!("\"{}\"", parameter.as_str()));
        }
    }

    #[test]
    fn test_state_wire_names() {
        assert_eq!(
            serde_json::to_string(&AlertState::NotTriggered).unwrap(),
            "\"not_triggered\""
        );
        assert_eq!(
            serde_json::to_string(&AlertState::Triggered).unwrap(),
            "\"triggered\""
        );
    }

    #[test]
    fn test_location_prefers_coordinates() {
        let location = AlertLocation {
            lat: Some(dec("30")),
            lon: Some(dec("31")),
            city: Some("Cairo".to_string()),
        };
        assert!(matches!(location.resolve(), Some(Location::Coordinates(_))));
    }

    #[test]
    fn test_location_falls_back_to_city_when_coordinates_invalid() {
        let location = AlertLocation {
            lat: Some(dec("120")),
            lon: Some(dec("31")),
            city: Some(" Cairo ".to_string()),
        };
        assert_eq!(location.resolve(), Some(Location::City("Cairo".to_string())));
    }

    #[test]
    fn test_location_without_usable_representation() {
        assert_eq!(AlertLocation::default().resolve(), None);
        assert_eq!(AlertLocation::city("   ").resolve(), None);

        let half = AlertLocation {
            lat: Some(dec("10")),
            lon: None,
            city: None,
        };
        assert_eq!(half.resolve(), None);
    }

    #[test]
    fn test_support_predicate() {
        for parameter in Parameter::ALL {
            assert!(parameter.is_supported_for(AlertKind::Instantaneous));
        }
        assert!(!Parameter::WindDirection.is_supported_for(AlertKind::Forecast));
        assert!(!Parameter::Pressure.is_supported_for(AlertKind::Forecast));
        assert!(Parameter::Visibility.is_supported_for(AlertKind::Forecast));
        assert!(!Parameter::Unrecognized("x".into()).is_supported_for(AlertKind::Instantaneous));
    }

    #[test]
    fn test_equality_tolerance() {
        assert!(Operator::Equal.apply(20.005, 20.0));
        assert!(!Operator::Equal.apply(20.02, 20.0));
        assert!(Operator::NotEqual.apply(20.02, 20.0));
        assert!(!Operator::NotEqual.apply(19.995, 20.0));
    }

    #[test]
    fn test_unrecognized_operator_never_holds() {
        let op = Operator::Unrecognized("=~".to_string());
        assert!(!op.apply(1.0, 1.0));
        assert!(!op.apply(2.0, 1.0));
    }
}
