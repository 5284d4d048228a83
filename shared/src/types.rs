//! Common types used across the platform

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::validation::{canonical_city, validate_latitude, validate_longitude};

/// GPS coordinates
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Coordinates {
    pub latitude: Decimal,
    pub longitude: Decimal,
}

impl Coordinates {
    pub fn new(latitude: Decimal, longitude: Decimal) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Both components are inside the WGS84 ranges
    pub fn is_valid(&self) -> bool {
        validate_latitude(self.latitude).is_ok() && validate_longitude(self.longitude).is_ok()
    }
}

/// A resolved alert location: a coordinate pair or a city, never both
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    Coordinates(Coordinates),
    City(String),
}

impl Location {
    /// Canonical deduplication key.
    ///
    /// Coordinates compare by decimal value (`40.0` and `40` are the same
    /// point), cities compare trimmed and case-insensitively.
    pub fn key(&self) -> LocationKey {
        match self {
            Location::Coordinates(c) => LocationKey(format!(
                "coords:{},{}",
                c.latitude.normalize(),
                c.longitude.normalize()
            )),
            Location::City(city) => {
                LocationKey(format!("city:{}", canonical_city(city).unwrap_or_default()))
            }
        }
    }

    /// Query parameters identifying this location on outbound requests
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        match self {
            Location::Coordinates(c) => vec![
                ("lat", c.latitude.to_string()),
                ("lon", c.longitude.to_string()),
            ],
            Location::City(city) => vec![("city", city.trim().to_string())],
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Location::Coordinates(c) => write!(f, "({}, {})", c.latitude, c.longitude),
            Location::City(city) => write!(f, "{}", city.trim()),
        }
    }
}

/// Canonical key shared by every alert pointing at the same place
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct LocationKey(String);

impl LocationKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LocationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Response envelope used by both remote services
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }

    /// Unwrap the payload, turning `success: false` or a missing body into
    /// the service-provided message
    pub fn into_data(self) -> Result<T, String> {
        if !self.success {
            return Err(self
                .message
                .unwrap_or_else(|| "request was not successful".to_string()));
        }
        self.data
            .ok_or_else(|| "response did not include data".to_string())
    }
}
