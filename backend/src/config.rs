//! Configuration management for the weather alert evaluator
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (config/development.toml, config/production.toml)
//! 3. Environment variable overrides with ALERTS__ prefix

use std::time::Duration;

use config::{ConfigError, Environment, File};
use serde::Deserialize;
use validator::Validate;

/// Main application configuration
#[derive(Debug, Deserialize, Clone, Validate)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// HTTP server configuration
    #[validate]
    pub server: ServerConfig,

    /// Alert store service
    #[validate]
    pub alert_store: AlertStoreConfig,

    /// Weather service
    #[validate]
    pub weather: WeatherConfig,

    /// Periodic evaluation trigger
    #[validate]
    pub scheduler: SchedulerConfig,

    #[validate]
    pub evaluator: EvaluatorConfig,
}

#[derive(Debug, Deserialize, Clone, Validate)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    #[validate(length(min = 1))]
    pub host: String,
}

#[derive(Debug, Deserialize, Clone, Validate)]
pub struct AlertStoreConfig {
    /// Base URL of the alert store API, e.g. `http://alerts:3001/api`
    #[validate(url)]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[validate(range(min = 1, max = 120))]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone, Validate)]
pub struct WeatherConfig {
    /// Base URL of the weather API
    #[validate(url)]
    pub base_url: String,

    /// Optional API key, sent as `x-api-key`
    pub api_key: Option<String>,

    /// Per-request timeout in seconds
    #[validate(range(min = 1, max = 120))]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone, Validate)]
pub struct SchedulerConfig {
    /// Run cycles periodically; when false, cycles only run on demand
    pub enabled: bool,

    /// Seconds between cycles
    #[validate(range(min = 10, max = 86400))]
    pub interval_secs: u64,

    /// Run a cycle immediately at startup instead of after the first interval
    pub run_on_startup: bool,
}

#[derive(Debug, Deserialize, Clone, Validate)]
pub struct EvaluatorConfig {
    /// Recorded as `evaluatedBy` on every state update
    #[validate(length(min = 1))]
    pub evaluated_by: String,
}

impl AlertStoreConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl WeatherConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl SchedulerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("ALERTS_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 8080)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("alert_store.base_url", "http://localhost:3001/api")?
            .set_default("alert_store.timeout_secs", 10)?
            .set_default("weather.base_url", "http://localhost:3002/api")?
            .set_default("weather.timeout_secs", 10)?
            .set_default("scheduler.enabled", true)?
            .set_default("scheduler.interval_secs", 300)?
            .set_default("scheduler.run_on_startup", true)?
            .set_default("evaluator.evaluated_by", "weather-alert-evaluator")?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (ALERTS__ prefix)
            .add_source(
                Environment::with_prefix("ALERTS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "0.0.0.0".to_string(),
        }
    }
}
