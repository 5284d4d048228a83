//! Weather Alert Evaluator - service entry point

use std::{net::SocketAddr, sync::Arc};

use alert_evaluator::{
    create_app, shutdown_signal,
    external::{AlertStoreClient, WeatherClient},
    services::{AlertEvaluationService, Scheduler},
    AppState, Config,
};
use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use validator::Validate;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load().context("failed to load configuration")?;
    config.validate().context("invalid configuration")?;

    init_tracing(config.is_production());

    tracing::info!("Starting Weather Alert Evaluator");
    tracing::info!("Environment: {}", config.environment);

    let store = AlertStoreClient::new(
        config.alert_store.base_url.clone(),
        config.alert_store.timeout(),
    )?;
    let weather = WeatherClient::new(config.weather.base_url.clone(), config.weather.timeout())?
        .with_api_key(config.weather.api_key.clone());

    let evaluator = Arc::new(AlertEvaluationService::new(
        Arc::new(store),
        Arc::new(weather),
        config.evaluator.evaluated_by.clone(),
    ));

    let scheduler = if config.scheduler.enabled {
        Some(
            Scheduler::new(
                evaluator.clone(),
                config.scheduler.interval(),
                config.scheduler.run_on_startup,
            )
            .spawn(),
        )
    } else {
        tracing::info!("Scheduler disabled; cycles run on demand only");
        None
    };

    let app = create_app(AppState { evaluator });

    // Start server
    let host: std::net::IpAddr = config
        .server
        .host
        .parse()
        .with_context(|| format!("invalid server host '{}'", config.server.host))?;
    let addr = SocketAddr::from((host, config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = scheduler {
        handle.abort();
    }
    tracing::info!("Shut down");

    Ok(())
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "alert_evaluator=debug,tower_http=debug".into());

    // Exactly one of the two fmt layers is installed
    let (json_layer, text_layer) = if json {
        (Some(tracing_subscriber::fmt::layer().json()), None)
    } else {
        (None, Some(tracing_subscriber::fmt::layer()))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}
