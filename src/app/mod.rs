mod config;
pub mod coordinator;
mod error;
mod logging;
mod runtime;
pub mod services;

pub use error::AppError;

/// Coordinators plus the read-only HTTP API.
pub fn run() -> Result<(), AppError> {
    let config = bootstrap()?;
    runtime::run(config)
}

/// Coordinators only; snapshot changes are reported through the log.
pub fn run_service() -> Result<(), AppError> {
    let config = bootstrap()?;
    runtime::run_headless(config)
}

fn bootstrap() -> Result<config::AppConfig, AppError> {
    logging::init()?;

    let config = config::AppConfig::from_env()?;
    let station_ids: Vec<&str> = config
        .stations
        .iter()
        .map(|station| station.id.as_str())
        .collect();

    tracing::info!(
        stations = ?station_ids,
        max_consecutive_failures = config.max_consecutive_failures,
        enabled_chargers = ?config.enabled_chargers,
        api_base = %config.api_base,
        request_timeout_secs = config.request_timeout_secs,
        replay_file = ?config.replay_file,
        http_bind = %config.http_bind,
        "application bootstrap initialized"
    );

    Ok(config)
}
