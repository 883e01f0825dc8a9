use tracing_subscriber::{EnvFilter, fmt};

use crate::app::AppError;

// reqwest and hyper are noisy at info when polling every few minutes.
const DEFAULT_FILTER: &str = "info,reqwest=warn,hyper_util=warn";

pub fn init() -> Result<(), AppError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(true)
        .try_init()
        .map_err(AppError::logging_init)
}
