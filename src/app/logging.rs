use tracing_subscriber::{EnvFilter, fmt};

use crate::app::AppError;

/// Used when `RUST_LOG` is unset; keeps per-request HTTP client chatter out.
const DEFAULT_DIRECTIVES: &str = "info,reqwest=warn,hyper_util=warn,actix_server=warn";

pub fn init() -> Result<(), AppError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_DIRECTIVES))
        .map_err(AppError::logging_init)?;

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .try_init()
        .map_err(AppError::logging_init)
}
