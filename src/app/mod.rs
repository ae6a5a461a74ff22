mod config;
mod error;
mod logging;
mod runtime;
pub mod services;
pub mod sync;

pub use config::{AppConfig, SyncConfig};
pub use error::AppError;

/// Sync scheduler and read API in one process.
pub fn run() -> Result<(), AppError> {
    logging::init()?;

    let config = AppConfig::from_env()?;
    let sync_config = SyncConfig::from_env()?;
    log_bootstrap(&config, Some(&sync_config));

    runtime::run(config, sync_config)
}

pub fn run_api() -> Result<(), AppError> {
    logging::init()?;

    let config = AppConfig::from_env()?;
    log_bootstrap(&config, None);

    runtime::run_api(config)
}

pub fn run_service() -> Result<(), AppError> {
    logging::init()?;

    let config = AppConfig::from_env()?;
    let sync_config = SyncConfig::from_env()?;
    log_bootstrap(&config, Some(&sync_config));

    runtime::run_service(config, sync_config)
}

pub fn run_sync_once() -> Result<(), AppError> {
    logging::init()?;

    let config = AppConfig::from_env()?;
    let sync_config = SyncConfig::from_env()?;
    log_bootstrap(&config, Some(&sync_config));

    runtime::run_sync_once(config, sync_config)
}

fn log_bootstrap(config: &AppConfig, sync_config: Option<&SyncConfig>) {
    match sync_config {
        Some(sync_config) => tracing::info!(
            db_path = %config.db_path,
            http_bind = %config.http_bind,
            ocm_url = %sync_config.ocm_url,
            tracked_countries = %sync_config.tracked_countries.join(","),
            max_results = sync_config.max_results,
            sync_interval_secs = sync_config.sync_interval_secs,
            "application bootstrap initialized"
        ),
        None => tracing::info!(
            db_path = %config.db_path,
            http_bind = %config.http_bind,
            "application bootstrap initialized"
        ),
    }
}
