use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};
use std::thread::JoinHandle;
use std::time::Duration;

use actix_web::{App, HttpServer, web};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Connection;
use uuid::Uuid;

use crate::adapters::api::{ApiState, configure_routes, cors, default_headers};
use crate::adapters::ocm_http::{ChargerSource, OcmHttpClient};
use crate::app::config::{AppConfig, SyncConfig};
use crate::app::error::AppError;
use crate::app::services::{ChargerStore, SqliteChargerService, SyncRunRecorder};
use crate::app::sync::{
    ChargerSync, Clock, SyncError, SyncReport, SyncResult, SystemClock, TrackedCountry,
};
use crate::domain::models::{NewSyncRunRecord, SyncRunStatus};

const STOP_POLL_INTERVAL: Duration = Duration::from_millis(500);

pub type OcmChargerSync = ChargerSync<OcmHttpClient, SqliteChargerService, SystemClock>;

/// Runs one sync, then records its outcome and reaps expired rows whether or
/// not the sync succeeded. Recording and reaping failures are logged and do
/// not change the returned result.
pub fn execute_sync_cycle<S, St, Cl, R>(
    sync: &ChargerSync<S, St, Cl>,
    recorder: &R,
) -> Result<SyncResult, SyncError>
where
    S: ChargerSource,
    St: ChargerStore,
    Cl: Clock,
    R: SyncRunRecorder,
{
    let run_id = Uuid::new_v4().to_string();
    let started_at = sync.now();
    let result = sync.run_sync_as(&run_id);
    let finished_at = sync.now();

    let run = match &result {
        Ok(outcome) => NewSyncRunRecord {
            run_id: run_id.clone(),
            started_at: to_iso8601(started_at),
            finished_at: to_iso8601(finished_at),
            status: SyncRunStatus::Succeeded,
            synced: count_to_i64(outcome.synced),
            deleted: count_to_i64(outcome.deleted),
            error: None,
        },
        Err(error) => NewSyncRunRecord {
            run_id: run_id.clone(),
            started_at: to_iso8601(started_at),
            finished_at: to_iso8601(finished_at),
            status: SyncRunStatus::Failed,
            synced: 0,
            deleted: 0,
            error: Some(error.to_string()),
        },
    };

    if let Err(error) = recorder.record_sync_run(&run) {
        tracing::warn!(run_id = %run_id, error = %error, "failed to record sync run");
    }

    match recorder.purge_expired(finished_at.timestamp()) {
        Ok(0) => {}
        Ok(purged) => tracing::info!(run_id = %run_id, purged, "purged expired chargers"),
        Err(error) => tracing::warn!(
            run_id = %run_id,
            error = %error,
            "failed to purge expired chargers"
        ),
    }

    result
}

pub fn start_sync_scheduler<S, St, Cl, R>(
    sync: ChargerSync<S, St, Cl>,
    recorder: R,
    interval: Duration,
    stop_flag: Arc<AtomicBool>,
) -> JoinHandle<()>
where
    S: ChargerSource,
    St: ChargerStore + Send + 'static,
    Cl: Clock + Send + 'static,
    R: SyncRunRecorder + Send + 'static,
{
    std::thread::spawn(move || {
        while !stop_flag.load(Ordering::Relaxed) {
            match execute_sync_cycle(&sync, &recorder) {
                Ok(outcome) => tracing::info!(
                    synced = outcome.synced,
                    deleted = outcome.deleted,
                    "scheduled sync finished"
                ),
                Err(error) => tracing::warn!(
                    error = %error,
                    kind = ?error.kind(),
                    "scheduled sync failed"
                ),
            }
            sleep_unless_stopped(interval, &stop_flag);
        }
    })
}

fn sleep_unless_stopped(interval: Duration, stop_flag: &AtomicBool) {
    let mut remaining = interval;
    while !remaining.is_zero() && !stop_flag.load(Ordering::Relaxed) {
        let step = remaining.min(STOP_POLL_INTERVAL);
        std::thread::sleep(step);
        remaining = remaining.saturating_sub(step);
    }
}

pub fn run(config: AppConfig, sync_config: SyncConfig) -> Result<(), AppError> {
    let shared_connection = open_store(&config.db_path)?;
    let service = SqliteChargerService::new(Arc::clone(&shared_connection));
    let sync = build_sync(&sync_config, service.clone())?;

    let stop_flag = Arc::new(AtomicBool::new(false));
    let scheduler_handle = start_sync_scheduler(
        sync,
        service.clone(),
        Duration::from_secs(sync_config.sync_interval_secs),
        Arc::clone(&stop_flag),
    );

    let server_result = serve_api(
        ApiState {
            charger_queries: service,
        },
        &config.http_bind,
    );

    stop_flag.store(true, Ordering::Relaxed);
    if scheduler_handle.join().is_err() {
        return Err(AppError::runtime("sync scheduler thread panicked"));
    }

    server_result.map_err(AppError::runtime)
}

pub fn run_api(config: AppConfig) -> Result<(), AppError> {
    let shared_connection = open_store(&config.db_path)?;
    let state = ApiState {
        charger_queries: SqliteChargerService::new(shared_connection),
    };

    serve_api(state, &config.http_bind).map_err(AppError::runtime)
}

pub fn run_service(config: AppConfig, sync_config: SyncConfig) -> Result<(), AppError> {
    let shared_connection = open_store(&config.db_path)?;
    let service = SqliteChargerService::new(shared_connection);
    let sync = build_sync(&sync_config, service.clone())?;

    let handle = start_sync_scheduler(
        sync,
        service,
        Duration::from_secs(sync_config.sync_interval_secs),
        Arc::new(AtomicBool::new(false)),
    );

    handle
        .join()
        .map_err(|_| AppError::runtime("sync scheduler thread panicked"))
}

/// Single sync cycle; the JSON summary goes to stdout.
pub fn run_sync_once(config: AppConfig, sync_config: SyncConfig) -> Result<(), AppError> {
    let shared_connection = open_store(&config.db_path)?;
    let service = SqliteChargerService::new(shared_connection);
    let sync = build_sync(&sync_config, service.clone())?;

    let result = execute_sync_cycle(&sync, &service);
    let report = SyncReport::from_result(&result);
    let body = serde_json::to_string(&report).map_err(AppError::runtime)?;
    println!("{body}");

    match result {
        Ok(_) => Ok(()),
        Err(error) => Err(AppError::runtime(error)),
    }
}

fn open_store(db_path: &str) -> Result<Arc<Mutex<Connection>>, AppError> {
    if let Some(parent) = std::path::Path::new(db_path).parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(AppError::database_init)?;
    }

    let mut connection =
        crate::adapters::db::open_connection(db_path).map_err(AppError::database_init)?;
    crate::adapters::db::run_migrations(&mut connection).map_err(AppError::database_init)?;

    Ok(Arc::new(Mutex::new(connection)))
}

fn build_sync(
    sync_config: &SyncConfig,
    service: SqliteChargerService,
) -> Result<OcmChargerSync, AppError> {
    let client = OcmHttpClient::new(
        sync_config.ocm_url.clone(),
        sync_config.ocm_api_key.clone(),
        sync_config.max_results,
        Duration::from_secs(sync_config.timeout_secs),
    )
    .map_err(AppError::runtime)?;

    let countries = sync_config
        .tracked_countries
        .iter()
        .map(|code| TrackedCountry::new(code.as_str()))
        .collect();

    Ok(ChargerSync::new(client, service, SystemClock, countries))
}

fn serve_api(state: ApiState, bind: &str) -> std::io::Result<()> {
    tracing::info!(bind, "http server starting");

    actix_web::rt::System::new().block_on(async move {
        HttpServer::new(move || {
            App::new()
                .wrap(default_headers())
                .wrap(cors())
                .app_data(web::Data::new(state.clone()))
                .configure(configure_routes)
        })
        .bind(bind)?
        .run()
        .await
    })
}

fn to_iso8601(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn count_to_i64(count: usize) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX)
}
