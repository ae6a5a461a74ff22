use actix_cors::Cors;
use actix_web::middleware::DefaultHeaders;
use actix_web::{HttpResponse, Responder, get, web};
use serde::{Deserialize, Serialize};

use crate::app::services::{ChargerQueryHandler, SqliteChargerService, StoreError};

#[derive(Clone)]
pub struct ApiState {
    pub charger_queries: SqliteChargerService,
}

#[derive(Debug, Deserialize)]
pub struct ChargerQuery {
    pub town: Option<String>,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SyncRunResponse {
    pub run_id: String,
    pub started_at: String,
    pub finished_at: String,
    pub status: String,
    pub synced: i64,
    pub deleted: i64,
    pub error: Option<String>,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticsDbResponse {
    pub schema_version: u32,
    pub chargers_count: i64,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(health)
        .service(list_chargers_endpoint)
        .service(get_latest_sync_run_endpoint)
        .service(get_db_diagnostics_endpoint);
}

/// Answers browser preflight requests for any origin.
pub fn cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .send_wildcard()
        .allowed_methods(vec!["GET", "OPTIONS"])
        .allow_any_header()
        .max_age(3600)
}

/// Allow-all origin header on every response, with or without an `Origin`.
pub fn default_headers() -> DefaultHeaders {
    DefaultHeaders::new().add(("Access-Control-Allow-Origin", "*"))
}

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

#[get("/chargers")]
async fn list_chargers_endpoint(
    state: web::Data<ApiState>,
    query: web::Query<ChargerQuery>,
) -> impl Responder {
    let town = query.town.as_deref();
    match town {
        Some(town) => tracing::debug!(town, "listing chargers by town"),
        None => tracing::debug!("listing all chargers"),
    }

    match state.charger_queries.list_chargers(town) {
        Ok(chargers) => HttpResponse::Ok().json(chargers),
        Err(error) => service_error_response(error),
    }
}

#[get("/sync/latest")]
async fn get_latest_sync_run_endpoint(state: web::Data<ApiState>) -> impl Responder {
    match state.charger_queries.get_latest_sync_run() {
        Ok(Some(run)) => HttpResponse::Ok().json(SyncRunResponse {
            run_id: run.run_id,
            started_at: run.started_at,
            finished_at: run.finished_at,
            status: run.status,
            synced: run.synced,
            deleted: run.deleted,
            error: run.error,
        }),
        Ok(None) => HttpResponse::NotFound().json(serde_json::json!({
            "error": "no sync runs recorded"
        })),
        Err(error) => service_error_response(error),
    }
}

#[get("/diagnostics/db")]
async fn get_db_diagnostics_endpoint(state: web::Data<ApiState>) -> impl Responder {
    let schema_version = match state.charger_queries.get_schema_version() {
        Ok(value) => value,
        Err(error) => return service_error_response(error),
    };
    let chargers_count = match state.charger_queries.count_chargers() {
        Ok(value) => value,
        Err(error) => return service_error_response(error),
    };

    HttpResponse::Ok().json(DiagnosticsDbResponse {
        schema_version,
        chargers_count,
    })
}

fn service_error_response(error: StoreError) -> HttpResponse {
    tracing::warn!(error = %error, "charger query failed");

    HttpResponse::InternalServerError().json(serde_json::json!({
        "error": error.to_string()
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use actix_web::{App, http::StatusCode, test, web};
    use rusqlite::Connection;

    use crate::adapters::db::{LATEST_SCHEMA_VERSION, insert_sync_run, put_chargers};
    use crate::app::services::SqliteChargerService;
    use crate::domain::models::{ChargerStatus, NewSyncRunRecord, SyncRunStatus};
    use crate::test_support::{open_shared_test_connection, sample_charger};

    use super::{ApiState, configure_routes, cors, default_headers};

    fn build_state_with_migrated_db(name: &str) -> (ApiState, Arc<Mutex<Connection>>) {
        let shared_connection = open_shared_test_connection(name);

        (
            ApiState {
                charger_queries: SqliteChargerService::new(Arc::clone(&shared_connection)),
            },
            shared_connection,
        )
    }

    fn seed_chargers(connection: &Arc<Mutex<Connection>>) {
        let mut db = connection.lock().expect("lock should be available");
        put_chargers(
            &mut db,
            &[
                sample_charger("42", "Belgrade", ChargerStatus::Available),
                sample_charger("7", "Banja Luka", ChargerStatus::Offline),
                sample_charger("43", "Belgrade", ChargerStatus::Offline),
            ],
        )
        .expect("seed should succeed");
    }

    #[actix_web::test]
    async fn health_endpoint_returns_ok() {
        let (state, _) = build_state_with_migrated_db("health.sqlite");
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn lists_all_chargers_without_town_filter() {
        let (state, connection) = build_state_with_migrated_db("chargers-all-api.sqlite");
        seed_chargers(&connection);

        let app = test::init_service(
            App::new()
                .wrap(default_headers())
                .wrap(cors())
                .app_data(web::Data::new(state))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::get().uri("/chargers").to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers()
                .get("access-control-allow-origin")
                .and_then(|value| value.to_str().ok()),
            Some("*")
        );

        let json: serde_json::Value = test::read_body_json(resp).await;
        let items = json.as_array().expect("response should be an array");
        assert_eq!(items.len(), 3);
        assert_eq!(items[0]["chargerId"], "42");
        assert_eq!(items[0]["town"], "Belgrade");
        assert_eq!(items[0]["status"], "Available");
        assert_eq!(items[0]["latitude"], "44.7866");
        assert_eq!(items[0]["expiresAt"], 1_790_172_800_i64);
    }

    #[actix_web::test]
    async fn filters_chargers_by_exact_town() {
        let (state, connection) = build_state_with_migrated_db("chargers-town-api.sqlite");
        seed_chargers(&connection);

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/chargers?town=Banja%20Luka")
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let json: serde_json::Value = test::read_body_json(resp).await;
        let items = json.as_array().expect("response should be an array");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["chargerId"], "7");
        assert_eq!(items[0]["status"], "Offline");
    }

    #[actix_web::test]
    async fn unknown_town_returns_empty_array() {
        let (state, connection) = build_state_with_migrated_db("chargers-unknown-api.sqlite");
        seed_chargers(&connection);

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/chargers?town=Nowhere")
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let json: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(json, serde_json::json!([]));
    }

    #[actix_web::test]
    async fn store_failure_returns_500_with_error_body() {
        let (state, connection) = build_state_with_migrated_db("chargers-error-api.sqlite");
        connection
            .lock()
            .expect("lock should be available")
            .execute_batch("DROP TABLE chargers;")
            .expect("drop should succeed");

        let app = test::init_service(
            App::new()
                .wrap(default_headers())
                .wrap(cors())
                .app_data(web::Data::new(state))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::get().uri("/chargers").to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(resp.headers().contains_key("access-control-allow-origin"));
        let json: serde_json::Value = test::read_body_json(resp).await;
        let message = json["error"].as_str().expect("error should be a string");
        assert!(message.contains("no such table"));
    }

    #[actix_web::test]
    async fn preflight_is_answered_for_any_origin() {
        let (state, _) = build_state_with_migrated_db("chargers-preflight-api.sqlite");
        let app = test::init_service(
            App::new()
                .wrap(default_headers())
                .wrap(cors())
                .app_data(web::Data::new(state))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::default()
            .method(actix_web::http::Method::OPTIONS)
            .uri("/chargers")
            .insert_header(("Origin", "https://map.example.org"))
            .insert_header(("Access-Control-Request-Method", "GET"))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers()
                .get("access-control-allow-origin")
                .and_then(|value| value.to_str().ok()),
            Some("*")
        );
    }

    #[actix_web::test]
    async fn latest_sync_run_returns_404_when_empty() {
        let (state, _) = build_state_with_migrated_db("sync-latest-empty-api.sqlite");
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::get().uri("/sync/latest").to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn latest_sync_run_reports_counts() {
        let (state, connection) = build_state_with_migrated_db("sync-latest-api.sqlite");
        {
            let db = connection.lock().expect("lock should be available");
            insert_sync_run(
                &db,
                &NewSyncRunRecord {
                    run_id: "run-1".to_string(),
                    started_at: "2026-10-18T10:00:00.000Z".to_string(),
                    finished_at: "2026-10-18T10:00:04.000Z".to_string(),
                    status: SyncRunStatus::Succeeded,
                    synced: 3,
                    deleted: 1,
                    error: None,
                },
            )
            .expect("insert should succeed");
        }

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::get().uri("/sync/latest").to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let json: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(json["runId"], "run-1");
        assert_eq!(json["status"], "succeeded");
        assert_eq!(json["synced"], 3);
        assert_eq!(json["deleted"], 1);
        assert_eq!(json["error"], serde_json::Value::Null);
    }

    #[actix_web::test]
    async fn diagnostics_db_returns_schema_and_count() {
        let (state, connection) = build_state_with_migrated_db("diagnostics-db-api.sqlite");
        seed_chargers(&connection);

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::get().uri("/diagnostics/db").to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let json: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(json["schemaVersion"], LATEST_SCHEMA_VERSION);
        assert_eq!(json["chargersCount"], 3);
    }
}
