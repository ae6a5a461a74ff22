use rusqlite::types::Type;
use rusqlite::{Connection, Row, params, params_from_iter};
use thiserror::Error;

use crate::domain::models::{ChargerRecord, ChargerStatus, NewSyncRunRecord, SyncRunRecord};

pub const LATEST_SCHEMA_VERSION: u32 = 2;

/// Rows written or deleted per statement group.
pub const WRITE_BATCH_SIZE: usize = 25;

const MIGRATIONS: &[(u32, &str)] = &[
    (
        1,
        r#"
CREATE TABLE IF NOT EXISTS chargers (
    charger_id TEXT PRIMARY KEY NOT NULL,
    town TEXT NOT NULL,
    title TEXT,
    latitude TEXT NOT NULL,
    longitude TEXT NOT NULL,
    status TEXT NOT NULL,
    expires_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_chargers_town
ON chargers (town);

CREATE INDEX IF NOT EXISTS idx_chargers_expires_at
ON chargers (expires_at);
"#,
    ),
    (
        2,
        r#"
CREATE TABLE IF NOT EXISTS sync_runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id TEXT NOT NULL,
    started_at TEXT NOT NULL,
    finished_at TEXT NOT NULL,
    status TEXT NOT NULL,
    synced INTEGER NOT NULL,
    deleted INTEGER NOT NULL,
    error TEXT
);

CREATE INDEX IF NOT EXISTS idx_sync_runs_finished_at_desc
ON sync_runs (finished_at DESC);
"#,
    ),
];

const CHARGER_COLUMNS: &str =
    "charger_id, town, title, latitude, longitude, status, expires_at";

#[derive(Debug, Error)]
pub enum DbError {
    #[error("database operation failed: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("unsupported schema version {current}; latest supported is {latest}")]
    UnsupportedSchemaVersion { current: u32, latest: u32 },
}

pub fn open_connection(path: &str) -> Result<Connection, DbError> {
    Connection::open(path).map_err(DbError::from)
}

pub fn run_migrations(connection: &mut Connection) -> Result<(), DbError> {
    let current_version = schema_version(connection)?;

    if current_version > LATEST_SCHEMA_VERSION {
        return Err(DbError::UnsupportedSchemaVersion {
            current: current_version,
            latest: LATEST_SCHEMA_VERSION,
        });
    }

    let transaction = connection.transaction()?;

    for (version, sql) in MIGRATIONS {
        if *version > current_version {
            transaction.execute_batch(sql)?;
            transaction.pragma_update(None, "user_version", version)?;
        }
    }

    transaction.commit()?;

    Ok(())
}

pub fn schema_version(connection: &Connection) -> Result<u32, DbError> {
    let version = connection.pragma_query_value(None, "user_version", |row| row.get(0))?;
    Ok(version)
}

/// Full-row replacement of every record. Each batch commits on its own, so a
/// failure leaves earlier batches applied.
pub fn put_chargers(
    connection: &mut Connection,
    records: &[ChargerRecord],
) -> Result<usize, DbError> {
    let mut written = 0;

    for batch in records.chunks(WRITE_BATCH_SIZE) {
        let transaction = connection.transaction()?;
        {
            let mut statement = transaction.prepare_cached(
                "INSERT OR REPLACE INTO chargers (charger_id, town, title, latitude, longitude, status, expires_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for record in batch {
                statement.execute(params![
                    record.id,
                    record.town,
                    record.title,
                    record.latitude,
                    record.longitude,
                    record.status.as_str(),
                    record.expires_at,
                ])?;
            }
        }
        transaction.commit()?;
        written += batch.len();
    }

    Ok(written)
}

pub fn delete_chargers(connection: &mut Connection, ids: &[String]) -> Result<usize, DbError> {
    let mut deleted = 0;

    for batch in ids.chunks(WRITE_BATCH_SIZE) {
        let placeholders = vec!["?"; batch.len()].join(", ");
        let sql = format!("DELETE FROM chargers WHERE charger_id IN ({placeholders})");
        deleted += connection.execute(&sql, params_from_iter(batch.iter()))?;
    }

    Ok(deleted)
}

pub fn list_charger_ids(connection: &Connection) -> Result<Vec<String>, DbError> {
    let mut statement = connection.prepare("SELECT charger_id FROM chargers")?;
    let rows = statement.query_map([], |row| row.get(0))?;

    let mut ids = Vec::new();
    for row in rows {
        ids.push(row?);
    }

    Ok(ids)
}

pub fn list_chargers(connection: &Connection) -> Result<Vec<ChargerRecord>, DbError> {
    let mut statement = connection.prepare(&format!(
        "SELECT {CHARGER_COLUMNS} FROM chargers ORDER BY charger_id"
    ))?;
    let rows = statement.query_map([], map_charger_row)?;

    let mut chargers = Vec::new();
    for row in rows {
        chargers.push(row?);
    }

    Ok(chargers)
}

pub fn list_chargers_by_town(
    connection: &Connection,
    town: &str,
) -> Result<Vec<ChargerRecord>, DbError> {
    let mut statement = connection.prepare(&format!(
        "SELECT {CHARGER_COLUMNS} FROM chargers WHERE town = ?1 ORDER BY charger_id"
    ))?;
    let rows = statement.query_map(params![town], map_charger_row)?;

    let mut chargers = Vec::new();
    for row in rows {
        chargers.push(row?);
    }

    Ok(chargers)
}

pub fn count_chargers(connection: &Connection) -> Result<i64, DbError> {
    let count = connection.query_row("SELECT COUNT(*) FROM chargers", [], |row| row.get(0))?;
    Ok(count)
}

/// Removes rows whose retention window has passed.
pub fn purge_expired(connection: &Connection, now_unix: i64) -> Result<usize, DbError> {
    let purged = connection.execute(
        "DELETE FROM chargers WHERE expires_at <= ?1",
        params![now_unix],
    )?;
    Ok(purged)
}

pub fn insert_sync_run(connection: &Connection, run: &NewSyncRunRecord) -> Result<i64, DbError> {
    connection.execute(
        "INSERT INTO sync_runs (run_id, started_at, finished_at, status, synced, deleted, error)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            run.run_id,
            run.started_at,
            run.finished_at,
            run.status.as_str(),
            run.synced,
            run.deleted,
            run.error,
        ],
    )?;

    Ok(connection.last_insert_rowid())
}

pub fn get_latest_sync_run(connection: &Connection) -> Result<Option<SyncRunRecord>, DbError> {
    let mut statement = connection.prepare(
        "SELECT run_id, started_at, finished_at, status, synced, deleted, error
         FROM sync_runs
         ORDER BY finished_at DESC, id DESC
         LIMIT 1",
    )?;

    let mut rows = statement.query([])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(SyncRunRecord {
            run_id: row.get(0)?,
            started_at: row.get(1)?,
            finished_at: row.get(2)?,
            status: row.get(3)?,
            synced: row.get(4)?,
            deleted: row.get(5)?,
            error: row.get(6)?,
        }));
    }

    Ok(None)
}

fn map_charger_row(row: &Row<'_>) -> rusqlite::Result<ChargerRecord> {
    let status: String = row.get(5)?;
    let status = status
        .parse::<ChargerStatus>()
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, error.into()))?;

    Ok(ChargerRecord {
        id: row.get(0)?,
        town: row.get(1)?,
        title: row.get(2)?,
        latitude: row.get(3)?,
        longitude: row.get(4)?,
        status,
        expires_at: row.get(6)?,
    })
}
