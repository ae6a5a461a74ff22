use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use thiserror::Error;

use crate::adapters::db;
use crate::adapters::db::DbError;
use crate::domain::models::{ChargerRecord, NewSyncRunRecord, SyncRunRecord};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database lock poisoned")]
    DbLockPoisoned,
    #[error(transparent)]
    Database(#[from] DbError),
}

/// Narrow persistence surface used by the sync reconciler.
pub trait ChargerStore {
    fn put_all(&self, records: &[ChargerRecord]) -> Result<usize, StoreError>;
    fn delete_all(&self, ids: &[String]) -> Result<usize, StoreError>;
    fn list_all_ids(&self) -> Result<HashSet<String>, StoreError>;
}

pub trait ChargerQueryHandler {
    fn list_chargers(&self, town: Option<&str>) -> Result<Vec<ChargerRecord>, StoreError>;
    fn get_schema_version(&self) -> Result<u32, StoreError>;
    fn count_chargers(&self) -> Result<i64, StoreError>;
    fn get_latest_sync_run(&self) -> Result<Option<SyncRunRecord>, StoreError>;
}

pub trait SyncRunRecorder {
    fn record_sync_run(&self, run: &NewSyncRunRecord) -> Result<i64, StoreError>;
    fn purge_expired(&self, now_unix: i64) -> Result<usize, StoreError>;
}

#[derive(Clone)]
pub struct SqliteChargerService {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteChargerService {
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }

    fn with_connection<T>(
        &self,
        op: impl FnOnce(&mut Connection) -> Result<T, DbError>,
    ) -> Result<T, StoreError> {
        let mut connection = self
            .connection
            .lock()
            .map_err(|_| StoreError::DbLockPoisoned)?;
        op(&mut *connection).map_err(StoreError::from)
    }
}

impl ChargerStore for SqliteChargerService {
    fn put_all(&self, records: &[ChargerRecord]) -> Result<usize, StoreError> {
        self.with_connection(|connection| db::put_chargers(connection, records))
    }

    fn delete_all(&self, ids: &[String]) -> Result<usize, StoreError> {
        self.with_connection(|connection| db::delete_chargers(connection, ids))
    }

    fn list_all_ids(&self) -> Result<HashSet<String>, StoreError> {
        self.with_connection(|connection| {
            db::list_charger_ids(connection).map(|ids| ids.into_iter().collect())
        })
    }
}

impl ChargerQueryHandler for SqliteChargerService {
    fn list_chargers(&self, town: Option<&str>) -> Result<Vec<ChargerRecord>, StoreError> {
        self.with_connection(|connection| match town {
            Some(town) => db::list_chargers_by_town(connection, town),
            None => db::list_chargers(connection),
        })
    }

    fn get_schema_version(&self) -> Result<u32, StoreError> {
        self.with_connection(|connection| db::schema_version(connection))
    }

    fn count_chargers(&self) -> Result<i64, StoreError> {
        self.with_connection(|connection| db::count_chargers(connection))
    }

    fn get_latest_sync_run(&self) -> Result<Option<SyncRunRecord>, StoreError> {
        self.with_connection(|connection| db::get_latest_sync_run(connection))
    }
}

impl SyncRunRecorder for SqliteChargerService {
    fn record_sync_run(&self, run: &NewSyncRunRecord) -> Result<i64, StoreError> {
        self.with_connection(|connection| db::insert_sync_run(connection, run))
    }

    fn purge_expired(&self, now_unix: i64) -> Result<usize, StoreError> {
        self.with_connection(|connection| db::purge_expired(connection, now_unix))
    }
}
