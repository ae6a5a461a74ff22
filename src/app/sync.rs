use std::collections::{HashMap, HashSet};

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::adapters::ocm_http::{ChargerSource, FetchError};
use crate::app::services::{ChargerStore, StoreError};
use crate::domain::models::{ChargerRecord, RawCharger};
use crate::domain::normalize::normalize_charger;
use crate::domain::region::{SubRegionRule, include_record, region_rule_for};

/// Rows outlive a missed sync by this many days before the reaper may drop them.
pub const RETENTION_DAYS: i64 = 2;

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedCountry {
    pub code: String,
    pub rule: Option<&'static SubRegionRule>,
}

impl TrackedCountry {
    pub fn new(code: impl Into<String>) -> Self {
        let code = code.into();
        let rule = region_rule_for(&code);
        Self { code, rule }
    }

    fn accepts(&self, raw: &RawCharger) -> bool {
        include_record(&self.code, &raw.address())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SyncResult {
    pub synced: usize,
    pub deleted: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncErrorKind {
    Fetch,
    Store,
    Unexpected,
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("failed to fetch chargers for {country}: {source}")]
    Fetch {
        country: String,
        #[source]
        source: FetchError,
    },
    #[error("charger store failed: {0}")]
    Store(#[from] StoreError),
    #[error("unexpected sync failure: {0}")]
    Unexpected(String),
}

impl SyncError {
    pub fn kind(&self) -> SyncErrorKind {
        match self {
            Self::Fetch { .. } => SyncErrorKind::Fetch,
            Self::Store(_) => SyncErrorKind::Store,
            Self::Unexpected(_) => SyncErrorKind::Unexpected,
        }
    }
}

/// Transport-facing summary of one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SyncReport {
    Synced {
        message: &'static str,
        synced: usize,
        deleted: usize,
    },
    Failed {
        error: String,
    },
}

impl SyncReport {
    pub fn from_result(result: &Result<SyncResult, SyncError>) -> Self {
        match result {
            Ok(outcome) => Self::Synced {
                message: "OCM data synced",
                synced: outcome.synced,
                deleted: outcome.deleted,
            },
            Err(error) => Self::Failed {
                error: error.to_string(),
            },
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::Synced { .. } => 200,
            Self::Failed { .. } => 500,
        }
    }
}

/// Converges the store onto what the charger source currently reports.
pub struct ChargerSync<S, St, Cl> {
    source: S,
    store: St,
    clock: Cl,
    countries: Vec<TrackedCountry>,
}

impl<S, St, Cl> ChargerSync<S, St, Cl>
where
    S: ChargerSource,
    St: ChargerStore,
    Cl: Clock,
{
    pub fn new(source: S, store: St, clock: Cl, countries: Vec<TrackedCountry>) -> Self {
        Self {
            source,
            store,
            clock,
            countries,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn run_sync(&self) -> Result<SyncResult, SyncError> {
        self.run_sync_as(&Uuid::new_v4().to_string())
    }

    pub fn run_sync_as(&self, run_id: &str) -> Result<SyncResult, SyncError> {
        let span = tracing::info_span!("sync_run", run_id);
        let _entered = span.enter();

        let fetched = self.fetch_tracked()?;

        let expires_at = self
            .clock
            .now()
            .checked_add_signed(TimeDelta::days(RETENTION_DAYS))
            .ok_or_else(|| SyncError::Unexpected("expiry timestamp out of range".to_string()))?
            .timestamp();

        let records = build_target_set(&fetched, expires_at);
        let current_ids: HashSet<&str> = records.iter().map(|record| record.id.as_str()).collect();

        self.store.put_all(&records)?;

        let mut stale: Vec<String> = self
            .store
            .list_all_ids()?
            .into_iter()
            .filter(|id| !current_ids.contains(id.as_str()))
            .collect();
        stale.sort();

        if !stale.is_empty() {
            self.store.delete_all(&stale)?;
        }

        tracing::info!(
            fetched = fetched.len(),
            synced = records.len(),
            deleted = stale.len(),
            "charger sync completed"
        );

        Ok(SyncResult {
            synced: records.len(),
            deleted: stale.len(),
        })
    }

    fn fetch_tracked(&self) -> Result<Vec<RawCharger>, SyncError> {
        let mut accepted = Vec::new();

        for country in &self.countries {
            let batch = self
                .source
                .fetch_country(&country.code)
                .map_err(|source| SyncError::Fetch {
                    country: country.code.clone(),
                    source,
                })?;
            let received = batch.len();

            let before = accepted.len();
            accepted.extend(batch.into_iter().filter(|raw| country.accepts(raw)));
            let kept = accepted.len() - before;

            match country.rule {
                Some(rule) => tracing::info!(
                    country = %country.code,
                    region = rule.name,
                    received,
                    kept,
                    "filtered chargers to sub-region"
                ),
                None => tracing::info!(country = %country.code, received, "fetched chargers"),
            }
        }

        Ok(accepted)
    }
}

/// Normalizes fetched records into one row per id. A repeated id replaces the
/// earlier row's content but keeps its position.
fn build_target_set(fetched: &[RawCharger], expires_at: i64) -> Vec<ChargerRecord> {
    let mut positions: HashMap<String, usize> = HashMap::with_capacity(fetched.len());
    let mut records: Vec<ChargerRecord> = Vec::with_capacity(fetched.len());

    for raw in fetched {
        let record = normalize_charger(raw, expires_at);
        tracing::debug!(charger_id = %record.id, status = %record.status, "normalized charger");

        match positions.get(&record.id) {
            Some(&position) => records[position] = record,
            None => {
                positions.insert(record.id.clone(), records.len());
                records.push(record);
            }
        }
    }

    records
}
