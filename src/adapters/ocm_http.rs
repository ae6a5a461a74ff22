use std::time::Duration;

use reqwest::blocking::Client;
use thiserror::Error;

use crate::domain::models::RawCharger;

pub const DEFAULT_MAX_RESULTS: u32 = 1000;

pub trait ChargerSource: Send + Sync + 'static {
    fn fetch_country(&self, country_code: &str) -> Result<Vec<RawCharger>, FetchError>;
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to charger source failed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("charger source returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to decode charger source response: {0}")]
    Decode(#[source] reqwest::Error),
}

/// Blocking client for the Open Charge Map POI endpoint.
#[derive(Debug, Clone)]
pub struct OcmHttpClient {
    http: Client,
    base_url: String,
    api_key: String,
    max_results: u32,
}

impl OcmHttpClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        max_results: u32,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
            max_results,
        })
    }
}

impl ChargerSource for OcmHttpClient {
    fn fetch_country(&self, country_code: &str) -> Result<Vec<RawCharger>, FetchError> {
        let max_results = self.max_results.to_string();
        tracing::debug!(country_code, url = %self.base_url, "requesting chargers");

        let response = self
            .http
            .get(&self.base_url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("countrycode", country_code),
                ("maxresults", max_results.as_str()),
                ("compact", "false"),
                ("verbose", "false"),
            ])
            .send()
            .map_err(FetchError::Request)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: response.text().unwrap_or_default(),
            });
        }

        response.json().map_err(FetchError::Decode)
    }
}
