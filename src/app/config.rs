use crate::adapters::ocm_http::DEFAULT_MAX_RESULTS;
use crate::app::AppError;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: String,
    pub http_bind: String,
}

#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub ocm_api_key: String,
    pub ocm_url: String,
    pub tracked_countries: Vec<String>,
    pub max_results: u32,
    pub timeout_secs: u64,
    pub sync_interval_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        load_dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            db_path: non_empty(&lookup, "DB_PATH")
                .unwrap_or_else(|| "./data/chargers.db".to_string()),
            http_bind: non_empty(&lookup, "HTTP_BIND")
                .unwrap_or_else(|| "0.0.0.0:8080".to_string()),
        })
    }
}

impl SyncConfig {
    pub fn from_env() -> Result<Self, AppError> {
        load_dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let ocm_api_key = non_empty(&lookup, "OCM_API_KEY")
            .ok_or_else(|| AppError::config("OCM_API_KEY is required"))?;

        let tracked_countries = match non_empty(&lookup, "TRACKED_COUNTRIES") {
            Some(raw) => parse_country_list(&raw)?,
            None => vec!["RS".to_string(), "XK".to_string(), "BA".to_string()],
        };

        let sync_interval_secs = parse_or_default(&lookup, "SYNC_INTERVAL_SECS", 3600_u64)?;
        if sync_interval_secs == 0 {
            return Err(AppError::config("SYNC_INTERVAL_SECS must be greater than zero"));
        }

        Ok(Self {
            ocm_api_key,
            ocm_url: non_empty(&lookup, "OCM_URL")
                .unwrap_or_else(|| "https://api.openchargemap.io/v3/poi/".to_string()),
            tracked_countries,
            max_results: parse_or_default(&lookup, "OCM_MAX_RESULTS", DEFAULT_MAX_RESULTS)?,
            timeout_secs: parse_or_default(&lookup, "OCM_TIMEOUT_SECS", 30_u64)?,
            sync_interval_secs,
        })
    }
}

fn load_dotenv() {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "loaded environment file");
    }
}

fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_country_list(raw: &str) -> Result<Vec<String>, AppError> {
    let countries: Vec<String> = raw
        .split(',')
        .map(|code| code.trim().to_ascii_uppercase())
        .filter(|code| !code.is_empty())
        .collect();

    if countries.is_empty() {
        return Err(AppError::config(
            "TRACKED_COUNTRIES must list at least one country code",
        ));
    }

    Ok(countries)
}

fn parse_or_default<T, F>(lookup: &F, key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr + Copy,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| AppError::config(format!("{key} must be a valid number"))),
        None => Ok(default),
    }
}
