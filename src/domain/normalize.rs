use crate::domain::models::{ChargerRecord, ChargerStatus, RawCharger, value_text};

pub const CAPITAL_TOWN: &str = "Belgrade";
pub const UNKNOWN_TOWN: &str = "Unknown";

const CAPITAL_SPELLINGS: &[&str] = &["Belgrad", "Belgrade", "Beograd"];
const CAPITAL_POSTCODE_PREFIX: &str = "11";

pub fn normalize_town(raw_town: Option<&str>, postcode: Option<&str>) -> String {
    if let Some(town) = raw_town
        && CAPITAL_SPELLINGS.contains(&town)
    {
        return CAPITAL_TOWN.to_string();
    }

    if let Some(postcode) = postcode
        && postcode.starts_with(CAPITAL_POSTCODE_PREFIX)
    {
        return CAPITAL_TOWN.to_string();
    }

    match raw_town {
        Some(town) if !town.is_empty() => town.to_string(),
        _ => UNKNOWN_TOWN.to_string(),
    }
}

pub fn derive_status(is_operational: Option<bool>) -> ChargerStatus {
    if is_operational.unwrap_or(false) {
        ChargerStatus::Available
    } else {
        ChargerStatus::Offline
    }
}

/// Builds the canonical row for one fetched record.
pub fn normalize_charger(raw: &RawCharger, expires_at: i64) -> ChargerRecord {
    let address = raw.address();
    let postcode = address.postcode_text();

    ChargerRecord {
        id: raw.id_text(),
        town: normalize_town(address.town.as_deref(), postcode.as_deref()),
        title: address.title.clone(),
        latitude: value_text(address.latitude.as_ref()),
        longitude: value_text(address.longitude.as_ref()),
        status: derive_status(raw.is_operational()),
        expires_at,
    }
}
