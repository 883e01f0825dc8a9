use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Station {
    pub id: String,
    pub name: String,
    pub address: String,
    pub operator: String,
}

impl Station {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// A station without an identifier is registered but never polled.
    pub fn is_configured(&self) -> bool {
        !self.id.trim().is_empty()
    }

    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

/// One charger record as delivered by the `getChargerInfo` listing.
///
/// Every field is kept as the raw upstream text; interpretation happens in
/// [`crate::domain::sensor`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct ChargerRow {
    #[serde(rename = "statId", default, deserialize_with = "lenient_text")]
    pub station_id: String,
    #[serde(rename = "statNm", default, deserialize_with = "lenient_text")]
    pub station_name: String,
    #[serde(rename = "addr", default, deserialize_with = "lenient_text")]
    pub address: String,
    #[serde(rename = "busiNm", default, deserialize_with = "lenient_text")]
    pub operator_name: String,
    #[serde(rename = "chgerId", default, deserialize_with = "lenient_text")]
    pub charger_id: String,
    #[serde(rename = "stat", default, deserialize_with = "lenient_text")]
    pub status_code: String,
    #[serde(rename = "statUpdDt", default, deserialize_with = "lenient_text")]
    pub status_updated_at: String,
    #[serde(rename = "nowTsdt", default, deserialize_with = "lenient_text")]
    pub session_started_at: String,
    #[serde(rename = "lastTsdt", default, deserialize_with = "lenient_text")]
    pub last_session_started_at: String,
    #[serde(rename = "lastTedt", default, deserialize_with = "lenient_text")]
    pub last_session_ended_at: String,
    #[serde(rename = "output", default, deserialize_with = "lenient_text")]
    pub output_kw: String,
    #[serde(rename = "chgerType", default, deserialize_with = "lenient_text")]
    pub charger_type: String,
    #[serde(rename = "method", default, deserialize_with = "lenient_text")]
    pub method: String,
}

impl ChargerRow {
    /// Key used for merging; blank identifiers never enter the cache.
    pub fn charger_key(&self) -> Option<&str> {
        let key = self.charger_id.trim();
        (!key.is_empty()).then_some(key)
    }
}

/// Published view: station identifier to the rows currently considered current.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    stations: BTreeMap<String, Vec<ChargerRow>>,
}

impl Snapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn single(station_id: impl Into<String>, rows: Vec<ChargerRow>) -> Self {
        let mut stations = BTreeMap::new();
        stations.insert(station_id.into(), rows);
        Self { stations }
    }

    pub fn rows(&self, station_id: &str) -> &[ChargerRow] {
        self.stations
            .get(station_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }
}

/// Accepts strings, numbers, booleans and null; the listing is not consistent
/// about which one it sends for numeric-looking fields.
pub(crate) fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => String::new(),
        Value::String(text) => text,
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        other => other.to_string(),
    })
}
