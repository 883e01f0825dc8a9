use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::domain::charger_status::status_text;
use crate::domain::models::ChargerRow;
use crate::domain::timestamp::parse_keco_timestamp;

pub const DEFAULT_MANUFACTURER: &str = "공공충전인프라";
pub const DEVICE_MODEL: &str = "KECO EV Charger";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorKind {
    StatusText,
    StatusCode,
    StatusUpdatedAt,
    SessionStartedAt,
    LastSessionStartedAt,
    LastSessionEndedAt,
    OutputKw,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SensorValue {
    Text(String),
    Timestamp(DateTime<FixedOffset>),
    Number(f64),
    Unknown,
}

impl SensorKind {
    pub const ALL: [SensorKind; 7] = [
        SensorKind::StatusText,
        SensorKind::StatusCode,
        SensorKind::StatusUpdatedAt,
        SensorKind::SessionStartedAt,
        SensorKind::LastSessionStartedAt,
        SensorKind::LastSessionEndedAt,
        SensorKind::OutputKw,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::StatusText => "status_text",
            Self::StatusCode => "status_code",
            Self::StatusUpdatedAt => "stat_upd_dt",
            Self::SessionStartedAt => "now_tsdt",
            Self::LastSessionStartedAt => "last_tsdt",
            Self::LastSessionEndedAt => "last_tedt",
            Self::OutputKw => "output_kw",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::StatusText => "상태",
            Self::StatusCode => "상태 코드",
            Self::StatusUpdatedAt => "상태 갱신 시각",
            Self::SessionStartedAt => "현재 충전 시작 시각",
            Self::LastSessionStartedAt => "직전 충전 시작 시각",
            Self::LastSessionEndedAt => "직전 충전 종료 시각",
            Self::OutputKw => "출력(kW)",
        }
    }

    pub fn enabled_by_default(self) -> bool {
        matches!(
            self,
            Self::StatusText | Self::StatusUpdatedAt | Self::SessionStartedAt
        )
    }

    pub fn unit(self) -> Option<&'static str> {
        match self {
            Self::OutputKw => Some("kW"),
            _ => None,
        }
    }

    pub fn value(self, row: &ChargerRow) -> SensorValue {
        match self {
            Self::StatusText => SensorValue::Text(status_text(&row.status_code)),
            Self::StatusCode => SensorValue::Text(row.status_code.trim().to_string()),
            Self::StatusUpdatedAt => timestamp_value(&row.status_updated_at),
            Self::SessionStartedAt => timestamp_value(&row.session_started_at),
            Self::LastSessionStartedAt => timestamp_value(&row.last_session_started_at),
            Self::LastSessionEndedAt => timestamp_value(&row.last_session_ended_at),
            Self::OutputKw => row
                .output_kw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite())
                .map_or(SensorValue::Unknown, SensorValue::Number),
        }
    }
}

fn timestamp_value(raw: &str) -> SensorValue {
    parse_keco_timestamp(raw).map_or(SensorValue::Unknown, SensorValue::Timestamp)
}

/// Raw upstream fields exposed next to every sensor value.
pub fn charger_attributes(row: &ChargerRow) -> Map<String, Value> {
    let mut attributes = Map::new();
    for (key, value) in [
        ("statId", &row.station_id),
        ("chgerId", &row.charger_id),
        ("statNm", &row.station_name),
        ("addr", &row.address),
        ("busiNm", &row.operator_name),
        ("chgerType", &row.charger_type),
        ("output", &row.output_kw),
        ("method", &row.method),
    ] {
        attributes.insert(key.to_string(), Value::String(value.clone()));
    }
    attributes
}

pub fn device_name(station_name: &str, charger_id: &str) -> String {
    format!("{station_name} #{charger_id}")
}

pub fn device_manufacturer(row: &ChargerRow) -> &str {
    let operator = row.operator_name.trim();
    if operator.is_empty() {
        DEFAULT_MANUFACTURER
    } else {
        operator
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::charger_row;

    use super::{SensorKind, SensorValue, charger_attributes, device_manufacturer, device_name};

    #[test]
    fn projects_status_text_and_code() {
        let row = charger_row("ST001", "A", "3");

        assert_eq!(
            SensorKind::StatusText.value(&row),
            SensorValue::Text("충전중".to_string())
        );
        assert_eq!(
            SensorKind::StatusCode.value(&row),
            SensorValue::Text("3".to_string())
        );
    }

    #[test]
    fn projects_timestamps_with_absent_sentinels() {
        let mut row = charger_row("ST001", "A", "3");
        row.status_updated_at = "20240101093000".to_string();
        row.session_started_at = "00000000000000".to_string();

        match SensorKind::StatusUpdatedAt.value(&row) {
            SensorValue::Timestamp(value) => {
                assert_eq!(value.to_rfc3339(), "2024-01-01T09:30:00+09:00")
            }
            other => panic!("expected timestamp, got {other:?}"),
        }
        assert_eq!(
            SensorKind::SessionStartedAt.value(&row),
            SensorValue::Unknown
        );
    }

    #[test]
    fn output_power_is_numeric_or_unknown() {
        let mut row = charger_row("ST001", "A", "2");
        row.output_kw = "100".to_string();
        assert_eq!(SensorKind::OutputKw.value(&row), SensorValue::Number(100.0));

        row.output_kw = " ".to_string();
        assert_eq!(SensorKind::OutputKw.value(&row), SensorValue::Unknown);

        row.output_kw = "fast".to_string();
        assert_eq!(SensorKind::OutputKw.value(&row), SensorValue::Unknown);
    }

    #[test]
    fn serializes_values_as_plain_json() {
        let json = serde_json::to_value([
            SensorValue::Text("충전대기".to_string()),
            SensorValue::Number(7.0),
            SensorValue::Unknown,
        ])
        .expect("values should serialize");

        assert_eq!(json, serde_json::json!(["충전대기", 7.0, null]));
    }

    #[test]
    fn only_primary_sensors_are_enabled_by_default() {
        let enabled: Vec<&str> = SensorKind::ALL
            .iter()
            .filter(|kind| kind.enabled_by_default())
            .map(|kind| kind.key())
            .collect();

        assert_eq!(enabled, vec!["status_text", "stat_upd_dt", "now_tsdt"]);
    }

    #[test]
    fn exposes_device_metadata_and_attributes() {
        let mut row = charger_row("ST001", "A", "2");
        assert_eq!(device_manufacturer(&row), "공공충전인프라");

        row.operator_name = "환경부".to_string();
        assert_eq!(device_manufacturer(&row), "환경부");
        assert_eq!(device_name("강남구청", "A"), "강남구청 #A");

        let attributes = charger_attributes(&row);
        assert_eq!(attributes["chgerId"], "A");
        assert_eq!(attributes["busiNm"], "환경부");
        assert_eq!(attributes.len(), 8);
    }
}
