use std::fs;
use std::io;
use std::sync::Mutex;

use serde::Deserialize;
use serde_json::Value;

use crate::adapters::keco_http::{KecoClient, KecoClientError};
use crate::domain::models::{ChargerRow, Station};
use crate::domain::station_search::filter_stations;

#[derive(Debug, Clone, Deserialize)]
struct ScriptFile {
    #[serde(default = "default_loop")]
    loop_forever: bool,
    events: Vec<ScriptEvent>,
}

#[derive(Debug, Clone, Deserialize)]
struct ScriptEvent {
    ok: Option<Vec<ChargerRow>>,
    error: Option<String>,
    code: Option<String>,
    message: Option<String>,
}

/// Serves scripted listing responses in order, one event per call.
///
/// Used for running the service without an API key and for exercising the
/// failure policy against reproducible upstream behaviour.
#[derive(Debug)]
pub struct KecoReplayClient {
    script: ScriptFile,
    next_index: Mutex<usize>,
}

fn default_loop() -> bool {
    true
}

impl KecoReplayClient {
    pub fn from_file(path: &str) -> Result<Self, KecoClientError> {
        let content = fs::read_to_string(path).map_err(KecoClientError::Io)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, KecoClientError> {
        let script: ScriptFile = serde_json::from_str(content).map_err(KecoClientError::Json)?;

        if script.events.is_empty() {
            return Err(KecoClientError::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                "replay script must contain at least one event",
            )));
        }

        Ok(Self {
            script,
            next_index: Mutex::new(0),
        })
    }

    fn next_event(&self) -> Result<ScriptEvent, KecoClientError> {
        let mut index = self
            .next_index
            .lock()
            .map_err(|_| KecoClientError::Io(io::Error::other("replay state lock poisoned")))?;

        if *index >= self.script.events.len() {
            if self.script.loop_forever {
                *index = 0;
            } else {
                return Err(KecoClientError::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "replay finished",
                )));
            }
        }

        let event = self.script.events.get(*index).cloned().ok_or_else(|| {
            KecoClientError::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                "replay event index out of bounds",
            ))
        })?;

        *index = index.saturating_add(1);

        Ok(event)
    }

    fn execute_event(event: ScriptEvent) -> Result<Vec<ChargerRow>, KecoClientError> {
        match (event.ok, event.error) {
            (Some(rows), None) => Ok(rows),
            (None, Some(kind)) => Err(map_script_error(
                &kind,
                event.code.as_deref(),
                event.message.as_deref(),
            )),
            _ => Err(KecoClientError::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                "script event must contain exactly one of: ok or error",
            ))),
        }
    }
}

fn map_script_error(kind: &str, code: Option<&str>, message: Option<&str>) -> KecoClientError {
    let normalized = kind.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "timeout" => KecoClientError::Io(io::Error::new(io::ErrorKind::TimedOut, kind)),
        "network_unreachable" | "internet_down" => {
            KecoClientError::Io(io::Error::new(io::ErrorKind::NetworkUnreachable, kind))
        }
        "connection_refused" => {
            KecoClientError::Io(io::Error::new(io::ErrorKind::ConnectionRefused, kind))
        }
        "api_error" => KecoClientError::Api {
            code: code.unwrap_or("99").to_string(),
            message: message.unwrap_or("scripted api error").to_string(),
        },
        "credential" => KecoClientError::Credential {
            code: code.unwrap_or("30").to_string(),
            message: message
                .unwrap_or("SERVICE KEY IS NOT REGISTERED ERROR.")
                .to_string(),
        },
        "invalid_json" => match serde_json::from_str::<Value>("not json") {
            Err(parse_err) => KecoClientError::Json(parse_err),
            Ok(_) => KecoClientError::Io(io::Error::new(io::ErrorKind::InvalidData, kind)),
        },
        _ => KecoClientError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("unknown scripted error kind: {kind}"),
        )),
    }
}

impl KecoClient for KecoReplayClient {
    fn fetch_chargers(&self, station_id: &str) -> Result<Vec<ChargerRow>, KecoClientError> {
        let rows = Self::execute_event(self.next_event()?)?;
        Ok(rows
            .into_iter()
            .filter(|row| row.station_id.is_empty() || row.station_id == station_id)
            .collect())
    }

    fn validate_credentials(&self) -> Result<(), KecoClientError> {
        Self::execute_event(self.next_event()?).map(|_| ())
    }

    fn search_stations(
        &self,
        query: &str,
        _region_code: &str,
    ) -> Result<Vec<Station>, KecoClientError> {
        let rows = Self::execute_event(self.next_event()?)?;
        Ok(filter_stations(&rows, query))
    }
}

#[cfg(test)]
mod tests {
    use std::io::ErrorKind;

    use crate::adapters::keco_http::{KecoClient, KecoClientError};

    use super::KecoReplayClient;

    fn fixture(path: &str) -> String {
        format!(
            "{}/testdata/replay/{path}",
            env!("CARGO_MANIFEST_DIR").replace("\\", "/")
        )
    }

    #[test]
    fn replays_and_loops_scripted_listings() {
        let client =
            KecoReplayClient::from_file(&fixture("happy_loop.json")).expect("script should load");

        let first = client.fetch_chargers("ST001").expect("event #1 should succeed");
        let second = client.fetch_chargers("ST001").expect("event #2 should succeed");
        let third = client
            .fetch_chargers("ST001")
            .expect("replay should loop to first event");

        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].charger_id, "B");
        assert_eq!(third, first);
    }

    #[test]
    fn filters_rows_belonging_to_other_stations() {
        let client =
            KecoReplayClient::from_file(&fixture("happy_loop.json")).expect("script should load");

        let rows = client.fetch_chargers("ST999").expect("event should succeed");

        assert!(rows.is_empty());
    }

    #[test]
    fn simulates_transport_and_api_failures() {
        let client =
            KecoReplayClient::from_file(&fixture("upstream_failures.json")).expect("script");

        match client.fetch_chargers("ST001") {
            Err(KecoClientError::Io(io)) => assert_eq!(io.kind(), ErrorKind::TimedOut),
            other => panic!("expected timeout, got {other:?}"),
        }
        match client.fetch_chargers("ST001") {
            Err(KecoClientError::Api { code, .. }) => assert_eq!(code, "22"),
            other => panic!("expected api error, got {other:?}"),
        }
        match client.fetch_chargers("ST001") {
            Err(KecoClientError::Json(_)) => {}
            other => panic!("expected json error, got {other:?}"),
        }
        assert!(
            client
                .validate_credentials()
                .expect_err("credential event should fail")
                .is_credential()
        );
    }

    #[test]
    fn stops_after_last_event_without_loop() {
        let client =
            KecoReplayClient::from_file(&fixture("upstream_failures.json")).expect("script");
        for _ in 0..4 {
            let _ = client.fetch_chargers("ST001");
        }

        match client.fetch_chargers("ST001") {
            Err(KecoClientError::Io(io)) => assert_eq!(io.kind(), ErrorKind::UnexpectedEof),
            other => panic!("expected end of replay, got {other:?}"),
        }
    }

    #[test]
    fn loads_ad_hoc_script_file() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = dir.path().join("omission.json");
        std::fs::write(
            &path,
            r#"{"loop_forever": false, "events": [
                {"ok": [{"statId": "ST001", "chgerId": "A", "stat": 2}]},
                {"ok": []}
            ]}"#,
        )
        .expect("script should be written");

        let client = KecoReplayClient::from_file(path.to_string_lossy().as_ref())
            .expect("script should load");

        let first = client.fetch_chargers("ST001").expect("event #1 should succeed");
        assert_eq!(first[0].status_code, "2");
        assert!(client.fetch_chargers("ST001").expect("event #2").is_empty());
    }

    #[test]
    fn rejects_script_without_events() {
        let err = KecoReplayClient::from_json(r#"{"events": []}"#)
            .expect_err("empty script should fail");

        match err {
            KecoClientError::Io(io) => assert_eq!(io.kind(), ErrorKind::InvalidData),
            other => panic!("expected invalid data io error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_script_with_invalid_top_level_json() {
        let err = KecoReplayClient::from_json("[1, 2")
            .expect_err("invalid json should fail");

        assert!(matches!(err, KecoClientError::Json(_)));
    }

    #[test]
    fn rejects_unknown_error_kind() {
        let client = KecoReplayClient::from_json(r#"{"events": [{"error": "meteor_strike"}]}"#)
            .expect("script");

        match client.fetch_chargers("ST001") {
            Err(KecoClientError::Io(io)) => assert_eq!(io.kind(), ErrorKind::InvalidInput),
            other => panic!("expected invalid input io error, got {other:?}"),
        }
    }

    #[test]
    fn searches_scripted_listing() {
        let client =
            KecoReplayClient::from_file(&fixture("happy_loop.json")).expect("script should load");

        let stations = client
            .search_stations("강남", "11")
            .expect("search should succeed");

        assert_eq!(stations.len(), 1);
        assert_eq!(stations[0].id, "ST001");
    }
}
