use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};

use crate::adapters::keco_http::{KecoClient, KecoClientError};
use crate::domain::models::{ChargerRow, Station};
use crate::domain::refresh_state::Clock;
use crate::domain::station_search::filter_stations;

pub fn charger_row(station_id: &str, charger_id: &str, status_code: &str) -> ChargerRow {
    ChargerRow {
        station_id: station_id.to_string(),
        station_name: "강남구청 공영주차장".to_string(),
        address: "서울특별시 강남구 학동로 426".to_string(),
        operator_name: "환경부".to_string(),
        charger_id: charger_id.to_string(),
        status_code: status_code.to_string(),
        status_updated_at: "20240101093000".to_string(),
        output_kw: "50".to_string(),
        charger_type: "04".to_string(),
        method: "단독".to_string(),
        ..ChargerRow::default()
    }
}

pub fn timeout_error() -> KecoClientError {
    KecoClientError::Io(io::Error::new(io::ErrorKind::TimedOut, "timed out"))
}

pub fn api_error(code: &str) -> KecoClientError {
    KecoClientError::Api {
        code: code.to_string(),
        message: "scripted".to_string(),
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Default for FixedClock {
    fn default() -> Self {
        Self(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 30, 0)
                .single()
                .expect("fixed test instant should be valid"),
        )
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

type ScriptedResult = Result<Vec<ChargerRow>, KecoClientError>;

/// In-memory client answering fetches from a queue of results.
pub struct ScriptedClient {
    results: Mutex<VecDeque<ScriptedResult>>,
    repeat: Option<Vec<ChargerRow>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedClient {
    pub fn new(results: Vec<ScriptedResult>) -> Self {
        Self {
            results: Mutex::new(results.into()),
            repeat: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn repeating(result: Result<Vec<ChargerRow>, KecoClientError>) -> Self {
        let rows = result.expect("repeating client needs a successful result");
        Self {
            results: Mutex::new(VecDeque::new()),
            repeat: Some(rows),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl KecoClient for ScriptedClient {
    fn fetch_chargers(&self, _station_id: &str) -> Result<Vec<ChargerRow>, KecoClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(rows) = &self.repeat {
            return Ok(rows.clone());
        }
        self.results
            .lock()
            .expect("scripted results lock")
            .pop_front()
            .unwrap_or_else(|| Err(api_error("EOF")))
    }

    fn validate_credentials(&self) -> Result<(), KecoClientError> {
        Ok(())
    }

    fn search_stations(
        &self,
        query: &str,
        _region_code: &str,
    ) -> Result<Vec<Station>, KecoClientError> {
        let rows = self.repeat.clone().unwrap_or_default();
        Ok(filter_stations(&rows, query))
    }
}
