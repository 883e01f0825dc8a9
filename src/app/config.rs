use std::collections::{BTreeSet, HashSet};

use crate::adapters::keco_http::{DEFAULT_API_BASE, DEFAULT_REQUEST_TIMEOUT_SECONDS};
use crate::app::AppError;
use crate::domain::models::Station;
use crate::domain::refresh_state::DEFAULT_MAX_CONSECUTIVE_FAILURES;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_key: String,
    pub stations: Vec<Station>,
    pub max_consecutive_failures: u32,
    pub enabled_chargers: Option<BTreeSet<String>>,
    pub api_base: String,
    pub request_timeout_secs: u64,
    pub replay_file: Option<String>,
    pub http_bind: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        // A missing .env file is not an error.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = non_empty(&lookup, "KECO_API_KEY")
            .ok_or_else(|| AppError::config("KECO_API_KEY is required"))?;

        let stations = non_empty(&lookup, "KECO_STATIONS")
            .ok_or_else(|| AppError::config("KECO_STATIONS is required"))
            .and_then(|raw| parse_stations(&raw))?;

        let max_consecutive_failures = parse_or_default(
            &lookup,
            "KECO_MAX_CONSECUTIVE_FAILURES",
            DEFAULT_MAX_CONSECUTIVE_FAILURES,
        )?
        .max(1);

        Ok(Self {
            api_key,
            stations,
            max_consecutive_failures,
            enabled_chargers: non_empty(&lookup, "KECO_ENABLED_CHARGERS")
                .map(|raw| parse_charger_list(&raw))
                .filter(|chargers| !chargers.is_empty()),
            api_base: non_empty(&lookup, "KECO_API_BASE")
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            request_timeout_secs: parse_or_default(
                &lookup,
                "KECO_REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECONDS,
            )?,
            replay_file: non_empty(&lookup, "KECO_REPLAY_FILE"),
            http_bind: non_empty(&lookup, "HTTP_BIND")
                .unwrap_or_else(|| "0.0.0.0:8080".to_string()),
        })
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

/// `id` or `id|name|address|operator`, entries separated by `;`.
fn parse_stations(raw: &str) -> Result<Vec<Station>, AppError> {
    let mut seen = HashSet::new();
    let mut stations = Vec::new();

    for entry in raw.split(';').map(str::trim).filter(|e| !e.is_empty()) {
        let mut parts = entry.split('|').map(str::trim);
        let station = Station {
            id: parts.next().unwrap_or_default().to_string(),
            name: parts.next().unwrap_or_default().to_string(),
            address: parts.next().unwrap_or_default().to_string(),
            operator: parts.next().unwrap_or_default().to_string(),
        };

        if station.is_configured() && !seen.insert(station.id.clone()) {
            return Err(AppError::config(format!(
                "KECO_STATIONS lists station {} more than once",
                station.id
            )));
        }
        stations.push(station);
    }

    if stations.is_empty() {
        return Err(AppError::config(
            "KECO_STATIONS must list at least one station",
        ));
    }

    Ok(stations)
}

fn parse_charger_list(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(ToString::to_string)
        .collect()
}
