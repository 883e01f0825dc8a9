use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::domain::models::{ChargerRow, Station, lenient_text};
use crate::domain::region::DEFAULT_REGION_CODE;
use crate::domain::station_search::filter_stations;

pub const DEFAULT_API_BASE: &str = "https://apis.data.go.kr/B552584/EvCharger";
pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 12;

const CHARGER_INFO_PATH: &str = "getChargerInfo";
const STATION_PAGE_SIZE: u32 = 200;
const SEARCH_PAGE_SIZE: u32 = 9999;
const SUCCESS_RESULT_CODE: &str = "00";
// SERVICE_ACCESS_DENIED, SERVICE_KEY_IS_NOT_REGISTERED, DEADLINE_HAS_EXPIRED, UNREGISTERED_IP
const CREDENTIAL_RESULT_CODES: &[&str] = &["20", "30", "31", "32"];

/// Remote data source for the public charger listing. One call, one attempt.
pub trait KecoClient: Send + Sync + 'static {
    fn fetch_chargers(&self, station_id: &str) -> Result<Vec<ChargerRow>, KecoClientError>;
    fn validate_credentials(&self) -> Result<(), KecoClientError>;
    fn search_stations(
        &self,
        query: &str,
        region_code: &str,
    ) -> Result<Vec<Station>, KecoClientError>;
}

impl<T> KecoClient for Arc<T>
where
    T: KecoClient + ?Sized,
{
    fn fetch_chargers(&self, station_id: &str) -> Result<Vec<ChargerRow>, KecoClientError> {
        (**self).fetch_chargers(station_id)
    }

    fn validate_credentials(&self) -> Result<(), KecoClientError> {
        (**self).validate_credentials()
    }

    fn search_stations(
        &self,
        query: &str,
        region_code: &str,
    ) -> Result<Vec<Station>, KecoClientError> {
        (**self).search_stations(query, region_code)
    }
}

#[derive(Debug, Error)]
pub enum KecoClientError {
    #[error("KECO API error {code}: {message}")]
    Api { code: String, message: String },
    #[error("KECO API rejected the service key ({code}): {message}")]
    Credential { code: String, message: String },
    #[error("KECO request failed: {0}")]
    Http(reqwest::Error),
    #[error("KECO connection failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse KECO response as JSON: {0}")]
    Json(#[from] serde_json::Error),
}

// The request URL carries the service key as a query parameter.
impl From<reqwest::Error> for KecoClientError {
    fn from(error: reqwest::Error) -> Self {
        Self::Http(error.without_url())
    }
}

impl KecoClientError {
    pub fn is_credential(&self) -> bool {
        matches!(self, Self::Credential { .. })
    }

    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Io(_) | Self::Json(_))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChargerInfoResponse {
    #[serde(default, deserialize_with = "lenient_text")]
    result_code: String,
    #[serde(default, deserialize_with = "lenient_text")]
    result_msg: String,
    #[serde(default)]
    items: Value,
}

#[derive(Debug, Clone)]
pub struct KecoHttpClient {
    http: reqwest::blocking::Client,
    api_key: String,
    endpoint: String,
}

impl KecoHttpClient {
    pub fn new(api_key: &str, base_url: &str, timeout: Duration) -> Result<Self, KecoClientError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            api_key: api_key.to_string(),
            endpoint: format!("{}/{CHARGER_INFO_PATH}", base_url.trim_end_matches('/')),
        })
    }

    fn get_charger_info(
        &self,
        page_size: u32,
        filter: (&str, &str),
    ) -> Result<Vec<ChargerRow>, KecoClientError> {
        let response = self
            .http
            .get(&self.endpoint)
            .query(&[
                ("serviceKey", self.api_key.as_str()),
                ("dataType", "JSON"),
                ("pageNo", "1"),
                ("numOfRows", page_size.to_string().as_str()),
                filter,
            ])
            .send()?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(KecoClientError::Credential {
                code: status.as_u16().to_string(),
                message: status
                    .canonical_reason()
                    .unwrap_or("unauthorized")
                    .to_string(),
            });
        }

        let body = response.error_for_status()?.bytes()?;
        parse_charger_info(&body)
    }
}

impl KecoClient for KecoHttpClient {
    fn fetch_chargers(&self, station_id: &str) -> Result<Vec<ChargerRow>, KecoClientError> {
        self.get_charger_info(STATION_PAGE_SIZE, ("statId", station_id))
    }

    fn validate_credentials(&self) -> Result<(), KecoClientError> {
        self.get_charger_info(1, ("zcode", DEFAULT_REGION_CODE))
            .map(|_| ())
    }

    fn search_stations(
        &self,
        query: &str,
        region_code: &str,
    ) -> Result<Vec<Station>, KecoClientError> {
        let rows = self.get_charger_info(SEARCH_PAGE_SIZE, ("zcode", region_code))?;
        Ok(filter_stations(&rows, query))
    }
}

fn parse_charger_info(body: &[u8]) -> Result<Vec<ChargerRow>, KecoClientError> {
    let response: ChargerInfoResponse = serde_json::from_slice(body)?;
    check_result_code(&response.result_code, &response.result_msg)?;
    parse_items(response.items)
}

fn check_result_code(code: &str, message: &str) -> Result<(), KecoClientError> {
    let code = code.trim();
    if code.is_empty() || code == SUCCESS_RESULT_CODE {
        return Ok(());
    }

    let message = match message.trim() {
        "" => "unknown error".to_string(),
        text => text.to_string(),
    };

    if CREDENTIAL_RESULT_CODES.contains(&code) {
        Err(KecoClientError::Credential {
            code: code.to_string(),
            message,
        })
    } else {
        Err(KecoClientError::Api {
            code: code.to_string(),
            message,
        })
    }
}

// `items` is an object holding `item`, which is a list, a single record, or
// missing. An empty result sometimes arrives as `""` instead of an object.
fn parse_items(items: Value) -> Result<Vec<ChargerRow>, KecoClientError> {
    let item = match items {
        Value::Object(mut object) => object.remove("item").unwrap_or(Value::Null),
        _ => Value::Null,
    };

    match item {
        Value::Array(_) => Ok(serde_json::from_value(item)?),
        Value::Object(_) => Ok(vec![serde_json::from_value(item)?]),
        _ => Ok(Vec::new()),
    }
}
