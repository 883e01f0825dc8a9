use actix_web::{HttpResponse, Responder, get, web};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::app::coordinator::CoordinatorStatus;
use crate::app::services::{
    ChargerQueryHandler, ServiceError, SnapshotQueryService, StationChargers,
};
use crate::domain::models::{ChargerRow, Station};
use crate::domain::sensor::{
    DEVICE_MODEL, SensorKind, SensorValue, charger_attributes, device_manufacturer, device_name,
};

#[derive(Clone)]
pub struct ApiState {
    pub charger_queries: SnapshotQueryService,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StationResponse {
    #[serde(flatten)]
    pub station: Station,
    pub charger_count: usize,
    pub status: CoordinatorStatus,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StationChargersResponse {
    pub station: StationResponse,
    pub chargers: Vec<ChargerResponse>,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChargerResponse {
    pub charger_id: String,
    pub available: bool,
    pub device: DeviceResponse,
    pub sensors: Vec<SensorResponse>,
    pub attributes: Map<String, Value>,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeviceResponse {
    pub name: String,
    pub manufacturer: String,
    pub model: &'static str,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SensorResponse {
    pub key: &'static str,
    pub name: String,
    pub value: SensorValue,
    pub unit: Option<&'static str>,
    pub enabled_by_default: bool,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(health)
        .service(list_stations_endpoint)
        .service(get_station_chargers_endpoint)
        .service(get_charger_endpoint);
}

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

#[get("/stations")]
async fn list_stations_endpoint(state: web::Data<ApiState>) -> impl Responder {
    let stations: Vec<StationResponse> = state
        .charger_queries
        .list_stations()
        .into_iter()
        .map(station_response)
        .collect();

    HttpResponse::Ok().json(stations)
}

#[get("/stations/{station_id}/chargers")]
async fn get_station_chargers_endpoint(
    state: web::Data<ApiState>,
    path: web::Path<String>,
) -> impl Responder {
    match state.charger_queries.get_station_chargers(&path) {
        Ok(station_chargers) => {
            let chargers: Vec<ChargerResponse> = station_chargers
                .chargers
                .iter()
                .map(|row| {
                    charger_response(
                        &station_chargers.station,
                        station_chargers.status.available,
                        row,
                    )
                })
                .collect();

            HttpResponse::Ok().json(StationChargersResponse {
                station: station_response(station_chargers),
                chargers,
            })
        }
        Err(error) => service_error_response(error),
    }
}

#[get("/stations/{station_id}/chargers/{charger_id}")]
async fn get_charger_endpoint(
    state: web::Data<ApiState>,
    path: web::Path<(String, String)>,
) -> impl Responder {
    let (station_id, charger_id) = path.into_inner();

    match state.charger_queries.get_charger(&station_id, &charger_id) {
        Ok(reading) => HttpResponse::Ok().json(charger_response(
            &reading.station,
            reading.status.available,
            &reading.charger,
        )),
        Err(error) => service_error_response(error),
    }
}

fn station_response(station_chargers: StationChargers) -> StationResponse {
    StationResponse {
        charger_count: station_chargers.chargers.len(),
        station: station_chargers.station,
        status: station_chargers.status,
    }
}

fn charger_response(station: &Station, available: bool, row: &ChargerRow) -> ChargerResponse {
    let charger_id = row.charger_id.trim().to_string();
    let station_name = station.display_name();

    ChargerResponse {
        device: DeviceResponse {
            name: device_name(station_name, &charger_id),
            manufacturer: device_manufacturer(row).to_string(),
            model: DEVICE_MODEL,
        },
        sensors: SensorKind::ALL
            .iter()
            .map(|kind| SensorResponse {
                key: kind.key(),
                name: format!("{station_name} {charger_id} {}", kind.name()),
                value: kind.value(row),
                unit: kind.unit(),
                enabled_by_default: kind.enabled_by_default(),
            })
            .collect(),
        attributes: charger_attributes(row),
        available,
        charger_id,
    }
}

fn service_error_response(error: ServiceError) -> HttpResponse {
    match error {
        ServiceError::StationNotFound(_) | ServiceError::ChargerNotFound { .. } => {
            HttpResponse::NotFound().json(serde_json::json!({
                "error": error.to_string()
            }))
        }
    }
}
