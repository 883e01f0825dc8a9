use std::collections::BTreeSet;
use std::sync::Arc;

use thiserror::Error;

use crate::app::coordinator::{CoordinatorStatus, SnapshotHandle};
use crate::domain::models::{ChargerRow, Station};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("station {0} is not registered")]
    StationNotFound(String),
    #[error("charger {charger_id} not found at station {station_id}")]
    ChargerNotFound {
        station_id: String,
        charger_id: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct StationChargers {
    pub station: Station,
    pub status: CoordinatorStatus,
    pub chargers: Vec<ChargerRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChargerReading {
    pub station: Station,
    pub status: CoordinatorStatus,
    pub charger: ChargerRow,
}

pub trait ChargerQueryHandler {
    fn list_stations(&self) -> Vec<StationChargers>;
    fn get_station_chargers(&self, station_id: &str) -> Result<StationChargers, ServiceError>;
    fn get_charger(&self, station_id: &str, charger_id: &str)
    -> Result<ChargerReading, ServiceError>;
}

#[derive(Debug, Clone)]
pub struct RegisteredStation {
    pub station: Station,
    pub handle: SnapshotHandle,
}

/// Read-only view over every coordinator's published snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotQueryService {
    stations: Arc<Vec<RegisteredStation>>,
    enabled_chargers: Option<Arc<BTreeSet<String>>>,
}

impl SnapshotQueryService {
    pub fn new(
        stations: Vec<RegisteredStation>,
        enabled_chargers: Option<BTreeSet<String>>,
    ) -> Self {
        Self {
            stations: Arc::new(stations),
            enabled_chargers: enabled_chargers.map(Arc::new),
        }
    }

    fn find(&self, station_id: &str) -> Result<&RegisteredStation, ServiceError> {
        self.stations
            .iter()
            .find(|registered| {
                registered.station.is_configured() && registered.station.id == station_id
            })
            .ok_or_else(|| ServiceError::StationNotFound(station_id.to_string()))
    }

    fn read(&self, registered: &RegisteredStation) -> StationChargers {
        let chargers: Vec<ChargerRow> = registered
            .handle
            .get_snapshot(&registered.station.id)
            .into_iter()
            .filter(|row| self.is_enabled(row))
            .collect();

        StationChargers {
            station: with_listing_metadata(&registered.station, chargers.first()),
            status: registered.handle.status(),
            chargers,
        }
    }

    fn is_enabled(&self, row: &ChargerRow) -> bool {
        match (&self.enabled_chargers, row.charger_key()) {
            (_, None) => false,
            (None, Some(_)) => true,
            (Some(enabled), Some(key)) => enabled.contains(key),
        }
    }
}

impl ChargerQueryHandler for SnapshotQueryService {
    fn list_stations(&self) -> Vec<StationChargers> {
        self.stations
            .iter()
            .map(|registered| self.read(registered))
            .collect()
    }

    fn get_station_chargers(&self, station_id: &str) -> Result<StationChargers, ServiceError> {
        self.find(station_id).map(|registered| self.read(registered))
    }

    fn get_charger(
        &self,
        station_id: &str,
        charger_id: &str,
    ) -> Result<ChargerReading, ServiceError> {
        let StationChargers {
            station,
            status,
            chargers,
        } = self.get_station_chargers(station_id)?;

        let charger = chargers
            .into_iter()
            .find(|row| row.charger_key() == Some(charger_id.trim()))
            .ok_or_else(|| ServiceError::ChargerNotFound {
                station_id: station_id.to_string(),
                charger_id: charger_id.to_string(),
            })?;

        Ok(ChargerReading {
            station,
            status,
            charger,
        })
    }
}

// Configured metadata wins; blanks are filled from the listing.
fn with_listing_metadata(station: &Station, row: Option<&ChargerRow>) -> Station {
    let Some(row) = row else {
        return station.clone();
    };

    let pick = |configured: &str, listed: &str| {
        if configured.trim().is_empty() {
            listed.trim().to_string()
        } else {
            configured.to_string()
        }
    };

    Station {
        id: station.id.clone(),
        name: pick(&station.name, &row.station_name),
        address: pick(&station.address, &row.address),
        operator: pick(&station.operator, &row.operator_name),
    }
}
