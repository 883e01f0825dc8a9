use std::collections::HashSet;

use crate::domain::models::{ChargerRow, Station};

/// Keyword match over a regional charger listing. The upstream API has no
/// keyword endpoint, so the whole region page is filtered locally.
///
/// Matching is a case-insensitive substring test over name, address, operator
/// and identifier. Each station appears once; an empty query matches nothing.
pub fn filter_stations(rows: &[ChargerRow], query: &str) -> Vec<Station> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }

    let mut seen = HashSet::new();
    let mut stations = Vec::new();
    for row in rows {
        let station = Station {
            id: row.station_id.trim().to_string(),
            name: row.station_name.trim().to_string(),
            address: row.address.trim().to_string(),
            operator: row.operator_name.trim().to_string(),
        };
        if station.id.is_empty() || seen.contains(&station.id) {
            continue;
        }

        let haystack = format!(
            "{} {} {} {}",
            station.name, station.address, station.operator, station.id
        )
        .to_lowercase();
        if haystack.contains(&query) {
            seen.insert(station.id.clone());
            stations.push(station);
        }
    }

    stations
}
