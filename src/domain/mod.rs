pub mod charger_merge;
pub mod charger_status;
pub mod models;
pub mod refresh_state;
pub mod region;
pub mod sensor;
pub mod station_search;
pub mod timestamp;
