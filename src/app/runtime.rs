use std::sync::mpsc::{Receiver, RecvTimeoutError, channel};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::thread::JoinHandle;
use std::time::Duration;

use actix_cors::Cors;
use actix_web::{App, HttpServer, web};

use crate::adapters::api::{ApiState, configure_routes};
use crate::adapters::keco_http::{KecoClient, KecoHttpClient};
use crate::adapters::keco_replay::KecoReplayClient;
use crate::app::config::AppConfig;
use crate::app::coordinator::{
    CoordinatorEvent, DEFAULT_UPDATE_INTERVAL, RefreshCoordinator, SystemClock, start_coordinator,
};
use crate::app::error::AppError;
use crate::app::services::{RegisteredStation, SnapshotQueryService};
use crate::domain::charger_status::status_text;

type Coordinator = RefreshCoordinator<Arc<dyn KecoClient>, SystemClock>;

const EVENT_POLL_INTERVAL: Duration = Duration::from_secs(1);

pub fn run(config: AppConfig) -> Result<(), AppError> {
    let coordinators = activate(&config)?;
    let api_state = ApiState {
        charger_queries: SnapshotQueryService::new(
            register(&coordinators),
            config.enabled_chargers.clone(),
        ),
    };

    let stop_flag = Arc::new(AtomicBool::new(false));
    let threads = spawn_all(coordinators, &stop_flag);

    let http_bind = config.http_bind.clone();
    tracing::info!(bind = %http_bind, "http server starting");

    let server_result = actix_web::rt::System::new().block_on(async move {
        HttpServer::new(move || {
            App::new()
                .wrap(
                    Cors::default()
                        .allow_any_origin()
                        .allowed_methods(vec!["GET"]),
                )
                .app_data(web::Data::new(api_state.clone()))
                .configure(configure_routes)
        })
        .bind(&http_bind)?
        .run()
        .await
    });

    stop_all(&stop_flag, threads)?;
    server_result.map_err(AppError::runtime)
}

pub fn run_headless(config: AppConfig) -> Result<(), AppError> {
    let coordinators = activate(&config)?;
    let registered = register(&coordinators);

    let (sender, events) = channel();
    for station in &registered {
        station.handle.add_subscriber(sender.clone());
    }
    drop(sender);

    let stop_flag = Arc::new(AtomicBool::new(false));
    let threads = spawn_all(coordinators, &stop_flag);

    forward_events(&events, &registered, &threads);
    stop_all(&stop_flag, threads)
}

/// Logs coordinator events until every coordinator thread has exited.
fn forward_events(
    events: &Receiver<CoordinatorEvent>,
    registered: &[RegisteredStation],
    threads: &[JoinHandle<()>],
) {
    loop {
        match events.recv_timeout(EVENT_POLL_INTERVAL) {
            Ok(event) => log_event(registered, event),
            Err(RecvTimeoutError::Timeout) => {
                if threads.iter().all(JoinHandle::is_finished) {
                    tracing::warn!("all coordinator threads exited");
                    return;
                }
            }
            Err(RecvTimeoutError::Disconnected) => return,
        }
    }
}

fn build_client(config: &AppConfig) -> Result<Arc<dyn KecoClient>, AppError> {
    if let Some(path) = &config.replay_file {
        tracing::warn!(path = %path, "using replay client; KECO API will not be contacted");
        let client = KecoReplayClient::from_file(path).map_err(AppError::setup)?;
        return Ok(Arc::new(client));
    }

    let client = KecoHttpClient::new(
        &config.api_key,
        &config.api_base,
        Duration::from_secs(config.request_timeout_secs),
    )
    .map_err(AppError::setup)?;
    Ok(Arc::new(client))
}

/// Creates one coordinator per station and blocks on its first refresh.
/// Any first-refresh failure aborts activation.
fn activate(config: &AppConfig) -> Result<Vec<Coordinator>, AppError> {
    let client = build_client(config)?;

    config
        .stations
        .iter()
        .map(|station| {
            let mut coordinator = RefreshCoordinator::new(
                Arc::clone(&client),
                SystemClock,
                station.clone(),
                config.max_consecutive_failures,
            );
            let outcome = coordinator.first_refresh().map_err(AppError::setup)?;

            tracing::info!(
                station_id = %station.id,
                station_name = %station.display_name(),
                outcome = ?outcome,
                chargers = coordinator.handle().get_snapshot(&station.id).len(),
                "station activated"
            );
            Ok(coordinator)
        })
        .collect()
}

fn register(coordinators: &[Coordinator]) -> Vec<RegisteredStation> {
    coordinators
        .iter()
        .map(|coordinator| RegisteredStation {
            station: coordinator.station().clone(),
            handle: coordinator.handle(),
        })
        .collect()
}

fn spawn_all(coordinators: Vec<Coordinator>, stop_flag: &Arc<AtomicBool>) -> Vec<JoinHandle<()>> {
    coordinators
        .into_iter()
        .map(|coordinator| {
            start_coordinator(coordinator, DEFAULT_UPDATE_INTERVAL, Arc::clone(stop_flag))
        })
        .collect()
}

fn stop_all(stop_flag: &AtomicBool, threads: Vec<JoinHandle<()>>) -> Result<(), AppError> {
    stop_flag.store(true, Ordering::Relaxed);

    let panicked = threads
        .into_iter()
        .map(JoinHandle::join)
        .filter(Result::is_err)
        .count();
    if panicked > 0 {
        return Err(AppError::runtime(format!(
            "{panicked} coordinator thread(s) panicked"
        )));
    }

    Ok(())
}

fn log_event(registered: &[RegisteredStation], event: CoordinatorEvent) {
    match event {
        CoordinatorEvent::DataUpdated { station_id } => {
            let Some(station) = registered
                .iter()
                .find(|station| station.station.id == station_id)
            else {
                return;
            };
            let rows = station.handle.get_snapshot(&station_id);
            tracing::info!(station_id = %station_id, chargers = rows.len(), "station data updated");
            for row in rows {
                tracing::info!(
                    station_id = %station_id,
                    charger_id = %row.charger_id,
                    status = %status_text(&row.status_code),
                    status_updated_at = %row.status_updated_at,
                    "charger status"
                );
            }
        }
        CoordinatorEvent::RefreshFailed {
            station_id,
            consecutive_failures,
            error,
        } => tracing::error!(
            station_id = %station_id,
            consecutive_failures,
            error = %error,
            "station unavailable"
        ),
    }
}
