use std::sync::mpsc::{Receiver, Sender, channel};
use std::sync::{
    Arc, Mutex, PoisonError, RwLock,
    atomic::{AtomicBool, Ordering},
};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::adapters::keco_http::{KecoClient, KecoClientError};
use crate::domain::charger_merge::{LastKnownCache, merge_rows};
use crate::domain::models::{ChargerRow, Snapshot, Station};
use crate::domain::refresh_state::{Clock, CoordinatorState, CycleOutcome, FailureTracker};

pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_secs(300);

const STOP_CHECK_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("first refresh of station {station_id} failed: {source}")]
    FirstRefresh {
        station_id: String,
        #[source]
        source: KecoClientError,
    },
}

/// Broadcast to subscribers after a cycle that changed what readers see.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordinatorEvent {
    DataUpdated {
        station_id: String,
    },
    RefreshFailed {
        station_id: String,
        consecutive_failures: u32,
        error: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoordinatorStatus {
    pub state: CoordinatorState,
    pub last_outcome: Option<CycleOutcome>,
    pub consecutive_failures: u32,
    pub failure_threshold: u32,
    /// False once a failure has been surfaced, until the next success.
    pub available: bool,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

#[derive(Debug)]
struct Published {
    snapshot: Arc<Snapshot>,
    status: CoordinatorStatus,
}

/// Read side of one coordinator. Cloning is cheap; readers only ever see the
/// most recently published snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotHandle {
    published: Arc<RwLock<Published>>,
    subscribers: Arc<Mutex<Vec<Sender<CoordinatorEvent>>>>,
}

impl SnapshotHandle {
    fn new(failure_threshold: u32) -> Self {
        Self {
            published: Arc::new(RwLock::new(Published {
                snapshot: Arc::new(Snapshot::empty()),
                status: CoordinatorStatus {
                    state: CoordinatorState::Idle,
                    last_outcome: None,
                    consecutive_failures: 0,
                    failure_threshold,
                    available: true,
                    last_success_at: None,
                    last_error: None,
                },
            })),
            subscribers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn get_snapshot(&self, station_id: &str) -> Vec<ChargerRow> {
        self.snapshot().rows(station_id).to_vec()
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        let published = self.published.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&published.snapshot)
    }

    pub fn status(&self) -> CoordinatorStatus {
        let published = self.published.read().unwrap_or_else(PoisonError::into_inner);
        published.status.clone()
    }

    pub fn subscribe(&self) -> Receiver<CoordinatorEvent> {
        let (sender, receiver) = channel();
        self.add_subscriber(sender);
        receiver
    }

    pub fn add_subscriber(&self, sender: Sender<CoordinatorEvent>) {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(sender);
    }

    fn update<T>(&self, op: impl FnOnce(&mut Published) -> T) -> T {
        let mut published = self
            .published
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        op(&mut published)
    }

    fn notify(&self, event: CoordinatorEvent) {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|sender| sender.send(event.clone()).is_ok());
    }
}

/// Polls one station on a fixed schedule and publishes the merged rows.
pub struct RefreshCoordinator<C, Cl> {
    client: C,
    clock: Cl,
    station: Station,
    cache: LastKnownCache,
    failures: FailureTracker,
    handle: SnapshotHandle,
}

impl<C, Cl> RefreshCoordinator<C, Cl>
where
    C: KecoClient,
    Cl: Clock,
{
    pub fn new(client: C, clock: Cl, station: Station, max_consecutive_failures: u32) -> Self {
        let failures = FailureTracker::new(max_consecutive_failures);
        let handle = SnapshotHandle::new(failures.threshold());
        Self {
            client,
            clock,
            station,
            cache: LastKnownCache::new(),
            failures,
            handle,
        }
    }

    pub fn station(&self) -> &Station {
        &self.station
    }

    pub fn handle(&self) -> SnapshotHandle {
        self.handle.clone()
    }

    /// Runs the activation refresh. Failures here are not tolerated.
    pub fn first_refresh(&mut self) -> Result<CycleOutcome, CoordinatorError> {
        if !self.station.is_configured() {
            return Ok(self.skip());
        }

        self.begin_cycle();
        match self.client.fetch_chargers(&self.station.id) {
            Ok(rows) => Ok(self.apply_success(rows)),
            Err(error) => {
                self.failures.record_failure();
                self.handle.update(|published| {
                    published.status.state = CoordinatorState::Idle;
                    published.status.consecutive_failures = self.failures.consecutive_failures();
                    published.status.last_error = Some(error.to_string());
                });
                Err(CoordinatorError::FirstRefresh {
                    station_id: self.station.id.clone(),
                    source: error,
                })
            }
        }
    }

    pub fn refresh(&mut self) -> CycleOutcome {
        if !self.station.is_configured() {
            return self.skip();
        }

        self.begin_cycle();
        match self.client.fetch_chargers(&self.station.id) {
            Ok(rows) => self.apply_success(rows),
            Err(error) => self.apply_failure(error),
        }
    }

    fn begin_cycle(&self) {
        self.handle.update(|published| {
            published.status.state = CoordinatorState::Fetching;
        });
    }

    fn skip(&mut self) -> CycleOutcome {
        tracing::debug!(
            station_name = %self.station.display_name(),
            "station has no identifier; publishing empty snapshot"
        );
        self.handle.update(|published| {
            published.snapshot = Arc::new(Snapshot::empty());
            published.status.state = CoordinatorState::Idle;
            published.status.last_outcome = Some(CycleOutcome::Skipped);
        });
        CycleOutcome::Skipped
    }

    fn apply_success(&mut self, rows: Vec<ChargerRow>) -> CycleOutcome {
        self.failures.record_success();

        let fetched = rows.len();
        let merged = merge_rows(rows, &mut self.cache);
        if !merged.carried_over.is_empty() {
            tracing::info!(
                station_id = %self.station.id,
                carried_over = ?merged.carried_over,
                "chargers missing from listing; keeping last known rows"
            );
        }
        tracing::debug!(
            station_id = %self.station.id,
            fetched,
            published = merged.rows.len(),
            "refresh merged"
        );

        self.publish(
            Snapshot::single(self.station.id.clone(), merged.rows),
            CycleOutcome::Merged,
        );
        CycleOutcome::Merged
    }

    fn publish(&mut self, snapshot: Snapshot, outcome: CycleOutcome) {
        let now = self.clock.now();
        let changed = self.handle.update(|published| {
            let changed = *published.snapshot != snapshot || !published.status.available;
            if *published.snapshot != snapshot {
                published.snapshot = Arc::new(snapshot);
            }
            published.status = CoordinatorStatus {
                state: CoordinatorState::Idle,
                last_outcome: Some(outcome),
                consecutive_failures: self.failures.consecutive_failures(),
                failure_threshold: self.failures.threshold(),
                available: true,
                last_success_at: Some(now),
                last_error: None,
            };
            changed
        });

        if changed {
            self.handle.notify(CoordinatorEvent::DataUpdated {
                station_id: self.station.id.clone(),
            });
        }
    }

    fn apply_failure(&mut self, error: KecoClientError) -> CycleOutcome {
        let outcome = self.failures.record_failure();
        let consecutive_failures = self.failures.consecutive_failures();
        let threshold = self.failures.threshold();

        match outcome {
            CycleOutcome::Failed { .. } => tracing::error!(
                station_id = %self.station.id,
                consecutive_failures,
                threshold,
                error = %error,
                "KECO refresh failed; marking chargers unavailable"
            ),
            _ => tracing::warn!(
                station_id = %self.station.id,
                consecutive_failures,
                threshold,
                error = %error,
                "KECO refresh failed; keeping previous state"
            ),
        }

        let surfaced = outcome.is_surfaced_failure();
        self.handle.update(|published| {
            published.status.state = CoordinatorState::Idle;
            published.status.last_outcome = Some(outcome);
            published.status.consecutive_failures = consecutive_failures;
            published.status.last_error = Some(error.to_string());
            if surfaced {
                published.status.available = false;
            }
        });

        if surfaced {
            self.handle.notify(CoordinatorEvent::RefreshFailed {
                station_id: self.station.id.clone(),
                consecutive_failures,
                error: error.to_string(),
            });
        }

        outcome
    }
}

/// Runs refresh cycles on a dedicated thread, one at a time, each scheduled a
/// full `interval` after the previous one finished.
pub fn start_coordinator<C, Cl>(
    mut coordinator: RefreshCoordinator<C, Cl>,
    interval: Duration,
    stop_flag: Arc<AtomicBool>,
) -> JoinHandle<()>
where
    C: KecoClient,
    Cl: Clock + Send + 'static,
{
    std::thread::spawn(move || {
        while wait_for_next_tick(interval, &stop_flag) {
            coordinator.refresh();
        }
        tracing::debug!(station_id = %coordinator.station().id, "coordinator stopped");
    })
}

fn wait_for_next_tick(interval: Duration, stop_flag: &AtomicBool) -> bool {
    let deadline = Instant::now() + interval;
    loop {
        if stop_flag.load(Ordering::Relaxed) {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        std::thread::sleep(STOP_CHECK_INTERVAL.min(deadline - now));
    }
}
