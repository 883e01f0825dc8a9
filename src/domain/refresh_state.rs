use chrono::{DateTime, Utc};
use serde::Serialize;

pub const DEFAULT_MAX_CONSECUTIVE_FAILURES: u32 = 3;

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinatorState {
    Idle,
    Fetching,
}

/// Result of one refresh cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum CycleOutcome {
    /// Fetch succeeded and a merged snapshot was published.
    Merged,
    /// Station has no identifier; an empty snapshot was published.
    Skipped,
    /// Fetch failed below the threshold; the previous snapshot was kept.
    Degraded { consecutive_failures: u32 },
    /// Fetch failed at or above the threshold; the failure was surfaced.
    Failed { consecutive_failures: u32 },
}

impl CycleOutcome {
    pub fn is_surfaced_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Counts consecutive failed refreshes and decides whether a failure is
/// tolerated or surfaced.
///
/// Reaching the threshold does not reset the counter: every further failure
/// while still failing is surfaced as well.
#[derive(Debug, Clone)]
pub struct FailureTracker {
    threshold: u32,
    consecutive_failures: u32,
}

impl FailureTracker {
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold: threshold.max(1),
            consecutive_failures: 0,
        }
    }

    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
    }

    pub fn record_failure(&mut self) -> CycleOutcome {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);

        if self.consecutive_failures < self.threshold {
            CycleOutcome::Degraded {
                consecutive_failures: self.consecutive_failures,
            }
        } else {
            CycleOutcome::Failed {
                consecutive_failures: self.consecutive_failures,
            }
        }
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }
}

impl Default for FailureTracker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONSECUTIVE_FAILURES)
    }
}
