//! Shared view of the most recent polling cycle

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use plansync_domain::{PlannedWorkOrder, SyncReport};
use serde::Serialize;

/// Point-in-time copy of [`SyncStatus`].
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    pub last_fetch: Option<DateTime<Utc>>,
    pub next_fetch: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub cycles: u64,
}

#[derive(Debug, Default)]
struct Inner {
    snapshot: StatusSnapshot,
    planning: Option<Vec<PlannedWorkOrder>>,
    report: Option<SyncReport>,
}

/// Results of past cycles, written by the scheduler and read by the status
/// server.
#[derive(Debug, Default)]
pub struct SyncStatus {
    inner: RwLock<Inner>,
    interval: Option<Duration>,
}

impl SyncStatus {
    /// Status board that predicts the next fetch `interval` after the last one.
    pub fn with_interval(interval: Duration) -> Self {
        Self { inner: RwLock::default(), interval: Some(interval) }
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        self.inner.read().snapshot.clone()
    }

    /// Schedule rows of the last successful fetch.
    pub fn planning(&self) -> Option<Vec<PlannedWorkOrder>> {
        self.inner.read().planning.clone()
    }

    pub fn last_report(&self) -> Option<SyncReport> {
        self.inner.read().report.clone()
    }

    pub fn record_fetch(&self, at: DateTime<Utc>, planning: Vec<PlannedWorkOrder>) {
        let mut inner = self.inner.write();
        inner.snapshot.last_fetch = Some(at);
        inner.snapshot.next_fetch = self.interval.map(|interval| at + interval);
        inner.planning = Some(planning);
    }

    pub fn record_report(&self, report: SyncReport) {
        let mut inner = self.inner.write();
        inner.snapshot.cycles += 1;
        inner.snapshot.last_error = None;
        inner.report = Some(report);
    }

    pub fn record_error(&self, message: impl Into<String>) {
        let mut inner = self.inner.write();
        inner.snapshot.cycles += 1;
        inner.snapshot.last_error = Some(message.into());
    }

    /// Override the predicted next fetch, e.g. from the scheduler's own plan.
    pub fn set_next_fetch(&self, at: Option<DateTime<Utc>>) {
        self.inner.write().snapshot.next_fetch = at;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_predicts_next_run_from_interval() {
        let status = SyncStatus::with_interval(Duration::hours(1));
        let at = Utc::now();
        status.record_fetch(at, Vec::new());

        let snapshot = status.snapshot();
        assert_eq!(snapshot.last_fetch, Some(at));
        assert_eq!(snapshot.next_fetch, Some(at + Duration::hours(1)));
        assert_eq!(status.planning().map(|rows| rows.len()), Some(0));
    }

    #[test]
    fn report_clears_previous_error() {
        let status = SyncStatus::default();
        status.record_error("portal down");
        assert_eq!(status.snapshot().last_error.as_deref(), Some("portal down"));

        status.record_report(SyncReport::new(Utc::now()));
        let snapshot = status.snapshot();
        assert_eq!(snapshot.last_error, None);
        assert_eq!(snapshot.cycles, 2);
    }
}
