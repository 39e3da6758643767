//! Health report served by `/health`
//!
//! Derived from the status board only; building a report never calls the
//! portal or Graph.

use chrono::{DateTime, SecondsFormat, Utc};
use plansync_core::StatusSnapshot;
use serde::{Deserialize, Serialize};

pub const NEVER_FETCHED: &str = "Never";
pub const NOT_SCHEDULED: &str = "Not scheduled";

/// Overall state of the poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HealthState {
    /// No cycle has failed since the last successful one.
    Ok,
    /// The most recent cycle failed.
    Degraded,
}

/// Health of the poller
///
/// # Example
/// ```
/// use chrono::Utc;
/// use plansync_api::utils::health::{HealthReport, HealthState};
/// use plansync_core::StatusSnapshot;
///
/// let report = HealthReport::from_snapshot(&StatusSnapshot::default(), Utc::now());
/// assert_eq!(report.status, HealthState::Ok);
/// assert_eq!(report.last_fetch, "Never");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: HealthState,
    pub timestamp: String,
    /// RFC 3339 instant of the last successful fetch, or `Never`.
    pub last_fetch: String,
    /// RFC 3339 instant of the next planned fetch, or `Not scheduled`.
    pub next_fetch: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub cycles: u64,
}

impl HealthReport {
    pub fn from_snapshot(snapshot: &StatusSnapshot, now: DateTime<Utc>) -> Self {
        let status =
            if snapshot.last_error.is_some() { HealthState::Degraded } else { HealthState::Ok };
        Self {
            status,
            timestamp: iso(now),
            last_fetch: snapshot.last_fetch.map_or_else(|| NEVER_FETCHED.to_string(), iso),
            next_fetch: snapshot.next_fetch.map_or_else(|| NOT_SCHEDULED.to_string(), iso),
            last_error: snapshot.last_error.clone(),
            cycles: snapshot.cycles,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == HealthState::Ok
    }
}

/// Millisecond RFC 3339 in UTC, e.g. `2025-03-10T07:00:00.000Z`.
pub fn iso(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
