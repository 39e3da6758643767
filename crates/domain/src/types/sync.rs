//! Sync batch and report types

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::calendar::EventField;
use super::work_order::{WorkOrder, WorkOrderId};

/// Which users the upstream fetch is known to have covered completely.
///
/// Only confirmed users get a staleness pass; an unconfirmed fetch never
/// causes deletions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "users", rename_all = "snake_case")]
pub enum FetchCoverage {
    /// Every mapped user was covered.
    All,
    /// Only the listed user keys were covered.
    Users(BTreeSet<String>),
    /// Completeness unknown.
    Unconfirmed,
}

impl FetchCoverage {
    pub fn confirms(&self, user_key: &str) -> bool {
        match self {
            Self::All => true,
            Self::Users(users) => users.contains(user_key),
            Self::Unconfirmed => false,
        }
    }
}

/// Input of one reconciliation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncBatch {
    pub work_orders: Vec<WorkOrder>,
    pub coverage: FetchCoverage,
    /// Ids known to exist upstream but absent from `work_orders` this cycle.
    /// Their events are never treated as stale.
    #[serde(default)]
    pub retained: BTreeSet<WorkOrderId>,
}

impl SyncBatch {
    /// Batch from a fetch that covered every user.
    pub fn complete(work_orders: Vec<WorkOrder>) -> Self {
        Self { work_orders, coverage: FetchCoverage::All, retained: BTreeSet::new() }
    }

    pub fn with_coverage(mut self, coverage: FetchCoverage) -> Self {
        self.coverage = coverage;
        self
    }

    pub fn with_retained(mut self, retained: impl IntoIterator<Item = WorkOrderId>) -> Self {
        self.retained.extend(retained);
        self
    }
}

/// Remote operation a report entry refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOperation {
    List,
    Find,
    Create,
    Update,
    Delete,
}

impl fmt::Display for SyncOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::List => "list",
            Self::Find => "find",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// A failed remote operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemError {
    pub user: String,
    pub work_order_id: Option<WorkOrderId>,
    pub event_id: Option<String>,
    pub operation: SyncOperation,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnomalyKind {
    /// More than one remote event carries the same work order id.
    DuplicateEvents { event_ids: Vec<String> },
    /// The batch listed the same work order id more than once.
    DuplicateInBatch,
    /// A tagged subject could not be decoded.
    UndecodableSubject { event_id: String, subject: String },
}

/// Unexpected state observed during a run. Anomalies are never repaired by
/// deleting events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anomaly {
    pub user: String,
    pub work_order_id: Option<WorkOrderId>,
    #[serde(flatten)]
    pub kind: AnomalyKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MappingMissing,
    /// Blank or whitespace-containing id that no subject could carry.
    InvalidId,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedItem {
    pub work_order_id: WorkOrderId,
    pub user: String,
    pub reason: SkipReason,
}

/// Difference between this batch and the previous completed one.
///
/// Derived from in-memory run state, so it is empty after a restart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunDelta {
    pub added: Vec<WorkOrderId>,
    pub removed: Vec<WorkOrderId>,
    pub changed: Vec<(WorkOrderId, Vec<EventField>)>,
    /// False when there was no previous run to compare against.
    pub has_baseline: bool,
}

/// Outcome of one reconciliation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub deleted: usize,
    pub skipped: Vec<SkippedItem>,
    pub failed: usize,
    pub failed_users: BTreeSet<String>,
    pub anomalies: Vec<Anomaly>,
    pub errors: Vec<ItemError>,
    pub cancelled: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub delta: RunDelta,
}

impl SyncReport {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            created: 0,
            updated: 0,
            unchanged: 0,
            deleted: 0,
            skipped: Vec::new(),
            failed: 0,
            failed_users: BTreeSet::new(),
            anomalies: Vec::new(),
            errors: Vec::new(),
            cancelled: false,
            started_at,
            finished_at: started_at,
            delta: RunDelta::default(),
        }
    }

    /// Fold a per-user partial report into this one.
    pub fn merge(&mut self, other: Self) {
        self.created += other.created;
        self.updated += other.updated;
        self.unchanged += other.unchanged;
        self.deleted += other.deleted;
        self.failed += other.failed;
        self.skipped.extend(other.skipped);
        self.failed_users.extend(other.failed_users);
        self.anomalies.extend(other.anomalies);
        self.errors.extend(other.errors);
        self.cancelled |= other.cancelled;
    }

    /// Number of remote writes performed.
    pub fn writes(&self) -> usize {
        self.created + self.updated + self.deleted
    }

    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.failed_users.is_empty() && !self.cancelled
    }
}
