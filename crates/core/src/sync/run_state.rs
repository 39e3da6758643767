//! Process-lifetime memory of the previous completed batch
//!
//! The remote calendar stays the source of truth. This snapshot only feeds
//! the change summary in run reports and is empty after a restart.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use plansync_domain::{EventDraft, EventField, RunDelta, WorkOrder, WorkOrderId};

use super::codec::EventCodec;

#[derive(Debug, Default)]
struct Snapshot {
    orders: BTreeMap<WorkOrderId, WorkOrder>,
    completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
pub struct RunState {
    inner: RwLock<Snapshot>,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Completion time of the last run that replaced the snapshot.
    pub fn last_completed(&self) -> Option<DateTime<Utc>> {
        self.inner.read().completed_at
    }

    pub fn len(&self) -> usize {
        self.inner.read().orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().orders.is_empty()
    }

    pub fn get(&self, id: &WorkOrderId) -> Option<WorkOrder> {
        self.inner.read().orders.get(id).cloned()
    }

    /// Compare `orders` against the stored snapshot.
    pub fn delta(&self, orders: &[WorkOrder], codec: &EventCodec) -> RunDelta {
        let snapshot = self.inner.read();
        if snapshot.completed_at.is_none() {
            return RunDelta::default();
        }

        let mut seen = BTreeSet::new();
        let mut delta = RunDelta { has_baseline: true, ..RunDelta::default() };
        for order in orders {
            if !seen.insert(order.id.clone()) {
                continue;
            }
            match snapshot.orders.get(&order.id) {
                None => delta.added.push(order.id.clone()),
                Some(previous) => {
                    let fields = draft_changes(&codec.encode(previous), &codec.encode(order));
                    if !fields.is_empty() {
                        delta.changed.push((order.id.clone(), fields));
                    }
                }
            }
        }
        delta.removed =
            snapshot.orders.keys().filter(|id| !seen.contains(*id)).cloned().collect();
        delta
    }

    /// Replace the snapshot. Call only after a run finished uncancelled.
    pub fn replace(&self, orders: &[WorkOrder], completed_at: DateTime<Utc>) {
        let orders = orders.iter().map(|order| (order.id.clone(), order.clone())).collect();
        *self.inner.write() = Snapshot { orders, completed_at: Some(completed_at) };
    }
}

fn draft_changes(previous: &EventDraft, current: &EventDraft) -> Vec<EventField> {
    let mut fields = Vec::new();
    if previous.subject != current.subject {
        fields.push(EventField::Subject);
    }
    if previous.start != current.start {
        fields.push(EventField::Start);
    }
    if previous.end != current.end {
        fields.push(EventField::End);
    }
    if previous.body != current.body {
        fields.push(EventField::Body);
    }
    if previous.location != current.location {
        fields.push(EventField::Location);
    }
    if previous.show_as != current.show_as {
        fields.push(EventField::ShowAs);
    }
    fields
}
