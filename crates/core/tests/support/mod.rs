//! Shared test helpers for `plansync-core` integration tests.
//!
//! These helpers provide an in-memory calendar, scripted portal fakes and
//! work order fixtures so that tests can focus on behaviour instead of
//! boilerplate.

pub mod calendar;
pub mod portal;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use plansync_core::{
    EngineConfig, EventCodec, ManualClock, ReconciliationEngine, StaticMailboxMap,
};
use plansync_domain::{WorkOrder, WorkOrderDetails, WorkOrderId};

pub use calendar::{CallKind, FakeCalendar};

/// Fixed "now" used by every fixture: 2025-03-10 06:00 UTC.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, 6, 0, 0).unwrap()
}

pub fn codec() -> EventCodec {
    EventCodec::new("Work Order", "Europe/Stockholm").unwrap()
}

/// Work order for `user` starting `hours` after [`t0`] and lasting four hours.
pub fn order(id: &str, user: &str, hours: i64) -> WorkOrder {
    let start = t0() + chrono::Duration::hours(hours);
    WorkOrder {
        id: WorkOrderId::new(id),
        order_id: format!("WO-{id}"),
        user_key: user.to_string(),
        name: format!("Montage {id}"),
        start,
        end: start + chrono::Duration::hours(4),
        details: WorkOrderDetails {
            project_number: "1203".into(),
            project_name: "Hall B".into(),
            description: None,
            customer_name: "Acme AB".into(),
            status_name: "Planerad".into(),
        },
        location: "Acme AB".into(),
    }
}

pub fn mailboxes() -> StaticMailboxMap {
    [("anna", "anna@example.se"), ("bert", "bert@example.se"), ("cleo", "cleo@example.se")]
        .into_iter()
        .collect()
}

pub fn fast_config() -> EngineConfig {
    EngineConfig {
        max_concurrent_users: 2,
        call_timeout: Duration::from_secs(5),
        retry_backoff: Duration::from_millis(10),
    }
}

pub fn engine(calendar: &FakeCalendar) -> ReconciliationEngine {
    engine_with(calendar, fast_config())
}

pub fn engine_with(calendar: &FakeCalendar, config: EngineConfig) -> ReconciliationEngine {
    ReconciliationEngine::new(
        Arc::new(calendar.clone()),
        Arc::new(mailboxes()),
        Arc::new(ManualClock::new(t0())),
        codec(),
        config,
    )
}
