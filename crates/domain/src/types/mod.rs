//! Domain types and models

pub mod calendar;
pub mod sync;
pub mod work_order;

pub use calendar::{CalendarEvent, EventDraft, EventField, ShowAs};
pub use sync::{
    Anomaly, AnomalyKind, FetchCoverage, ItemError, RunDelta, SkipReason, SkippedItem,
    SyncBatch, SyncOperation, SyncReport,
};
pub use work_order::{PlannedWorkOrder, WorkOrder, WorkOrderDetails, WorkOrderId};
