//! # PlanSync Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port/adapter interfaces (traits) for the portal, the details API and the
//!   remote calendar
//! - The event codec and the calendar reconciliation engine
//! - The polling cycle that ties fetch, enrichment and reconciliation together
//!
//! ## Architecture Principles
//! - Only depends on `plansync-domain`
//! - No HTTP or platform code
//! - All external dependencies via traits

pub mod calendar_ports;
pub mod planning;
pub mod sync;

pub use calendar_ports::CalendarClient;
pub use planning::{
    CycleContext, CycleOutcome, DetailsLookup, PlanningWindow, SessionProvider, SessionToken,
    StatusSnapshot, SyncCycle, SyncStatus, WorkOrderSource,
};
pub use sync::{
    Clock, EngineConfig, EventCodec, ManualClock, ReconciliationEngine, RunState,
    StaticMailboxMap, SystemClock, UserMailboxMap,
};
