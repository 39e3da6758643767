//! Planning portal polling

pub mod cycle;
pub mod ports;
pub mod status;

pub use cycle::{CycleContext, CycleOutcome, SyncCycle};
pub use ports::{DetailsLookup, PlanningWindow, SessionProvider, SessionToken, WorkOrderSource};
pub use status::{StatusSnapshot, SyncStatus};
