//! Scheduling infrastructure for the polling cycle
//!
//! A cron scheduler drives two jobs against one shared cycle context:
//! - the sync job (poll → enrich → reconcile)
//! - the session refresh job, which renews the portal cookie before it ages
//!   out
//!
//! The scheduler has an explicit start/stop lifecycle, tracks its join
//! handles, cancels in-flight work on stop and wraps every async step in a
//! timeout.

pub mod error;
pub mod sync_scheduler;

pub use error::{SchedulerError, SchedulerResult};
pub use sync_scheduler::{CycleRunner, SyncScheduler, SyncSchedulerConfig};
