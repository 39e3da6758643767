//! # PlanSync Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - HTTP client with retry support
//! - Configuration loading (TOML/JSON + environment)
//! - External service integrations (planning portal, details API, Graph)
//! - Log buffer fed by a `tracing` layer
//! - Cron scheduling of the polling cycle
//!
//! ## Architecture
//! - Implements traits defined in `plansync-core`
//! - Contains all "impure" code (network and file I/O, timers)

pub mod config;
pub mod errors;
pub mod http;
pub mod integrations;
pub mod observability;
pub mod scheduling;

// Re-export commonly used items
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder};
pub use integrations::*;
pub use observability::{log_channel, LogBuffer, LogBufferLayer, LogForwarder};
pub use scheduling::{CycleRunner, SchedulerError, SchedulerResult, SyncScheduler, SyncSchedulerConfig};
