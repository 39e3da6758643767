//! # PlanSync API
//!
//! Application layer - status server, wiring and main entry point.
//!
//! This crate contains:
//! - Application context (dependency injection)
//! - axum handlers for the status page, health check and last-cycle views
//! - Tracing setup for the binary
//!
//! ## Architecture
//! - Depends on `domain`, `core`, and `infra`
//! - Wires up the hexagonal architecture

pub mod context;
pub mod handlers;
pub mod utils;

pub use context::{build_cycle, AppContext};
pub use handlers::{router, ApiError, AppState};
