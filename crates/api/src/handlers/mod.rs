//! HTTP status surface
//!
//! Every handler reads from the shared [`SyncStatus`] board or the log
//! buffer. None of them call the portal or Graph.

mod error;
mod planning;
mod status;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use chrono_tz::Tz;
use plansync_core::SyncStatus;
use plansync_infra::LogBuffer;
use tower_http::cors::CorsLayer;

pub use error::ApiError;

/// State shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub status: Arc<SyncStatus>,
    pub logs: LogBuffer,
    /// Zone used when rendering times on the HTML page.
    pub zone: Tz,
}

impl AppState {
    pub fn new(status: Arc<SyncStatus>, logs: LogBuffer, zone: Tz) -> Self {
        Self { status, logs, zone }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(status::index))
        .route("/health", get(status::health))
        .route("/api/plannedWorkOrders", get(planning::planned_work_orders))
        .route("/api/sync/last", get(planning::last_report))
        .route("/api/logs", get(planning::logs))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
