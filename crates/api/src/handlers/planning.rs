//! JSON views of the last cycle

use axum::extract::{Query, State};
use axum::Json;
use plansync_domain::{PlannedWorkOrder, SyncReport};
use serde::Deserialize;

use super::{ApiError, AppState};

/// Schedule rows of the last successful fetch, in the portal's own shape.
pub async fn planned_work_orders(
    State(state): State<AppState>,
) -> Result<Json<Vec<PlannedWorkOrder>>, ApiError> {
    state.status.planning().map(Json).ok_or(ApiError::NotFound("No work orders found"))
}

pub async fn last_report(State(state): State<AppState>) -> Result<Json<SyncReport>, ApiError> {
    state.status.last_report().map(Json).ok_or(ApiError::NotFound("No sync has completed yet"))
}

#[derive(Debug, Default, Deserialize)]
pub struct LogQuery {
    limit: Option<usize>,
}

/// Buffered log lines, newest first.
pub async fn logs(State(state): State<AppState>, Query(query): Query<LogQuery>) -> Json<Vec<String>> {
    let mut lines = state.logs.lines();
    if let Some(limit) = query.limit {
        lines.truncate(limit);
    }
    Json(lines)
}
