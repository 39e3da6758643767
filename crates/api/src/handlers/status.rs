//! Status page and health check

use std::fmt::Write as _;

use axum::extract::State;
use axum::response::Html;
use axum::Json;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use super::AppState;
use crate::utils::health::{HealthReport, NEVER_FETCHED, NOT_SCHEDULED};

const PAGE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S %Z";

pub async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    Json(HealthReport::from_snapshot(&state.status.snapshot(), Utc::now()))
}

pub async fn index(State(state): State<AppState>) -> Html<String> {
    Html(render_index(&state, Utc::now()))
}

fn render_index(state: &AppState, now: DateTime<Utc>) -> String {
    let snapshot = state.status.snapshot();
    let local = |at: DateTime<Utc>| local_time(at, state.zone);

    let mut html = String::from(concat!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n",
        "<title>PlanSync</title>\n",
        "<style>body { font-family: Arial, sans-serif; max-width: 800px; margin: 0 auto; ",
        "padding: 20px; } .endpoint { background: #f5f5f5; padding: 10px; margin: 10px 0; ",
        "border-radius: 4px; } .error { color: #b00020; }</style>\n",
        "</head>\n<body>\n<h1>PlanSync</h1>\n",
    ));
    let _ = writeln!(html, "<p>Version: {}</p>", env!("CARGO_PKG_VERSION"));
    html.push_str("<h2>Endpoints</h2>\n");
    for (path, what) in [
        ("/health", "Health check"),
        ("/api/plannedWorkOrders", "Last fetched work orders"),
        ("/api/sync/last", "Last calendar sync report"),
        ("/api/logs", "Recent log lines"),
    ] {
        let _ = writeln!(
            html,
            "<div class=\"endpoint\"><p>{what}: <code>GET {path}</code></p></div>"
        );
    }

    let _ = writeln!(html, "<p>Server Time: {}</p>", local(now));
    let last = snapshot.last_fetch.map_or_else(|| NEVER_FETCHED.to_string(), local);
    let next = snapshot.next_fetch.map_or_else(|| NOT_SCHEDULED.to_string(), local);
    let _ = writeln!(html, "<p>Last Fetch: {last}</p>");
    let _ = writeln!(html, "<p>Next Fetch: {next}</p>");
    if let Some(error) = &snapshot.last_error {
        let _ = writeln!(html, "<p class=\"error\">Last Error: {}</p>", escape_html(error));
    }
    if let Some(report) = state.status.last_report() {
        let _ = writeln!(
            html,
            "<p>Last Sync: {} created, {} updated, {} deleted, {} failed</p>",
            report.created, report.updated, report.deleted, report.failed
        );
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn local_time(at: DateTime<Utc>, zone: Tz) -> String {
    at.with_timezone(&zone).format(PAGE_TIME_FORMAT).to_string()
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
