use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use plansync_api::AppState;
use plansync_core::SyncStatus;
use plansync_domain::{
    Config, DetailsConfig, GraphConfig, LoggingConfig, PortalConfig, SchedulerConfig,
    ServerConfig, SyncConfig,
};
use plansync_infra::LogBuffer;
use tower::ServiceExt;
use wiremock::MockServer;

pub const ANNA: &str = "anna@example.se";

pub fn state() -> AppState {
    AppState::new(
        Arc::new(SyncStatus::with_interval(chrono::Duration::hours(1))),
        LogBuffer::new(100),
        chrono_tz::Europe::Stockholm,
    )
}

/// Issue a GET and return status plus raw body.
pub async fn get(router: Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = router
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

pub async fn get_json(router: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let (status, body) = get(router, uri).await;
    (status, serde_json::from_slice(&body).unwrap())
}

/// Configuration with every external endpoint on one mock server.
pub fn config(server: &MockServer, cookie_cache: &Path) -> Config {
    Config {
        portal: PortalConfig {
            base_url: format!("{}/200202", server.uri()),
            user_id: 32,
            username: "sync".into(),
            password: Some("pw".into()),
            time_zone: "Europe/Stockholm".into(),
            cookie_cache_path: cookie_cache.display().to_string(),
            request_timeout_secs: 5,
            login_path: "/client/".into(),
        },
        details: DetailsConfig {
            base_url: server.uri(),
            token: Some("next-token".into()),
            cache_ttl_secs: 60,
            request_timeout_secs: 5,
        },
        graph: GraphConfig {
            tenant_id: "tenant".into(),
            client_id: "client".into(),
            client_secret: Some("secret".into()),
            base_url: format!("{}/v1.0", server.uri()),
            login_base_url: server.uri(),
        },
        sync: SyncConfig { retry_backoff_ms: 10, ..SyncConfig::default() },
        scheduler: SchedulerConfig {
            // Never fires during a test run.
            sync_cron: "0 0 0 1 1 *".into(),
            session_refresh_cron: "0 0 0 1 1 *".into(),
            run_on_start: true,
            ..SchedulerConfig::default()
        },
        server: ServerConfig::default(),
        logging: LoggingConfig::default(),
        mailboxes: BTreeMap::from([("anna".to_string(), ANNA.to_string())]),
    }
}
