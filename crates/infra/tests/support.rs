use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use plansync_core::{
    EngineConfig, EventCodec, ReconciliationEngine, StaticMailboxMap, SyncCycle, SystemClock,
};
use plansync_domain::{
    Config, DetailsConfig, GraphConfig, LoggingConfig, PortalConfig, SchedulerConfig,
    ServerConfig, SyncConfig,
};
use plansync_infra::{
    CachedDetailsLookup, DetailsClient, FormLogin, GraphCalendarClient, HttpClient,
    PortalPlanningClient, PortalSessionProvider,
};
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

pub const ANNA: &str = "anna@example.se";
pub const STORE_PATH: &str = "/200202/cgi/me.cgi/data/store/UserWorkOrderScheduleStore";
pub const EVENTS_PATH: &str = "/v1.0/users/anna%40example.se/events";

/// Configuration pointing every adapter at one mock server.
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
        scheduler: SchedulerConfig::default(),
        server: ServerConfig::default(),
        logging: LoggingConfig::default(),
        mailboxes: BTreeMap::from([("anna".to_string(), ANNA.to_string())]),
    }
}

/// Real adapters wired into a cycle.
pub fn pipeline(config: &Config) -> SyncCycle {
    let clock = Arc::new(SystemClock);
    let http = HttpClient::builder().max_attempts(1).build().expect("http client");

    let login = Arc::new(FormLogin::from_config(&config.portal).expect("login"));
    let sessions = PortalSessionProvider::new(login, http.clone(), &config.portal, clock.clone());
    let source = PortalPlanningClient::new(http.clone(), &config.portal);
    let details = CachedDetailsLookup::new(
        Arc::new(DetailsClient::new(http, config.details.base_url.clone(), "next-token")),
        std::time::Duration::from_secs(config.details.cache_ttl_secs),
    );
    let calendar = GraphCalendarClient::from_config(&config.graph).expect("graph client");

    let engine = ReconciliationEngine::new(
        Arc::new(calendar),
        Arc::new(StaticMailboxMap::new(config.mailboxes.clone())),
        clock.clone(),
        EventCodec::from_config(&config.sync).expect("codec"),
        EngineConfig::from(&config.sync),
    );

    SyncCycle::new(
        Arc::new(sessions),
        Arc::new(source),
        Arc::new(details),
        Arc::new(engine),
        clock,
    )
    .with_portal_zone(chrono_tz::Europe::Stockholm)
}

pub async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/200202/client/"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("set-cookie", "milltimesessionid=SESSION1; Path=/; HttpOnly"),
        )
        .mount(server)
        .await;
}

pub async fn mount_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/tenant/oauth2/v2.0/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "expires_in": 3599,
            "access_token": "graph-token"
        })))
        .mount(server)
        .await;
}

pub async fn mount_details(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path_regex(r"^/v1/workorder/[^/]+$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "projectnumber": 1203,
            "projectname": "Hall B",
            "description": "Byt fläkt",
            "customername": "Acme AB",
            "statusname": "Planerad"
        })))
        .mount(server)
        .await;
}

pub async fn mount_schedule(server: &MockServer, rows: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(STORE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(rows))
        .mount(server)
        .await;
}

/// Schedule row starting `days` from now, in portal-local naive time.
pub fn row(id: u32, user: &str, days: i64) -> serde_json::Value {
    let start = (Utc::now() + Duration::days(days))
        .with_timezone(&chrono_tz::Europe::Stockholm)
        .date_naive()
        .and_hms_opt(8, 0, 0)
        .expect("valid time");
    serde_json::json!({
        "Id": id,
        "WorkOrderId": format!("WO-{id}"),
        "Name": "Montage",
        "UserName": user,
        "ProductionStart": start.format("%Y-%m-%dT%H:%M:%S").to_string(),
        "ProductionEnd": (start + Duration::hours(4)).format("%Y-%m-%dT%H:%M:%S").to_string()
    })
}

/// Graph event JSON as returned by the events endpoints.
pub fn graph_event(id: &str, subject: &str, start: DateTime<Utc>) -> serde_json::Value {
    let at = |instant: DateTime<Utc>| {
        serde_json::json!({
            "dateTime": instant.format("%Y-%m-%dT%H:%M:%S%.7f").to_string(),
            "timeZone": "UTC"
        })
    };
    serde_json::json!({
        "id": id,
        "subject": subject,
        "body": { "contentType": "text", "content": "" },
        "start": at(start),
        "end": at(start + Duration::hours(4)),
        "location": { "displayName": "" },
        "showAs": "busy"
    })
}

/// Answer an event POST by echoing the payload back with a fixed id.
pub fn echo_created(request: &Request) -> ResponseTemplate {
    let mut body: serde_json::Value =
        serde_json::from_slice(&request.body).unwrap_or(serde_json::Value::Null);
    body["id"] = serde_json::json!("created-1");
    ResponseTemplate::new(201).set_body_json(body)
}

/// Decoded `$filter` of a listing request.
pub fn filter_of(request: &Request) -> Option<String> {
    request
        .url
        .query_pairs()
        .find(|(key, _)| key == "$filter")
        .map(|(_, value)| value.into_owned())
}

pub async fn requests_with(server: &MockServer, verb: &str, path_prefix: &str) -> Vec<Request> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|request| {
            request.method.as_str() == verb && request.url.path().starts_with(path_prefix)
        })
        .collect()
}
