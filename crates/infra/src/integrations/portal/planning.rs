//! Work order schedule fetch

use async_trait::async_trait;
use plansync_core::{PlanningWindow, SessionToken, WorkOrderSource};
use plansync_domain::constants::SESSION_COOKIE_NAME;
use plansync_domain::{PlanSyncError, PlannedWorkOrder, PortalConfig, Result};
use reqwest::header::{ACCEPT, CONTENT_TYPE, COOKIE};
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::http::{failure_body, HttpClient};

const SCHEDULE_STORE_PATH: &str = "cgi/me.cgi/data/store/UserWorkOrderScheduleStore";
const FILTER_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// The store answers with a bare array; some portal versions wrap it in an
/// envelope that can also report a failed read.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoreResponse {
    Rows(Vec<PlannedWorkOrder>),
    Wrapped {
        #[serde(default)]
        success: Option<bool>,
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        data: Option<Vec<PlannedWorkOrder>>,
    },
}

impl StoreResponse {
    /// Rows of a successful read. A failed envelope or one without `data`
    /// is an error, never an empty schedule.
    fn into_rows(self) -> Result<Vec<PlannedWorkOrder>> {
        match self {
            Self::Rows(rows) => Ok(rows),
            Self::Wrapped { success: Some(false), message, .. } => {
                Err(PlanSyncError::Network(format!(
                    "portal reported a failed read: {}",
                    message.as_deref().unwrap_or("no message")
                )))
            }
            Self::Wrapped { data: Some(rows), .. } => Ok(rows),
            Self::Wrapped { data: None, .. } => {
                Err(PlanSyncError::Network("planning response has no data".to_string()))
            }
        }
    }
}

/// Reads `UserWorkOrderScheduleStore` for one portal user.
pub struct PortalPlanningClient {
    http: HttpClient,
    store_url: String,
}

impl PortalPlanningClient {
    /// # Errors
    /// Propagates HTTP client construction failures.
    pub fn from_config(config: &PortalConfig) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self::new(http, config))
    }

    pub fn new(http: HttpClient, config: &PortalConfig) -> Self {
        Self { http, store_url: schedule_store_url(config) }
    }

    fn url(&self, window: PlanningWindow) -> String {
        let filter = format!(
            r#"[["ProductionEnd",">=","{}"],["ProductionStart","<=","{}"]]"#,
            window.start.format(FILTER_TIME_FORMAT),
            window.end.format(FILTER_TIME_FORMAT)
        );
        format!("{}&filter={}", self.store_url, urlencoding::encode(&filter))
    }
}

#[async_trait]
impl WorkOrderSource for PortalPlanningClient {
    #[instrument(skip_all, fields(start = %window.start, end = %window.end))]
    async fn fetch_planning(
        &self,
        session: &SessionToken,
        window: PlanningWindow,
    ) -> Result<Vec<PlannedWorkOrder>> {
        let request = self
            .http
            .request(Method::GET, self.url(window))
            .header(ACCEPT, "application/json")
            .header(COOKIE, session_cookie(session));
        let response = self.http.execute(request).await?;

        let status = response.status();
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Err(PlanSyncError::Auth(format!("portal rejected session (HTTP {status})")));
        }
        if !status.is_success() {
            let (code, body) = failure_body(response).await;
            return Err(PlanSyncError::Network(format!("portal returned HTTP {code}: {body}")));
        }

        // An expired session is answered with the login page instead of JSON.
        let is_html = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("text/html"));
        if is_html {
            return Err(PlanSyncError::Auth("portal answered with login page".to_string()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| PlanSyncError::Network(format!("failed to read planning response: {e}")))?;
        let rows = serde_json::from_str::<StoreResponse>(&body)
            .map_err(|e| PlanSyncError::Network(format!("malformed planning response: {e}")))?
            .into_rows()?;

        debug!(rows = rows.len(), "Parsed schedule store response");
        Ok(rows)
    }
}

/// Store URL with user and format parameters, ready for a `filter` suffix.
pub(super) fn schedule_store_url(config: &PortalConfig) -> String {
    format!(
        "{}/{}?user={}&type=json",
        config.base_url.trim_end_matches('/'),
        SCHEDULE_STORE_PATH,
        config.user_id
    )
}

pub(super) fn session_cookie(session: &SessionToken) -> String {
    format!("{SESSION_COOKIE_NAME}={}", session.cookie())
}
