use async_trait::async_trait;
use plansync_core::DetailsLookup;
use plansync_domain::{DetailsConfig, PlanSyncError, Result, WorkOrderDetails};
use reqwest::header::ACCEPT;
use reqwest::Method;
use tracing::debug;

use crate::http::{failure_body, HttpClient};

/// Bearer-authenticated client for `GET /v1/workorder/{id}`.
pub struct DetailsClient {
    http: HttpClient,
    base_url: String,
    token: String,
}

impl DetailsClient {
    /// # Errors
    /// `PlanSyncError::Config` when no token is configured.
    pub fn from_config(config: &DetailsConfig) -> Result<Self> {
        let token = config
            .token
            .clone()
            .ok_or_else(|| PlanSyncError::Config("details.token is not set".to_string()))?;
        let http = HttpClient::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self::new(http, config.base_url.clone(), token))
    }

    pub fn new(http: HttpClient, base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }
}

#[async_trait]
impl DetailsLookup for DetailsClient {
    async fn get_details(&self, order_id: &str) -> Result<WorkOrderDetails> {
        let url = format!("{}/v1/workorder/{}", self.base_url, urlencoding::encode(order_id));
        let request = self
            .http
            .request(Method::GET, url)
            .bearer_auth(&self.token)
            .header(ACCEPT, "application/json");

        let response = self
            .http
            .execute(request)
            .await
            .map_err(|err| PlanSyncError::lookup(order_id, err.to_string()))?;

        if !response.status().is_success() {
            let (status, body) = failure_body(response).await;
            return Err(PlanSyncError::lookup(order_id, format!("HTTP {status}: {body}")));
        }

        let details: WorkOrderDetails = response
            .json()
            .await
            .map_err(|err| PlanSyncError::lookup(order_id, format!("malformed details: {err}")))?;
        debug!(order_id, project = %details.project_number, "Fetched work order details");
        Ok(details)
    }
}
