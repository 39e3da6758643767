//! App-only access tokens via the OAuth2 client credentials grant

use std::time::{Duration, Instant};

use plansync_domain::{GraphConfig, PlanSyncError, Result};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::types::TokenResponse;
use crate::errors::provider_error;
use crate::http::{failure_body, HttpClient};

const GRAPH_SCOPE: &str = "https://graph.microsoft.com/.default";

/// Tokens are renewed this long before Azure AD says they expire.
const EXPIRY_MARGIN: Duration = Duration::from_secs(300);

#[derive(Debug)]
struct CachedToken {
    value: String,
    renew_at: Instant,
}

/// Client credentials token source for Microsoft Graph.
///
/// The cached token is shared by all calendar calls; concurrent callers that
/// find it stale wait for a single renewal.
pub struct GraphTokenProvider {
    http: HttpClient,
    token_url: String,
    client_id: String,
    client_secret: String,
    cached: Mutex<Option<CachedToken>>,
}

impl GraphTokenProvider {
    /// # Errors
    /// `PlanSyncError::Config` when the client secret is missing.
    pub fn from_config(http: HttpClient, config: &GraphConfig) -> Result<Self> {
        let client_secret = config.client_secret.clone().ok_or_else(|| {
            PlanSyncError::Config("graph.client_secret is not set".to_string())
        })?;
        let token_url = format!(
            "{}/{}/oauth2/v2.0/token",
            config.login_base_url.trim_end_matches('/'),
            config.tenant_id
        );
        Ok(Self {
            http,
            token_url,
            client_id: config.client_id.clone(),
            client_secret,
            cached: Mutex::new(None),
        })
    }

    /// A valid bearer token, renewing it when close to expiry.
    ///
    /// # Errors
    /// `PlanSyncError::Provider` when the token endpoint fails.
    pub async fn access_token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.renew_at {
                return Ok(token.value.clone());
            }
            debug!("Graph access token due for renewal");
        }

        let fresh = self.request_token().await?;
        let value = fresh.value.clone();
        *cached = Some(fresh);
        Ok(value)
    }

    /// Forget the cached token, e.g. after Graph answered 401.
    pub async fn invalidate(&self) {
        *self.cached.lock().await = None;
    }

    async fn request_token(&self) -> Result<CachedToken> {
        let request = self.http.request(reqwest::Method::POST, &self.token_url).form(&[
            ("client_id", self.client_id.as_str()),
            ("scope", GRAPH_SCOPE),
            ("client_secret", self.client_secret.as_str()),
            ("grant_type", "client_credentials"),
        ]);

        let response = self.http.send(request).await.map_err(|e| provider_error(&e))?;
        if !response.status().is_success() {
            let (status, body) = failure_body(response).await;
            return Err(PlanSyncError::provider(status, format!("token request failed: {body}")));
        }

        let token: TokenResponse = response.json().await.map_err(|e| provider_error(&e))?;
        let lifetime = Duration::from_secs(u64::try_from(token.expires_in).unwrap_or(0));
        info!(expires_in = token.expires_in, "Obtained Graph access token");

        Ok(CachedToken {
            value: token.access_token,
            renew_at: Instant::now() + lifetime.saturating_sub(EXPIRY_MARGIN),
        })
    }
}
