//! Portal login

use async_trait::async_trait;
use plansync_domain::constants::SESSION_COOKIE_NAME;
use plansync_domain::{PlanSyncError, PortalConfig, Result};
use reqwest::header::SET_COOKIE;
use reqwest::Method;
use tracing::{info, warn};

use crate::http::HttpClient;

/// Exchanges portal credentials for a session cookie value.
#[async_trait]
pub trait PortalLogin: Send + Sync {
    /// # Errors
    /// `PlanSyncError::Auth` when the portal rejects the credentials or sets
    /// no session cookie.
    async fn login(&self) -> Result<String>;
}

/// Login by posting the portal's `userlogin`/`password` form.
pub struct FormLogin {
    http: HttpClient,
    url: String,
    username: String,
    password: String,
}

impl FormLogin {
    /// # Errors
    /// `PlanSyncError::Config` when no password is configured.
    pub fn from_config(config: &PortalConfig) -> Result<Self> {
        let password = config.password.clone().ok_or_else(|| {
            PlanSyncError::Config("portal.password is not set".to_string())
        })?;
        let http = HttpClient::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .max_attempts(2)
            .no_redirects()
            .build()?;
        let url = format!(
            "{}/{}",
            config.base_url.trim_end_matches('/'),
            config.login_path.trim_start_matches('/')
        );
        Ok(Self { http, url, username: config.username.clone(), password })
    }
}

#[async_trait]
impl PortalLogin for FormLogin {
    async fn login(&self) -> Result<String> {
        info!(user = %self.username, "Logging in to planning portal");
        let request = self.http.request(Method::POST, &self.url).form(&[
            ("userlogin", self.username.as_str()),
            ("password", self.password.as_str()),
        ]);
        let response = self.http.execute(request).await?;
        let status = response.status();

        if status.is_server_error() {
            return Err(PlanSyncError::Network(format!("portal login returned HTTP {status}")));
        }

        let cookie = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find_map(session_cookie_value);

        match cookie {
            Some(value) => {
                info!("Portal login successful");
                Ok(value)
            }
            None => {
                warn!(%status, "Portal login set no session cookie");
                Err(PlanSyncError::Auth(format!(
                    "portal login rejected (HTTP {}): no {SESSION_COOKIE_NAME} cookie",
                    status.as_u16()
                )))
            }
        }
    }
}

/// Value of the session cookie in one `Set-Cookie` header, if present and
/// non-empty.
fn session_cookie_value(header: &str) -> Option<String> {
    let pair = header.split(';').next()?.trim();
    let (name, value) = pair.split_once('=')?;
    (name.trim() == SESSION_COOKIE_NAME && !value.trim().is_empty())
        .then(|| value.trim().to_string())
}
