//! Portal session with an on-disk cookie cache

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use plansync_core::{Clock, SessionProvider, SessionToken};
use plansync_domain::constants::SESSION_COOKIE_MAX_AGE_SECS;
use plansync_domain::{PlanSyncError, PortalConfig, Result};
use reqwest::header::{ACCEPT, COOKIE};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::login::PortalLogin;
use super::planning::{schedule_store_url, session_cookie};
use crate::errors::InfraError;
use crate::http::HttpClient;

/// On-disk cache record; `timestamp` is milliseconds since the Unix epoch.
#[derive(Debug, Serialize, Deserialize)]
struct CachedCookie {
    cookie: String,
    timestamp: i64,
}

/// [`SessionProvider`] that reuses a cached cookie while it is younger than
/// a day and still accepted by the portal, and logs in otherwise.
pub struct PortalSessionProvider {
    login: Arc<dyn PortalLogin>,
    http: HttpClient,
    probe_url: String,
    cache_path: PathBuf,
    max_age: Duration,
    clock: Arc<dyn Clock>,
    /// Serialises logins so concurrent callers share one.
    lock: Mutex<()>,
}

impl PortalSessionProvider {
    pub fn new(
        login: Arc<dyn PortalLogin>,
        http: HttpClient,
        config: &PortalConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            login,
            http,
            probe_url: schedule_store_url(config),
            cache_path: PathBuf::from(&config.cookie_cache_path),
            max_age: Duration::seconds(SESSION_COOKIE_MAX_AGE_SECS),
            clock,
            lock: Mutex::new(()),
        }
    }

    async fn read_cache(&self) -> Option<SessionToken> {
        let raw = match tokio::fs::read_to_string(&self.cache_path).await {
            Ok(raw) => raw,
            Err(err) => {
                debug!(path = %self.cache_path.display(), error = %err, "No cached portal cookie");
                return None;
            }
        };
        let cached: CachedCookie = match serde_json::from_str(&raw) {
            Ok(cached) => cached,
            Err(err) => {
                warn!(error = %err, "Ignoring unreadable cookie cache");
                return None;
            }
        };
        let obtained_at = DateTime::from_timestamp_millis(cached.timestamp)?;
        let token = SessionToken::new(cached.cookie, obtained_at);
        if token.is_older_than(self.max_age, self.clock.now()) {
            info!(obtained_at = %obtained_at, "Cached portal cookie expired");
            return None;
        }
        Some(token)
    }

    async fn write_cache(&self, token: &SessionToken) -> Result<()> {
        let record = CachedCookie {
            cookie: token.cookie().to_string(),
            timestamp: token.obtained_at().timestamp_millis(),
        };
        let json = serde_json::to_string(&record).map_err(|e| PlanSyncError::from(InfraError::from(e)))?;
        tokio::fs::write(&self.cache_path, json)
            .await
            .map_err(|e| PlanSyncError::from(InfraError::from(e)))?;
        debug!(path = %self.cache_path.display(), "Saved portal cookie");
        Ok(())
    }

    /// Whether the portal still accepts `token`.
    async fn probe(&self, token: &SessionToken) -> bool {
        let request = self
            .http
            .request(Method::GET, &self.probe_url)
            .header(ACCEPT, "application/json")
            .header(COOKIE, session_cookie(token));
        match self.http.send(request).await {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                warn!(error = %err, "Cookie validation request failed");
                false
            }
        }
    }

    async fn login_and_cache(&self) -> Result<SessionToken> {
        let cookie = self.login.login().await?;
        let token = SessionToken::new(cookie, self.clock.now());
        // A cache write failure costs one extra login after restart.
        if let Err(err) = self.write_cache(&token).await {
            warn!(error = %err, "Could not cache portal cookie");
        }
        Ok(token)
    }
}

#[async_trait]
impl SessionProvider for PortalSessionProvider {
    #[instrument(skip_all)]
    async fn get_session(&self) -> Result<SessionToken> {
        let _guard = self.lock.lock().await;
        if let Some(token) = self.read_cache().await {
            if self.probe(&token).await {
                info!("Using cached portal cookie");
                return Ok(token);
            }
            info!("Cached portal cookie rejected");
        }
        self.login_and_cache().await
    }

    #[instrument(skip_all)]
    async fn refresh_session(&self) -> Result<SessionToken> {
        let _guard = self.lock.lock().await;
        self.login_and_cache().await
    }

    async fn invalidate(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.cache_path).await {
            Ok(()) => {
                info!("Discarded cached portal cookie");
                Ok(())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(InfraError::from(err).into()),
        }
    }
}
