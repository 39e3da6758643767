//! Configuration management

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CALL_TIMEOUT_SECS, DEFAULT_EVENT_TAG, DEFAULT_LOG_BUFFER_SIZE,
    DEFAULT_MAX_CONCURRENT_USERS, DEFAULT_RETRY_BACKOFF_MS, DEFAULT_SERVER_PORT,
    DEFAULT_SESSION_REFRESH_CRON, DEFAULT_SYNC_CRON, DEFAULT_SYNC_INTERVAL_SECS,
    DEFAULT_TIME_ZONE,
};
use crate::errors::{PlanSyncError, Result};

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub portal: PortalConfig,
    pub details: DetailsConfig,
    pub graph: GraphConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Portal user key → Outlook mailbox address.
    #[serde(default)]
    pub mailboxes: BTreeMap<String, String>,
}

/// Legacy planning portal configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalConfig {
    /// Base URL including the tenant path, e.g. `https://next.example.se/200202`.
    pub base_url: String,
    /// Portal user whose schedule store is polled.
    pub user_id: u32,
    pub username: String,
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    /// Time zone of the naive production timestamps returned by the portal.
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
    /// Where the session cookie is cached between restarts.
    #[serde(default = "default_cookie_cache_path")]
    pub cookie_cache_path: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Path of the login form, relative to `base_url`.
    #[serde(default = "default_login_path")]
    pub login_path: String,
}

/// Work order details API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailsConfig {
    pub base_url: String,
    #[serde(default, skip_serializing)]
    pub token: Option<String>,
    /// How long fetched details are reused.
    #[serde(default = "default_details_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Microsoft Graph configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    pub tenant_id: String,
    pub client_id: String,
    #[serde(default, skip_serializing)]
    pub client_secret: Option<String>,
    #[serde(default = "default_graph_base_url")]
    pub base_url: String,
    #[serde(default = "default_login_base_url")]
    pub login_base_url: String,
}

/// Reconciliation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Subject tag identifying events owned by PlanSync.
    pub tag: String,
    /// IANA time zone used for event timestamps written to the calendar.
    pub time_zone: String,
    pub max_concurrent_users: usize,
    pub call_timeout_secs: u64,
    pub retry_backoff_ms: u64,
}

/// Scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub sync_cron: String,
    pub session_refresh_cron: String,
    /// Expected interval between sync runs, used for "next fetch" reporting.
    pub sync_interval_secs: u64,
    pub job_timeout_secs: u64,
    /// How long a timed-out cycle may take to finish its current work order.
    pub cancel_grace_secs: u64,
    pub run_on_start: bool,
}

/// Status server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    pub filter: String,
    /// Number of recent lines kept for the status page.
    pub buffer_size: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            tag: DEFAULT_EVENT_TAG.to_string(),
            time_zone: DEFAULT_TIME_ZONE.to_string(),
            max_concurrent_users: DEFAULT_MAX_CONCURRENT_USERS,
            call_timeout_secs: DEFAULT_CALL_TIMEOUT_SECS,
            retry_backoff_ms: DEFAULT_RETRY_BACKOFF_MS,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            sync_cron: DEFAULT_SYNC_CRON.to_string(),
            session_refresh_cron: DEFAULT_SESSION_REFRESH_CRON.to_string(),
            sync_interval_secs: DEFAULT_SYNC_INTERVAL_SECS,
            job_timeout_secs: 600,
            cancel_grace_secs: 60,
            run_on_start: true,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "0.0.0.0".to_string(), port: DEFAULT_SERVER_PORT }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { filter: "info".to_string(), buffer_size: DEFAULT_LOG_BUFFER_SIZE }
    }
}

impl Config {
    /// Check cross-field constraints that serde cannot express.
    ///
    /// # Errors
    /// Returns `PlanSyncError::Config` describing the first violated rule.
    pub fn validate(&self) -> Result<()> {
        if self.sync.tag.trim().is_empty() {
            return Err(PlanSyncError::Config("sync.tag must not be empty".into()));
        }
        if self.sync.tag.contains(':') {
            return Err(PlanSyncError::Config("sync.tag must not contain ':'".into()));
        }
        if self.sync.max_concurrent_users == 0 {
            return Err(PlanSyncError::Config(
                "sync.max_concurrent_users must be at least 1".into(),
            ));
        }
        if self.sync.call_timeout_secs == 0 {
            return Err(PlanSyncError::Config("sync.call_timeout_secs must be positive".into()));
        }
        for (field, zone) in
            [("portal.time_zone", &self.portal.time_zone), ("sync.time_zone", &self.sync.time_zone)]
        {
            if zone.parse::<chrono_tz::Tz>().is_err() {
                return Err(PlanSyncError::Config(format!("{field} is not an IANA zone: {zone}")));
            }
        }
        if self.logging.buffer_size == 0 {
            return Err(PlanSyncError::Config("logging.buffer_size must be positive".into()));
        }
        for (user, mailbox) in &self.mailboxes {
            if !mailbox.contains('@') {
                return Err(PlanSyncError::Config(format!(
                    "mailbox for user '{user}' is not an email address: {mailbox}"
                )));
            }
        }
        Ok(())
    }
}

fn default_time_zone() -> String {
    DEFAULT_TIME_ZONE.to_string()
}

fn default_cookie_cache_path() -> String {
    ".cookie-cache.json".to_string()
}

fn default_login_path() -> String {
    "/client/".to_string()
}

const fn default_request_timeout_secs() -> u64 {
    30
}

const fn default_details_cache_ttl_secs() -> u64 {
    600
}

fn default_graph_base_url() -> String {
    "https://graph.microsoft.com/v1.0".to_string()
}

fn default_login_base_url() -> String {
    "https://login.microsoftonline.com".to_string()
}
