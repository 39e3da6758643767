//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application.

// Event encoding
pub const DEFAULT_EVENT_TAG: &str = "Work Order";
pub const DEFAULT_TIME_ZONE: &str = "Europe/Stockholm";

// Portal
pub const SESSION_COOKIE_NAME: &str = "milltimesessionid";
pub const SESSION_COOKIE_MAX_AGE_SECS: i64 = 24 * 60 * 60;
pub const PLANNING_WINDOW_DAYS: i64 = 14;

// Reconciliation
pub const DEFAULT_MAX_CONCURRENT_USERS: usize = 4;
pub const DEFAULT_CALL_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 500;

// Scheduling
pub const DEFAULT_SYNC_CRON: &str = "0 0 * * * *"; // hourly
pub const DEFAULT_SESSION_REFRESH_CRON: &str = "0 30 3 * * *"; // daily, before the cookie ages out
pub const DEFAULT_SYNC_INTERVAL_SECS: u64 = 60 * 60;

// Status surface
pub const DEFAULT_LOG_BUFFER_SIZE: usize = 100;
pub const DEFAULT_SERVER_PORT: u16 = 3000;
