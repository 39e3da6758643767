//! Port interfaces for the planning portal and the details API
//!
//! These traits define the boundaries between the polling cycle and the
//! HTTP adapters in the infra crate.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use plansync_domain::constants::PLANNING_WINDOW_DAYS;
use plansync_domain::{PlannedWorkOrder, Result, WorkOrderDetails};

/// Authenticated portal session.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken {
    cookie: String,
    obtained_at: DateTime<Utc>,
}

impl SessionToken {
    pub fn new(cookie: impl Into<String>, obtained_at: DateTime<Utc>) -> Self {
        Self { cookie: cookie.into(), obtained_at }
    }

    /// Raw session cookie value.
    pub fn cookie(&self) -> &str {
        &self.cookie
    }

    pub fn obtained_at(&self) -> DateTime<Utc> {
        self.obtained_at
    }

    /// Whether the session is older than `max_age` at `now`.
    pub fn is_older_than(&self, max_age: Duration, now: DateTime<Utc>) -> bool {
        now - self.obtained_at >= max_age
    }
}

// The cookie is a credential; keep it out of logs.
impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionToken")
            .field("cookie", &"<redacted>")
            .field("obtained_at", &self.obtained_at)
            .finish()
    }
}

/// Acquires and maintains the portal session.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// A usable session, reusing a cached one when it is still valid.
    async fn get_session(&self) -> Result<SessionToken>;

    /// Force a fresh login and cache the result.
    async fn refresh_session(&self) -> Result<SessionToken>;

    /// Drop any cached session so the next call re-authenticates.
    async fn invalidate(&self) -> Result<()>;
}

/// Inclusive schedule window, in the portal's local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanningWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl PlanningWindow {
    /// Midnight of `today` through midnight `PLANNING_WINDOW_DAYS` later.
    pub fn starting(today: NaiveDate) -> Self {
        let start = today.and_time(chrono::NaiveTime::MIN);
        Self { start, end: start + Duration::days(PLANNING_WINDOW_DAYS) }
    }
}

/// Source of scheduled work order rows.
#[async_trait]
pub trait WorkOrderSource: Send + Sync {
    /// Schedule rows overlapping `window`.
    ///
    /// # Errors
    /// `PlanSyncError::Auth` when the session was rejected.
    async fn fetch_planning(
        &self,
        session: &SessionToken,
        window: PlanningWindow,
    ) -> Result<Vec<PlannedWorkOrder>>;
}

/// Enrichment lookup for a single work order.
#[async_trait]
pub trait DetailsLookup: Send + Sync {
    /// # Errors
    /// `PlanSyncError::Lookup` for any failure.
    async fn get_details(&self, order_id: &str) -> Result<WorkOrderDetails>;
}
