//! Calendar provider port interfaces

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use plansync_domain::{CalendarEvent, EventDraft, Result};

/// Remote calendar operations available to the reconciliation engine.
///
/// Implementations report every failure as `PlanSyncError::Provider` and do
/// not retry internally. Subject filtering is the only query primitive; reads
/// may lag behind writes.
#[async_trait]
pub trait CalendarClient: Send + Sync {
    /// Events in `mailbox` whose subject equals `subject` exactly.
    async fn find_by_subject(&self, mailbox: &str, subject: &str) -> Result<Vec<CalendarEvent>>;

    /// Events in `mailbox` whose subject starts with `prefix` and whose start
    /// is at or after `since`. Follows pagination to the end.
    async fn find_by_tag_prefix(
        &self,
        mailbox: &str,
        prefix: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>>;

    /// Create an event and return it as stored by the provider.
    async fn create(&self, mailbox: &str, draft: &EventDraft) -> Result<CalendarEvent>;

    /// Overwrite the mutable fields of an existing event.
    async fn update(&self, mailbox: &str, event_id: &str, draft: &EventDraft) -> Result<()>;

    async fn delete(&self, mailbox: &str, event_id: &str) -> Result<()>;
}
