//! Port interfaces for reconciliation

use chrono::{DateTime, Utc};

/// Maps portal user keys to calendar mailboxes.
pub trait UserMailboxMap: Send + Sync {
    /// Mailbox address for `user_key`, if one is configured.
    fn mailbox_for(&self, user_key: &str) -> Option<String>;

    /// Every mapped user key.
    fn users(&self) -> Vec<String>;
}

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
