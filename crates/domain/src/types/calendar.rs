//! Calendar event types
//!
//! Provider-neutral shapes of remote calendar events. Provider wire formats
//! live next to their clients in the infra crate.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Free/busy visibility of an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ShowAs {
    Free,
    Tentative,
    #[default]
    Busy,
    Oof,
    WorkingElsewhere,
    #[serde(other)]
    Unknown,
}

/// Event content as PlanSync wants it to exist on the remote calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDraft {
    pub subject: String,
    pub body: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// IANA zone the provider should store the timestamps in.
    pub time_zone: String,
    pub location: String,
    pub show_as: ShowAs,
}

/// Event as read back from the remote calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    /// Opaque provider identifier. Never used for correlation.
    pub id: String,
    pub subject: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub body: String,
    pub location: String,
    pub show_as: ShowAs,
}

/// Mutable event fields compared during reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventField {
    Subject,
    Start,
    End,
    Body,
    Location,
    ShowAs,
}

impl fmt::Display for EventField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Subject => "subject",
            Self::Start => "start",
            Self::End => "end",
            Self::Body => "body",
            Self::Location => "location",
            Self::ShowAs => "show_as",
        };
        f.write_str(name)
    }
}
