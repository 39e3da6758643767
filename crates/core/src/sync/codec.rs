//! Work order ⇄ calendar event encoding
//!
//! The event subject is the only channel that carries a work order's identity
//! back from the provider. Subjects have the form
//!
//! ```text
//! <tag>: <id> <name>
//! ```
//!
//! where `<id>` never contains whitespace. Subjects that do not start with
//! `<tag>:` belong to someone else and are ignored.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use plansync_domain::{
    CalendarEvent, EventDraft, EventField, PlanSyncError, Result, ShowAs, SyncConfig, WorkOrder,
    WorkOrderId,
};

/// Deterministic encoder for calendar events owned by PlanSync.
#[derive(Debug, Clone)]
pub struct EventCodec {
    tag: String,
    prefix: String,
    zone: Tz,
}

impl EventCodec {
    /// # Errors
    /// `PlanSyncError::Config` for an empty tag, a tag containing `:`, or an
    /// unknown IANA zone.
    pub fn new(tag: impl Into<String>, time_zone: &str) -> Result<Self> {
        let tag = tag.into().trim().to_string();
        if tag.is_empty() || tag.contains(':') {
            return Err(PlanSyncError::Config(format!("invalid event tag: '{tag}'")));
        }
        let zone = time_zone
            .parse::<Tz>()
            .map_err(|_| PlanSyncError::Config(format!("unknown time zone: {time_zone}")))?;
        let prefix = format!("{tag}:");
        Ok(Self { tag, prefix, zone })
    }

    pub fn from_config(config: &SyncConfig) -> Result<Self> {
        Self::new(config.tag.clone(), &config.time_zone)
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Subject prefix shared by every owned event, e.g. `Work Order:`.
    pub fn tag_prefix(&self) -> &str {
        &self.prefix
    }

    pub fn time_zone(&self) -> Tz {
        self.zone
    }

    pub fn is_tagged(&self, subject: &str) -> bool {
        subject.starts_with(&self.prefix)
    }

    /// Whether `id` survives a trip through a subject unchanged.
    pub fn accepts_id(&self, id: &WorkOrderId) -> bool {
        let id = id.as_str();
        !id.is_empty() && !id.contains(char::is_whitespace)
    }

    /// Subject prefix of every event owned by the work order `id`.
    pub fn id_prefix(&self, id: &WorkOrderId) -> String {
        format!("{} {}", self.prefix, id)
    }

    pub fn subject(&self, work_order: &WorkOrder) -> String {
        let name = work_order.name.trim();
        if name.is_empty() {
            format!("{} {}", self.prefix, work_order.id)
        } else {
            format!("{} {} {}", self.prefix, work_order.id, name)
        }
    }

    pub fn encode(&self, work_order: &WorkOrder) -> EventDraft {
        EventDraft {
            subject: self.subject(work_order),
            body: self.body(work_order),
            start: work_order.start,
            end: work_order.end,
            time_zone: self.zone.name().to_string(),
            location: work_order.location.trim().to_string(),
            show_as: ShowAs::Busy,
        }
    }

    /// Extract the work order id from a subject.
    ///
    /// Returns `Ok(None)` for subjects without the tag prefix.
    ///
    /// # Errors
    /// `PlanSyncError::InvalidInput` for a tagged subject with no id token.
    pub fn decode_id(&self, subject: &str) -> Result<Option<WorkOrderId>> {
        let Some(rest) = subject.strip_prefix(&self.prefix) else {
            return Ok(None);
        };
        rest.split_whitespace().next().map(|token| Some(WorkOrderId::new(token))).ok_or_else(|| {
            PlanSyncError::InvalidInput(format!("tagged subject without id: '{subject}'"))
        })
    }

    /// Fields in which `event` differs from `draft`.
    ///
    /// Bodies are compared after line-ending and trailing whitespace
    /// normalisation, since providers rewrite both.
    pub fn diff(&self, draft: &EventDraft, event: &CalendarEvent) -> Vec<EventField> {
        let mut changed = Vec::new();
        if draft.subject != event.subject {
            changed.push(EventField::Subject);
        }
        if draft.start != event.start {
            changed.push(EventField::Start);
        }
        if draft.end != event.end {
            changed.push(EventField::End);
        }
        if normalize_text(&draft.body) != normalize_text(&event.body) {
            changed.push(EventField::Body);
        }
        if draft.location.trim() != event.location.trim() {
            changed.push(EventField::Location);
        }
        if draft.show_as != event.show_as {
            changed.push(EventField::ShowAs);
        }
        changed
    }

    /// Format an instant as the provider's zone-less local timestamp.
    pub fn local_timestamp(&self, instant: DateTime<Utc>) -> String {
        instant.with_timezone(&self.zone).format("%Y-%m-%dT%H:%M:%S").to_string()
    }

    fn local_date(&self, instant: DateTime<Utc>) -> String {
        instant.with_timezone(&self.zone).format("%Y-%m-%d").to_string()
    }

    fn body(&self, work_order: &WorkOrder) -> String {
        let details = &work_order.details;
        let mut body = String::new();
        let _ = writeln!(body, "Projekt: {} - {}", details.project_number, details.project_name);
        let _ = writeln!(body, "Kund: {}", details.customer_name);
        let _ = writeln!(body, "Status: {}", details.status_name);
        let _ = write!(
            body,
            "Tid: {} - {}",
            self.local_date(work_order.start),
            self.local_date(work_order.end)
        );
        if let Some(description) = details.trimmed_description() {
            let _ = write!(body, "\n\nBeskrivning:\n{description}");
        }
        body
    }
}

fn normalize_text(text: &str) -> String {
    text.replace("\r\n", "\n")
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
