//! Graph wire formats for events and tokens

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use plansync_domain::{CalendarEvent, EventDraft, PlanSyncError, Result, ShowAs};
use serde::{Deserialize, Serialize};

/// Fields requested when listing events.
pub(crate) const EVENT_SELECT: &str = "id,subject,body,start,end,location,showAs";

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    pub expires_in: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EventsPage {
    pub value: Vec<GraphEvent>,
    #[serde(rename = "@odata.nextLink")]
    pub next_link: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct EventDateTime {
    #[serde(rename = "dateTime")]
    pub date_time: String,
    #[serde(rename = "timeZone")]
    pub time_zone: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct ItemBody {
    #[serde(rename = "contentType", default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct Location {
    #[serde(rename = "displayName", default)]
    pub display_name: String,
}

/// Event as returned by `/users/{id}/events`.
#[derive(Debug, Deserialize)]
pub(crate) struct GraphEvent {
    pub id: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub body: Option<ItemBody>,
    pub start: EventDateTime,
    pub end: EventDateTime,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(rename = "showAs", default)]
    pub show_as: Option<ShowAs>,
}

/// Body of create (POST) and update (PATCH) requests.
#[derive(Debug, Serialize)]
pub(crate) struct EventPayload<'a> {
    pub subject: &'a str,
    pub body: ItemBody,
    pub start: EventDateTime,
    pub end: EventDateTime,
    pub location: Location,
    #[serde(rename = "showAs")]
    pub show_as: ShowAs,
}

impl<'a> EventPayload<'a> {
    /// Timestamps are written as wall-clock time in the draft's zone.
    pub fn from_draft(draft: &'a EventDraft) -> Self {
        let zone = draft.time_zone.parse::<Tz>().unwrap_or(chrono_tz::UTC);
        let wall = |instant: DateTime<Utc>| EventDateTime {
            date_time: instant.with_timezone(&zone).format("%Y-%m-%dT%H:%M:%S").to_string(),
            time_zone: Some(zone.name().to_string()),
        };
        Self {
            subject: &draft.subject,
            body: ItemBody { content_type: Some("text".into()), content: draft.body.clone() },
            start: wall(draft.start),
            end: wall(draft.end),
            location: Location { display_name: draft.location.clone() },
            show_as: draft.show_as,
        }
    }
}

impl GraphEvent {
    pub fn into_event(self) -> Result<CalendarEvent> {
        let start = parse_event_time(&self.start)?;
        let end = parse_event_time(&self.end)?;
        Ok(CalendarEvent {
            id: self.id,
            subject: self.subject.unwrap_or_default(),
            start,
            end,
            body: self.body.map(|body| body.content).unwrap_or_default(),
            location: self.location.map(|location| location.display_name).unwrap_or_default(),
            show_as: self.show_as.unwrap_or_default(),
        })
    }
}

/// Resolve a Graph `dateTimeTimeZone` to an instant.
///
/// Graph returns seven fractional digits and no offset; the zone is given
/// separately and is `UTC` when the `outlook.timezone` preference is honoured.
pub(crate) fn parse_event_time(value: &EventDateTime) -> Result<DateTime<Utc>> {
    let raw = value.date_time.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Ok(instant.with_timezone(&Utc));
    }

    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").map_err(|e| {
        PlanSyncError::provider(None, format!("unparseable event time '{raw}': {e}"))
    })?;

    let zone = value.time_zone.as_deref().unwrap_or("UTC");
    if zone.eq_ignore_ascii_case("utc") {
        return Ok(naive.and_utc());
    }
    let tz = zone
        .parse::<Tz>()
        .map_err(|_| PlanSyncError::provider(None, format!("unknown event time zone '{zone}'")))?;
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| PlanSyncError::provider(None, format!("{raw} does not exist in {zone}")))
}
