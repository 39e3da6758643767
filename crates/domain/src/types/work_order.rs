//! Work order types
//!
//! `PlannedWorkOrder` and `WorkOrderDetails` mirror the wire shapes of the
//! planning portal and the details API. `WorkOrder` is the enriched record the
//! reconciliation engine works with.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Stable identifier of a scheduled work order row.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkOrderId(String);

impl WorkOrderId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkOrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WorkOrderId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for WorkOrderId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Schedule row as returned by the portal's `UserWorkOrderScheduleStore`.
///
/// Production timestamps are naive and expressed in the portal's time zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PlannedWorkOrder {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub work_order_id: String,
    #[serde(default)]
    pub name: String,
    pub user_name: String,
    pub production_start: NaiveDateTime,
    pub production_end: NaiveDateTime,
}

/// Enrichment record from the details API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkOrderDetails {
    #[serde(rename = "projectnumber", default, deserialize_with = "string_or_number")]
    pub project_number: String,
    #[serde(rename = "projectname", default)]
    pub project_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "customername", default)]
    pub customer_name: String,
    #[serde(rename = "statusname", default)]
    pub status_name: String,
}

impl WorkOrderDetails {
    /// Description with surrounding whitespace removed, `None` when blank.
    pub fn trimmed_description(&self) -> Option<&str> {
        self.description.as_deref().map(str::trim).filter(|text| !text.is_empty())
    }
}

/// Enriched work order, produced fresh every polling cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkOrder {
    pub id: WorkOrderId,
    /// Portal work order number used for the details lookup.
    pub order_id: String,
    /// Assigned portal user.
    pub user_key: String,
    pub name: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub details: WorkOrderDetails,
    /// Customer/location label shown on the calendar event.
    pub location: String,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
        Null,
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Int(value) => value.to_string(),
        Raw::Float(value) => value.to_string(),
        Raw::Null => String::new(),
    })
}
