//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for PlanSync
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum PlanSyncError {
    /// Portal session or credential failure. Fatal to the current cycle.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Enrichment lookup failed for one work order.
    #[error("Lookup error for work order {order_id}: {message}")]
    Lookup { order_id: String, message: String },

    /// Calendar provider failure, with the HTTP status when one was received.
    #[error("Provider error ({}): {body}", display_status(.status))]
    Provider { status: Option<u16>, body: String },

    /// No mailbox is mapped for a user key.
    #[error("No mailbox mapped for user: {0}")]
    MappingMissing(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A reconciliation run is already in flight.
    #[error("Sync already in progress")]
    SyncInProgress,

    #[error("Operation timed out: {0}")]
    Timeout(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PlanSyncError {
    /// Build a provider error from a status code and raw response body.
    pub fn provider(status: impl Into<Option<u16>>, body: impl Into<String>) -> Self {
        Self::Provider { status: status.into(), body: body.into() }
    }

    /// Build a lookup error for the given work order.
    pub fn lookup(order_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Lookup { order_id: order_id.into(), message: message.into() }
    }

    /// Whether a provider failure is worth a single retry.
    ///
    /// Transport failures (no status), request timeouts, throttling and
    /// server errors are transient. Everything else is returned as is.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Provider { status: None, .. } => true,
            Self::Provider { status: Some(code), .. } => {
                matches!(code, 408 | 429) || (500..=599).contains(code)
            }
            Self::Network(_) | Self::Timeout(_) => true,
            _ => false,
        }
    }

    /// Whether this error means the portal session is no longer usable.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }

    /// Stable label suitable for logging fields.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Auth(_) => "auth",
            Self::Lookup { .. } => "lookup",
            Self::Provider { .. } => "provider",
            Self::MappingMissing(_) => "mapping_missing",
            Self::Network(_) => "network",
            Self::Config(_) => "config",
            Self::NotFound(_) => "not_found",
            Self::InvalidInput(_) => "invalid_input",
            Self::SyncInProgress => "sync_in_progress",
            Self::Timeout(_) => "timeout",
            Self::Internal(_) => "internal",
        }
    }
}

fn display_status(status: &Option<u16>) -> String {
    status.map_or_else(|| "no status".to_string(), |code| format!("HTTP {code}"))
}

/// Result type alias for PlanSync operations
pub type Result<T> = std::result::Result<T, PlanSyncError>;
