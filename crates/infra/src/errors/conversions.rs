//! Conversions from external infrastructure errors into domain errors.

use plansync_domain::PlanSyncError;
use reqwest::Error as HttpError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub PlanSyncError);

impl From<InfraError> for PlanSyncError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<PlanSyncError> for InfraError {
    fn from(value: PlanSyncError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoPlanSyncError {
    fn into_plansync(self) -> PlanSyncError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → PlanSyncError */
/* -------------------------------------------------------------------------- */

impl IntoPlanSyncError for HttpError {
    fn into_plansync(self) -> PlanSyncError {
        if self.is_timeout() {
            return PlanSyncError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return PlanSyncError::Network("HTTP connection failure".into());
        }

        if self.is_decode() {
            return PlanSyncError::InvalidInput(format!("malformed response body: {self}"));
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 | 403 => PlanSyncError::Auth(message),
                404 => PlanSyncError::NotFound(message),
                400..=499 if code != 408 && code != 429 => PlanSyncError::InvalidInput(message),
                _ => PlanSyncError::Network(message),
            };
        }

        PlanSyncError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_plansync())
    }
}

/// Calendar provider view of a transport failure: every error becomes
/// `Provider`, keeping the HTTP status when one was received so retry
/// classification stays with the domain error.
pub fn provider_error(err: &HttpError) -> PlanSyncError {
    let status = err.status().map(|status| status.as_u16());
    let body = if err.is_timeout() {
        "HTTP request timed out".to_string()
    } else if err.is_connect() {
        "HTTP connection failure".to_string()
    } else {
        err.to_string()
    };
    PlanSyncError::provider(status, body)
}

/* -------------------------------------------------------------------------- */
/* std::io / serde errors → PlanSyncError */
/* -------------------------------------------------------------------------- */

impl IntoPlanSyncError for std::io::Error {
    fn into_plansync(self) -> PlanSyncError {
        match self.kind() {
            std::io::ErrorKind::NotFound => PlanSyncError::NotFound(self.to_string()),
            _ => PlanSyncError::Internal(format!("I/O error: {self}")),
        }
    }
}

impl From<std::io::Error> for InfraError {
    fn from(value: std::io::Error) -> Self {
        InfraError(value.into_plansync())
    }
}

impl From<serde_json::Error> for InfraError {
    fn from(value: serde_json::Error) -> Self {
        InfraError(PlanSyncError::InvalidInput(format!("invalid JSON: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
