use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::{classify::FetchOutcome, freshness::time_since};

/// Community code that is not in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown community '{0}'. Supported communities: AK91 (Craig), AK182 (Kasaan).")]
pub struct ValidationError(pub String);

/// Failure below HTTP: nothing usable came back.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The request deadline elapsed.
    #[error("request timed out")]
    Timeout,

    /// Connection refused, DNS failure, aborted request, unreadable body.
    #[error("network failure: {0}")]
    Network(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ServerErrorKind {
    /// HTTP 500: the backend could not format the data from its database.
    Formatting,
    /// HTTP 502: the backend could not reach its database.
    Unreachable,
    Generic(u16),
}

impl ServerErrorKind {
    pub fn from_status(status: u16) -> Self {
        match status {
            500 => ServerErrorKind::Formatting,
            502 => ServerErrorKind::Unreachable,
            other => ServerErrorKind::Generic(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorCategory {
    Validation,
    NetworkFailure,
    Timeout,
    ServerError(ServerErrorKind),
    StaleSignal,
    MalformedPayload,
    Expired,
}

impl ErrorCategory {
    /// Whether the UI should hide the map and navigation entirely.
    pub fn suppresses_content(&self) -> bool {
        matches!(
            self,
            ErrorCategory::ServerError(ServerErrorKind::Formatting | ServerErrorKind::Unreachable)
        )
    }
}

/// User-facing error published by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorDescriptor {
    pub category: ErrorCategory,
    pub message: String,
}

impl ErrorDescriptor {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self { category, message: message.into() }
    }

    pub fn validation() -> Self {
        Self::new(
            ErrorCategory::Validation,
            "Invalid community selected. Please choose 'AK91' (Craig) or 'AK182' (Kasaan).",
        )
    }

    /// Describe a failed outcome; `None` for `Success`.
    ///
    /// `now` is only used to phrase the time since the last update.
    pub fn from_outcome(outcome: &FetchOutcome, now: DateTime<Utc>) -> Option<Self> {
        let descriptor = match outcome {
            FetchOutcome::Success(_) => return None,
            FetchOutcome::NetworkFailure => Self::new(
                ErrorCategory::NetworkFailure,
                "Network error occurred while fetching data. \
                 Please check your connection and try again.",
            ),
            FetchOutcome::Timeout => Self::new(
                ErrorCategory::Timeout,
                "The request timed out while fetching landslide data. Please try again.",
            ),
            FetchOutcome::ServerError(status) => {
                let kind = ServerErrorKind::from_status(*status);
                let message = match kind {
                    ServerErrorKind::Formatting => {
                        "Unable to format the data from the database.".to_string()
                    }
                    ServerErrorKind::Unreachable => {
                        "The database is currently inaccessible.".to_string()
                    }
                    ServerErrorKind::Generic(code) => {
                        format!("Failed to fetch landslide data (HTTP {code}). Please try again.")
                    }
                };
                Self::new(ErrorCategory::ServerError(kind), message)
            }
            FetchOutcome::StaleSignal(last_update) => {
                let message = match last_update {
                    Some(ts) => format!(
                        "The data is out of sync. Time since the last update: {}.",
                        time_since(now, *ts)
                    ),
                    None => "The data is out of sync.".to_string(),
                };
                Self::new(ErrorCategory::StaleSignal, message)
            }
            FetchOutcome::MalformedPayload => Self::new(
                ErrorCategory::MalformedPayload,
                "The data received from the server is corrupted or in an unexpected format.",
            ),
            FetchOutcome::Expired(last_update) => Self::new(
                ErrorCategory::Expired,
                format!(
                    "The upstream data sources were unable to be updated. \
                     Time since the last update: {}.",
                    time_since(now, *last_update)
                ),
            ),
        };

        Some(descriptor)
    }
}
