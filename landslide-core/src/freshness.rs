//! Expiry checks for risk snapshots.
//!
//! Every function takes `now` explicitly instead of calling `Utc::now()`, so
//! the boundaries below are deterministic in tests.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreshnessStatus {
    Fresh,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Freshness {
    pub status: FreshnessStatus,
    pub timestamp: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub elapsed_since_update: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FreshnessError {
    #[error("unparsable timestamp '{0}'")]
    MalformedTimestamp(String),

    #[error("unparsable expires_at '{0}'")]
    MalformedExpiry(String),

    #[error("expires_at {expires_at} precedes timestamp {timestamp}")]
    ExpiryBeforeIssue { timestamp: DateTime<Utc>, expires_at: DateTime<Utc> },
}

/// Parse an ISO-8601 / RFC 3339 date-time into UTC.
///
/// Values with an offset (`Z`, `+00:00`, `-08:00`) are normalised to UTC.
/// Values without one (`2024-05-01T12:00:00`, optional fractional seconds)
/// are read as UTC. Date-only strings are rejected.
pub fn parse_utc(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(value, NAIVE_FORMAT)
        .ok()
        .map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc))
}

const NAIVE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Decide whether a snapshot issued at `timestamp` is still authoritative.
///
/// Expiry is strictly greater than:
///   now >  expires_at  →  expired
///   now == expires_at  →  fresh
///
/// Unparsable strings and an expiry earlier than the issue time are errors,
/// never a fresh or expired verdict.
pub fn classify_freshness(
    now: DateTime<Utc>,
    timestamp: &str,
    expires_at: &str,
) -> Result<Freshness, FreshnessError> {
    let issued =
        parse_utc(timestamp).ok_or_else(|| FreshnessError::MalformedTimestamp(timestamp.into()))?;
    let expiry =
        parse_utc(expires_at).ok_or_else(|| FreshnessError::MalformedExpiry(expires_at.into()))?;

    if expiry < issued {
        return Err(FreshnessError::ExpiryBeforeIssue { timestamp: issued, expires_at: expiry });
    }

    let status = if now > expiry { FreshnessStatus::Expired } else { FreshnessStatus::Fresh };

    Ok(Freshness {
        status,
        timestamp: issued,
        expires_at: expiry,
        elapsed_since_update: now - issued,
    })
}

/// Human phrase for the time since the last update, e.g. "3 hours" or "Just now".
///
/// Units are floor-truncated; hours carry the leftover minutes.
pub fn format_elapsed(elapsed: Duration) -> String {
    let minutes = elapsed.num_minutes();

    if minutes < 1 {
        "Just now".to_string()
    } else if minutes < 60 {
        plural(minutes, "minute")
    } else if minutes < 1440 {
        let hours = minutes / 60;
        let rest = minutes % 60;
        if rest == 0 {
            plural(hours, "hour")
        } else {
            format!("{} and {}", plural(hours, "hour"), plural(rest, "minute"))
        }
    } else {
        plural(minutes / 1440, "day")
    }
}

/// Phrase for the time between `since` and `now`.
pub fn time_since(now: DateTime<Utc>, since: DateTime<Utc>) -> String {
    format_elapsed(now - since)
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 { format!("{n} {unit}") } else { format!("{n} {unit}s") }
}
