//! Maps one raw fetch attempt onto a [`FetchOutcome`].
//!
//! Pure: no I/O, no logging, `now` is injected. Rules apply in this order:
//! transport failure, non-2xx status, in-body `error_code`, payload shape,
//! freshness.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::{
    error::TransportError,
    freshness::{FreshnessStatus, classify_freshness, parse_utc},
    model::{CommunityInfo, RiskSnapshot},
};

/// Status and body of a response that made it back over the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub type RawOutcome = Result<RawResponse, TransportError>;

/// Classification of a single fetch attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Success(RiskSnapshot),
    /// Backend reported 409: its sources failed to refresh. Carries the last
    /// update time when the body had a parsable one.
    StaleSignal(Option<DateTime<Utc>>),
    /// Snapshot parsed fine but is past `expires_at`; carries its `timestamp`.
    Expired(DateTime<Utc>),
    MalformedPayload,
    NetworkFailure,
    ServerError(u16),
    Timeout,
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success(_))
    }
}

#[derive(Debug, Deserialize)]
struct WireSnapshot {
    #[serde(default)]
    community: Option<CommunityInfo>,
    #[serde(default)]
    hour: Option<String>,
    precipitation_24hr: f64,
    precipitation_2days: f64,
    precipitation_3days: f64,
    precipitation_inches: f64,
    precipitation_mm: f64,
    risk_24hr: i64,
    risk_2days: i64,
    risk_3days: i64,
    risk_level: i64,
    #[serde(default)]
    risk_probability: Option<f64>,
    #[serde(default)]
    risk_is_elevated_from_previous: Option<bool>,
    timestamp: String,
    expires_at: String,
}

impl WireSnapshot {
    fn into_snapshot(self, timestamp: DateTime<Utc>, expires_at: DateTime<Utc>) -> RiskSnapshot {
        RiskSnapshot {
            community: self.community,
            hour: self.hour,
            precipitation_24hr: self.precipitation_24hr,
            precipitation_2days: self.precipitation_2days,
            precipitation_3days: self.precipitation_3days,
            precipitation_inches: self.precipitation_inches,
            precipitation_mm: self.precipitation_mm,
            risk_24hr: self.risk_24hr,
            risk_2days: self.risk_2days,
            risk_3days: self.risk_3days,
            risk_level: self.risk_level,
            risk_probability: self.risk_probability,
            risk_is_elevated_from_previous: self.risk_is_elevated_from_previous,
            timestamp,
            expires_at,
        }
    }
}

pub fn classify(raw: &RawOutcome, now: DateTime<Utc>) -> FetchOutcome {
    let response = match raw {
        Err(TransportError::Timeout) => return FetchOutcome::Timeout,
        Err(TransportError::Network(_)) => return FetchOutcome::NetworkFailure,
        Ok(response) => response,
    };

    if !response.is_success() {
        return classify_status(response.status, &response.body);
    }

    let Ok(value) = serde_json::from_str::<serde_json::Value>(&response.body) else {
        return FetchOutcome::MalformedPayload;
    };
    let Some(object) = value.as_object() else {
        return FetchOutcome::MalformedPayload;
    };

    // Older backends answer 200 and put the failure code in the body.
    if let Some(code) = object.get("error_code").filter(|code| !code.is_null()) {
        match code.as_u64().and_then(|c| u16::try_from(c).ok()) {
            Some(c) if (200..300).contains(&c) => {}
            Some(c) => return classify_status(c, &response.body),
            None => return FetchOutcome::MalformedPayload,
        }
    }

    let Ok(wire) = serde_json::from_value::<WireSnapshot>(value) else {
        return FetchOutcome::MalformedPayload;
    };

    match classify_freshness(now, &wire.timestamp, &wire.expires_at) {
        Err(_) => FetchOutcome::MalformedPayload,
        Ok(f) if f.status == FreshnessStatus::Expired => FetchOutcome::Expired(f.timestamp),
        Ok(f) => FetchOutcome::Success(wire.into_snapshot(f.timestamp, f.expires_at)),
    }
}

fn classify_status(status: u16, body: &str) -> FetchOutcome {
    match status {
        409 => FetchOutcome::StaleSignal(last_update_from(body)),
        other => FetchOutcome::ServerError(other),
    }
}

fn last_update_from(body: &str) -> Option<DateTime<Utc>> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value.get("timestamp")?.as_str().and_then(parse_utc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, SecondsFormat, TimeZone};
    use serde_json::{Value, json};

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 13, 0, 0).unwrap()
    }

    fn iso(dt: DateTime<Utc>) -> String {
        dt.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    fn valid_body() -> Value {
        json!({
            "community": { "name": "Craig", "latitude": 55.4764, "longitude": -133.148 },
            "expires_at": iso(fixed_now() + Duration::hours(3)),
            "precipitation_24hr": 10.5,
            "precipitation_2days": 25.2,
            "precipitation_3days": 45.8,
            "precipitation_inches": 1.8,
            "precipitation_mm": 45.8,
            "risk_24hr": 0,
            "risk_2days": 1,
            "risk_3days": 2,
            "risk_level": 1,
            "timestamp": iso(fixed_now()),
        })
    }

    fn ok(body: &Value) -> RawOutcome {
        Ok(RawResponse::new(200, body.to_string()))
    }

    fn with(mut body: Value, key: &str, v: Value) -> Value {
        body[key] = v;
        body
    }

    #[test]
    fn valid_payload_roundtrips_into_snapshot() {
        let body = with(valid_body(), "precipitation_inches", json!(2.5));
        let outcome = classify(&ok(&body), fixed_now());

        let FetchOutcome::Success(snapshot) = outcome else {
            panic!("expected success, got {outcome:?}");
        };
        assert_eq!(snapshot.risk_level, 1);
        assert_eq!(snapshot.risk_level_label(), "Medium");
        assert_eq!(snapshot.precipitation_inches, 2.5);
        assert_eq!(snapshot.precipitation_3days, 45.8);
        assert_eq!(snapshot.risk_3days, 2);
        assert_eq!(snapshot.timestamp, fixed_now());
        assert_eq!(snapshot.expires_at, fixed_now() + Duration::hours(3));
        assert_eq!(snapshot.community.map(|c| c.name), Some("Craig".to_string()));
        assert_eq!(snapshot.risk_probability, None);
    }

    #[test]
    fn optional_fields_are_carried_into_snapshot() {
        let mut body = valid_body();
        body["hour"] = json!("13");
        body["risk_probability"] = json!(0.42);
        body["risk_is_elevated_from_previous"] = json!(true);

        let expected = RiskSnapshot {
            community: Some(CommunityInfo {
                name: "Craig".to_string(),
                latitude: 55.4764,
                longitude: -133.148,
            }),
            hour: Some("13".to_string()),
            precipitation_24hr: 10.5,
            precipitation_2days: 25.2,
            precipitation_3days: 45.8,
            precipitation_inches: 1.8,
            precipitation_mm: 45.8,
            risk_24hr: 0,
            risk_2days: 1,
            risk_3days: 2,
            risk_level: 1,
            risk_probability: Some(0.42),
            risk_is_elevated_from_previous: Some(true),
            timestamp: fixed_now(),
            expires_at: fixed_now() + Duration::hours(3),
        };

        assert_eq!(classify(&ok(&body), fixed_now()), FetchOutcome::Success(expected));
    }

    #[test]
    fn absent_optional_fields_are_none() {
        let mut body = valid_body();
        body.as_object_mut().unwrap().remove("community");
        body["hour"] = Value::Null;

        let FetchOutcome::Success(snapshot) = classify(&ok(&body), fixed_now()) else {
            panic!("expected success");
        };
        assert_eq!(snapshot.community, None);
        assert_eq!(snapshot.hour, None);
        assert_eq!(snapshot.risk_probability, None);
        assert_eq!(snapshot.risk_is_elevated_from_previous, None);
    }

    #[test]
    fn expiry_equal_to_now_is_success() {
        let body = with(valid_body(), "expires_at", json!(iso(fixed_now())));
        assert!(classify(&ok(&body), fixed_now()).is_success());
    }

    #[test]
    fn past_expiry_is_expired_with_issue_time() {
        let issued = fixed_now() - Duration::hours(6);
        let body = with(valid_body(), "timestamp", json!(iso(issued)));
        let body = with(body, "expires_at", json!(iso(fixed_now() - Duration::hours(3))));

        assert_eq!(classify(&ok(&body), fixed_now()), FetchOutcome::Expired(issued));
    }

    #[test]
    fn unparsable_time_fields_are_malformed() {
        let body = with(valid_body(), "expires_at", json!("invalid-date-format"));
        assert_eq!(classify(&ok(&body), fixed_now()), FetchOutcome::MalformedPayload);

        let body = with(valid_body(), "timestamp", json!("invalid-timestamp"));
        assert_eq!(classify(&ok(&body), fixed_now()), FetchOutcome::MalformedPayload);

        let body = with(valid_body(), "timestamp", json!(1714568400));
        assert_eq!(classify(&ok(&body), fixed_now()), FetchOutcome::MalformedPayload);
    }

    #[test]
    fn inverted_time_fields_are_malformed() {
        let body = with(valid_body(), "expires_at", json!(iso(fixed_now() - Duration::hours(1))));
        assert_eq!(classify(&ok(&body), fixed_now()), FetchOutcome::MalformedPayload);
    }

    #[test]
    fn missing_fields_are_malformed() {
        let mut body = valid_body();
        body.as_object_mut().unwrap().remove("expires_at");
        assert_eq!(classify(&ok(&body), fixed_now()), FetchOutcome::MalformedPayload);

        assert_eq!(classify(&ok(&json!({})), fixed_now()), FetchOutcome::MalformedPayload);
    }

    #[test]
    fn non_object_bodies_are_malformed() {
        for body in ["{ invalid json }", "", "[]", "null", "\"text\""] {
            let raw = Ok(RawResponse::new(200, body));
            assert_eq!(classify(&raw, fixed_now()), FetchOutcome::MalformedPayload, "{body:?}");
        }
    }

    #[test]
    fn http_status_mapping() {
        let body = json!({ "error": "Internal server error" }).to_string();
        for status in [500, 502, 404, 503] {
            let raw = Ok(RawResponse::new(status, body.clone()));
            assert_eq!(classify(&raw, fixed_now()), FetchOutcome::ServerError(status));
        }
    }

    #[test]
    fn http_409_is_stale_signal() {
        let last = fixed_now() - Duration::hours(4);
        let body = json!({ "error_msg": "Data is stale", "timestamp": iso(last) }).to_string();
        let raw = Ok(RawResponse::new(409, body));
        assert_eq!(classify(&raw, fixed_now()), FetchOutcome::StaleSignal(Some(last)));

        let raw = Ok(RawResponse::new(409, "out of sync"));
        assert_eq!(classify(&raw, fixed_now()), FetchOutcome::StaleSignal(None));
    }

    #[test]
    fn in_body_error_code_409_is_stale_signal() {
        let last = fixed_now() - Duration::hours(4);
        let body = json!({ "error_code": 409, "error_msg": "Data is stale", "timestamp": iso(last) });
        assert_eq!(classify(&ok(&body), fixed_now()), FetchOutcome::StaleSignal(Some(last)));

        let body = json!({ "error_code": 409, "timestamp": "garbage" });
        assert_eq!(classify(&ok(&body), fixed_now()), FetchOutcome::StaleSignal(None));
    }

    #[test]
    fn in_body_error_code_follows_status_rules() {
        let body = json!({ "error_code": 502 });
        assert_eq!(classify(&ok(&body), fixed_now()), FetchOutcome::ServerError(502));

        let body = json!({ "error_code": "409" });
        assert_eq!(classify(&ok(&body), fixed_now()), FetchOutcome::MalformedPayload);
    }

    #[test]
    fn null_or_success_error_code_is_ignored() {
        let body = with(valid_body(), "error_code", Value::Null);
        assert!(classify(&ok(&body), fixed_now()).is_success());

        let body = with(valid_body(), "error_code", json!(200));
        assert!(classify(&ok(&body), fixed_now()).is_success());
    }

    #[test]
    fn transport_failures() {
        assert_eq!(classify(&Err(TransportError::Timeout), fixed_now()), FetchOutcome::Timeout);
        assert_eq!(
            classify(&Err(TransportError::Network("internetdisconnected".into())), fixed_now()),
            FetchOutcome::NetworkFailure
        );
    }
}
