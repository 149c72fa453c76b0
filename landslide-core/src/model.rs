use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ErrorDescriptor;

/// Community block echoed back by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityInfo {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Current landslide risk for one community, as accepted from the backend.
///
/// Only built by the classifier once the time fields have been parsed and
/// checked, so `timestamp <= expires_at` always holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskSnapshot {
    pub community: Option<CommunityInfo>,
    pub hour: Option<String>,
    pub precipitation_24hr: f64,
    pub precipitation_2days: f64,
    pub precipitation_3days: f64,
    pub precipitation_inches: f64,
    pub precipitation_mm: f64,
    pub risk_24hr: i64,
    pub risk_2days: i64,
    pub risk_3days: i64,
    pub risk_level: i64,
    pub risk_probability: Option<f64>,
    pub risk_is_elevated_from_previous: Option<bool>,
    pub timestamp: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl RiskSnapshot {
    pub fn risk_level_label(&self) -> &'static str {
        get_risk_level_label(self.risk_level)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_ordinal(level: i64) -> Option<Self> {
        match level {
            0 => Some(RiskLevel::Low),
            1 => Some(RiskLevel::Medium),
            2 => Some(RiskLevel::High),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }
}

/// Label for a raw risk ordinal; anything outside 0..=2 is "Unknown".
pub fn get_risk_level_label(level: i64) -> &'static str {
    RiskLevel::from_ordinal(level).map_or("Unknown", |l| l.label())
}

/// What the presentation layer reads.
///
/// `data` and `error` are never both set. While `loading` is true they still
/// describe the previous settled fetch (the error is cleared when a fetch starts).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StoreState {
    pub data: Option<RiskSnapshot>,
    pub loading: bool,
    pub error: Option<ErrorDescriptor>,
}

impl StoreState {
    pub fn is_idle(&self) -> bool {
        self.data.is_none() && self.error.is_none() && !self.loading
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_level_labels() {
        assert_eq!(get_risk_level_label(0), "Low");
        assert_eq!(get_risk_level_label(1), "Medium");
        assert_eq!(get_risk_level_label(2), "High");
        assert_eq!(get_risk_level_label(3), "Unknown");
        assert_eq!(get_risk_level_label(-1), "Unknown");
    }

    #[test]
    fn risk_levels_are_ordered() {
        assert!(RiskLevel::Low < RiskLevel::Medium);
        assert!(RiskLevel::Medium < RiskLevel::High);
    }

    #[test]
    fn default_state_is_idle() {
        assert!(StoreState::default().is_idle());
    }
}
