//! Analytics and event records served by the detection backend.
//!
//! Values are passed through untouched: counts, severities and coordinates
//! are displayed exactly as the backend reports them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalyticsStats {
    pub total_events: u64,
    pub severity_counts: BTreeMap<String, u64>,
}

impl AnalyticsStats {
    /// Count for a DB severity key (`HIGH`, `MEDIUM`, `LOW`), zero when absent.
    pub fn count_for(&self, severity: &str) -> u64 {
        self.severity_counts.get(severity).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalyticsSnapshot {
    pub stats: AnalyticsStats,
    pub events: Vec<EventSummary>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EventSummary {
    pub id: i64,
    pub timestamp: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub severity: String,
    pub confidence: f64,
    pub location_url: Option<String>,
    pub image_path: Option<String>,
    pub zone: Option<String>,
}

/// Full record behind `/api/event/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EventDetail {
    pub id: i64,
    pub timestamp: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub severity: String,
    pub confidence: f64,
    pub location_url: Option<String>,
    pub image_path: Option<String>,
    pub zone: Option<String>,
    pub chaos_score: Option<f64>,
    pub alert_sent: Option<bool>,
}

impl EventDetail {
    pub fn zone_label(&self) -> &str {
        self.zone
            .as_deref()
            .filter(|zone| !zone.is_empty())
            .unwrap_or("Unclassified")
    }
}

/// Severity bucket used for map colouring; compared case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSeverity {
    High,
    Medium,
    Low,
    Other,
}

impl EventSeverity {
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_uppercase().as_str() {
            "HIGH" => EventSeverity::High,
            "MEDIUM" => EventSeverity::Medium,
            "LOW" => EventSeverity::Low,
            _ => EventSeverity::Other,
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            EventSeverity::High => "#ff4d4d",
            EventSeverity::Medium => "#ffa500",
            EventSeverity::Low => "#4dff4d",
            EventSeverity::Other => "#cccccc",
        }
    }
}
