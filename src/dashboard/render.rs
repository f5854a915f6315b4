//! Plain-text rendering of dashboard state.

use std::fmt::Write;

use crate::{
    api::Endpoints,
    fetchers::DetailState,
    incidents::IncidentLog,
    models::{
        AnalyticsSnapshot, EventDetail, EventSeverity, EventSummary, IncidentEntry, Severity,
        StatusSnapshot,
    },
};

use super::state::DashboardState;

pub const DEFAULT_MAP_CENTER: (f64, f64) = (17.3850, 78.4867);
const RECENT_EVENTS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Secure,
    Warning,
    Critical,
}

impl StatusLevel {
    pub fn of(status: &StatusSnapshot) -> Self {
        if !status.detected {
            StatusLevel::Secure
        } else if status.severity == Severity::High {
            StatusLevel::Critical
        } else {
            StatusLevel::Warning
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            StatusLevel::Secure => "#4dff4d",
            StatusLevel::Warning => "#ffa500",
            StatusLevel::Critical => "#ff4d4d",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StatusLevel::Secure => "Secure",
            StatusLevel::Warning | StatusLevel::Critical => "THREAT DETECTED",
        }
    }
}

pub fn camera_badge(camera_active: bool, detected: bool) -> &'static str {
    match (camera_active, detected) {
        (false, _) => "OFFLINE",
        (true, true) => "DETECTING",
        (true, false) => "LIVE",
    }
}

pub fn recommendation(severity: Severity) -> &'static str {
    if severity == Severity::High {
        "RECOMMENDATION: EVACUATE / AUTO-SUPPRESSION"
    } else {
        "RECOMMENDATION: MANUAL EXTINGUISHER OK"
    }
}

pub fn confidence_percent(confidence: f64) -> String {
    format!("{:.0}%", confidence * 100.0)
}

fn coordinate(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.4}"))
}

/// Map center follows the newest event when it has usable coordinates.
pub fn map_center(events: &[EventSummary]) -> (f64, f64) {
    match events.first() {
        Some(EventSummary {
            latitude: Some(lat),
            longitude: Some(lon),
            ..
        }) if *lat != 0.0 && *lon != 0.0 => (*lat, *lon),
        _ => DEFAULT_MAP_CENTER,
    }
}

pub fn status_line(state: &DashboardState) -> String {
    let status = state.status();
    let level = StatusLevel::of(status);
    format!(
        "[{}] intensity={} confidence={} camera={} | {}",
        level.label(),
        status.severity.as_str(),
        confidence_percent(status.confidence),
        camera_badge(state.camera_active(), status.detected),
        status.message
    )
}

/// Status block including the analysis overlay shown while a fire is visible.
pub fn status_panel(state: &DashboardState, endpoints: &Endpoints) -> String {
    let status = state.status();
    let mut out = String::new();
    let _ = writeln!(out, "{}", status_line(state));
    let _ = writeln!(out, "view: {}  feed: {}", state.view(), endpoints.video_feed_url());
    if status.detected {
        let _ = writeln!(out, "AI ANALYSIS: {}", status.message);
        let _ = writeln!(out, "{}", recommendation(status.severity));
    }
    out
}

pub fn incident_line(entry: &IncidentEntry) -> String {
    format!("{:>11}  {:<8}  {}", entry.time, entry.kind.as_str(), entry.message)
}

pub fn incident_log(log: &IncidentLog) -> String {
    if log.is_empty() {
        return "No active threats.\n".to_string();
    }
    let mut out = String::new();
    for entry in log.iter() {
        let _ = writeln!(out, "{}", incident_line(entry));
    }
    out
}

pub fn history(log: &IncidentLog) -> String {
    let mut out = String::from("Extensive Incident History\n");
    for entry in log.iter() {
        let _ = writeln!(
            out,
            "{}  {} - {}",
            entry.time,
            entry.message,
            entry.kind.as_str().to_uppercase()
        );
    }
    out
}

pub fn analytics(snapshot: &AnalyticsSnapshot, endpoints: &Endpoints) -> String {
    let stats = &snapshot.stats;
    let (lat, lon) = map_center(&snapshot.events);
    let mut out = String::new();
    let _ = writeln!(out, "Total Incidents: {}", stats.total_events);
    let _ = writeln!(out, "High Severity:   {}", stats.count_for("HIGH"));
    let _ = writeln!(out, "Medium Severity: {}", stats.count_for("MEDIUM"));
    let _ = writeln!(out, "Map center:      {lat:.4}, {lon:.4}");
    let _ = writeln!(out, "Download Report: {}", endpoints.export_url());
    let _ = writeln!(out, "Recent Events:");
    for event in snapshot.events.iter().take(RECENT_EVENTS) {
        let _ = writeln!(
            out,
            "  #{:<5} {}  Detected at {}, {}  [{} {}]",
            event.id,
            event.timestamp,
            coordinate(event.latitude),
            coordinate(event.longitude),
            event.severity,
            EventSeverity::parse(&event.severity).color()
        );
    }
    out
}

pub fn event_detail(event: &EventDetail, endpoints: &Endpoints) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Fire Incident Report #{}", event.id);
    let _ = writeln!(out, "Timestamp: {}", event.timestamp);
    let _ = writeln!(out, "Severity: {}", event.severity);
    let _ = writeln!(out, "Confidence: {:.1}%", event.confidence * 100.0);
    let _ = writeln!(
        out,
        "Location: {}, {}",
        coordinate(event.latitude),
        coordinate(event.longitude)
    );
    let _ = writeln!(out, "Zone Classification: {}", event.zone_label());
    if let Some(image_path) = &event.image_path {
        let _ = writeln!(out, "Evidence: {}", endpoints.evidence_url(image_path));
    }
    if let Some(url) = &event.location_url {
        let _ = writeln!(out, "Map: {url}");
    }
    out
}

pub fn detail_state(detail: &DetailState, endpoints: &Endpoints) -> String {
    match detail {
        DetailState::Closed => String::new(),
        DetailState::Loading { id } => format!("Loading Details for event {id}...\n"),
        DetailState::Loaded(event) => event_detail(event, endpoints),
        DetailState::Failed { id, reason } => format!("Failed to load event {id}: {reason}\n"),
    }
}
