use std::{fmt, str::FromStr};

use anyhow::{bail, Result};
use chrono::{DateTime, Local};

use crate::{
    fetchers::DetailState,
    incidents::IncidentLog,
    models::{AnalyticsSnapshot, IncidentEntry, StatusSnapshot},
    settings::DashboardSettings,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActiveView {
    #[default]
    Dashboard,
    Live,
    History,
    Analytics,
}

impl ActiveView {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActiveView::Dashboard => "dashboard",
            ActiveView::Live => "live",
            ActiveView::History => "history",
            ActiveView::Analytics => "analytics",
        }
    }
}

impl fmt::Display for ActiveView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActiveView {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "dashboard" => Ok(ActiveView::Dashboard),
            "live" => Ok(ActiveView::Live),
            "history" => Ok(ActiveView::History),
            "analytics" => Ok(ActiveView::Analytics),
            other => bail!("unknown view '{other}' (dashboard, live, history, analytics)"),
        }
    }
}

/// Everything the dashboard renders. Mutated only through the methods below,
/// which is where the incident log bound and suppression window are enforced.
#[derive(Debug, Clone)]
pub struct DashboardState {
    view: ActiveView,
    status: StatusSnapshot,
    incidents: IncidentLog,
    analytics: Option<AnalyticsSnapshot>,
    detail: DetailState,
    camera_active: bool,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new(&DashboardSettings::default())
    }
}

impl DashboardState {
    pub fn new(settings: &DashboardSettings) -> Self {
        Self {
            view: ActiveView::default(),
            status: StatusSnapshot::default(),
            incidents: IncidentLog::new(settings.incident_capacity, settings.suppression_window()),
            analytics: None,
            detail: DetailState::Closed,
            camera_active: true,
        }
    }

    /// Stores the snapshot and logs an incident if it warrants one.
    pub fn apply_status(
        &mut self,
        snapshot: StatusSnapshot,
        now: DateTime<Local>,
    ) -> Option<IncidentEntry> {
        let logged = self.incidents.record(&snapshot, now).cloned();
        self.status = snapshot;
        logged
    }

    pub fn clear_incidents(&mut self) {
        self.incidents.clear();
    }

    pub fn set_camera_active(&mut self, active: bool) {
        self.camera_active = active;
    }

    pub fn set_view(&mut self, view: ActiveView) {
        self.view = view;
    }

    pub fn set_analytics(&mut self, analytics: AnalyticsSnapshot) {
        self.analytics = Some(analytics);
    }

    pub fn set_detail(&mut self, detail: DetailState) {
        self.detail = detail;
    }

    pub fn view(&self) -> ActiveView {
        self.view
    }

    pub fn status(&self) -> &StatusSnapshot {
        &self.status
    }

    pub fn incidents(&self) -> &IncidentLog {
        &self.incidents
    }

    pub fn analytics(&self) -> Option<&AnalyticsSnapshot> {
        self.analytics.as_ref()
    }

    pub fn detail(&self) -> &DetailState {
        &self.detail
    }

    pub fn camera_active(&self) -> bool {
        self.camera_active
    }
}
