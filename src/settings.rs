use anyhow::{bail, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::PathBuf,
    sync::{PoisonError, RwLock},
    time::Duration,
};

use crate::models::Position;

pub const BACKEND_URL_ENV: &str = "FLARESENSE_BACKEND_URL";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DashboardSettings {
    pub backend_url: String,
    pub poll_interval_ms: u64,
    /// Minimum gap between two logged incidents.
    pub suppression_window_ms: u64,
    pub incident_capacity: usize,
    pub request_timeout_ms: u64,
    pub geolocation_timeout_ms: u64,
    pub position: Option<Position>,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:5000".into(),
            poll_interval_ms: 1000,
            suppression_window_ms: 5000,
            incident_capacity: 50,
            request_timeout_ms: 5000,
            geolocation_timeout_ms: 10_000,
            position: None,
        }
    }
}

impl DashboardSettings {
    pub fn validate(&self) -> Result<()> {
        if self.backend_url.trim().is_empty() {
            bail!("backend_url must not be empty");
        }
        if !self.backend_url.starts_with("http://") && !self.backend_url.starts_with("https://") {
            bail!("backend_url must start with http:// or https://");
        }
        if self.poll_interval_ms == 0 {
            bail!("poll_interval_ms must be greater than zero");
        }
        if self.suppression_window_ms == 0 {
            bail!("suppression_window_ms must be greater than zero");
        }
        if i64::try_from(self.suppression_window_ms).is_err() {
            bail!("suppression_window_ms must not exceed {}", i64::MAX);
        }
        if self.incident_capacity == 0 {
            bail!("incident_capacity must be greater than zero");
        }
        if self.request_timeout_ms == 0 {
            bail!("request_timeout_ms must be greater than zero");
        }
        if self.geolocation_timeout_ms == 0 {
            bail!("geolocation_timeout_ms must be greater than zero");
        }
        Ok(())
    }

    /// Window in the signed millisecond units incident ids use. Saturates
    /// for values `validate` would reject.
    pub fn suppression_window(&self) -> i64 {
        i64::try_from(self.suppression_window_ms).unwrap_or(i64::MAX)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn geolocation_timeout(&self) -> Duration {
        Duration::from_millis(self.geolocation_timeout_ms)
    }

    /// Environment overrides sit between the settings file and CLI flags.
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(BACKEND_URL_ENV) {
            if !url.trim().is_empty() {
                self.backend_url = url;
            }
        }
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<DashboardSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!(
                    "Ignoring malformed settings at {}: {err}; using defaults",
                    path.display()
                );
                DashboardSettings::default()
            })
        } else {
            DashboardSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn settings(&self) -> DashboardSettings {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn update(&self, settings: DashboardSettings) -> Result<()> {
        settings.validate()?;
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        *guard = settings;
        self.persist(&guard)
    }

    fn persist(&self, data: &DashboardSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create settings directory {}", parent.display())
                })?;
            }
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}
