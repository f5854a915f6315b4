use serde::{Deserialize, Serialize};

/// Fire severity as reported by `/api/status`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Severity {
    #[default]
    None,
    Low,
    Medium,
    High,
    #[serde(other)]
    Unknown,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::None => "None",
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
            Severity::Unknown => "Unknown",
        }
    }
}

/// Latest detector status. Replaced wholesale on every successful poll.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StatusSnapshot {
    pub detected: bool,
    pub severity: Severity,
    pub message: String,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
}

impl Default for StatusSnapshot {
    fn default() -> Self {
        Self {
            detected: false,
            severity: Severity::None,
            message: "System Normal".into(),
            confidence: 0.0,
            count: None,
            camera_active: None,
            timestamp: None,
        }
    }
}

impl StatusSnapshot {
    pub fn is_critical(&self) -> bool {
        self.detected && self.severity == Severity::High
    }
}
