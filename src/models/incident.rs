use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IncidentKind {
    Warning,
    Critical,
}

impl IncidentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IncidentKind::Warning => "warning",
            IncidentKind::Critical => "critical",
        }
    }
}

/// One line of the local incident log. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IncidentEntry {
    /// Wall-clock milliseconds at insertion; doubles as the suppression key.
    pub id: i64,
    pub time: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: IncidentKind,
}
