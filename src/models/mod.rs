pub mod analytics;
pub mod incident;
pub mod position;
pub mod status;

pub use analytics::{AnalyticsSnapshot, AnalyticsStats, EventDetail, EventSeverity, EventSummary};
pub use incident::{IncidentEntry, IncidentKind};
pub use position::Position;
pub use status::{Severity, StatusSnapshot};
