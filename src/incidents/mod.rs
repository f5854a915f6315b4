pub mod reducer;

pub use reducer::{IncidentLog, DEFAULT_CAPACITY, DEFAULT_SUPPRESSION_WINDOW_MS};
