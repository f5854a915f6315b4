use chrono::{DateTime, Local};
use std::collections::VecDeque;

use crate::models::{IncidentEntry, IncidentKind, Severity, StatusSnapshot};

pub const DEFAULT_CAPACITY: usize = 50;
pub const DEFAULT_SUPPRESSION_WINDOW_MS: i64 = 5000;

const CLOCK_FORMAT: &str = "%-I:%M:%S %p";

/// Newest-first, bounded log of detections. Index 0 is always the most recent.
#[derive(Debug, Clone)]
pub struct IncidentLog {
    entries: VecDeque<IncidentEntry>,
    capacity: usize,
    suppression_window_ms: i64,
}

impl Default for IncidentLog {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_SUPPRESSION_WINDOW_MS)
    }
}

impl IncidentLog {
    pub fn new(capacity: usize, suppression_window_ms: i64) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            suppression_window_ms,
        }
    }

    /// Folds one status snapshot into the log.
    ///
    /// Nothing happens unless the snapshot reports a detection and more than
    /// the suppression window has passed since the newest entry. Returns the
    /// new entry when one was prepended.
    pub fn record(
        &mut self,
        snapshot: &StatusSnapshot,
        now: DateTime<Local>,
    ) -> Option<&IncidentEntry> {
        if !snapshot.detected {
            return None;
        }

        let now_ms = now.timestamp_millis();
        if let Some(last) = self.entries.front() {
            if now_ms - last.id <= self.suppression_window_ms {
                return None;
            }
        }

        let kind = if snapshot.severity == Severity::High {
            IncidentKind::Critical
        } else {
            IncidentKind::Warning
        };

        self.entries.push_front(IncidentEntry {
            id: now_ms,
            time: now.format(CLOCK_FORMAT).to_string(),
            message: snapshot.message.clone(),
            kind,
        });
        self.entries.truncate(self.capacity);

        self.entries.front()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn latest(&self) -> Option<&IncidentEntry> {
        self.entries.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &IncidentEntry> {
        self.entries.iter()
    }

    pub fn to_vec(&self) -> Vec<IncidentEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
