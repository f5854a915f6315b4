//! On-demand fetch channels: analytics and single-event detail.

pub mod analytics;
pub mod detail;

pub use analytics::AnalyticsFetcher;
pub use detail::{DetailState, EventDetailFetcher};

/// Outcome of one sequenced fetch.
#[derive(Debug)]
pub enum Fetched<T> {
    /// Newest request for the channel; apply it.
    Fresh(T),
    /// A newer request was issued while this one was in flight.
    Stale,
    Failed(anyhow::Error),
}

impl<T> Fetched<T> {
    pub fn is_stale(&self) -> bool {
        matches!(self, Fetched::Stale)
    }
}
