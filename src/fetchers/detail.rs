use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::{
    api::DashboardApi,
    models::EventDetail,
    sequencer::{RequestSequencer, Ticket},
};

use super::Fetched;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error};

/// Lifecycle of the event detail view.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DetailState {
    #[default]
    Closed,
    Loading { id: i64 },
    Loaded(EventDetail),
    /// Terminal until the next `open`; never reverts to `Loading` on its own.
    Failed { id: i64, reason: String },
}

impl DetailState {
    pub fn id(&self) -> Option<i64> {
        match self {
            DetailState::Closed => None,
            DetailState::Loading { id } | DetailState::Failed { id, .. } => Some(*id),
            DetailState::Loaded(event) => Some(event.id),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, DetailState::Loading { .. })
    }
}

#[derive(Clone)]
pub struct EventDetailFetcher {
    api: Arc<dyn DashboardApi>,
    sequencer: RequestSequencer,
}

impl EventDetailFetcher {
    pub fn new(api: Arc<dyn DashboardApi>) -> Self {
        Self {
            api,
            sequencer: RequestSequencer::new(),
        }
    }

    /// Claims the detail view for a new request. Any earlier ticket goes stale.
    pub fn begin(&self) -> Ticket {
        self.sequencer.issue()
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.sequencer.is_latest(ticket)
    }

    /// Loads event `id` under a ticket taken from `begin`.
    pub async fn fetch(
        &self,
        ticket: Ticket,
        id: i64,
        cancel: &CancellationToken,
    ) -> Fetched<EventDetail> {
        let result = self.api.fetch_event(id, cancel).await;

        if !self.sequencer.is_latest(ticket) {
            log_debug!("dropping stale detail response for event {id}");
            return Fetched::Stale;
        }

        match result {
            Ok(event) => Fetched::Fresh(event),
            Err(err) => {
                log_error!("Failed to load event {id}: {err:#}");
                Fetched::Failed(err)
            }
        }
    }

    /// Makes any in-flight request stale, e.g. when the detail view closes.
    pub fn invalidate(&self) {
        self.sequencer.issue();
    }

    /// Maps a fetch outcome onto the view state; `None` means leave it alone.
    pub fn resolve(id: i64, outcome: Fetched<EventDetail>) -> Option<DetailState> {
        match outcome {
            Fetched::Fresh(event) => Some(DetailState::Loaded(event)),
            Fetched::Failed(err) => Some(DetailState::Failed {
                id,
                reason: format!("{err:#}"),
            }),
            Fetched::Stale => None,
        }
    }
}
