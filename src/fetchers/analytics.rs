use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::{
    api::DashboardApi, models::AnalyticsSnapshot, sequencer::RequestSequencer,
};

use super::Fetched;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error};

#[derive(Clone)]
pub struct AnalyticsFetcher {
    api: Arc<dyn DashboardApi>,
    sequencer: RequestSequencer,
}

impl AnalyticsFetcher {
    pub fn new(api: Arc<dyn DashboardApi>) -> Self {
        Self {
            api,
            sequencer: RequestSequencer::new(),
        }
    }

    /// Fetches stats and the event list. Only the most recently issued
    /// request can come back `Fresh`.
    pub async fn fetch(&self, cancel: &CancellationToken) -> Fetched<AnalyticsSnapshot> {
        let ticket = self.sequencer.issue();
        let result = self.api.fetch_analytics(cancel).await;

        if !self.sequencer.is_latest(ticket) {
            log_debug!("dropping stale analytics response #{}", ticket.value());
            return Fetched::Stale;
        }

        match result {
            Ok(snapshot) => Fetched::Fresh(snapshot),
            Err(err) => {
                log_error!("Analytics Error: {err:#}");
                Fetched::Failed(err)
            }
        }
    }
}
