use std::sync::Arc;

use tokio::{
    sync::watch,
    task::JoinSet,
    time::{self, Duration, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::{
    api::{is_cancelled, DashboardApi},
    models::StatusSnapshot,
    sequencer::{RequestSequencer, Ticket},
};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

pub type StatusPublisher = Arc<watch::Sender<Option<StatusSnapshot>>>;

/// Issues one status request per tick until `cancel_token` fires.
///
/// Requests run concurrently so a slow backend never delays the next tick.
/// Each one carries a child token of `cancel_token`; on teardown they are
/// cancelled and any result that still arrives is dropped.
pub async fn status_loop(
    api: Arc<dyn DashboardApi>,
    period: Duration,
    publisher: StatusPublisher,
    cancel_token: CancellationToken,
) {
    // First request goes out one period after start, like a browser interval.
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let sequencer = RequestSequencer::new();
    let mut in_flight = JoinSet::new();

    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                log_info!(
                    "status poll loop shutting down ({} request(s) in flight)",
                    in_flight.len()
                );
                break;
            }
            _ = ticker.tick() => {
                let ticket = sequencer.issue();
                in_flight.spawn(poll_once(
                    api.clone(),
                    ticket,
                    sequencer.clone(),
                    publisher.clone(),
                    cancel_token.child_token(),
                ));
            }
            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                if let Err(err) = joined {
                    log_warn!("status request task failed: {err}");
                }
            }
        }
    }

    in_flight.shutdown().await;
}

async fn poll_once(
    api: Arc<dyn DashboardApi>,
    ticket: Ticket,
    sequencer: RequestSequencer,
    publisher: StatusPublisher,
    cancel_token: CancellationToken,
) {
    match api.fetch_status(&cancel_token).await {
        Ok(snapshot) => {
            if cancel_token.is_cancelled() {
                log_debug!("dropping status #{} received after teardown", ticket.value());
                return;
            }
            if !sequencer.try_commit(ticket) {
                log_debug!(
                    "dropping stale status #{} (already applied #{})",
                    ticket.value(),
                    sequencer.last_applied()
                );
                return;
            }
            publisher.send_replace(Some(snapshot));
        }
        Err(err) if is_cancelled(&err) => {
            log_debug!("status #{} cancelled", ticket.value());
        }
        Err(err) => {
            // Keep the previous snapshot; the next tick tries again.
            log_warn!("status poll #{} failed: {err:#}", ticket.value());
        }
    }
}
