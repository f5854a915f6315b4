use std::{sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use log::info;
use tokio::{sync::watch, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::{api::DashboardApi, models::StatusSnapshot};

use super::loop_worker::{status_loop, StatusPublisher};

/// Owns the status polling loop and the channel it publishes into.
///
/// The channel outlives individual start/stop cycles, so subscribers keep
/// seeing the last good snapshot across a restart.
pub struct StatusPoller {
    period: Duration,
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
    publisher: StatusPublisher,
}

impl StatusPoller {
    pub fn new(period: Duration) -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            period,
            handle: None,
            cancel_token: None,
            publisher: Arc::new(tx),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<StatusSnapshot>> {
        self.publisher.subscribe()
    }

    pub fn latest(&self) -> Option<StatusSnapshot> {
        self.publisher.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Starts polling under a child of `parent` so the owner can tear
    /// everything down at once.
    pub fn start(&mut self, api: Arc<dyn DashboardApi>, parent: &CancellationToken) -> Result<()> {
        if self.handle.is_some() {
            bail!("status polling already active");
        }

        let cancel_token = parent.child_token();
        let handle = tokio::spawn(status_loop(
            api,
            self.period,
            self.publisher.clone(),
            cancel_token.clone(),
        ));

        info!("status polling started (every {} ms)", self.period.as_millis());
        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("status poll loop task failed to join")
                .map(|_| ())
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::Severity,
        testing::{detection, Call, FakeApi},
    };
    use tokio::time::sleep;

    const PERIOD: Duration = Duration::from_millis(1000);

    fn poller() -> (StatusPoller, CancellationToken) {
        (StatusPoller::new(PERIOD), CancellationToken::new())
    }

    #[tokio::test(start_paused = true)]
    async fn publishes_each_successful_poll() {
        let api = Arc::new(FakeApi::new());
        api.push_status(Ok(detection(Severity::Low, "first")));
        api.push_status(Ok(detection(Severity::High, "second")));
        let (mut poller, root) = poller();

        poller.start(api.clone(), &root).unwrap();
        assert!(poller.latest().is_none());

        sleep(Duration::from_millis(1500)).await;
        assert_eq!(poller.latest().unwrap().message, "first");

        sleep(PERIOD).await;
        assert_eq!(poller.latest().unwrap().message, "second");

        poller.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn failed_poll_keeps_previous_snapshot() {
        let api = Arc::new(FakeApi::new());
        api.push_status(Ok(detection(Severity::Medium, "visible")));
        api.push_status(Err("connection refused"));
        api.push_status(Err("expected value at line 1 column 1"));
        let (mut poller, root) = poller();

        poller.start(api.clone(), &root).unwrap();
        sleep(Duration::from_millis(3500)).await;

        assert_eq!(api.count(&Call::Status), 3);
        assert_eq!(poller.latest().unwrap().message, "visible");
        poller.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn slow_request_does_not_delay_next_tick() {
        let api = Arc::new(FakeApi::new());
        api.push_status_after(Duration::from_millis(2500), Ok(detection(Severity::Low, "slow")));
        api.push_status(Ok(detection(Severity::Low, "fast")));
        let (mut poller, root) = poller();

        poller.start(api.clone(), &root).unwrap();
        sleep(Duration::from_millis(2200)).await;

        // Tick 2 went out at 2000 ms while tick 1 was still pending.
        assert_eq!(api.count(&Call::Status), 2);
        assert_eq!(poller.latest().unwrap().message, "fast");
        poller.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn stale_completion_never_overwrites_newer_one() {
        let api = Arc::new(FakeApi::new());
        api.push_status_after(Duration::from_millis(2500), Ok(detection(Severity::Low, "old")));
        api.push_status_after(Duration::from_millis(100), Ok(detection(Severity::High, "new")));
        let (mut poller, root) = poller();

        poller.start(api.clone(), &root).unwrap();
        // Old response lands at 3500 ms, after the newer one at 2100 ms.
        sleep(Duration::from_millis(3800)).await;

        assert_eq!(poller.latest().unwrap().message, "new");
        poller.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn stop_cancels_timer_and_discards_in_flight_result() {
        let api = Arc::new(FakeApi::new());
        api.push_status_after(Duration::from_millis(5000), Ok(detection(Severity::High, "late")));
        let (mut poller, root) = poller();

        poller.start(api.clone(), &root).unwrap();
        sleep(Duration::from_millis(1500)).await;
        assert_eq!(api.count(&Call::Status), 1);

        poller.stop().await.unwrap();
        assert!(!poller.is_running());

        sleep(Duration::from_secs(10)).await;
        assert_eq!(api.count(&Call::Status), 1);
        assert!(poller.latest().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn parent_cancellation_stops_loop() {
        let api = Arc::new(FakeApi::new());
        let (mut poller, root) = poller();

        poller.start(api.clone(), &root).unwrap();
        root.cancel();
        sleep(Duration::from_secs(5)).await;

        assert_eq!(api.count(&Call::Status), 0);
        poller.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn refuses_double_start_and_restarts_after_stop() {
        let api = Arc::new(FakeApi::new());
        let (mut poller, root) = poller();

        poller.start(api.clone(), &root).unwrap();
        assert!(poller.start(api.clone(), &root).is_err());

        poller.stop().await.unwrap();
        poller.start(api.clone(), &root).unwrap();
        assert!(poller.is_running());
        poller.stop().await.unwrap();
    }
}
