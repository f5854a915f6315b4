use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Local;
use tokio::{
    sync::{broadcast, watch, Mutex},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;

use crate::{
    api::{DashboardApi, Endpoints},
    camera::CameraToggle,
    fetchers::{AnalyticsFetcher, DetailState, EventDetailFetcher, Fetched},
    geolocation::{self, PositionSource},
    models::{AnalyticsSnapshot, IncidentEntry, StatusSnapshot},
    polling::StatusPoller,
    sequencer::Ticket,
    settings::DashboardSettings,
};

use super::state::{ActiveView, DashboardState};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

const EVENT_BUFFER: usize = 64;

/// Change notifications for whatever is rendering the dashboard.
#[derive(Debug, Clone)]
pub enum DashboardEvent {
    StatusChanged(StatusSnapshot),
    IncidentLogged(IncidentEntry),
    IncidentsCleared,
    CameraChanged(bool),
    ViewChanged(ActiveView),
    AnalyticsUpdated(AnalyticsSnapshot),
    DetailChanged(DetailState),
}

struct ShellInner {
    api: Arc<dyn DashboardApi>,
    state: Arc<Mutex<DashboardState>>,
    events: broadcast::Sender<DashboardEvent>,
    analytics: AnalyticsFetcher,
    detail: EventDetailFetcher,
    camera: CameraToggle,
    lifetime: CancellationToken,
}

impl ShellInner {
    fn emit(&self, event: DashboardEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    async fn refresh_analytics(&self) {
        if let Fetched::Fresh(snapshot) = self.analytics.fetch(&self.lifetime).await {
            self.state.lock().await.set_analytics(snapshot.clone());
            self.emit(DashboardEvent::AnalyticsUpdated(snapshot));
        }
    }

    /// `ticket` must come from `detail.begin()` at the moment the user asked,
    /// so a close issued in between makes this whole request a no-op.
    async fn open_event(&self, ticket: Ticket, id: i64) {
        if !self
            .set_detail_if_current(ticket, DetailState::Loading { id })
            .await
        {
            return;
        }

        let outcome = self.detail.fetch(ticket, id, &self.lifetime).await;
        if let Some(next) = EventDetailFetcher::resolve(id, outcome) {
            self.set_detail_if_current(ticket, next).await;
        }
    }

    /// The ticket check and the write share the state lock, so a concurrent
    /// close either wins outright or overwrites this afterwards.
    async fn set_detail_if_current(&self, ticket: Ticket, detail: DetailState) -> bool {
        let mut state = self.state.lock().await;
        if !self.detail.is_current(ticket) {
            log_debug!("detail update for a closed or superseded request dropped");
            return false;
        }
        state.set_detail(detail.clone());
        self.emit(DashboardEvent::DetailChanged(detail));
        true
    }

    async fn close_event(&self) {
        self.detail.invalidate();
        self.set_detail(DetailState::Closed).await;
    }

    async fn set_detail(&self, detail: DetailState) {
        self.state.lock().await.set_detail(detail.clone());
        self.emit(DashboardEvent::DetailChanged(detail));
    }

    async fn toggle_camera(&self) -> bool {
        let active = self.camera.toggle(&self.state, &self.lifetime).await;
        self.emit(DashboardEvent::CameraChanged(active));
        active
    }

    async fn clear_incidents(&self) {
        self.state.lock().await.clear_incidents();
        self.emit(DashboardEvent::IncidentsCleared);
    }

    async fn apply_status(&self, snapshot: StatusSnapshot) {
        let logged = self
            .state
            .lock()
            .await
            .apply_status(snapshot.clone(), Local::now());

        self.emit(DashboardEvent::StatusChanged(snapshot));
        if let Some(entry) = logged {
            self.emit(DashboardEvent::IncidentLogged(entry));
        }
    }
}

/// Composes the poller, fetchers, camera switch and location report around
/// one `DashboardState`.
pub struct DashboardShell {
    inner: Arc<ShellInner>,
    settings: DashboardSettings,
    endpoints: Endpoints,
    position_source: Arc<dyn PositionSource>,
    poller: StatusPoller,
    consumer: Option<JoinHandle<()>>,
}

impl DashboardShell {
    pub fn new(
        api: Arc<dyn DashboardApi>,
        settings: DashboardSettings,
        position_source: Arc<dyn PositionSource>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        let inner = ShellInner {
            analytics: AnalyticsFetcher::new(api.clone()),
            detail: EventDetailFetcher::new(api.clone()),
            camera: CameraToggle::new(api.clone()),
            state: Arc::new(Mutex::new(DashboardState::new(&settings))),
            events,
            lifetime: CancellationToken::new(),
            api,
        };

        Self {
            inner: Arc::new(inner),
            endpoints: Endpoints::new(&settings.backend_url),
            poller: StatusPoller::new(settings.poll_interval()),
            settings,
            position_source,
            consumer: None,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DashboardEvent> {
        self.inner.events.subscribe()
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub async fn snapshot(&self) -> DashboardState {
        self.inner.state.lock().await.clone()
    }

    pub fn is_mounted(&self) -> bool {
        self.consumer.is_some()
    }

    /// Reports the device location once, then starts polling for the
    /// current view.
    pub async fn mount(&mut self) -> Result<()> {
        if self.consumer.is_some() {
            bail!("dashboard already mounted");
        }
        if self.inner.lifetime.is_cancelled() {
            bail!("dashboard was unmounted and cannot be mounted again");
        }

        let api = self.inner.api.clone();
        let source = self.position_source.clone();
        let timeout = self.settings.geolocation_timeout();
        let cancel = self.inner.lifetime.child_token();
        tokio::spawn(async move {
            geolocation::report_once(api.as_ref(), source.as_ref(), timeout, &cancel).await;
        });

        self.consumer = Some(tokio::spawn(consume_status(
            self.inner.clone(),
            self.poller.subscribe(),
        )));

        self.poller
            .start(self.inner.api.clone(), &self.inner.lifetime)
            .context("failed to start status polling")?;

        let view = self.inner.state.lock().await.view();
        if view == ActiveView::Analytics {
            self.inner.refresh_analytics().await;
        }

        log_info!("dashboard mounted on {view} view");
        Ok(())
    }

    /// Tears the polling context down and brings it back up for `view`, so
    /// nothing issued under the old view can land afterwards.
    pub async fn switch_view(&mut self, view: ActiveView) -> Result<()> {
        self.poller.stop().await?;

        self.inner.state.lock().await.set_view(view);
        self.inner.emit(DashboardEvent::ViewChanged(view));

        // Before mount only the view changes; `mount` does the rest.
        if !self.is_mounted() {
            return Ok(());
        }

        self.poller
            .start(self.inner.api.clone(), &self.inner.lifetime)
            .context("failed to restart status polling")?;

        if view == ActiveView::Analytics {
            self.spawn_refresh_analytics();
        }
        Ok(())
    }

    pub async fn unmount(&mut self) -> Result<()> {
        self.inner.lifetime.cancel();
        self.poller.stop().await?;

        if let Some(handle) = self.consumer.take() {
            handle
                .await
                .context("status consumer task failed to join")?;
        }
        log_info!("dashboard unmounted");
        Ok(())
    }

    pub async fn clear_incidents(&self) {
        self.inner.clear_incidents().await;
    }

    pub async fn refresh_analytics(&self) {
        self.inner.refresh_analytics().await;
    }

    pub async fn open_event(&self, id: i64) {
        let ticket = self.inner.detail.begin();
        self.inner.open_event(ticket, id).await;
    }

    pub async fn close_event(&self) {
        self.inner.close_event().await;
    }

    pub async fn toggle_camera(&self) -> bool {
        self.inner.toggle_camera().await
    }

    pub fn spawn_refresh_analytics(&self) {
        let inner = self.inner.clone();
        tokio::spawn(async move { inner.refresh_analytics().await });
    }

    pub fn spawn_open_event(&self, id: i64) {
        let ticket = self.inner.detail.begin();
        let inner = self.inner.clone();
        tokio::spawn(async move { inner.open_event(ticket, id).await });
    }

    pub fn spawn_toggle_camera(&self) {
        let inner = self.inner.clone();
        tokio::spawn(async move {
            inner.toggle_camera().await;
        });
    }
}

async fn consume_status(inner: Arc<ShellInner>, mut rx: watch::Receiver<Option<StatusSnapshot>>) {
    loop {
        tokio::select! {
            _ = inner.lifetime.cancelled() => break,
            changed = rx.changed() => {
                if changed.is_err() {
                    log_warn!("status channel closed; consumer exiting");
                    break;
                }
                let latest = rx.borrow_and_update().clone();
                if let Some(snapshot) = latest {
                    inner.apply_status(snapshot).await;
                }
            }
        }
    }
}
