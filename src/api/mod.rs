//! Client side of the detection backend's HTTP interface.
//!
//! `DashboardApi` is the seam between dashboard logic and transport: the
//! dashboard only ever talks to the trait, `HttpBackend` speaks HTTP.

pub mod http;

use std::fmt;

use anyhow::Result;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::models::{AnalyticsSnapshot, EventDetail, Position, StatusSnapshot};

pub use http::HttpBackend;

pub const STATUS_PATH: &str = "/api/status";
pub const CAMERA_TOGGLE_PATH: &str = "/api/camera/toggle";
pub const ANALYTICS_PATH: &str = "/api/analytics/stats";
pub const EXPORT_PATH: &str = "/api/analytics/export";
pub const EVENT_PATH: &str = "/api/event";
pub const LOCATION_PATH: &str = "/api/location";
pub const VIDEO_FEED_PATH: &str = "/video_feed";

#[async_trait]
pub trait DashboardApi: Send + Sync + 'static {
    async fn fetch_status(&self, cancel: &CancellationToken) -> Result<StatusSnapshot>;

    async fn set_camera_active(&self, active: bool, cancel: &CancellationToken) -> Result<()>;

    async fn fetch_analytics(&self, cancel: &CancellationToken) -> Result<AnalyticsSnapshot>;

    async fn fetch_event(&self, id: i64, cancel: &CancellationToken) -> Result<EventDetail>;

    async fn report_location(&self, position: Position, cancel: &CancellationToken) -> Result<()>;

    /// Raw bytes of the PDF analytics report.
    async fn download_report(&self, cancel: &CancellationToken) -> Result<Vec<u8>>;
}

/// Returned when a request is abandoned because its owning context was torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestCancelled;

impl fmt::Display for RequestCancelled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("request cancelled")
    }
}

impl std::error::Error for RequestCancelled {}

pub fn is_cancelled(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| cause.is::<RequestCancelled>())
}

/// Absolute URLs for resources the dashboard links to rather than fetches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base: String,
}

impl Endpoints {
    pub fn new(base_url: &str) -> Self {
        Self {
            base: base_url.trim().trim_end_matches('/').to_string(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub fn event_url(&self, id: i64) -> String {
        format!("{}{}/{}", self.base, EVENT_PATH, id)
    }

    pub fn video_feed_url(&self) -> String {
        self.url(VIDEO_FEED_PATH)
    }

    pub fn export_url(&self) -> String {
        self.url(EXPORT_PATH)
    }

    /// Evidence images are served relative to the backend root.
    pub fn evidence_url(&self, image_path: &str) -> String {
        format!("{}/{}", self.base, image_path.trim_start_matches('/'))
    }
}
