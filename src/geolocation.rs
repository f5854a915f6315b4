//! One-shot device location report.

use std::{sync::Arc, time::Duration};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::{api::DashboardApi, models::Position};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info};

/// Where the device position comes from.
#[async_trait]
pub trait PositionSource: Send + Sync + 'static {
    async fn current_position(&self) -> Result<Position>;
}

/// Coordinates supplied by configuration or the command line.
pub struct FixedPosition(pub Position);

#[async_trait]
impl PositionSource for FixedPosition {
    async fn current_position(&self) -> Result<Position> {
        Ok(self.0)
    }
}

/// No positioning available on this host.
pub struct Unavailable;

#[async_trait]
impl PositionSource for Unavailable {
    async fn current_position(&self) -> Result<Position> {
        Err(anyhow!("geolocation is not supported on this host"))
    }
}

pub fn source_for(position: Option<Position>) -> Arc<dyn PositionSource> {
    match position {
        Some(position) => Arc::new(FixedPosition(position)),
        None => Arc::new(Unavailable),
    }
}

/// Reads the position once and forwards it to the backend.
///
/// Best effort: failures are logged and nothing is retried. Returns whether
/// the backend accepted the report.
pub async fn report_once(
    api: &dyn DashboardApi,
    source: &dyn PositionSource,
    timeout: Duration,
    cancel: &CancellationToken,
) -> bool {
    match try_report(api, source, timeout, cancel).await {
        Ok(position) => {
            log_info!("location reported: {:.4}, {:.4}", position.lat, position.lon);
            true
        }
        Err(err) => {
            log_error!("Error sending location: {err:#}");
            false
        }
    }
}

async fn try_report(
    api: &dyn DashboardApi,
    source: &dyn PositionSource,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<Position> {
    let position = tokio::time::timeout(timeout, source.current_position())
        .await
        .map_err(|_| anyhow!("timed out after {} ms", timeout.as_millis()))?
        .context("error getting location")?;

    api.report_location(position, cancel)
        .await
        .context("backend rejected location")?;

    Ok(position)
}
