use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::{api::DashboardApi, dashboard::DashboardState};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info};

/// Optimistic camera on/off switch with rollback on failure.
#[derive(Clone)]
pub struct CameraToggle {
    api: Arc<dyn DashboardApi>,
}

impl CameraToggle {
    pub fn new(api: Arc<dyn DashboardApi>) -> Self {
        Self { api }
    }

    /// Flips the camera flag immediately, then tells the backend. If the
    /// request fails the flag goes back to its pre-toggle value.
    ///
    /// Returns the flag as it stands afterwards.
    pub async fn toggle(&self, state: &Mutex<DashboardState>, cancel: &CancellationToken) -> bool {
        let desired = {
            let mut guard = state.lock().await;
            let desired = !guard.camera_active();
            guard.set_camera_active(desired);
            desired
        };

        match self.api.set_camera_active(desired, cancel).await {
            Ok(()) => {
                log_info!("camera turned {}", if desired { "on" } else { "off" });
                desired
            }
            Err(err) => {
                log_error!("Camera Toggle Error: {err:#}");
                let previous = !desired;
                state.lock().await.set_camera_active(previous);
                previous
            }
        }
    }
}
