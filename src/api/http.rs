use std::{future::Future, time::Duration};

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;
use tokio_util::sync::CancellationToken;

use crate::models::{AnalyticsSnapshot, EventDetail, Position, StatusSnapshot};

use super::{
    DashboardApi, Endpoints, RequestCancelled, ANALYTICS_PATH, CAMERA_TOGGLE_PATH, LOCATION_PATH,
    STATUS_PATH,
};

/// `DashboardApi` over HTTP/JSON with reqwest.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    endpoints: Endpoints,
}

impl HttpBackend {
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            endpoints: Endpoints::new(base_url),
        })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    async fn send(
        &self,
        url: String,
        request: reqwest::RequestBuilder,
        cancel: &CancellationToken,
    ) -> Result<Response> {
        let response = run_cancellable(cancel, async {
            request
                .send()
                .await
                .with_context(|| format!("request to {url} failed"))
        })
        .await?;

        response
            .error_for_status()
            .with_context(|| format!("{url} returned an error status"))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: String,
        cancel: &CancellationToken,
    ) -> Result<T> {
        let response = self.send(url.clone(), self.client.get(&url), cancel).await?;
        run_cancellable(cancel, async {
            response
                .json::<T>()
                .await
                .with_context(|| format!("failed to decode JSON from {url}"))
        })
        .await
    }

    async fn post_json<B: Serialize + ?Sized>(
        &self,
        url: String,
        body: &B,
        cancel: &CancellationToken,
    ) -> Result<()> {
        self.send(url.clone(), self.client.post(&url).json(body), cancel)
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl DashboardApi for HttpBackend {
    async fn fetch_status(&self, cancel: &CancellationToken) -> Result<StatusSnapshot> {
        self.get_json(self.endpoints.url(STATUS_PATH), cancel).await
    }

    async fn set_camera_active(&self, active: bool, cancel: &CancellationToken) -> Result<()> {
        self.post_json(
            self.endpoints.url(CAMERA_TOGGLE_PATH),
            &json!({ "active": active }),
            cancel,
        )
        .await
    }

    async fn fetch_analytics(&self, cancel: &CancellationToken) -> Result<AnalyticsSnapshot> {
        self.get_json(self.endpoints.url(ANALYTICS_PATH), cancel).await
    }

    async fn fetch_event(&self, id: i64, cancel: &CancellationToken) -> Result<EventDetail> {
        self.get_json(self.endpoints.event_url(id), cancel).await
    }

    async fn report_location(&self, position: Position, cancel: &CancellationToken) -> Result<()> {
        self.post_json(self.endpoints.url(LOCATION_PATH), &position, cancel)
            .await
    }

    async fn download_report(&self, cancel: &CancellationToken) -> Result<Vec<u8>> {
        let url = self.endpoints.export_url();
        let response = self.send(url.clone(), self.client.get(&url), cancel).await?;
        let bytes = run_cancellable(cancel, async {
            response
                .bytes()
                .await
                .with_context(|| format!("failed to read report body from {url}"))
        })
        .await?;
        Ok(bytes.to_vec())
    }
}

async fn run_cancellable<T, F>(cancel: &CancellationToken, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        _ = cancel.cancelled() => Err(RequestCancelled.into()),
        result = fut => result,
    }
}
