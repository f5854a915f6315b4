//! Scripted in-memory backend for unit tests.

use std::{collections::VecDeque, sync::Mutex, time::Duration};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::{
    api::{DashboardApi, RequestCancelled},
    models::{AnalyticsSnapshot, EventDetail, Position, Severity, StatusSnapshot},
};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Status,
    Camera(bool),
    Analytics,
    Event(i64),
    Location(Position),
    Report,
}

struct Scripted<T> {
    delay: Duration,
    result: Result<T, String>,
}

type Queue<T> = Mutex<VecDeque<Scripted<T>>>;

#[derive(Default)]
pub struct FakeApi {
    status: Queue<StatusSnapshot>,
    camera: Queue<()>,
    analytics: Queue<AnalyticsSnapshot>,
    events: Queue<EventDetail>,
    location: Queue<()>,
    report: Queue<Vec<u8>>,
    calls: Mutex<Vec<Call>>,
}

fn push<T>(queue: &Queue<T>, delay: Duration, result: Result<T, &str>) {
    queue.lock().unwrap().push_back(Scripted {
        delay,
        result: result.map_err(str::to_string),
    });
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_status(&self, result: Result<StatusSnapshot, &str>) {
        push(&self.status, Duration::ZERO, result);
    }

    pub fn push_status_after(&self, delay: Duration, result: Result<StatusSnapshot, &str>) {
        push(&self.status, delay, result);
    }

    pub fn push_camera(&self, result: Result<(), &str>) {
        push(&self.camera, Duration::ZERO, result);
    }

    pub fn push_analytics(&self, result: Result<AnalyticsSnapshot, &str>) {
        push(&self.analytics, Duration::ZERO, result);
    }

    pub fn push_analytics_after(&self, delay: Duration, result: Result<AnalyticsSnapshot, &str>) {
        push(&self.analytics, delay, result);
    }

    pub fn push_event(&self, result: Result<EventDetail, &str>) {
        push(&self.events, Duration::ZERO, result);
    }

    pub fn push_event_after(&self, delay: Duration, result: Result<EventDetail, &str>) {
        push(&self.events, delay, result);
    }

    pub fn push_location(&self, result: Result<(), &str>) {
        push(&self.location, Duration::ZERO, result);
    }

    pub fn push_report(&self, result: Result<Vec<u8>, &str>) {
        push(&self.report, Duration::ZERO, result);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, call: &Call) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|recorded| std::mem::discriminant(*recorded) == std::mem::discriminant(call))
            .count()
    }

    async fn answer<T>(
        &self,
        queue: &Queue<T>,
        call: Call,
        cancel: &CancellationToken,
    ) -> Result<T> {
        self.calls.lock().unwrap().push(call.clone());
        let scripted = queue.lock().unwrap().pop_front();
        let Some(Scripted { delay, result }) = scripted else {
            return Err(anyhow!("no scripted response for {call:?}"));
        };

        if !delay.is_zero() {
            tokio::select! {
                _ = cancel.cancelled() => return Err(RequestCancelled.into()),
                _ = tokio::time::sleep(delay) => {}
            }
        }

        result.map_err(|message| anyhow!(message))
    }
}

#[async_trait]
impl DashboardApi for FakeApi {
    async fn fetch_status(&self, cancel: &CancellationToken) -> Result<StatusSnapshot> {
        self.answer(&self.status, Call::Status, cancel).await
    }

    async fn set_camera_active(&self, active: bool, cancel: &CancellationToken) -> Result<()> {
        self.answer(&self.camera, Call::Camera(active), cancel).await
    }

    async fn fetch_analytics(&self, cancel: &CancellationToken) -> Result<AnalyticsSnapshot> {
        self.answer(&self.analytics, Call::Analytics, cancel).await
    }

    async fn fetch_event(&self, id: i64, cancel: &CancellationToken) -> Result<EventDetail> {
        self.answer(&self.events, Call::Event(id), cancel).await
    }

    async fn report_location(&self, position: Position, cancel: &CancellationToken) -> Result<()> {
        self.answer(&self.location, Call::Location(position), cancel)
            .await
    }

    async fn download_report(&self, cancel: &CancellationToken) -> Result<Vec<u8>> {
        self.answer(&self.report, Call::Report, cancel).await
    }
}

pub fn detection(severity: Severity, message: &str) -> StatusSnapshot {
    StatusSnapshot {
        detected: true,
        severity,
        message: message.into(),
        confidence: 0.87,
        ..StatusSnapshot::default()
    }
}

pub fn event(id: i64, severity: &str) -> EventDetail {
    EventDetail {
        id,
        timestamp: "Tue, 15 Oct 2024 10:00:00 GMT".into(),
        latitude: Some(17.4),
        longitude: Some(78.5),
        severity: severity.into(),
        confidence: 0.912,
        image_path: Some(format!("evidence/fire_{id}.jpg")),
        ..EventDetail::default()
    }
}
