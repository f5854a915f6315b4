use std::time::Duration;

use chrono::Local;
use flaresense_lib::{
    api::{is_cancelled, DashboardApi, HttpBackend},
    incidents::IncidentLog,
    models::{IncidentKind, Position, Severity},
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;

const TIMEOUT: Duration = Duration::from_secs(5);

/// Serves exactly one canned HTTP/1.1 response and hands back the raw request.
async fn serve_once(
    status: &str,
    content_type: &str,
    body: &[u8],
) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());

    let mut response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    )
    .into_bytes();
    response.extend_from_slice(body);

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;
        socket.write_all(&response).await.unwrap();
        socket.shutdown().await.unwrap();
        request
    });

    (base, handle)
}

async fn read_request(socket: &mut TcpStream) -> String {
    let mut raw = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        raw.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&raw).to_string();
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if raw.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&raw).to_string()
}

fn request_body(request: &str) -> serde_json::Value {
    let (_, body) = request.split_once("\r\n\r\n").unwrap();
    serde_json::from_str(body).unwrap()
}

#[tokio::test]
async fn decodes_status_payload() {
    let (base, server) = serve_once(
        "200 OK",
        "application/json",
        br#"{"detected":true,"severity":"High","message":"CRITICAL: 2 FIRE(S) DETECTED!","confidence":0.93,"count":2}"#,
    )
    .await;
    let backend = HttpBackend::new(&base, TIMEOUT).unwrap();

    let status = backend.fetch_status(&CancellationToken::new()).await.unwrap();

    assert!(status.detected);
    assert_eq!(status.severity, Severity::High);
    assert_eq!(status.count, Some(2));
    let request = server.await.unwrap();
    assert!(request.starts_with("GET /api/status HTTP/1.1"));
}

#[tokio::test]
async fn upper_case_severity_is_unknown_and_logs_a_warning() {
    let (base, _server) = serve_once(
        "200 OK",
        "application/json",
        br#"{"detected":true,"severity":"HIGH","message":"CRITICAL: 1 FIRE(S) DETECTED!","confidence":0.88}"#,
    )
    .await;
    let backend = HttpBackend::new(&base, TIMEOUT).unwrap();

    let status = backend.fetch_status(&CancellationToken::new()).await.unwrap();
    assert_eq!(status.severity, Severity::Unknown);

    let mut log = IncidentLog::default();
    let entry = log.record(&status, Local::now()).unwrap();
    assert_eq!(entry.kind, IncidentKind::Warning);
}

#[tokio::test]
async fn non_json_status_body_is_an_error() {
    let (base, _server) = serve_once("200 OK", "text/html", b"<html>").await;
    let backend = HttpBackend::new(&base, TIMEOUT).unwrap();

    let err = backend
        .fetch_status(&CancellationToken::new())
        .await
        .unwrap_err();

    assert!(!is_cancelled(&err));
    assert!(format!("{err:#}").contains("failed to decode JSON"));
}

#[tokio::test]
async fn missing_event_is_an_error() {
    let (base, server) =
        serve_once("404 Not Found", "application/json", br#"{"error":"Not found"}"#).await;
    let backend = HttpBackend::new(&base, TIMEOUT).unwrap();

    let err = backend
        .fetch_event(404, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(!is_cancelled(&err));
    assert!(format!("{err:#}").contains("404"));
    assert!(server.await.unwrap().starts_with("GET /api/event/404 HTTP/1.1"));
}

#[tokio::test]
async fn camera_toggle_posts_desired_state() {
    let (base, server) =
        serve_once("200 OK", "application/json", br#"{"status":"ok"}"#).await;
    let backend = HttpBackend::new(&base, TIMEOUT).unwrap();

    backend
        .set_camera_active(false, &CancellationToken::new())
        .await
        .unwrap();

    let request = server.await.unwrap();
    assert!(request.starts_with("POST /api/camera/toggle HTTP/1.1"));
    assert_eq!(request_body(&request), serde_json::json!({ "active": false }));
}

#[tokio::test]
async fn location_report_posts_coordinates() {
    let (base, server) = serve_once("200 OK", "application/json", b"{}").await;
    let backend = HttpBackend::new(&base, TIMEOUT).unwrap();

    backend
        .report_location(
            Position {
                lat: 17.385,
                lon: 78.4867,
            },
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let request = server.await.unwrap();
    assert!(request.starts_with("POST /api/location HTTP/1.1"));
    assert_eq!(
        request_body(&request),
        serde_json::json!({ "lat": 17.385, "lon": 78.4867 })
    );
}

#[tokio::test]
async fn analytics_counts_pass_through() {
    let (base, _server) = serve_once(
        "200 OK",
        "application/json",
        br#"{"stats":{"total_events":7,"severity_counts":{"HIGH":3,"LOW":4}},"events":[{"id":9,"timestamp":"2024-03-01 10:00:00","latitude":12.9,"longitude":77.6,"severity":"HIGH","confidence":0.8}]}"#,
    )
    .await;
    let backend = HttpBackend::new(&base, TIMEOUT).unwrap();

    let snapshot = backend
        .fetch_analytics(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(snapshot.stats.total_events, 7);
    assert_eq!(snapshot.stats.count_for("HIGH"), 3);
    assert_eq!(snapshot.stats.count_for("MEDIUM"), 0);
    assert_eq!(snapshot.events[0].id, 9);
}

#[tokio::test]
async fn report_download_returns_raw_bytes() {
    let pdf = b"%PDF-1.4\n%fake report\n";
    let (base, server) = serve_once("200 OK", "application/pdf", pdf).await;
    let backend = HttpBackend::new(&base, TIMEOUT).unwrap();

    let bytes = backend
        .download_report(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(bytes, pdf);
    assert!(server.await.unwrap().starts_with("GET /api/analytics/export HTTP/1.1"));
}

#[tokio::test]
async fn cancelling_abandons_a_hung_request() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let _server = tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;
        drop(socket);
    });
    let backend = HttpBackend::new(&base, TIMEOUT).unwrap();
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let err = backend.fetch_status(&cancel).await.unwrap_err();
    assert!(is_cancelled(&err));
}

#[tokio::test]
async fn request_timeout_is_a_plain_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let _server = tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;
        drop(socket);
    });
    let backend = HttpBackend::new(&base, Duration::from_millis(100)).unwrap();

    let err = backend
        .fetch_status(&CancellationToken::new())
        .await
        .unwrap_err();
    assert!(!is_cancelled(&err));
}
