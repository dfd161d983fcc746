#![allow(clippy::unwrap_used)]
// Status poller behaviour against wiremock printers.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use printdeck_core::{
    LiveStatus, NewProfile, PollState, ProfilePatch, Session, SessionConfig, StatusStream,
    TracingNotifier,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn session(poll_interval: Duration) -> Session {
    let config = SessionConfig {
        poll_interval,
        ..SessionConfig::default()
    };
    Session::in_memory(&config, Arc::new(TracingNotifier)).unwrap()
}

fn printer_body(tool0: f64) -> serde_json::Value {
    json!({
        "temperature": {
            "tool0": { "actual": tool0, "target": 0.0, "offset": 0 },
            "bed": { "actual": 22.0, "target": 0.0, "offset": 0 }
        },
        "state": { "text": "Operational", "flags": { "operational": true, "ready": true } }
    })
}

fn job_body() -> serde_json::Value {
    json!({
        "state": "Operational",
        "job": { "file": { "name": null }, "estimatedPrintTime": null },
        "progress": { "completion": null, "printTime": null, "printTimeLeft": null }
    })
}

async fn printer_server(tool0: f64, delay: Duration) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/printer"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(printer_body(tool0))
                .set_delay(delay),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/job"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(job_body())
                .set_delay(delay),
        )
        .mount(&server)
        .await;
    server
}

async fn count(server: &MockServer, route: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == route)
        .count()
}

/// Wait until `server` has received at least `n` requests on `route`.
async fn wait_for_requests(server: &MockServer, route: &str, n: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while count(server, route).await < n {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("timed out waiting for requests");
}

async fn wait_for(
    stream: &mut StatusStream,
    pred: impl Fn(&LiveStatus) -> bool,
) -> Arc<LiveStatus> {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let latest = stream.latest();
            if pred(&latest) {
                return latest;
            }
            stream.changed().await.expect("poller dropped");
        }
    })
    .await
    .expect("timed out waiting for status")
}

fn tool0(status: &LiveStatus) -> Option<f64> {
    status
        .printer
        .as_ref()
        .and_then(|p| p.temperature.tool0)
        .and_then(|t| t.actual)
}

// ── Lifecycle ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_first_read_is_immediate() {
    let server = printer_server(205.0, Duration::ZERO).await;
    let session = session(Duration::from_secs(60));
    let id = session
        .registry()
        .add(NewProfile::new("Ender", server.uri(), "key"))
        .unwrap();

    let mut stream = session.poller().subscribe();
    session.start();

    let status = wait_for(&mut stream, |s| s.printer.is_some() && s.job.is_some()).await;
    assert_eq!(status.device_id.as_ref(), Some(&id));
    assert_eq!(tool0(&status), Some(205.0));
    assert_eq!(status.state_text(), Some("Operational"));
    assert_eq!(
        session.poller().state(),
        PollState::Polling { device_id: id }
    );
    assert_eq!(count(&server, "/api/printer").await, 1);

    session.shutdown().await;
    assert_eq!(session.poller().state(), PollState::Idle);
}

#[tokio::test]
async fn test_tick_during_in_flight_read_is_skipped() {
    let server = printer_server(200.0, Duration::from_secs(3)).await;
    let session = session(Duration::from_millis(50));
    session
        .registry()
        .add(NewProfile::new("Slow", server.uri(), "key"))
        .unwrap();

    session.start();
    wait_for_requests(&server, "/api/printer", 1).await;
    tokio::time::sleep(Duration::from_millis(500)).await;

    // Ten or so ticks fired while the first read was still pending.
    assert_eq!(count(&server, "/api/printer").await, 1);
    assert_eq!(count(&server, "/api/job").await, 1);

    session.shutdown().await;
}

#[tokio::test]
async fn test_read_for_previous_printer_is_discarded() {
    let slow_a = printer_server(200.0, Duration::from_secs(1)).await;
    let fast_b = printer_server(20.0, Duration::ZERO).await;
    let session = session(Duration::from_secs(60));

    session
        .registry()
        .add(NewProfile::new("A", slow_a.uri(), "key"))
        .unwrap();
    let mut stream = session.poller().subscribe();
    session.start();
    wait_for_requests(&slow_a, "/api/printer", 1).await;

    // Adding B makes it active while A's read is still in flight.
    let b = session
        .registry()
        .add(NewProfile::new("B", fast_b.uri(), "key"))
        .unwrap();
    let status = wait_for(&mut stream, |s| s.device_id.as_ref() == Some(&b) && s.printer.is_some()).await;
    assert_eq!(tool0(&status), Some(20.0));

    // Let A's read resolve; it must not leak into B's status.
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(count(&slow_a, "/api/printer").await, 1);
    let status = session.poller().status();
    assert_eq!(status.device_id.as_ref(), Some(&b));
    assert_eq!(tool0(&status), Some(20.0));

    session.shutdown().await;
}

#[tokio::test]
async fn test_edited_address_is_used_on_next_read() {
    let old = printer_server(200.0, Duration::ZERO).await;
    let new = printer_server(30.0, Duration::ZERO).await;
    let session = session(Duration::from_millis(100));
    let id = session
        .registry()
        .add(NewProfile::new("Ender", old.uri(), "key"))
        .unwrap();

    let mut stream = session.poller().subscribe();
    session.start();
    wait_for(&mut stream, |s| tool0(s) == Some(200.0)).await;

    session
        .registry()
        .update(
            &id,
            &ProfilePatch {
                server_url: Some(new.uri()),
                ..ProfilePatch::default()
            },
        )
        .unwrap();

    let status = wait_for(&mut stream, |s| tool0(s) == Some(30.0)).await;
    assert_eq!(status.device_id.as_ref(), Some(&id));
    assert!(count(&new, "/api/printer").await >= 1);
    assert_eq!(
        session.poller().state(),
        PollState::Polling { device_id: id }
    );

    session.shutdown().await;
}

#[tokio::test]
async fn test_removing_last_printer_goes_idle() {
    let server = printer_server(180.0, Duration::ZERO).await;
    let session = session(Duration::from_secs(60));
    let id = session
        .registry()
        .add(NewProfile::new("Only", server.uri(), "key"))
        .unwrap();

    let mut stream = session.poller().subscribe();
    let mut state = session.poller().watch_state();
    session.start();
    wait_for(&mut stream, |s| s.printer.is_some()).await;

    session.registry().remove(&id).unwrap();
    tokio::time::timeout(Duration::from_secs(5), state.wait_for(|s| *s == PollState::Idle))
        .await
        .unwrap()
        .unwrap();

    let status = session.poller().status();
    assert!(status.is_empty());
    assert_eq!(status.device_id, None);

    session.shutdown().await;
}

// ── Out-of-cycle reads ──────────────────────────────────────────────

#[tokio::test]
async fn test_failed_half_keeps_last_known_value() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/printer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(printer_body(210.0)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/job"))
        .respond_with(ResponseTemplate::new(200).set_body_json(job_body()))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/job"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let session = session(Duration::from_secs(60));
    session
        .registry()
        .add(NewProfile::new("Flaky", server.uri(), "key"))
        .unwrap();

    session.poller().refresh_now().await;
    let first = session.poller().status();
    assert!(first.job.is_some());

    session.poller().refresh_now().await;
    let second = session.poller().status();
    assert_eq!(second.job, first.job);
    assert_eq!(second.job_updated_at, first.job_updated_at);
    assert!(second.printer_updated_at >= first.printer_updated_at);
    assert_eq!(count(&server, "/api/job").await, 2);
}

#[tokio::test]
async fn test_malformed_printer_payload_is_ignored() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/printer"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "state": { "text": "?" } })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/job"))
        .respond_with(ResponseTemplate::new(200).set_body_json(job_body()))
        .mount(&server)
        .await;

    let session = session(Duration::from_secs(60));
    session
        .registry()
        .add(NewProfile::new("Odd", server.uri(), "key"))
        .unwrap();

    session.poller().refresh_now().await;
    let status = session.poller().status();
    assert!(status.printer.is_none());
    assert_eq!(status.job.as_ref().map(|j| j.state.as_str()), Some("Operational"));
}

#[tokio::test]
async fn test_refresh_without_active_printer_is_noop() {
    let session = session(Duration::from_secs(60));
    session.poller().refresh_now().await;
    assert!(session.poller().status().is_empty());
}
