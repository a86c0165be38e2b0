// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use haulage_app::{QuickActionOutcome, sample};
use haulage_feed::FeedClient;
use std::thread;
use std::time::{Duration, Instant};
use tiny_http::{Header, Method, Response, Server};

fn json_header() -> Header {
    Header::from_bytes("Content-Type", "application/json").expect("valid content type header")
}

fn mock_server() -> Result<(Server, String)> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let base = format!("http://{}/api", server.server_addr());
    Ok((server, base))
}

#[test]
fn notifications_come_from_the_server_when_it_answers() -> Result<()> {
    let (server, base) = mock_server()?;
    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(request.method(), &Method::Get);
        assert_eq!(request.url(), "/api/notifications");
        let body = r#"[{"id":9,"text":"Trip TR-77 delivered","time":"now"}]"#;
        let response = Response::from_string(body)
            .with_status_code(200)
            .with_header(json_header());
        request.respond(response).expect("response should succeed");
    });

    let client = FeedClient::new(&base, Duration::from_secs(1))?;
    let notifications = client.notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].id.get(), 9);
    assert_eq!(notifications[0].text, "Trip TR-77 delivered");

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn server_error_falls_back_to_samples() -> Result<()> {
    let (server, base) = mock_server()?;
    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(request.url(), "/api/quick-actions");
        request
            .respond(Response::from_string("boom").with_status_code(500))
            .expect("response should succeed");
    });

    let client = FeedClient::new(&base, Duration::from_secs(1))?;
    assert_eq!(client.quick_actions(), sample::fallback_quick_actions());

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn malformed_body_falls_back_to_samples() -> Result<()> {
    let (server, base) = mock_server()?;
    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        let response = Response::from_string(r#"{"not":"a list"}"#)
            .with_status_code(200)
            .with_header(json_header());
        request.respond(response).expect("response should succeed");
    });

    let client = FeedClient::new(&base, Duration::from_secs(1))?;
    assert_eq!(client.notifications(), sample::fallback_notifications());

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn unreachable_server_falls_back() {
    let client = FeedClient::new("http://127.0.0.1:1/api", Duration::from_millis(200))
        .expect("client should initialize");
    assert_eq!(client.notifications(), sample::fallback_notifications());
}

#[test]
fn slow_server_times_out_into_fallback() -> Result<()> {
    let (server, base) = mock_server()?;
    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        thread::sleep(Duration::from_millis(600));
        // The client has given up by now; a failed write is expected.
        let _ = request.respond(Response::from_string("[]").with_header(json_header()));
    });

    let client = FeedClient::new(&base, Duration::from_millis(150))?;
    let started = Instant::now();
    assert_eq!(client.quick_actions(), sample::fallback_quick_actions());
    assert!(started.elapsed() < Duration::from_millis(550));

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn quick_action_completes_on_success() -> Result<()> {
    let (server, base) = mock_server()?;
    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(request.method(), &Method::Post);
        assert_eq!(request.url(), "/api/quick-actions/create_trip");
        let response = Response::from_string(r#"{"ok":true}"#)
            .with_status_code(200)
            .with_header(json_header());
        request.respond(response).expect("response should succeed");
    });

    let client = FeedClient::new(&base, Duration::from_secs(1))?
        .with_simulated_delay(Duration::from_secs(5));
    let started = Instant::now();
    assert_eq!(
        client.perform_quick_action("create_trip"),
        QuickActionOutcome::Completed
    );
    assert!(started.elapsed() < Duration::from_secs(5));

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn quick_action_failure_waits_the_simulated_delay() -> Result<()> {
    let (server, base) = mock_server()?;
    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        request
            .respond(Response::from_string("missing").with_status_code(404))
            .expect("response should succeed");
    });

    let delay = Duration::from_millis(120);
    let client = FeedClient::new(&base, Duration::from_secs(1))?.with_simulated_delay(delay);
    let started = Instant::now();
    assert_eq!(
        client.perform_quick_action("view_trips"),
        QuickActionOutcome::Simulated
    );
    assert!(started.elapsed() >= delay);

    handle.join().expect("server thread should join");
    Ok(())
}
