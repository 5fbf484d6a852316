//! Integration tests for concurrent CDN probing

#![allow(clippy::unwrap_used)]

use docs_cdn_host::{EarlyStop, ProbeOptions, Prober};
use pretty_assertions::assert_eq;
use std::time::{Duration, Instant};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

fn quick(total_ms: u64) -> ProbeOptions {
    ProbeOptions::default().with_timing(Duration::from_millis(50), Duration::from_millis(total_ms))
}

async fn serve(server: &MockServer, at: &str, status: u16, body: &str, delay: Duration) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(
            ResponseTemplate::new(status)
                .set_body_string(body)
                .set_delay(delay),
        )
        .mount(server)
        .await;
}

/// Test that reachable URLs come back in input order, failures omitted
#[tokio::test]
async fn test_probe_all_keeps_input_order() {
    let server = MockServer::start().await;
    serve(&server, "/slow.css", 200, "slow", Duration::from_millis(150)).await;
    serve(&server, "/fast.css", 200, "fast", Duration::ZERO).await;
    serve(&server, "/gone.css", 404, "", Duration::ZERO).await;

    let urls = vec![
        format!("{}/slow.css", server.uri()),
        format!("{}/gone.css", server.uri()),
        format!("{}/fast.css", server.uri()),
    ];
    let prober = Prober::new().unwrap();
    let reachable = prober.probe_all(&urls, &quick(1000)).await;
    assert_eq!(reachable, vec![urls[0].clone(), urls[2].clone()]);
}

/// Test that redirect-class and error statuses count as failures
#[tokio::test]
async fn test_status_above_299_fails() {
    let server = MockServer::start().await;
    serve(&server, "/moved.css", 304, "", Duration::ZERO).await;
    serve(&server, "/error.css", 500, "boom", Duration::ZERO).await;
    serve(&server, "/ok.css", 204, "", Duration::ZERO).await;

    let urls = vec![
        format!("{}/moved.css", server.uri()),
        format!("{}/error.css", server.uri()),
        format!("{}/ok.css", server.uri()),
    ];
    let prober = Prober::new().unwrap();
    let reachable = prober.probe_all(&urls, &quick(500)).await;
    assert_eq!(reachable, vec![urls[2].clone()]);
}

/// Test that fetched bodies line up with their URLs
#[tokio::test]
async fn test_fetch_all_returns_bodies() {
    let server = MockServer::start().await;
    serve(&server, "/swagger-ui.css", 200, "body{}", Duration::ZERO).await;
    serve(&server, "/missing.js", 404, "nope", Duration::ZERO).await;
    serve(&server, "/redoc.standalone.js", 200, "redoc()", Duration::from_millis(80)).await;

    let urls = vec![
        format!("{}/swagger-ui.css", server.uri()),
        format!("{}/missing.js", server.uri()),
        format!("{}/redoc.standalone.js", server.uri()),
    ];
    let prober = Prober::new().unwrap();
    let bodies = prober.fetch_all(&urls, &quick(1000)).await;
    assert_eq!(bodies.len(), 3);
    assert_eq!(&bodies[0][..], b"body{}");
    assert!(bodies[1].is_empty());
    assert_eq!(&bodies[2][..], b"redoc()");

    // Successful bodies are memoized for later fetches
    assert!(prober.cache().contains(&urls[0]));
    assert!(!prober.cache().contains(&urls[1]));
}

/// Test that memoized bodies answer fetches without a request
#[tokio::test]
async fn test_fetch_all_trusts_memo() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/swagger-ui.css"))
        .respond_with(ResponseTemplate::new(200).set_body_string("once"))
        .expect(1)
        .mount(&server)
        .await;

    let urls = vec![format!("{}/swagger-ui.css", server.uri())];
    let prober = Prober::new().unwrap();
    let first = prober.fetch_all(&urls, &quick(500)).await;
    let second = prober.fetch_all(&urls, &quick(500)).await;
    assert_eq!(first, second);
}

/// Test that the fastest candidate wins over a slower earlier one
#[tokio::test]
async fn test_find_fastest_picks_quickest() {
    let slow = MockServer::start().await;
    let fast = MockServer::start().await;
    serve(&slow, "/swagger-ui.css", 200, "slow", Duration::from_millis(600)).await;
    serve(&fast, "/swagger-ui.css", 200, "fast", Duration::ZERO).await;

    let urls = vec![
        format!("{}/swagger-ui.css", slow.uri()),
        format!("{}/swagger-ui.css", fast.uri()),
    ];
    let prober = Prober::new()
        .unwrap()
        .with_fastest(quick(2000));
    assert_eq!(prober.find_fastest(&urls).await, urls[1]);
}

/// Test the fallback to the first URL when nothing answers in time
#[tokio::test]
async fn test_find_fastest_falls_back_to_first() {
    let server = MockServer::start().await;
    serve(&server, "/a.css", 503, "", Duration::ZERO).await;
    serve(&server, "/b.css", 200, "late", Duration::from_secs(2)).await;

    let urls = vec![
        format!("{}/a.css", server.uri()),
        format!("{}/b.css", server.uri()),
    ];
    let prober = Prober::new().unwrap().with_fastest(quick(200));
    assert_eq!(prober.find_fastest(&urls).await, urls[0]);
    assert_eq!(prober.find_fastest(&[]).await, "");
}

/// Test that an early stop does not wait for slow probes
#[tokio::test]
async fn test_early_stop_aborts_pending_probes() {
    let server = MockServer::start().await;
    serve(&server, "/fast.css", 200, "fast", Duration::ZERO).await;
    serve(&server, "/hang.css", 200, "hang", Duration::from_secs(10)).await;

    let urls = vec![
        format!("{}/hang.css", server.uri()),
        format!("{}/fast.css", server.uri()),
    ];
    let prober = Prober::new().unwrap();
    let options = quick(5000).with_early_stop(EarlyStop::First);

    let started = Instant::now();
    let reachable = prober.probe_all(&urls, &options).await;
    assert_eq!(reachable, vec![urls[1].clone()]);
    assert!(started.elapsed() < Duration::from_secs(2));
}

/// Test that all-but-one stops as soon as one probe is left hanging
#[tokio::test]
async fn test_all_but_one_early_stop() {
    let server = MockServer::start().await;
    serve(&server, "/a.css", 200, "a", Duration::ZERO).await;
    serve(&server, "/b.css", 200, "b", Duration::ZERO).await;
    serve(&server, "/hang.css", 200, "hang", Duration::from_secs(10)).await;

    let urls = vec![
        format!("{}/a.css", server.uri()),
        format!("{}/hang.css", server.uri()),
        format!("{}/b.css", server.uri()),
    ];
    let prober = Prober::new().unwrap();
    let options = quick(5000).with_early_stop(EarlyStop::AllButOne);

    let started = Instant::now();
    let reachable = prober.probe_all(&urls, &options).await;
    assert_eq!(reachable, vec![urls[0].clone(), urls[2].clone()]);
    assert!(started.elapsed() < Duration::from_secs(2));
}
