//! Tests for the `/api/v1/events` server-sent event stream.

mod common;

use std::time::Duration;

use aura_events::{event_types, MonitorEvent};
use axum::body::Body;
use axum::http::{header, Response, StatusCode};
use common::*;
use http_body_util::BodyExt;

/// Next SSE frame as text, or `None` once the stream has ended.
async fn next_frame(body: &mut Body) -> Option<String> {
    let frame = tokio::time::timeout(Duration::from_secs(2), body.frame())
        .await
        .expect("frame within timeout")?
        .unwrap();
    let data = frame.into_data().unwrap();
    Some(String::from_utf8(data.to_vec()).unwrap())
}

async fn open_stream(app: &TestApp, uri: &str) -> Response<Body> {
    let response = get(app.router.clone(), uri).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/event-stream"
    );
    response
}

#[tokio::test]
async fn published_events_reach_the_stream() {
    let app = build_test_app(FixedModel(0.05));
    let mut body = open_stream(&app, "/api/v1/events").await.into_body();

    app.monitor.events().publish(
        MonitorEvent::new(event_types::MAINTENANCE_RECORDED)
            .for_machine("Machine_002")
            .with_payload(serde_json::json!({ "health_score": 91.5 })),
    );

    let frame = next_frame(&mut body).await.unwrap();
    assert!(frame.contains("event: maintenance.recorded"), "{frame}");
    let data = frame
        .lines()
        .find_map(|line| line.strip_prefix("data: "))
        .unwrap();
    let event: serde_json::Value = serde_json::from_str(data).unwrap();
    assert_eq!(event["machine_id"], "Machine_002");
    assert_eq!(event["payload"]["health_score"], 91.5);
}

#[tokio::test]
async fn cycle_events_are_streamed_in_order() {
    let mut app = build_test_app(FixedModel(0.7));
    let mut body = open_stream(&app, "/api/v1/events").await.into_body();

    app.scheduler.run_cycle().await.unwrap();

    // Five danger alerts, then the cycle summary.
    for _ in 0..5 {
        let frame = next_frame(&mut body).await.unwrap();
        assert!(frame.contains("event: alert.raised"), "{frame}");
    }
    let frame = next_frame(&mut body).await.unwrap();
    assert!(frame.contains("event: monitor.cycle_completed"), "{frame}");
}

#[tokio::test]
async fn machine_filter_skips_other_machines() {
    let app = build_test_app(FixedModel(0.05));
    let mut body = open_stream(&app, "/api/v1/events?machine_id=Machine_003")
        .await
        .into_body();

    let bus = app.monitor.events();
    bus.publish(MonitorEvent::new(event_types::ALERT_RAISED).for_machine("Machine_001"));
    bus.publish(MonitorEvent::new(event_types::ALERT_RAISED).for_machine("Machine_003"));
    bus.publish(MonitorEvent::new(event_types::CYCLE_COMPLETED));

    let frame = next_frame(&mut body).await.unwrap();
    assert!(frame.contains("\"machine_id\":\"Machine_003\""), "{frame}");
    let frame = next_frame(&mut body).await.unwrap();
    assert!(frame.contains("event: monitor.cycle_completed"), "{frame}");
}

#[tokio::test]
async fn stream_ends_on_shutdown() {
    let app = build_test_app(FixedModel(0.05));
    let mut body = open_stream(&app, "/api/v1/events").await.into_body();

    app.shutdown.cancel();
    assert_eq!(next_frame(&mut body).await, None);
}
