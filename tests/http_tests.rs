// Integration tests for the HTTP control API
//
// Requests go straight through the axum router with tower's `oneshot`, no
// listener involved.

mod common;

use anyhow::Result;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use common::{expect_event, TestRecorder};
use serde_json::{json, Value};
use tower::ServiceExt;
use voice_recorder::{create_router, AppState, RecorderEvent, RecordingStatus};

fn router(recorder: &TestRecorder) -> Router {
    create_router(AppState::new(
        recorder.controller.clone(),
        recorder.hub.clone(),
    ))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> Result<(StatusCode, Value)> {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body)?))?,
        None => builder.body(Body::empty())?,
    };

    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    Ok((status, value))
}

#[tokio::test]
async fn test_health_check() -> Result<()> {
    let recorder = TestRecorder::new()?;
    let app = router(&recorder);

    let (status, body) = send(&app, "GET", "/health", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("OK".to_string()));

    Ok(())
}

#[tokio::test]
async fn test_recording_lifecycle() -> Result<()> {
    let recorder = TestRecorder::new()?;
    let app = router(&recorder);

    let (status, body) = send(
        &app,
        "POST",
        "/recording/start",
        Some(json!({ "outputLocation": "CACHE", "subDirectory": "http" })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "value": true }));

    let (_, body) = send(&app, "GET", "/recording/status", None).await?;
    assert_eq!(body, json!({ "status": "RECORDING" }));

    recorder.injector.capture_ms(400).await?;

    let (_, body) = send(&app, "POST", "/recording/pause", None).await?;
    assert_eq!(body, json!({ "value": true }));
    let (_, body) = send(&app, "POST", "/recording/pause", None).await?;
    assert_eq!(body, json!({ "value": false }));
    let (_, body) = send(&app, "POST", "/recording/resume", None).await?;
    assert_eq!(body, json!({ "value": true }));

    let (status, body) = send(&app, "POST", "/recording/stop", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["durationMs"], json!(400));
    assert_eq!(body["mimeType"], json!("audio/wav"));
    assert_eq!(body["value"]["kind"], json!("path"));
    assert!(body["value"]["path"]
        .as_str()
        .is_some_and(|p| p.starts_with("http/recording-")));

    let (_, body) = send(&app, "GET", "/recording/status", None).await?;
    assert_eq!(body, json!({ "status": "NONE" }));

    Ok(())
}

#[tokio::test]
async fn test_default_location_is_inline() -> Result<()> {
    let recorder = TestRecorder::new()?;
    let app = router(&recorder);

    // Missing fields fall back to the defaults
    let (status, _) = send(&app, "POST", "/recording/start", Some(json!({}))).await?;
    assert_eq!(status, StatusCode::OK);
    recorder.injector.capture_ms(200).await?;

    let (status, body) = send(&app, "POST", "/recording/stop", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["value"]["kind"], json!("inline"));
    assert!(body["value"]["base64"].as_str().is_some_and(|b| !b.is_empty()));

    Ok(())
}

#[tokio::test]
async fn test_errors_map_to_status_codes() -> Result<()> {
    let recorder = TestRecorder::new()?;
    let app = router(&recorder);

    let (status, body) = send(&app, "POST", "/recording/stop", None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], json!("RECORDING_HAS_NOT_STARTED"));

    send(&app, "POST", "/recording/start", Some(json!({}))).await?;
    let (status, body) = send(&app, "POST", "/recording/start", Some(json!({}))).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], json!("ALREADY_RECORDING"));
    send(&app, "POST", "/recording/stop", None).await?;

    recorder.injector.fail_next_open();
    let (status, body) = send(&app, "POST", "/recording/start", Some(json!({}))).await?;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], json!("DEVICE_UNAVAILABLE"));

    Ok(())
}

#[tokio::test]
async fn test_interruption_notifications() -> Result<()> {
    let recorder = TestRecorder::new()?;
    let app = router(&recorder);
    let mut events = recorder.controller.subscribe_events();

    send(&app, "POST", "/recording/start", Some(json!({}))).await?;

    let (status, _) = send(&app, "POST", "/interruptions/began", None).await?;
    assert_eq!(status, StatusCode::ACCEPTED);
    expect_event(&mut events, |e| matches!(e, RecorderEvent::InterruptionBegan)).await?;
    assert_eq!(
        recorder.controller.get_current_status().await,
        RecordingStatus::Interrupted
    );

    // Body is optional on the ended notification
    let (status, _) = send(&app, "POST", "/interruptions/ended", None).await?;
    assert_eq!(status, StatusCode::ACCEPTED);
    expect_event(&mut events, |e| matches!(e, RecorderEvent::InterruptionEnded)).await?;

    let (_, body) = send(&app, "POST", "/recording/resume", None).await?;
    assert_eq!(body, json!({ "value": true }));
    assert_eq!(recorder.controller.segment_count().await, 2);

    Ok(())
}
