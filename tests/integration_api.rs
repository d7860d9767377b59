//! Integration tests for the REST API feature.

#![cfg(feature = "api")]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::util::ServiceExt;

use hems_sim::api::{AppState, router};
use hems_sim::config::ScenarioConfig;
use hems_sim::runner::run_scenario;

/// Run the demo preset and return the API state.
fn build_api_state() -> Arc<AppState> {
    let report = run_scenario(&ScenarioConfig::demo()).unwrap();
    assert!(report.completed());
    Arc::new(AppState {
        engine: report.engine,
    })
}

async fn get_json(uri: &str) -> (StatusCode, serde_json::Value) {
    let app = router(build_api_state());
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn state_reflects_demo_run() {
    let (status, json) = get_json("/state").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["time"], "21:00");
    assert_eq!(json["max_grid_kw"], 3.5);
    assert_eq!(json["production_device"], "solar");
    assert_eq!(json["tick_count"], 21 * 60);

    let devices = json["devices"].as_array().unwrap();
    assert_eq!(devices.len(), 7);
    let tv = devices.iter().find(|d| d["id"] == "tv").unwrap();
    assert_eq!(tv["is_on"], true);
    assert_eq!(tv["kind"], "manual");

    // Only the tv timer is still pending.
    let timers = json["timers"].as_array().unwrap();
    assert_eq!(timers.len(), 1);
    assert_eq!(timers[0]["device_id"], "tv");
}

#[tokio::test]
async fn telemetry_window_around_oven_start() {
    let (status, json) = get_json("/telemetry?from=1109&to=1111").await;
    assert_eq!(status, StatusCode::OK);

    let ticks = json.as_array().unwrap();
    assert_eq!(ticks.len(), 3);
    assert_eq!(ticks[1]["time"], "18:30");
    assert_eq!(ticks[1]["transitions"][0], "started:oven");
    assert_eq!(ticks[1]["transitions"][1], "shed:heater");
}

#[tokio::test]
async fn telemetry_open_ranges() {
    let (_, all) = get_json("/telemetry").await;
    assert_eq!(all.as_array().map(Vec::len), Some(21 * 60));

    let (_, tail) = get_json("/telemetry?from=1200").await;
    assert_eq!(tail.as_array().map(Vec::len), Some(61));
}

#[tokio::test]
async fn telemetry_rejects_inverted_range() {
    let (status, json) = get_json("/telemetry?from=600&to=10").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().is_some());
}
