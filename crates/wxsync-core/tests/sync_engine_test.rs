#![allow(clippy::unwrap_used)]
// Integration tests for `SyncEngine` against mocked vendor and platform APIs.

mod common;

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, body_partial_json, body_string_contains, header, method, path};
use wiremock::{Mock, ResponseTemplate};

use common::{
    GARDEN_TEMP_STATE, Harness, INDOOR_HUMIDITY_STATE, INDOOR_TEMP_STATE, RECORD_ID, config,
    mount_existing_network, station_data, token_expired, token_response,
};
use wxsync_core::{BootstrapCoordinator, CoreError, StartMode, SyncEngine};

async fn resumed_engine(harness: &Harness) -> SyncEngine {
    harness.mount_record("Home").await;
    harness.mount_record_patches().await;
    mount_existing_network(&harness.platform).await;

    let mut engine = harness.engine(config()).await;
    let mode = BootstrapCoordinator::new().run(&mut engine).await.unwrap();
    assert_eq!(mode, StartMode::Resumed);
    engine
}

// ── Connect ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_connect_reuses_stored_credential() {
    let harness = Harness::start().await;
    harness.mount_record("Home").await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(token_response("unused", "unused"))
        .expect(0)
        .mount(&harness.vendor)
        .await;

    let mut engine = harness.engine(config()).await;
    assert_eq!(engine.station_name(), Some("Home"));
    assert!(engine.network().is_none());
    assert!(engine.tokens().credential().is_some());
}

#[tokio::test]
async fn test_connect_without_token_performs_password_grant_and_persists() {
    let harness = Harness::start().await;
    harness
        .mount_record_body(json!([{ "meta": { "id": RECORD_ID } }]))
        .await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(body_string_contains("grant_type=password"))
        .respond_with(token_response("a-new", "r-new"))
        .expect(1)
        .mount(&harness.vendor)
        .await;

    Mock::given(method("PATCH"))
        .and(path(format!("/data/{RECORD_ID}")))
        .and(body_json(json!({
            "accessToken": "a-new",
            "refreshToken": "r-new",
            "expiresIn": 10800
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&harness.platform)
        .await;

    harness.engine(config()).await;
}

#[tokio::test]
async fn test_connect_fails_when_initial_exchange_is_rejected() {
    let harness = Harness::start().await;
    harness
        .mount_record_body(json!([{ "meta": { "id": RECORD_ID } }]))
        .await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "bad credentials"
        })))
        .mount(&harness.vendor)
        .await;

    let (vendor, udm) = harness.clients();
    let result = SyncEngine::connect(vendor, udm, config()).await;
    assert!(matches!(result, Err(CoreError::Auth { .. })));
}

#[tokio::test]
async fn test_connect_without_record_fails() {
    let harness = Harness::start().await;
    harness.mount_record_body(json!([])).await;

    let (vendor, udm) = harness.clients();
    let result = SyncEngine::connect(vendor, udm, config()).await;
    assert!(matches!(result, Err(CoreError::RecordMissing)));
}

// ── Token retry ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_expired_token_refreshes_once_and_retries() {
    let harness = Harness::start().await;
    harness.mount_record("Home").await;
    harness.mount_record_patches().await;

    Mock::given(method("GET"))
        .and(path("/api/getstationsdata"))
        .and(header("authorization", "Bearer a1"))
        .respond_with(token_expired())
        .expect(1)
        .mount(&harness.vendor)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/getstationsdata"))
        .and(header("authorization", "Bearer a2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(station_data(21.5, 40, 6.5)))
        .expect(1)
        .mount(&harness.vendor)
        .await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=r1"))
        .respond_with(token_response("a2", "r2"))
        .expect(1)
        .mount(&harness.vendor)
        .await;

    Mock::given(method("PATCH"))
        .and(path(format!("/data/{RECORD_ID}")))
        .and(body_partial_json(json!({ "accessToken": "a2", "refreshToken": "r2" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&harness.platform)
        .await;

    let mut engine = harness.engine(config()).await;
    let snapshot = engine.fetch_snapshot().await.unwrap();
    assert_eq!(snapshot.station_name.as_deref(), Some("Home"));
    assert_eq!(snapshot.devices.len(), 1);
}

#[tokio::test]
async fn test_second_empty_result_is_surfaced_not_retried() {
    let harness = Harness::start().await;
    harness.mount_record("Home").await;
    harness.mount_record_patches().await;

    Mock::given(method("GET"))
        .and(path("/api/getstationsdata"))
        .respond_with(token_expired())
        .expect(2)
        .mount(&harness.vendor)
        .await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(token_response("a2", "r2"))
        .expect(1)
        .mount(&harness.vendor)
        .await;

    let mut engine = harness.engine(config()).await;
    let result = engine.fetch_snapshot().await;
    assert!(matches!(result, Err(CoreError::EmptySnapshot)));
}

#[tokio::test]
async fn test_failed_refresh_is_an_auth_error() {
    let harness = Harness::start().await;
    harness.mount_record("Home").await;
    harness.mount_record_patches().await;

    Mock::given(method("GET"))
        .and(path("/api/getstationsdata"))
        .respond_with(token_expired())
        .expect(1)
        .mount(&harness.vendor)
        .await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "error": "invalid_grant" })))
        .expect(1)
        .mount(&harness.vendor)
        .await;

    let mut engine = harness.engine(config()).await;
    let result = engine.fetch_snapshot().await;
    assert!(matches!(result, Err(CoreError::Auth { .. })));
}

// ── Sync pass ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_sync_pass_writes_only_changed_states() {
    let harness = Harness::start().await;
    let mut engine = resumed_engine(&harness).await;

    Mock::given(method("GET"))
        .and(path("/api/getstationsdata"))
        .respond_with(ResponseTemplate::new(200).set_body_json(station_data(21.5, 40, 6.5)))
        .mount(&harness.vendor)
        .await;

    Mock::given(method("PATCH"))
        .and(path(format!("/state/{INDOOR_HUMIDITY_STATE}")))
        .and(body_json(json!({ "data": "40" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&harness.platform)
        .await;

    for unchanged in [INDOOR_TEMP_STATE, GARDEN_TEMP_STATE] {
        Mock::given(method("PATCH"))
            .and(path(format!("/state/{unchanged}")))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&harness.platform)
            .await;
    }

    Mock::given(method("PATCH"))
        .and(path(format!("/data/{RECORD_ID}")))
        .and(body_json(json!({ "status_message": "Successfully updated UDM data" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&harness.platform)
        .await;

    let report = engine.sync_pass().await.unwrap();
    assert_eq!(report.checked, 3);
    assert_eq!(report.written, 1);
    assert_eq!(report.failed_writes, 0);
    assert!(report.unmatched.is_empty());
    assert!(!report.station_renamed);

    let humidity = &engine.network().unwrap().devices[0].values[1];
    assert_eq!(humidity.state.data, "40");
}

#[tokio::test]
async fn test_second_identical_pass_writes_nothing() {
    let harness = Harness::start().await;
    let mut engine = resumed_engine(&harness).await;

    Mock::given(method("GET"))
        .and(path("/api/getstationsdata"))
        .respond_with(ResponseTemplate::new(200).set_body_json(station_data(22.0, 38, 7.25)))
        .mount(&harness.vendor)
        .await;

    Mock::given(method("PATCH"))
        .and(path(format!("/state/{INDOOR_TEMP_STATE}")))
        .and(body_json(json!({ "data": "22" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&harness.platform)
        .await;

    Mock::given(method("PATCH"))
        .and(path(format!("/state/{GARDEN_TEMP_STATE}")))
        .and(body_json(json!({ "data": "7.25" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&harness.platform)
        .await;

    assert_eq!(engine.sync_pass().await.unwrap().written, 2);
    assert_eq!(engine.sync_pass().await.unwrap().written, 0);
}

#[tokio::test]
async fn test_failed_state_write_keeps_pass_alive() {
    let harness = Harness::start().await;
    let mut engine = resumed_engine(&harness).await;

    Mock::given(method("GET"))
        .and(path("/api/getstationsdata"))
        .respond_with(ResponseTemplate::new(200).set_body_json(station_data(21.5, 41, 6.5)))
        .mount(&harness.vendor)
        .await;

    Mock::given(method("PATCH"))
        .and(path(format!("/state/{INDOOR_HUMIDITY_STATE}")))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "message": "boom" })))
        .expect(1)
        .mount(&harness.platform)
        .await;

    // Nothing reached the platform, so the status must not claim success.
    Mock::given(method("PATCH"))
        .and(path(format!("/data/{RECORD_ID}")))
        .and(body_json(json!({ "status_message": "Failed to update UDM data" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&harness.platform)
        .await;

    let report = engine.sync_pass().await.unwrap();
    assert_eq!(report.written, 0);
    assert_eq!(report.failed_writes, 1);
    // No rollback: the in-memory tree is ahead of the platform.
    assert_eq!(engine.network().unwrap().devices[0].values[1].state.data, "41");
}

#[tokio::test]
async fn test_station_rename_is_persisted() {
    let harness = Harness::start().await;
    harness.mount_record("Old Name").await;
    harness.mount_record_patches().await;
    mount_existing_network(&harness.platform).await;

    Mock::given(method("GET"))
        .and(path("/api/getstationsdata"))
        .respond_with(ResponseTemplate::new(200).set_body_json(station_data(21.5, 38, 6.5)))
        .mount(&harness.vendor)
        .await;

    Mock::given(method("PATCH"))
        .and(path(format!("/data/{RECORD_ID}")))
        .and(body_json(json!({ "stationName": "Home" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&harness.platform)
        .await;

    let mut engine = harness.engine(config()).await;
    BootstrapCoordinator::new().run(&mut engine).await.unwrap();

    assert!(engine.sync_pass().await.unwrap().station_renamed);
    assert_eq!(engine.station_name(), Some("Home"));
    assert!(!engine.sync_pass().await.unwrap().station_renamed);
}

#[tokio::test]
async fn test_sync_pass_requires_bootstrap() {
    let harness = Harness::start().await;
    harness.mount_record("Home").await;

    let mut engine = harness.engine(config()).await;
    assert!(matches!(
        engine.sync_pass().await,
        Err(CoreError::NotBootstrapped)
    ));
}

// ── Fallback ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_tick_falls_back_to_refresh_and_one_more_pass() {
    let harness = Harness::start().await;
    let mut engine = resumed_engine(&harness).await;

    Mock::given(method("GET"))
        .and(path("/api/getstationsdata"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .with_priority(1)
        .expect(1)
        .mount(&harness.vendor)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/getstationsdata"))
        .respond_with(ResponseTemplate::new(200).set_body_json(station_data(21.5, 38, 6.5)))
        .expect(1)
        .mount(&harness.vendor)
        .await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(token_response("a2", "r2"))
        .expect(1)
        .mount(&harness.vendor)
        .await;

    Mock::given(method("PATCH"))
        .and(path(format!("/data/{RECORD_ID}")))
        .and(body_json(json!({ "status_message": "Failed to update UDM data" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&harness.platform)
        .await;

    let report = engine.run_tick().await.unwrap();
    assert_eq!(report.written, 0);
}

#[tokio::test]
async fn test_tick_gives_up_after_bounded_fallback() {
    let harness = Harness::start().await;
    let mut engine = resumed_engine(&harness).await;

    Mock::given(method("GET"))
        .and(path("/api/getstationsdata"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&harness.vendor)
        .await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(token_response("a2", "r2"))
        .expect(1)
        .mount(&harness.vendor)
        .await;

    let result = engine.run_tick().await;
    assert!(matches!(result, Err(CoreError::Fetch { .. })));
}

#[tokio::test]
async fn test_tick_fallback_after_empty_snapshots_is_bounded() {
    let harness = Harness::start().await;
    let mut engine = resumed_engine(&harness).await;

    // Every fetch looks like an expired token: each pass refreshes once
    // inside `with_refresh`, and the fallback adds one forced refresh.
    Mock::given(method("GET"))
        .and(path("/api/getstationsdata"))
        .respond_with(token_expired())
        .expect(4)
        .mount(&harness.vendor)
        .await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(token_response("a2", "r2"))
        .expect(3)
        .mount(&harness.vendor)
        .await;

    Mock::given(method("PATCH"))
        .and(path(format!("/data/{RECORD_ID}")))
        .and(body_json(json!({ "status_message": "Failed to update UDM data" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&harness.platform)
        .await;

    assert_eq!(engine.config().max_fallback_passes, 1);
    let result = engine.run_tick().await;
    assert!(matches!(result, Err(CoreError::EmptySnapshot)));
}
