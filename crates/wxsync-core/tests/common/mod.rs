// Shared fixtures for engine-level tests: one mock server per side.

#![allow(dead_code, clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use wxsync_api::{AppCredentials, NetatmoClient, TransportConfig, UdmClient};
use wxsync_core::{EngineConfig, NetworkInfo, SyncEngine};

pub const RECORD_ID: &str = "3c1d2e4f-5a6b-4c7d-8e9f-0a1b2c3d4e5f";
pub const NETWORK_ID: &str = "6a1b0e2c-7d55-4a0e-9f3c-1d2e3f4a5b6c";
pub const INDOOR_TEMP_STATE: &str = "0f6c3a4e-91b2-4c8d-a7e6-2b3c4d5e6f70";
pub const INDOOR_HUMIDITY_STATE: &str = "1a7d4b5f-a2c3-4d9e-b8f7-3c4d5e6f7081";
pub const GARDEN_TEMP_STATE: &str = "2b8e5c60-b3d4-4eaf-c9a8-4d5e6f708192";

pub struct Harness {
    pub vendor: MockServer,
    pub platform: MockServer,
}

impl Harness {
    pub async fn start() -> Self {
        Self {
            vendor: MockServer::start().await,
            platform: MockServer::start().await,
        }
    }

    pub fn clients(&self) -> (Arc<NetatmoClient>, Arc<UdmClient>) {
        let transport = TransportConfig::default();
        let app = AppCredentials {
            client_id: "client-id".into(),
            client_secret: SecretString::from("client-secret".to_string()),
            username: "user@example.com".into(),
            password: SecretString::from("hunter2".to_string()),
            scope: "read_station".into(),
        };
        let vendor = NetatmoClient::new(&self.vendor.uri(), app, &transport).unwrap();
        let session = SecretString::from("session-token".to_string());
        let udm = UdmClient::from_session(&self.platform.uri(), &session, &transport).unwrap();
        (Arc::new(vendor), Arc::new(udm))
    }

    pub async fn engine(&self, config: EngineConfig) -> SyncEngine {
        let (vendor, udm) = self.clients();
        SyncEngine::connect(vendor, udm, config).await.unwrap()
    }

    /// Data record holding a valid credential.
    pub async fn mount_record(&self, station_name: &str) {
        self.mount_record_body(json!([{
            "meta": { "id": RECORD_ID, "type": "data" },
            "accessToken": "a1",
            "refreshToken": "r1",
            "expiresIn": 10800,
            "stationName": station_name
        }]))
        .await;
    }

    pub async fn mount_record_body(&self, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/data"))
            .and(query_param("expand", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.platform)
            .await;
    }

    /// Accept any record patch not matched by a more specific mock.
    pub async fn mount_record_patches(&self) {
        Mock::given(method("PATCH"))
            .and(path(format!("/data/{RECORD_ID}")))
            .respond_with(ResponseTemplate::new(200))
            .with_priority(10)
            .mount(&self.platform)
            .await;
    }
}

pub fn config() -> EngineConfig {
    let mut config = EngineConfig::new(NetworkInfo::builtin().unwrap());
    config.fallback_delay = Duration::from_millis(10);
    config
}

/// Station with the main unit and one outdoor module.
pub fn station_data(indoor_temp: f64, humidity: i64, garden_temp: f64) -> serde_json::Value {
    json!({
        "body": {
            "devices": [{
                "_id": "70:ee:50:00:00:01",
                "station_name": "Home",
                "module_name": "Indoor",
                "type": "NAMain",
                "data_type": ["Temperature", "Humidity"],
                "dashboard_data": { "Temperature": indoor_temp, "Humidity": humidity },
                "modules": [{
                    "_id": "02:00:00:00:00:01",
                    "module_name": "Garden",
                    "type": "NAModule1",
                    "data_type": ["Temperature"],
                    "dashboard_data": { "Temperature": garden_temp }
                }]
            }]
        },
        "status": "ok"
    })
}

/// The network as the platform stores it after a previous bootstrap.
pub fn stored_network() -> serde_json::Value {
    fn value(id: &str, state_id: &str, name: &str, data: &str) -> serde_json::Value {
        json!({
            "meta": { "id": id },
            "name": name,
            "type": name.to_lowercase(),
            "permission": "r",
            "number": { "min": -999.0, "max": 999.0, "step": 1.0 },
            "state": [{ "meta": { "id": state_id }, "type": "Report", "data": data }]
        })
    }

    json!({
        "meta": { "id": NETWORK_ID, "type": "network" },
        "name": "Netatmo Weather Station",
        "device": [
            {
                "meta": { "id": "4d0a7e82-d5f6-4ac1-eb0c-6f708192a3b4" },
                "name": "Indoor",
                "value": [
                    value("5e1b8f93-e607-4bd2-fc1d-708192a3b4c5", INDOOR_TEMP_STATE, "Temperature", "21.5"),
                    value("6f2c90a4-f718-4ce3-8d2e-8192a3b4c5d6", INDOOR_HUMIDITY_STATE, "Humidity", "38")
                ]
            },
            {
                "meta": { "id": "7031a1b5-0829-4df4-9e3f-92a3b4c5d6e7" },
                "name": "Garden",
                "value": [
                    value("8142b2c6-193a-4e05-af40-a3b4c5d6e7f8", GARDEN_TEMP_STATE, "Temperature", "6.5")
                ]
            }
        ]
    })
}

pub async fn mount_existing_network(platform: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/network"))
        .and(query_param("name", "Netatmo Weather Station"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([stored_network()])))
        .mount(platform)
        .await;
}

pub async fn mount_no_network(platform: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/network"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(platform)
        .await;
}

/// The vendor's answer to a stale access token.
pub fn token_expired() -> ResponseTemplate {
    ResponseTemplate::new(403).set_body_json(json!({
        "error": { "code": 3, "message": "Access token expired" }
    }))
}

pub fn token_response(access: &str, refresh: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "access_token": access,
        "refresh_token": refresh,
        "expires_in": 10800,
        "scope": ["read_station"]
    }))
}
