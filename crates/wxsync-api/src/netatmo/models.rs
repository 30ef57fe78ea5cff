// Netatmo wire types.
//
// Only the fields the sync engine reads are modeled; everything else in
// the vendor payload is ignored during deserialization.

use serde::Deserialize;
use serde_json::{Map, Value};

/// Response body of `POST /oauth2/token` (password and refresh grants).
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Validity of the access token in seconds.
    pub expires_in: i64,
    #[serde(default)]
    pub scope: Vec<String>,
}

/// Response body of `GET /api/getstationsdata`.
#[derive(Debug, Clone, Deserialize)]
pub struct StationDataResponse {
    pub body: StationDataBody,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub time_server: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StationDataBody {
    #[serde(default)]
    pub devices: Vec<StationDevice>,
}

/// A main station unit (`NAMain`) with its attached modules.
#[derive(Debug, Clone, Deserialize)]
pub struct StationDevice {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default, alias = "home_name")]
    pub station_name: Option<String>,
    #[serde(default)]
    pub module_name: Option<String>,
    #[serde(rename = "type")]
    pub device_type: String,
    #[serde(default)]
    pub data_type: Vec<String>,
    /// Missing when the station is unreachable.
    #[serde(default)]
    pub dashboard_data: Option<Map<String, Value>>,
    #[serde(default)]
    pub modules: Vec<StationModule>,
}

/// An attached sensor module (outdoor, rain, wind, extra indoor).
#[derive(Debug, Clone, Deserialize)]
pub struct StationModule {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub module_name: Option<String>,
    #[serde(rename = "type")]
    pub module_type: String,
    #[serde(default)]
    pub data_type: Vec<String>,
    /// Missing when the module lost its radio link.
    #[serde(default)]
    pub dashboard_data: Option<Map<String, Value>>,
    #[serde(default)]
    pub battery_percent: Option<u8>,
    #[serde(default)]
    pub reachable: Option<bool>,
}

/// Netatmo error envelope: `{"error":{"code":3,"message":"Access token expired"}}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorBody,
    #[serde(default)]
    pub error_description: Option<String>,
}

/// The token endpoint uses the plain OAuth2 shape instead:
/// `{"error":"invalid_grant","error_description":"..."}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ErrorBody {
    Api {
        code: i64,
        #[serde(default)]
        message: Option<String>,
    },
    OAuth(String),
}
