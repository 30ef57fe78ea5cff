// Async HTTP client for the UDM platform REST API.
//
// Base path: /services/2.0/
// Auth: X-Session header

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;
use uuid::Uuid;

use super::models::{DataPatch, DataRecord, NetworkEntity, StatePatch};
use crate::error::Error;
use crate::transport::TransportConfig;

/// Default production endpoint.
pub const DEFAULT_BASE_URL: &str = "https://wappsto.com/services/2.0/";

/// Depth needed to receive Network → Device → Value → State in one response.
const NETWORK_EXPAND: &str = "5";

/// Async client for the UDM platform.
pub struct UdmClient {
    http: reqwest::Client,
    base_url: Url,
}

impl UdmClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from a session token and transport config.
    ///
    /// Injects `X-Session` as a default header on every request.
    pub fn from_session(
        base_url: &str,
        session: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut value =
            HeaderValue::from_str(session.expose_secret()).map_err(|e| Error::Platform {
                message: format!("invalid session header value: {e}"),
                status: 0,
            })?;
        value.set_sensitive(true);
        headers.insert("X-Session", value);

        let http = transport.build_client_with_headers(headers)?;
        Self::from_reqwest(base_url, http)
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let mut url = Url::parse(base_url)?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(Self { http, base_url: url })
    }

    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    // ── Network ──────────────────────────────────────────────────────

    /// Find the network with the given name, fully expanded.
    pub async fn find_network(&self, name: &str) -> Result<Option<NetworkEntity>, Error> {
        let networks: Vec<NetworkEntity> = self
            .get_with_params("network", &[("name", name), ("expand", NETWORK_EXPAND)])
            .await?;
        Ok(networks.into_iter().find(|n| n.name == name))
    }

    /// Persist a complete network tree in one request.
    ///
    /// Returns the stored tree with platform-assigned ids.
    pub async fn create_network(&self, network: &NetworkEntity) -> Result<NetworkEntity, Error> {
        let url = self.url("network")?;
        debug!("POST {url}");

        let resp = self
            .http
            .post(url)
            .query(&[("expand", NETWORK_EXPAND)])
            .json(network)
            .send()
            .await?;
        handle_response(resp).await
    }

    // ── State ────────────────────────────────────────────────────────

    /// Overwrite the data of a single state.
    pub async fn patch_state(&self, state_id: Uuid, data: &str) -> Result<(), Error> {
        self.patch(&format!("state/{state_id}"), &StatePatch { data })
            .await
    }

    // ── Data record ──────────────────────────────────────────────────

    /// Fetch the integration's data record, if one exists.
    pub async fn get_data_record(&self) -> Result<Option<DataRecord>, Error> {
        let records: Vec<DataRecord> = self.get_with_params("data", &[("expand", "1")]).await?;
        Ok(records.into_iter().next())
    }

    /// Partially update the data record.
    pub async fn patch_data(&self, record_id: Uuid, patch: &DataPatch<'_>) -> Result<(), Error> {
        self.patch(&format!("data/{record_id}"), patch).await
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    async fn get_with_params<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url} params={params:?}");

        let resp = self.http.get(url).query(params).send().await?;
        handle_response(resp).await
    }

    async fn patch<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<(), Error> {
        let url = self.url(path)?;
        debug!("PATCH {url}");

        let resp = self.http.patch(url).json(body).send().await?;
        handle_empty(resp).await
    }
}

// ── Response handling ────────────────────────────────────────────────

async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let status = resp.status();
    if status.is_success() {
        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| Error::deserialization(&e, body))
    } else {
        Err(parse_error(status, resp).await)
    }
}

async fn handle_empty(resp: reqwest::Response) -> Result<(), Error> {
    let status = resp.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(parse_error(status, resp).await)
    }
}

#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    message: Option<String>,
}

async fn parse_error(status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Error::InvalidSession;
    }

    let raw = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorResponse>(&raw)
        .ok()
        .and_then(|e| e.message)
        .unwrap_or_else(|| {
            if raw.is_empty() {
                status.to_string()
            } else {
                raw
            }
        });

    Error::Platform {
        message,
        status: status.as_u16(),
    }
}
