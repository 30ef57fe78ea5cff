// Async HTTP client for the Netatmo weather API.
//
// Token endpoint: POST /oauth2/token (form-encoded, password + refresh grants)
// Station data:   GET  /api/getstationsdata (Bearer auth)

use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use super::models::{ErrorBody, ErrorEnvelope, StationDataResponse, TokenResponse};
use crate::error::Error;
use crate::transport::TransportConfig;

/// Default production endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.netatmo.com/";

const TOKEN_PATH: &str = "oauth2/token";
const STATION_DATA_PATH: &str = "api/getstationsdata";

/// OAuth application credentials plus the account used for the password grant.
#[derive(Debug, Clone)]
pub struct AppCredentials {
    pub client_id: String,
    pub client_secret: SecretString,
    pub username: String,
    pub password: SecretString,
    /// Space-separated OAuth scope, e.g. `read_station`.
    pub scope: String,
}

/// Async client for the Netatmo API.
///
/// Stateless with respect to tokens: the caller owns the credential and
/// passes the access token into each data call.
pub struct NetatmoClient {
    http: reqwest::Client,
    base_url: Url,
    app: AppCredentials,
}

impl NetatmoClient {
    /// Build a client from a base URL, app credentials, and transport config.
    pub fn new(
        base_url: &str,
        app: AppCredentials,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::with_client(base_url, http, app)
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn with_client(
        base_url: &str,
        http: reqwest::Client,
        app: AppCredentials,
    ) -> Result<Self, Error> {
        Ok(Self {
            http,
            base_url: normalize_base_url(base_url)?,
            app,
        })
    }

    /// The API base URL (always ends with `/`).
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── OAuth2 ───────────────────────────────────────────────────────

    /// Initial token exchange using the resource-owner password grant.
    pub async fn get_access_token(&self) -> Result<TokenResponse, Error> {
        debug!(username = %self.app.username, "requesting access token");

        let form = [
            ("grant_type", "password"),
            ("client_id", self.app.client_id.as_str()),
            ("client_secret", self.app.client_secret.expose_secret()),
            ("username", self.app.username.as_str()),
            ("password", self.app.password.expose_secret()),
            ("scope", self.app.scope.as_str()),
        ];
        self.post_token(&form).await
    }

    /// Exchange a refresh token for a new access/refresh pair.
    pub async fn refresh_token(&self, refresh_token: &SecretString) -> Result<TokenResponse, Error> {
        debug!("refreshing access token");

        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token.expose_secret()),
            ("client_id", self.app.client_id.as_str()),
            ("client_secret", self.app.client_secret.expose_secret()),
        ];
        self.post_token(&form).await
    }

    async fn post_token(&self, form: &[(&str, &str)]) -> Result<TokenResponse, Error> {
        let url = self.base_url.join(TOKEN_PATH)?;
        debug!("POST {url}");

        let resp = self.http.post(url).form(form).send().await?;
        let status = resp.status();
        if status.is_success() {
            return parse_json(resp).await;
        }

        let message = match parse_error(status, resp).await {
            Error::Vendor { message, .. } => message,
            other => other.to_string(),
        };
        Err(Error::Authentication {
            message: format!("token exchange failed (HTTP {status}): {message}"),
        })
    }

    // ── Station data ─────────────────────────────────────────────────

    /// Fetch the full station tree for the authenticated account.
    ///
    /// Returns `Ok(None)` when the access token is invalid or expired:
    /// that is the signal to refresh, not an absence of data.
    pub async fn get_station_data(
        &self,
        access_token: &str,
    ) -> Result<Option<StationDataResponse>, Error> {
        let url = self.base_url.join(STATION_DATA_PATH)?;
        debug!("GET {url}");

        let resp = self.http.get(url).bearer_auth(access_token).send().await?;
        let status = resp.status();
        if status.is_success() {
            return parse_json(resp).await.map(Some);
        }

        let err = parse_error(status, resp).await;
        if err.is_token_expired()
            || matches!(
                status,
                reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN
            )
        {
            debug!(%status, "access token rejected");
            return Ok(None);
        }
        Err(err)
    }
}

/// Ensure the base URL parses and ends with a slash so relative joins work.
fn normalize_base_url(raw: &str) -> Result<Url, Error> {
    let mut url = Url::parse(raw)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

async fn parse_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let body = resp.text().await?;
    serde_json::from_str(&body).map_err(|e| Error::deserialization(&e, body))
}

async fn parse_error(status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
    let raw = resp.text().await.unwrap_or_default();

    match serde_json::from_str::<ErrorEnvelope>(&raw) {
        Ok(ErrorEnvelope {
            error: ErrorBody::Api { code, message },
            ..
        }) => Error::Vendor {
            status: status.as_u16(),
            message: message.unwrap_or_else(|| status.to_string()),
            code: Some(code),
        },
        Ok(ErrorEnvelope {
            error: ErrorBody::OAuth(kind),
            error_description,
        }) => Error::Vendor {
            status: status.as_u16(),
            message: error_description.map_or_else(|| kind.clone(), |d| format!("{kind}: {d}")),
            code: None,
        },
        Err(_) => Error::Vendor {
            status: status.as_u16(),
            message: if raw.is_empty() {
                status.to_string()
            } else {
                raw
            },
            code: None,
        },
    }
}
