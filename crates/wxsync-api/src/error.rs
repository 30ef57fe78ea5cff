use thiserror::Error;

/// Top-level error type for the `wxsync-api` crate.
///
/// Covers every failure mode across both API surfaces: OAuth token
/// exchange, transport, the Netatmo weather API, and the UDM platform.
/// `wxsync-core` classifies these into engine-level failures.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Token exchange or refresh rejected by the vendor.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// Platform session was rejected.
    #[error("Invalid platform session")]
    InvalidSession,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Netatmo ─────────────────────────────────────────────────────
    /// Structured error from the Netatmo API (`{"error":{"code":N,"message":"..."}}`).
    #[error("Netatmo API error (HTTP {status}): {message}")]
    Vendor {
        message: String,
        code: Option<i64>,
        status: u16,
    },

    // ── UDM platform ────────────────────────────────────────────────
    /// Non-success response from the platform REST API.
    #[error("Platform API error (HTTP {status}): {message}")]
    Platform { message: String, status: u16 },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the vendor rejected the access token as invalid
    /// or expired, i.e. a refresh might resolve it.
    pub fn is_token_expired(&self) -> bool {
        matches!(
            self,
            Self::Vendor {
                code: Some(2 | 3),
                ..
            }
        )
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Vendor { status, .. } | Self::Platform { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Platform { status: 404, .. } | Self::Vendor { status: 404, .. } => true,
            _ => false,
        }
    }

    /// Build a `Deserialization` error carrying a short preview of the body.
    pub(crate) fn deserialization(err: &serde_json::Error, body: String) -> Self {
        let end = body.char_indices().nth(200).map_or(body.len(), |(i, _)| i);
        let preview = &body[..end];
        Self::Deserialization {
            message: format!("{err} (body preview: {preview:?})"),
            body,
        }
    }
}
